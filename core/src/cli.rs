use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::{Config, CONFIG_PATH_ENV};
use crate::interpreter::context::StdoutSink;
use crate::sandbox::Scenario;
use crate::task::Task;

#[derive(Parser)]
#[command(name = "taskforce")]
#[command(about = "Taskforce - scripted unit tasks and per-faction schedulers", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a scenario in the sandbox world
    Run {
        /// Scenario JSON file
        scenario: PathBuf,

        /// Tick limit (default: simulation.max_ticks)
        #[arg(short = 't', long = "ticks")]
        ticks: Option<u64>,

        /// Seed for the next-to picker (overrides simulation.rng_seed)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Report well-formedness problems for every task in a scenario
    Check {
        /// Scenario JSON file
        scenario: PathBuf,
    },

    /// Print the effective configuration
    Config,
}

/// Load configuration honouring `--config`
pub fn load_config(cli: &Cli) -> Result<Config> {
    if let Some(config_path) = &cli.config {
        std::env::set_var(CONFIG_PATH_ENV, config_path);
    }
    Config::load()
}

/// Handle a parsed command line with an already loaded configuration
pub fn run_cli_with_args(cli: Cli, mut config: Config) -> Result<()> {
    match cli.command {
        Commands::Run {
            scenario,
            ticks,
            seed,
        } => {
            if seed.is_some() {
                config.simulation.rng_seed = seed;
            }
            let limit = ticks.unwrap_or(config.simulation.max_ticks);
            run_scenario(&scenario, config, limit)?;
        }

        Commands::Check { scenario } => {
            check_scenario(&scenario)?;
        }

        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

fn run_scenario(path: &Path, config: Config, limit: u64) -> Result<()> {
    let scenario = Scenario::load(path)?;
    let (mut app, mut world, ids) = scenario
        .setup(config)
        .with_context(|| format!("Failed to set up {}", path.display()))?;
    info!(tasks = ids.len(), limit, "Scenario loaded");

    let mut sink = StdoutSink;
    let mut completed = 0usize;
    let mut ticks = 0u64;

    while ticks < limit && completed < ids.len() {
        let report = app.tick(&mut world, &mut sink);
        ticks += 1;

        for (unit, task) in &report.assigned {
            println!("tick {}: {} claimed '{}'", ticks, unit, app.name(*task)?);
        }
        for task in &report.completed {
            println!("tick {}: '{}' completed", ticks, app.name(*task)?);
        }
        for task in &report.failed {
            println!("tick {}: '{}' failed", ticks, app.name(*task)?);
        }
        for (task, error) in &report.errors {
            println!("  {}: {}", app.name(*task)?, error);
        }
        completed += report.completed.len();

        world.advance();
    }

    println!(
        "\n{} of {} tasks completed after {} ticks",
        completed,
        ids.len(),
        ticks
    );
    Ok(())
}

fn check_scenario(path: &Path) -> Result<()> {
    let scenario = Scenario::load(path)?;
    let mut problems = 0usize;

    for entry in &scenario.tasks {
        let tasks = entry.template.instantiate(&entry.selections);
        // Every instance shares the tree; the first one stands for all
        let Some(task) = tasks.first() else {
            continue;
        };
        let errors = Task::validate(task);
        if errors.is_empty() {
            println!("✓ {}", entry.template.name);
            continue;
        }

        println!("✗ {}", entry.template.name);
        for error in &errors {
            println!("    {}", error);
        }
        problems += errors.len();
    }

    if problems > 0 {
        bail!("{} well-formedness problem(s) found", problems);
    }
    Ok(())
}
