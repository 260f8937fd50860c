//! Configuration loading
//!
//! Layers, lowest precedence first:
//! 1. Built-in defaults
//! 2. TOML file at `TASKFORCE_CONFIG_PATH`, else `taskforce.toml` (optional)
//! 3. Environment variables: `TASKFORCE__SCHEDULER__FAILURE_PRIORITY_PENALTY=5`
//!
//! A `.env` file in the working directory is read before the environment.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "TASKFORCE_CONFIG_PATH";

const DEFAULT_CONFIG_FILE: &str = "taskforce.toml";
const ENV_PREFIX: &str = "TASKFORCE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub scheduler: SchedulerSettings,
    pub simulation: SimulationSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    /// Subtracted from a task's priority each time it fails and returns to pending
    pub failure_priority_penalty: i64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            failure_priority_penalty: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Seed for the next-to picker; entropy when absent
    pub rng_seed: Option<u64>,
    /// Upper bound on ticks for `taskforce run`
    pub max_ticks: u64,
    /// Ticks a sandbox work-at action takes
    pub work_ticks: u32,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            rng_seed: None,
            max_ticks: 1000,
            work_ticks: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "taskforce_core=info".to_string(),
        }
    }
}

impl Config {
    /// Load from file and environment on top of the defaults
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let path = std::env::var(CONFIG_PATH_ENV).ok();
        Self::load_from(path.as_deref())
    }

    /// Load with an explicit config file; a missing explicit file is an error
    pub fn load_from(path: Option<&str>) -> Result<Self> {
        let file = match path {
            Some(p) => config::File::with_name(p).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read configuration")?;

        settings
            .try_deserialize::<Config>()
            .context("Invalid configuration")
    }

    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Effective configuration rendered as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to render configuration")
    }
}

/// Programmatic overrides on top of [`Config::default`]
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn failure_priority_penalty(mut self, penalty: i64) -> Self {
        self.config.scheduler.failure_priority_penalty = penalty;
        self
    }

    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.config.simulation.rng_seed = Some(seed);
        self
    }

    pub fn max_ticks(mut self, ticks: u64) -> Self {
        self.config.simulation.max_ticks = ticks;
        self
    }

    pub fn work_ticks(mut self, ticks: u32) -> Self {
        self.config.simulation.work_ticks = ticks;
        self
    }

    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.logging.filter = filter.into();
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.scheduler.failure_priority_penalty, 0);
        assert_eq!(config.simulation.max_ticks, 1000);
        assert_eq!(config.simulation.rng_seed, None);
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            "[scheduler]\nfailure_priority_penalty = 2\n\n[simulation]\nrng_seed = 7"
        )
        .unwrap();

        let config = Config::load_from(file.path().to_str()).unwrap();
        assert_eq!(config.scheduler.failure_priority_penalty, 2);
        assert_eq!(config.simulation.rng_seed, Some(7));
        // Untouched keys keep their defaults
        assert_eq!(config.simulation.work_ticks, 3);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        assert!(Config::load_from(Some("/nonexistent/taskforce-config.toml")).is_err());
    }

    #[test]
    fn test_builder_and_toml_render() {
        let config = Config::builder()
            .failure_priority_penalty(1)
            .max_ticks(20)
            .build();
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("failure_priority_penalty = 1"));
        assert!(rendered.contains("max_ticks = 20"));
    }
}
