pub mod application;
pub mod cli;
pub mod config;
pub mod error;
pub mod interpreter;
pub mod sandbox;
pub mod scheduler;
pub mod task;
pub mod types;
pub mod worker;

// Re-export main types
pub use types::*;

pub use application::Application;
pub use config::Config;
pub use error::{EvalError, SchedulerError, TaskError};
pub use scheduler::{PriorityIter, Scheduler};
pub use task::{Task, TaskArena, TaskTemplate};
pub use worker::TickReport;
