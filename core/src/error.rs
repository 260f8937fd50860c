use thiserror::Error;

use crate::interpreter::semantic_validator::ValidationError;
use crate::interpreter::types::{Span, ValueKind};
use crate::types::{FactionId, SchedulerId, TaskId, UnitId};

/// Failure while evaluating an expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    /// The context has no executing unit. This is a caller bug, not a script error.
    #[error("internal error: expression at {span} evaluated without an executing unit")]
    MissingUnit { span: Span },

    #[error("type mismatch at {span}: expected {expected}, found {found}")]
    TypeMismatch {
        expected: ValueKind,
        found: ValueKind,
        span: Span,
    },

    #[error("expression at {span} produced no value")]
    NoValue { span: Span },

    #[error("unit {unit} is not known to the world")]
    UnknownUnit { unit: UnitId },
}

/// Failure while stepping a task
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TaskError {
    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error("task '{name}' is not well-formed: {}", .errors.first().map(|e| e.to_string()).unwrap_or_default())]
    IllFormed {
        name: String,
        errors: Vec<ValidationError>,
    },
}

/// Rejected scheduler operation; scheduler state is left untouched
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulerError {
    #[error("{task} is already scheduled in {scheduler}")]
    AlreadyScheduled { scheduler: SchedulerId, task: TaskId },

    #[error("{task} is not a member of {scheduler}")]
    NotMember { scheduler: SchedulerId, task: TaskId },

    #[error("unknown task {0}")]
    UnknownTask(TaskId),

    #[error("unknown scheduler {0}")]
    UnknownScheduler(SchedulerId),

    #[error("{task} is not well-formed and cannot be scheduled")]
    IllFormed { task: TaskId },

    #[error("{unit} is already executing {task}")]
    UnitBusy { unit: UnitId, task: TaskId },

    #[error("{task} is currently assigned to {unit}")]
    TaskAssigned { task: TaskId, unit: UnitId },

    #[error("{faction} already has scheduler {scheduler}")]
    DuplicateFaction {
        faction: FactionId,
        scheduler: SchedulerId,
    },
}

pub type Result<T, E = SchedulerError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EvalError::TypeMismatch {
            expected: ValueKind::Boolean,
            found: ValueKind::Position,
            span: Span::new(3, 7),
        };
        assert_eq!(
            err.to_string(),
            "type mismatch at line 3, col 7: expected boolean, found position"
        );

        let err = SchedulerError::AlreadyScheduled {
            scheduler: SchedulerId(0),
            task: TaskId(4),
        };
        assert_eq!(err.to_string(), "task#4 is already scheduled in scheduler#0");
    }
}
