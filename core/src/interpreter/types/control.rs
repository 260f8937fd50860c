//! Execution state and control flow types

use serde::{Deserialize, Serialize};

/// Execution state carried by every statement node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    #[default]
    NotStarted,
    InProgress,
    Done,
    Failed,
}

impl ExecutionState {
    /// Done or Failed
    pub fn is_terminal(self) -> bool {
        matches!(self, ExecutionState::Done | ExecutionState::Failed)
    }
}

/// Control flow state
///
/// Set by `break` and consumed by the innermost enclosing loop. Sequences and
/// conditionals stop running children while control is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Control {
    #[default]
    None,
    Break,
}

/// Which arm of a conditional was selected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Branch {
    Then,
    Else,
}
