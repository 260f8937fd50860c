//! # Task interpreter
//!
//! Typed expressions and resumable statements for task scripts.
//!
//! ## Core Principles
//!
//! 1. **One step per call**: `step_stmt` advances a statement by a single
//!    bounded step; long loops never monopolise a tick
//! 2. **State lives in the tree**: every statement node carries its own
//!    `ExecutionState`, so a task resumes where its last step stopped
//! 3. **Collaborators through context**: world queries, unit actions, output
//!    and randomness all arrive via `EvalContext` / `ExecContext`
//! 4. **No parsing**: trees are built by `build` helpers or deserialized

pub mod build;
pub mod context;
pub mod expressions;
pub mod semantic_validator;
pub mod statements;
pub mod types;
pub mod variables;

#[cfg(test)]
mod tests;

pub use context::{
    EvalContext, ExecContext, OutputSink, Picker, RandomPicker, Selection, SequencePicker,
    StdoutSink, UnitController, World,
};
pub use expressions::{eval_expr, EvalResult};
pub use statements::step_stmt;
pub use types::{ActionKind, Control, ExecutionState, Expr, Stmt, Value, ValueKind};
pub use variables::VariableStore;
