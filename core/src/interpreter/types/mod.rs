//! Type definitions for the interpreter
//!
//! - AST nodes (Stmt, Expr)
//! - Runtime values (Value)
//! - Execution state and control flow (ExecutionState, Control)

pub mod ast;
pub mod control;
pub mod values;

pub use ast::{ActionKind, Expr, ExprKind, Span, Stmt, StmtKind};
pub use control::{Branch, Control, ExecutionState};
pub use values::{Value, ValueKind};
