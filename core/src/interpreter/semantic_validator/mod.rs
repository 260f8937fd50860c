//! Well-formedness validation for task statement trees
//!
//! An extensible rule-based validation system that runs before a task is
//! admitted to a scheduler.
//!
//! # Usage
//!
//! ```ignore
//! let errors = validate_task(&task.body, &Bindings::new(&task.variables, &task.selection));
//! if !errors.is_empty() {
//!     // Reject the task
//! }
//! ```
//!
//! # Architecture
//!
//! 1. **ValidationRule trait** - Each rule implements this trait
//! 2. **Validator** - Collects and runs all rules
//! 3. **ValidationError** - The output of validation
//!
//! New rules go in `semantic_validator/rules/` and are registered in
//! `Validator::new()`.

pub mod rules;

use super::context::Selection;
use super::types::{Expr, Span, Stmt, StmtKind};
use super::variables::VariableStore;

// ============================================================================
// Validation Error Types
// ============================================================================

/// A well-formedness problem found in a statement tree
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// The source location of the issue
    pub span: Span,
    /// Human-readable message
    pub message: String,
    /// Which rule produced this error
    pub rule_id: &'static str,
}

impl ValidationError {
    pub fn new(span: Span, message: impl Into<String>, rule_id: &'static str) -> Self {
        Self {
            span,
            message: message.into(),
            rule_id,
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "error at line {}, col {}: {} [{}]",
            self.span.line, self.span.column, self.message, self.rule_id
        )
    }
}

impl std::error::Error for ValidationError {}

/// What a task already has available when it is checked
#[derive(Debug, Clone, Copy)]
pub struct Bindings<'a> {
    pub variables: &'a VariableStore,
    pub selection: &'a Selection,
}

impl<'a> Bindings<'a> {
    pub fn new(variables: &'a VariableStore, selection: &'a Selection) -> Self {
        Self {
            variables,
            selection,
        }
    }
}

// ============================================================================
// ValidationRule Trait
// ============================================================================

/// Trait that all validation rules must implement.
///
/// Rules are independent of each other and must not depend on execution
/// state; a half-executed tree validates the same as a fresh one.
pub trait ValidationRule: Send + Sync {
    /// Unique identifier for this rule (e.g., "undefined-variable")
    fn id(&self) -> &'static str;

    /// Human-readable description of what this rule checks
    fn description(&self) -> &'static str;

    /// Run the validation and return any errors found.
    fn validate(&self, body: &Stmt, bindings: &Bindings<'_>) -> Vec<ValidationError>;
}

// ============================================================================
// Validator - Runs All Rules
// ============================================================================

pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    /// Create a new validator with all built-in rules.
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(rules::UndefinedVariableRule),
                Box::new(rules::SelectionRequiredRule),
                Box::new(rules::BreakOutsideLoopRule),
            ],
        }
    }

    pub fn validate(&self, body: &Stmt, bindings: &Bindings<'_>) -> Vec<ValidationError> {
        self.rules
            .iter()
            .flat_map(|rule| rule.validate(body, bindings))
            .collect()
    }

    /// Get a list of all registered rules
    pub fn rules(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.rules.iter().map(|r| (r.id(), r.description()))
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Traversal helpers shared by rules
// ============================================================================

/// Visit every expression node reachable from `stmt`, in program order
pub(crate) fn visit_exprs<'s>(stmt: &'s Stmt, f: &mut dyn FnMut(&'s Expr)) {
    for expr in stmt.expressions() {
        visit_expr(expr, f);
    }
    match &stmt.kind {
        StmtKind::Sequence { body, .. } => {
            for child in body {
                visit_exprs(child, f);
            }
        }
        StmtKind::If { then_s, else_s, .. } => {
            visit_exprs(then_s, f);
            if let Some(else_s) = else_s {
                visit_exprs(else_s, f);
            }
        }
        StmtKind::While { body, .. } => visit_exprs(body, f),
        _ => {}
    }
}

pub(crate) fn visit_expr<'s>(expr: &'s Expr, f: &mut dyn FnMut(&'s Expr)) {
    f(expr);
    for child in expr.children() {
        visit_expr(child, f);
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Validate a statement tree and return all errors found.
pub fn validate_task(body: &Stmt, bindings: &Bindings<'_>) -> Vec<ValidationError> {
    Validator::new().validate(body, bindings)
}

/// True if no rule reports an error
pub fn is_well_formed(body: &Stmt, bindings: &Bindings<'_>) -> bool {
    validate_task(body, bindings).is_empty()
}
