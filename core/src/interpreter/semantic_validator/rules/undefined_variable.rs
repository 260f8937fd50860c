//! Rule: Undefined Variable
//!
//! Reports an error when a variable may be read before anything assigned it.
//!
//! ```text
//! // Error: 'target' is read before assignment
//! moveTo target;
//! target := boulder;
//! ```
//!
//! A name counts as assigned after a conditional only if both branches assign
//! it, and never after a loop (the body may not run at all).

use std::collections::HashSet;

use crate::interpreter::types::{Expr, ExprKind, Stmt, StmtKind};

use super::super::{visit_expr, Bindings, ValidationError, ValidationRule};

/// Rule that checks for reads of unbound variables.
pub struct UndefinedVariableRule;

impl ValidationRule for UndefinedVariableRule {
    fn id(&self) -> &'static str {
        "undefined-variable"
    }

    fn description(&self) -> &'static str {
        "Variables must be assigned before they are read"
    }

    fn validate(&self, body: &Stmt, bindings: &Bindings<'_>) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut scope = Scope::new();

        for name in bindings.variables.names() {
            scope.define(name);
        }

        check_stmt(body, &mut scope, &mut errors, self.id());

        errors
    }
}

// ============================================================================
// Scope Tracking
// ============================================================================

/// Names assigned on every path reaching the current point
#[derive(Clone)]
struct Scope {
    defined: HashSet<String>,
}

impl Scope {
    fn new() -> Self {
        Self {
            defined: HashSet::new(),
        }
    }

    fn define(&mut self, name: &str) {
        self.defined.insert(name.to_string());
    }

    fn is_defined(&self, name: &str) -> bool {
        self.defined.contains(name)
    }

    /// Keep only names defined in both scopes
    fn intersect(&mut self, other: &Scope) {
        self.defined.retain(|n| other.defined.contains(n));
    }
}

// ============================================================================
// AST Traversal
// ============================================================================

fn check_stmt(
    stmt: &Stmt,
    scope: &mut Scope,
    errors: &mut Vec<ValidationError>,
    rule_id: &'static str,
) {
    match &stmt.kind {
        StmtKind::Sequence { body, .. } => {
            for child in body {
                check_stmt(child, scope, errors, rule_id);
            }
        }

        StmtKind::If {
            test,
            then_s,
            else_s,
            ..
        } => {
            check_expr(test, scope, errors, rule_id);

            let mut then_scope = scope.clone();
            check_stmt(then_s, &mut then_scope, errors, rule_id);

            let mut else_scope = scope.clone();
            if let Some(else_s) = else_s {
                check_stmt(else_s, &mut else_scope, errors, rule_id);
            }

            then_scope.intersect(&else_scope);
            *scope = then_scope;
        }

        StmtKind::While { test, body } => {
            check_expr(test, scope, errors, rule_id);

            // Body assignments are visible inside the body only
            let mut body_scope = scope.clone();
            check_stmt(body, &mut body_scope, errors, rule_id);
        }

        StmtKind::Assign { name, expr } => {
            // Check the value FIRST: `x := x` reads x before binding it
            check_expr(expr, scope, errors, rule_id);
            scope.define(name);
        }

        StmtKind::Print { expr } | StmtKind::Action { target: expr, .. } => {
            check_expr(expr, scope, errors, rule_id);
        }

        StmtKind::Break => {}
    }
}

fn check_expr(
    expr: &Expr,
    scope: &Scope,
    errors: &mut Vec<ValidationError>,
    rule_id: &'static str,
) {
    visit_expr(expr, &mut |e| {
        if let ExprKind::Var { name } = &e.kind {
            if !scope.is_defined(name) {
                errors.push(ValidationError::new(
                    e.span,
                    format!("Variable '{}' is read before it is assigned", name),
                    rule_id,
                ));
            }
        }
    });
}
