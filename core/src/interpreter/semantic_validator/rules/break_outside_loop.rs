//! Rule: Break Outside Loop

use crate::interpreter::types::{Stmt, StmtKind};

use super::super::{Bindings, ValidationError, ValidationRule};

pub struct BreakOutsideLoopRule;

impl ValidationRule for BreakOutsideLoopRule {
    fn id(&self) -> &'static str {
        "break-outside-loop"
    }

    fn description(&self) -> &'static str {
        "break may only appear inside a while loop"
    }

    fn validate(&self, body: &Stmt, _bindings: &Bindings<'_>) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        check_stmt(body, 0, &mut errors, self.id());
        errors
    }
}

fn check_stmt(stmt: &Stmt, depth: usize, errors: &mut Vec<ValidationError>, rule_id: &'static str) {
    match &stmt.kind {
        StmtKind::Break if depth == 0 => {
            errors.push(ValidationError::new(stmt.span, "break outside of a loop", rule_id));
        }
        StmtKind::Sequence { body, .. } => {
            for child in body {
                check_stmt(child, depth, errors, rule_id);
            }
        }
        StmtKind::If { then_s, else_s, .. } => {
            check_stmt(then_s, depth, errors, rule_id);
            if let Some(else_s) = else_s {
                check_stmt(else_s, depth, errors, rule_id);
            }
        }
        StmtKind::While { body, .. } => check_stmt(body, depth + 1, errors, rule_id),
        _ => {}
    }
}
