//! Rule: Selection Required
//!
//! `selected` expressions read a value handed in by the presentation layer.
//! A task that uses them without a selection can never evaluate them.

use crate::interpreter::types::{ExprKind, Stmt};

use super::super::{visit_exprs, Bindings, ValidationError, ValidationRule};

pub struct SelectionRequiredRule;

impl ValidationRule for SelectionRequiredRule {
    fn id(&self) -> &'static str {
        "selection-required"
    }

    fn description(&self) -> &'static str {
        "Selected unit or position must be available when used"
    }

    fn validate(&self, body: &Stmt, bindings: &Bindings<'_>) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let selection = bindings.selection;

        visit_exprs(body, &mut |e| {
            let missing = match e.kind {
                ExprKind::SelectedPos if selection.position.is_none() => Some("position"),
                ExprKind::SelectedUnit if selection.unit.is_none() => Some("unit"),
                _ => None,
            };
            if let Some(what) = missing {
                errors.push(ValidationError::new(
                    e.span,
                    format!("'selected' {} used but nothing is selected", what),
                    self.id(),
                ));
            }
        });

        errors
    }
}
