//! Built-in validation rules

mod break_outside_loop;
mod selection_required;
mod undefined_variable;

pub use break_outside_loop::BreakOutsideLoopRule;
pub use selection_required::SelectionRequiredRule;
pub use undefined_variable::UndefinedVariableRule;
