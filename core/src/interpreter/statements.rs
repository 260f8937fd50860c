//! Statement execution handlers
//!
//! Each statement type has its own handler that advances the node by exactly
//! one step. A handler returns the node's new execution state; `step_stmt`
//! stores it on the node.

use super::context::ExecContext;
use super::expressions::{eval_expr, eval_required, EvalResult};
use super::types::{
    ActionKind, Branch, Control, ExecutionState, Expr, Stmt, StmtKind, Value, ValueKind,
};
use crate::error::EvalError;
use crate::types::ActionStatus;

use ExecutionState::{Done, Failed, InProgress, NotStarted};

/// Advance `stmt` by one step
///
/// Terminal statements are left as they are. If evaluation fails the node is
/// marked `Failed` and the error is returned, so every enclosing statement on
/// the way up ends up `Failed` as well.
pub fn step_stmt(stmt: &mut Stmt, ctx: &mut ExecContext<'_>) -> Result<ExecutionState, EvalError> {
    if stmt.state.is_terminal() {
        return Ok(stmt.state);
    }

    let result = match &mut stmt.kind {
        StmtKind::Sequence { body, idx } => execute_sequence(body, idx, ctx),

        StmtKind::If {
            test,
            then_s,
            else_s,
            branch,
        } => execute_if(test, then_s, else_s.as_deref_mut(), branch, ctx),

        StmtKind::While { test, body } => execute_while(test, body, ctx),

        StmtKind::Assign { name, expr } => execute_assign(name, expr, ctx),

        StmtKind::Print { expr } => execute_print(expr, ctx),

        StmtKind::Action { action, target } => execute_action(*action, target, stmt.state, ctx),

        StmtKind::Break => {
            ctx.control = Control::Break;
            Ok(Done)
        }
    };

    match result {
        Ok(state) => {
            stmt.state = state;
            Ok(state)
        }
        Err(e) => {
            stmt.state = Failed;
            Err(e)
        }
    }
}

/* ===================== Statement Handlers ===================== */

/// Execute Sequence statement
///
/// Steps the active child once. A finished child hands over to the next one
/// on the following step; a failed child fails the whole sequence.
pub fn execute_sequence(
    body: &mut [Stmt],
    idx: &mut usize,
    ctx: &mut ExecContext<'_>,
) -> Result<ExecutionState, EvalError> {
    let len = body.len();
    let Some(child) = body.get_mut(*idx) else {
        // Empty sequence, or every child already ran
        return Ok(Done);
    };

    match step_stmt(child, ctx)? {
        Done => {
            *idx += 1;
            if ctx.control != Control::None || *idx >= len {
                Ok(Done)
            } else {
                Ok(InProgress)
            }
        }
        Failed => Ok(Failed),
        NotStarted | InProgress => Ok(InProgress),
    }
}

/// Execute If statement
///
/// The condition is evaluated once, on the first step. The chosen branch is
/// remembered and stepped on every later step.
pub fn execute_if(
    test: &Expr,
    then_s: &mut Stmt,
    else_s: Option<&mut Stmt>,
    branch: &mut Option<Branch>,
    ctx: &mut ExecContext<'_>,
) -> Result<ExecutionState, EvalError> {
    let chosen = match *branch {
        Some(b) => b,
        None => {
            let cond = eval_required(test, &mut ctx.eval(), ValueKind::Boolean)?;
            let b = if cond.as_bool() == Some(true) {
                Branch::Then
            } else {
                Branch::Else
            };
            *branch = Some(b);
            b
        }
    };

    match (chosen, else_s) {
        (Branch::Then, _) => step_stmt(then_s, ctx),
        (Branch::Else, Some(else_s)) => step_stmt(else_s, ctx),
        (Branch::Else, None) => Ok(Done),
    }
}

/// Execute While statement
///
/// The condition is checked whenever the body is not mid-iteration. A true
/// condition restarts the body from `NotStarted` and steps it once.
pub fn execute_while(
    test: &Expr,
    body: &mut Stmt,
    ctx: &mut ExecContext<'_>,
) -> Result<ExecutionState, EvalError> {
    if body.state != InProgress {
        let cond = eval_required(test, &mut ctx.eval(), ValueKind::Boolean)?;
        if cond.as_bool() != Some(true) {
            return Ok(Done);
        }
        body.reset();
    }

    match step_stmt(body, ctx)? {
        Failed => Ok(Failed),
        Done if ctx.control == Control::Break => {
            ctx.control = Control::None;
            Ok(Done)
        }
        _ => Ok(InProgress),
    }
}

/// Execute Assign statement
pub fn execute_assign(
    name: &str,
    expr: &Expr,
    ctx: &mut ExecContext<'_>,
) -> Result<ExecutionState, EvalError> {
    let value = match eval_expr(expr, &mut ctx.eval())? {
        EvalResult::Value(v) => v,
        EvalResult::NoValue => return Err(EvalError::NoValue { span: expr.span }),
    };
    ctx.variables.set(name, value);
    Ok(Done)
}

/// Execute Print statement
pub fn execute_print(expr: &Expr, ctx: &mut ExecContext<'_>) -> Result<ExecutionState, EvalError> {
    let value = match eval_expr(expr, &mut ctx.eval())? {
        EvalResult::Value(v) => v,
        EvalResult::NoValue => return Err(EvalError::NoValue { span: expr.span }),
    };
    ctx.output.emit(ctx.task_name, &value);
    Ok(Done)
}

/// Execute an action statement
///
/// The target is evaluated and the action started only on the first step.
/// Every step (the first included) polls the unit for progress.
pub fn execute_action(
    action: ActionKind,
    target: &Expr,
    state: ExecutionState,
    ctx: &mut ExecContext<'_>,
) -> Result<ExecutionState, EvalError> {
    if state == NotStarted {
        let value = eval_required(target, &mut ctx.eval(), action.target_kind())?;
        let unit = ctx.unit;

        match (action, value) {
            (ActionKind::MoveTo, Value::Position(at)) => ctx.host.move_to(unit, at, false),
            (ActionKind::WorkAt, Value::Position(at)) => ctx.host.work_at(unit, at),
            (ActionKind::Attack, Value::Unit(other)) => ctx.host.attack(unit, other),
            (ActionKind::Follow, Value::Unit(other)) => ctx.host.follow(unit, other),
            (_, other) => {
                return Err(EvalError::TypeMismatch {
                    expected: action.target_kind(),
                    found: other.kind(),
                    span: target.span,
                })
            }
        }

        *ctx.current_action = Some(action);
        tracing::debug!(task = ctx.task_name, %unit, %action, target = %value, "Action started");
    }

    match ctx.host.action_status(ctx.unit) {
        ActionStatus::InProgress => Ok(InProgress),
        ActionStatus::Completed => {
            *ctx.current_action = None;
            Ok(Done)
        }
        ActionStatus::Failed => {
            *ctx.current_action = None;
            Ok(Failed)
        }
    }
}
