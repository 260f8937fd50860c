//! Expression evaluation
//!
//! Evaluation only queries the world. Outcomes:
//! - `Ok(EvalResult::Value)` for a produced value
//! - `Ok(EvalResult::NoValue)` when a read has nothing to read (an unbound
//!   variable, no current selection, no boulder in the world, ...)
//! - `Err(EvalError)` for type mismatches and contract violations

use super::context::EvalContext;
use super::types::{Expr, ExprKind, Value, ValueKind};
use crate::error::EvalError;
use crate::types::{Cube, UnitId};

/// Result of evaluating an expression
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EvalResult {
    Value(Value),
    NoValue,
}

impl EvalResult {
    pub fn value(self) -> Option<Value> {
        match self {
            EvalResult::Value(v) => Some(v),
            EvalResult::NoValue => None,
        }
    }
}

/// Evaluate an expression to a value
pub fn eval_expr(expr: &Expr, ctx: &mut EvalContext<'_>) -> Result<EvalResult, EvalError> {
    let span = expr.span;
    let value = match &expr.kind {
        ExprKind::LitBool { v } => Value::Boolean(*v),

        ExprKind::LitPos { x, y, z } => Value::Position(Cube::new(*x, *y, *z)),

        ExprKind::And { left, right } => {
            // Both sides are evaluated before combining
            let l = eval_bool(left, ctx)?;
            let r = eval_bool(right, ctx)?;
            match (l, r) {
                (Some(l), Some(r)) => Value::Boolean(l && r),
                _ => return Ok(EvalResult::NoValue),
            }
        }

        ExprKind::Or { left, right } => {
            let l = eval_bool(left, ctx)?;
            let r = eval_bool(right, ctx)?;
            match (l, r) {
                (Some(l), Some(r)) => Value::Boolean(l || r),
                _ => return Ok(EvalResult::NoValue),
            }
        }

        ExprKind::Not { inner } => match eval_bool(inner, ctx)? {
            Some(b) => Value::Boolean(!b),
            None => return Ok(EvalResult::NoValue),
        },

        ExprKind::IsEnemy { unit } | ExprKind::IsFriend { unit } => {
            let this = this_unit(ctx, span)?;
            let Some(other) = eval_unit(unit, ctx)? else {
                return Ok(EvalResult::NoValue);
            };
            let this_faction = ctx
                .world
                .unit_faction(this)
                .ok_or(EvalError::UnknownUnit { unit: this })?;
            let other_faction = ctx
                .world
                .unit_faction(other)
                .ok_or(EvalError::UnknownUnit { unit: other })?;
            let same = this_faction == other_faction;
            match expr.kind {
                ExprKind::IsFriend { .. } => Value::Boolean(same),
                _ => Value::Boolean(!same),
            }
        }

        ExprKind::CarriesItem { unit } => match eval_unit(unit, ctx)? {
            Some(u) => Value::Boolean(ctx.world.unit_carries_item(u)),
            None => return Ok(EvalResult::NoValue),
        },

        ExprKind::IsAlive { unit } => match eval_unit(unit, ctx)? {
            Some(u) => Value::Boolean(ctx.world.unit_is_alive(u)),
            None => return Ok(EvalResult::NoValue),
        },

        ExprKind::IsSolid { pos } | ExprKind::IsPassable { pos } => {
            let Some(at) = eval_position(pos, ctx)? else {
                return Ok(EvalResult::NoValue);
            };
            let Some(info) = ctx.world.cube_at(at) else {
                return Ok(EvalResult::NoValue);
            };
            match expr.kind {
                ExprKind::IsPassable { .. } => Value::Boolean(info.is_passable),
                _ => Value::Boolean(!info.is_passable),
            }
        }

        ExprKind::This => Value::Unit(this_unit(ctx, span)?),

        ExprKind::AnyUnit => {
            let this = this_unit(ctx, span)?;
            return nearest_unit(ctx, this, |_| true);
        }

        ExprKind::Friend => {
            let this = this_unit(ctx, span)?;
            let faction = ctx.world.unit_faction(this);
            return nearest_unit(ctx, this, |f| f.is_some() && f == faction);
        }

        ExprKind::Enemy => {
            let this = this_unit(ctx, span)?;
            let faction = ctx.world.unit_faction(this);
            return nearest_unit(ctx, this, |f| f.is_some() && f != faction);
        }

        ExprKind::SelectedUnit => match ctx.selection.unit {
            Some(u) => Value::Unit(u),
            None => return Ok(EvalResult::NoValue),
        },

        ExprKind::Here => {
            let this = this_unit(ctx, span)?;
            Value::Position(position_of(ctx, this)?)
        }

        ExprKind::PositionOf { unit } => match eval_unit(unit, ctx)? {
            Some(u) => Value::Position(position_of(ctx, u)?),
            None => return Ok(EvalResult::NoValue),
        },

        ExprKind::NextTo { pos } => {
            let Some(at) = eval_position(pos, ctx)? else {
                return Ok(EvalResult::NoValue);
            };
            let candidates: Vec<Cube> = ctx
                .world
                .directly_adjacent(at)
                .into_iter()
                .filter(|c| ctx.world.cube_at(*c).is_some_and(|info| info.is_passable))
                .collect();
            if candidates.is_empty() {
                return Ok(EvalResult::NoValue);
            }
            let idx = ctx.picker.pick(candidates.len());
            Value::Position(candidates[idx.min(candidates.len() - 1)])
        }

        ExprKind::Boulder => {
            let from = here(ctx, span)?;
            return Ok(nearest_cube(from, ctx.world.boulders()));
        }

        ExprKind::Log => {
            let from = here(ctx, span)?;
            return Ok(nearest_cube(from, ctx.world.logs()));
        }

        ExprKind::Workshop => {
            let from = here(ctx, span)?;
            return Ok(nearest_cube(from, ctx.world.workshops()));
        }

        ExprKind::SelectedPos => match ctx.selection.position {
            Some(at) => Value::Position(at),
            None => return Ok(EvalResult::NoValue),
        },

        ExprKind::Var { name } => match ctx.variables.get(name) {
            Some(v) => *v,
            None => return Ok(EvalResult::NoValue),
        },
    };

    Ok(EvalResult::Value(value))
}

/* ===================== Typed evaluation ===================== */

/// Evaluate and check the produced kind. `Ok(None)` means no value.
pub fn eval_as(
    expr: &Expr,
    ctx: &mut EvalContext<'_>,
    expected: ValueKind,
) -> Result<Option<Value>, EvalError> {
    match eval_expr(expr, ctx)? {
        EvalResult::Value(v) if v.kind() == expected => Ok(Some(v)),
        EvalResult::Value(v) => Err(EvalError::TypeMismatch {
            expected,
            found: v.kind(),
            span: expr.span,
        }),
        EvalResult::NoValue => Ok(None),
    }
}

/// Like [`eval_as`], but treats "no value" as an error at the point of use
pub fn eval_required(
    expr: &Expr,
    ctx: &mut EvalContext<'_>,
    expected: ValueKind,
) -> Result<Value, EvalError> {
    eval_as(expr, ctx, expected)?.ok_or(EvalError::NoValue { span: expr.span })
}

pub fn eval_bool(expr: &Expr, ctx: &mut EvalContext<'_>) -> Result<Option<bool>, EvalError> {
    Ok(eval_as(expr, ctx, ValueKind::Boolean)?.and_then(|v| v.as_bool()))
}

pub fn eval_unit(expr: &Expr, ctx: &mut EvalContext<'_>) -> Result<Option<UnitId>, EvalError> {
    Ok(eval_as(expr, ctx, ValueKind::Unit)?.and_then(|v| v.as_unit()))
}

pub fn eval_position(expr: &Expr, ctx: &mut EvalContext<'_>) -> Result<Option<Cube>, EvalError> {
    Ok(eval_as(expr, ctx, ValueKind::Position)?.and_then(|v| v.as_position()))
}

/* ===================== Helpers ===================== */

fn this_unit(ctx: &EvalContext<'_>, span: super::types::Span) -> Result<UnitId, EvalError> {
    ctx.unit.ok_or(EvalError::MissingUnit { span })
}

fn position_of(ctx: &EvalContext<'_>, unit: UnitId) -> Result<Cube, EvalError> {
    ctx.world
        .unit_position(unit)
        .ok_or(EvalError::UnknownUnit { unit })
}

fn here(ctx: &EvalContext<'_>, span: super::types::Span) -> Result<Cube, EvalError> {
    let this = this_unit(ctx, span)?;
    position_of(ctx, this)
}

/// Strict minimum by distance; the first candidate wins ties
fn nearest<T: Copy>(from: Cube, candidates: impl IntoIterator<Item = (T, Cube)>) -> Option<T> {
    let mut best: Option<(T, f64)> = None;
    for (item, at) in candidates {
        let d = from.distance(&at);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((item, d)),
        }
    }
    best.map(|(item, _)| item)
}

fn nearest_cube(from: Cube, candidates: Vec<Cube>) -> EvalResult {
    match nearest(from, candidates.into_iter().map(|c| (c, c))) {
        Some(c) => EvalResult::Value(Value::Position(c)),
        None => EvalResult::NoValue,
    }
}

/// Nearest living unit other than `this` whose faction passes `filter`
fn nearest_unit(
    ctx: &EvalContext<'_>,
    this: UnitId,
    filter: impl Fn(Option<crate::types::FactionId>) -> bool,
) -> Result<EvalResult, EvalError> {
    let from = position_of(ctx, this)?;
    let world = ctx.world;
    let candidates = world
        .units()
        .into_iter()
        .filter(|u| *u != this && world.unit_is_alive(*u))
        .filter(|u| filter(world.unit_faction(*u)))
        .filter_map(|u| world.unit_position(u).map(|at| (u, at)));

    Ok(match nearest(from, candidates) {
        Some(u) => EvalResult::Value(Value::Unit(u)),
        None => EvalResult::NoValue,
    })
}
