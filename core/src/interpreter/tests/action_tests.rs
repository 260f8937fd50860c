//! Tests for action statements

use super::helpers::{Call, Harness, ScriptedHost};
use crate::error::EvalError;
use crate::interpreter::build::*;
use crate::interpreter::types::{ActionKind, ExecutionState, ValueKind};
use crate::types::{ActionStatus, Cube, UnitId};

use ActionStatus::{Completed, Failed, InProgress};

#[test]
fn test_move_to_unreachable_fails_on_fourth_tick() {
    let host = ScriptedHost::new().with_statuses([InProgress, InProgress, InProgress], Failed);
    let mut h = Harness::new(host);
    let mut stmt = seq(vec![move_to(pos(5, 5, 0)), print(lit(true))]);

    for _ in 0..3 {
        assert_eq!(h.step(&mut stmt), Ok(ExecutionState::InProgress));
        assert_eq!(h.current_action, Some(ActionKind::MoveTo));
    }
    assert_eq!(h.step(&mut stmt), Ok(ExecutionState::Failed));
    assert_eq!(stmt.state, ExecutionState::Failed);
    assert_eq!(h.current_action, None);

    // The target was resolved and the action started exactly once
    assert_eq!(h.host.calls, vec![Call::MoveTo(UnitId(1), Cube::new(5, 5, 0))]);
    assert!(h.output.is_empty());
}

#[test]
fn test_action_completing_at_once_finishes_in_one_step() {
    let mut h = Harness::new(ScriptedHost::new());
    let mut stmt = work_at(pos(1, 0, 0));

    assert_eq!(h.step(&mut stmt), Ok(ExecutionState::Done));
    assert_eq!(h.host.calls, vec![Call::WorkAt(UnitId(1), Cube::new(1, 0, 0))]);
    assert_eq!(h.current_action, None);
}

#[test]
fn test_sequence_continues_after_action_completes() {
    let host = ScriptedHost::new().with_statuses([InProgress], Completed);
    let mut h = Harness::new(host);
    let mut stmt = seq(vec![move_to(pos(2, 0, 0)), print(lit(true))]);

    assert_eq!(h.run(&mut stmt, 10), (ExecutionState::Done, 3));
    assert_eq!(h.output, vec!["true"]);
}

#[test]
fn test_attack_and_follow_take_units() {
    let host = ScriptedHost::new()
        .with_unit(2, 2, Cube::new(1, 0, 0))
        .with_unit(3, 1, Cube::new(0, 1, 0));
    let mut h = Harness::new(host);
    let mut stmt = seq(vec![attack(enemy()), follow(friend())]);

    h.run(&mut stmt, 5);
    assert_eq!(
        h.host.calls,
        vec![
            Call::Attack(UnitId(1), UnitId(2)),
            Call::Follow(UnitId(1), UnitId(3)),
        ]
    );
}

#[test]
fn test_action_target_of_wrong_kind() {
    let mut h = Harness::new(ScriptedHost::new());
    let mut stmt = attack(here());

    assert_eq!(
        h.step(&mut stmt),
        Err(EvalError::TypeMismatch {
            expected: ValueKind::Unit,
            found: ValueKind::Position,
            span: Default::default(),
        })
    );
    assert!(h.host.calls.is_empty());
    assert_eq!(stmt.state, ExecutionState::Failed);
}

#[test]
fn test_action_target_without_value() {
    let mut h = Harness::new(ScriptedHost::new());
    let mut stmt = follow(enemy());

    assert!(matches!(h.step(&mut stmt), Err(EvalError::NoValue { .. })));
    assert!(h.host.calls.is_empty());
    assert_eq!(h.current_action, None);
}

#[test]
fn test_action_inside_loop_restarts_each_iteration() {
    let host = ScriptedHost::new().with_statuses([], Completed);
    let mut h = Harness::new(host);
    let mut stmt = while_loop(lit(true), work_at(pos(0, 0, 0)));

    for _ in 0..3 {
        assert_eq!(h.step(&mut stmt), Ok(ExecutionState::InProgress));
    }
    assert_eq!(h.host.calls.len(), 3);
}
