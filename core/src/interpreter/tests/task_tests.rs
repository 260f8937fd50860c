//! Tests for task claiming, interruption and templates

use super::helpers::{Call, Harness, ScriptedHost};
use crate::error::TaskError;
use crate::interpreter::build::*;
use crate::interpreter::context::{Selection, SequencePicker};
use crate::interpreter::expressions::EvalResult;
use crate::interpreter::types::{ActionKind, ExecutionState, Stmt, StmtKind, Value};
use crate::interpreter::variables::VariableStore;
use crate::task::{Task, TaskTemplate};
use crate::types::{ActionStatus, Cube, UnitId};

fn advance(task: &mut Task, host: &mut ScriptedHost, out: &mut Vec<String>) -> ExecutionState {
    let mut picker = SequencePicker::default();
    task.advance(UnitId(1), host, out, &mut picker)
        .expect("advance should succeed")
}

#[test]
fn test_advance_claims_unassigned_task() {
    let mut host = ScriptedHost::new();
    let mut out = Vec::new();
    let mut task = Task::new("greet", 5, seq(vec![print(lit(true)), print(lit(true))]));
    assert_eq!(task.assigned_unit(), None);

    assert_eq!(advance(&mut task, &mut host, &mut out), ExecutionState::InProgress);
    assert_eq!(task.assigned_unit(), Some(UnitId(1)));
    assert_eq!(advance(&mut task, &mut host, &mut out), ExecutionState::Done);
    assert_eq!(task.state(), ExecutionState::Done);
}

#[test]
fn test_interrupt_mid_loop_restarts_from_top() {
    let mut host = ScriptedHost::new().with_statuses([], ActionStatus::InProgress);
    let mut out = Vec::new();
    let body = while_loop(
        lit(true),
        seq(vec![print(lit(true)), move_to(pos(5, 5, 0))]),
    );
    let mut task = Task::new("patrol", 1, body);

    advance(&mut task, &mut host, &mut out);
    advance(&mut task, &mut host, &mut out);
    assert_eq!(task.current_action(), Some(ActionKind::MoveTo));
    assert_eq!(out.len(), 1);

    assert_eq!(task.interrupt(&mut host), Some(UnitId(1)));
    assert_eq!(host.calls.last(), Some(&Call::Abort(UnitId(1))));
    assert!(task.body().is_pristine());
    assert_eq!(task.assigned_unit(), None);

    // Re-claimed: the loop body runs from its first statement again
    advance(&mut task, &mut host, &mut out);
    assert_eq!(out.len(), 2);
    assert_eq!(task.current_action(), None);
}

#[test]
fn test_interrupt_without_action_does_not_abort() {
    let mut host = ScriptedHost::new();
    let mut out = Vec::new();
    let mut task = Task::new("talk", 1, seq(vec![print(lit(true)), print(lit(true))]));

    advance(&mut task, &mut host, &mut out);
    task.interrupt(&mut host);
    assert!(host.calls.is_empty());
}

#[test]
fn test_advance_by_another_unit_aborts_first_unit() {
    let mut host = ScriptedHost::new()
        .with_unit(2, 1, Cube::new(1, 0, 0))
        .with_statuses([], ActionStatus::InProgress);
    let mut out = Vec::new();
    let mut picker = SequencePicker::default();
    let mut task = Task::new("haul", 1, move_to(pos(5, 5, 0)));

    advance(&mut task, &mut host, &mut out);
    task.advance(UnitId(2), &mut host, &mut out, &mut picker)
        .expect("advance should succeed");

    assert_eq!(
        host.calls,
        vec![
            Call::MoveTo(UnitId(1), Cube::new(5, 5, 0)),
            Call::Abort(UnitId(1)),
            Call::MoveTo(UnitId(2), Cube::new(5, 5, 0)),
        ]
    );
    assert_eq!(task.assigned_unit(), Some(UnitId(2)));
}

#[test]
fn test_failed_action_fails_task() {
    let mut host = ScriptedHost::new().with_statuses(
        [
            ActionStatus::InProgress,
            ActionStatus::InProgress,
            ActionStatus::InProgress,
        ],
        ActionStatus::Failed,
    );
    let mut out = Vec::new();
    let mut task = Task::new("walk", 1, seq(vec![move_to(pos(5, 5, 0))]));

    let states: Vec<ExecutionState> = (0..4)
        .map(|_| advance(&mut task, &mut host, &mut out))
        .collect();
    assert_eq!(
        states,
        vec![
            ExecutionState::InProgress,
            ExecutionState::InProgress,
            ExecutionState::InProgress,
            ExecutionState::Failed,
        ]
    );

    task.release();
    assert!(task.body().is_pristine());
}

#[test]
fn test_unbound_variable_is_no_value_not_crash() {
    let task = Task::new("lost", 1, move_to(var("dest")));
    assert!(!task.is_well_formed());

    let mut h = Harness::new(ScriptedHost::new());
    assert_eq!(h.eval(&var("dest")), Ok(EvalResult::NoValue));

    let err = task.check_well_formed().unwrap_err();
    assert!(matches!(err, TaskError::IllFormed { ref name, .. } if name == "lost"));
    assert!(err.to_string().contains("Variable 'dest' is read before it is assigned"));
}

#[test]
fn test_runtime_error_surfaces_from_advance() {
    let mut host = ScriptedHost::new();
    let mut out = Vec::new();
    let mut picker = SequencePicker::default();
    let mut task = Task::new("fetch", 1, work_at(log()));

    let result = task.advance(UnitId(1), &mut host, &mut out, &mut picker);
    assert!(matches!(result, Err(TaskError::Eval(_))));
    assert_eq!(task.state(), ExecutionState::Failed);
    assert_eq!(task.current_action(), None);
}

#[test]
fn test_claim_restores_initial_variables() {
    let mut host = ScriptedHost::new();
    let mut out = Vec::new();
    let mut vars = VariableStore::new();
    vars.set("armed", Value::Boolean(false));
    let mut task = Task::new("arm", 1, seq(vec![assign("armed", lit(true)), print(var("armed"))]))
        .with_variables(vars);

    advance(&mut task, &mut host, &mut out);
    assert_eq!(task.variables().get("armed"), Some(&Value::Boolean(true)));

    task.claim(UnitId(2));
    assert_eq!(task.variables().get("armed"), Some(&Value::Boolean(false)));
}

#[test]
fn test_well_formedness_ignores_runtime_bindings() {
    let mut host = ScriptedHost::new();
    let mut out = Vec::new();
    let mut vars = VariableStore::new();
    vars.set("go", Value::Boolean(true));
    let body = seq(vec![
        while_loop(
            var("go"),
            seq(vec![assign("seen", here()), assign("go", lit(false))]),
        ),
        print(var("seen")),
    ]);
    let mut task = Task::new("scout", 1, body).with_variables(vars);
    assert!(!task.is_well_formed());

    for _ in 0..10 {
        if task.variables().get("seen").is_some() {
            break;
        }
        advance(&mut task, &mut host, &mut out);
    }
    assert!(task.variables().get("seen").is_some());
    assert!(!task.is_well_formed());
}

#[test]
fn test_template_instances_are_independent() {
    let template = TaskTemplate::new(
        "dig",
        4,
        seq(vec![work_at(selected_pos()), print(selected_pos())]),
    );
    let mut tasks = template.instantiate(&[Cube::new(1, 0, 0), Cube::new(0, 1, 0)]);
    assert_eq!(tasks.len(), 2);
    assert!(tasks.iter().all(Task::is_well_formed));

    let mut host = ScriptedHost::new();
    let mut out = Vec::new();
    advance(&mut tasks[0], &mut host, &mut out);
    advance(&mut tasks[0], &mut host, &mut out);

    assert_eq!(tasks[0].state(), ExecutionState::Done);
    assert!(tasks[1].body().is_pristine());
    assert_eq!(out, vec!["(1, 0, 0)"]);
    assert_eq!(
        tasks[1].selection(),
        &Selection::position(Cube::new(0, 1, 0))
    );
}

#[test]
fn test_template_without_selection_is_ill_formed_when_it_needs_one() {
    let template = TaskTemplate::new("dig", 1, work_at(selected_pos()));
    let tasks = template.instantiate(&[]);

    assert_eq!(tasks.len(), 1);
    assert!(!tasks[0].is_well_formed());
}

#[test]
fn test_tree_loads_from_json() {
    let json = r#"{
        "type": "sequence",
        "body": [
            {"type": "assign", "name": "rock", "expr": {"type": "boulder"}},
            {"type": "if",
             "test": {"type": "not", "inner": {"type": "carries_item", "unit": {"type": "this"}}},
             "then_s": {"type": "action", "action": "work_at", "target": {"type": "var", "name": "rock"}}},
            {"type": "print", "expr": {"type": "lit_pos", "x": 1, "y": 2, "z": 3}, "span": {"line": 4, "column": 1}}
        ]
    }"#;

    let parsed: Stmt = serde_json::from_str(json).unwrap();
    let built = seq(vec![
        assign("rock", boulder()),
        if_else(not(carries_item(this())), work_at(var("rock")), None),
        print(pos(1, 2, 3)).at(4, 1),
    ]);
    assert_eq!(parsed, built);
    assert!(matches!(parsed.kind, StmtKind::Sequence { .. }));
    assert!(parsed.is_pristine());
}
