//! Tasks: named, prioritized statement trees with their own variables

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{SchedulerError, TaskError};
use crate::interpreter::context::{ExecContext, OutputSink, Picker, Selection, UnitController};
use crate::interpreter::semantic_validator::{validate_task, Bindings, ValidationError};
use crate::interpreter::statements::step_stmt;
use crate::interpreter::types::{ActionKind, Control, ExecutionState, Stmt};
use crate::interpreter::variables::VariableStore;
use crate::types::{Cube, SchedulerId, TaskId, UnitId};

/// An executable unit of scripted work
///
/// A task may be registered with several schedulers at once but executes
/// under at most one unit. Whenever a unit claims it, the statement tree
/// restarts from `NotStarted` and the variables return to their initial
/// bindings.
#[derive(Debug, Clone)]
pub struct Task {
    name: String,
    priority: i64,
    body: Stmt,
    initial_variables: VariableStore,
    variables: VariableStore,
    selection: Selection,
    schedulers: BTreeSet<SchedulerId>,
    assigned_unit: Option<UnitId>,
    current_action: Option<ActionKind>,
}

impl Task {
    pub fn new(name: impl Into<String>, priority: i64, body: Stmt) -> Self {
        Self {
            name: name.into(),
            priority,
            body: body.fresh_copy(),
            initial_variables: VariableStore::new(),
            variables: VariableStore::new(),
            selection: Selection::default(),
            schedulers: BTreeSet::new(),
            assigned_unit: None,
            current_action: None,
        }
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// Bindings available before the first statement runs
    pub fn with_variables(mut self, variables: VariableStore) -> Self {
        self.initial_variables = variables.clone();
        self.variables = variables;
        self
    }

    /* ===================== Accessors ===================== */

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i64 {
        self.priority
    }

    pub fn set_priority(&mut self, priority: i64) {
        self.priority = priority;
    }

    pub fn body(&self) -> &Stmt {
        &self.body
    }

    /// Execution state of the root statement
    pub fn state(&self) -> ExecutionState {
        self.body.state
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    pub fn schedulers(&self) -> &BTreeSet<SchedulerId> {
        &self.schedulers
    }

    pub(crate) fn schedulers_mut(&mut self) -> &mut BTreeSet<SchedulerId> {
        &mut self.schedulers
    }

    pub fn assigned_unit(&self) -> Option<UnitId> {
        self.assigned_unit
    }

    /// The action statement currently waiting on the unit, if any
    pub fn current_action(&self) -> Option<ActionKind> {
        self.current_action
    }

    /* ===================== Well-formedness ===================== */

    pub fn validate(&self) -> Vec<ValidationError> {
        validate_task(
            &self.body,
            &Bindings::new(&self.initial_variables, &self.selection),
        )
    }

    pub fn is_well_formed(&self) -> bool {
        self.validate().is_empty()
    }

    /// `Err(TaskError::IllFormed)` listing every problem found
    pub fn check_well_formed(&self) -> Result<(), TaskError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(TaskError::IllFormed {
                name: self.name.clone(),
                errors,
            })
        }
    }

    /* ===================== Lifecycle ===================== */

    /// Bind the task to `unit` and restart it from the top
    pub fn claim(&mut self, unit: UnitId) {
        self.restart();
        self.assigned_unit = Some(unit);
    }

    /// Drop the unit claim without touching the unit. Returns the released unit.
    pub fn release(&mut self) -> Option<UnitId> {
        self.restart();
        self.assigned_unit.take()
    }

    /// Cancel the in-flight action (if any), then release the claim
    pub fn interrupt(&mut self, host: &mut dyn UnitController) -> Option<UnitId> {
        if let (Some(unit), Some(_)) = (self.assigned_unit, self.current_action) {
            host.abort_current_action(unit);
        }
        self.release()
    }

    /// Step the root statement once on behalf of `unit`
    ///
    /// Claims the task first if `unit` does not already hold it. A claim held
    /// by another unit is interrupted, which aborts that unit's action.
    pub fn advance(
        &mut self,
        unit: UnitId,
        host: &mut dyn UnitController,
        output: &mut dyn OutputSink,
        picker: &mut dyn Picker,
    ) -> Result<ExecutionState, TaskError> {
        match self.assigned_unit {
            Some(held) if held == unit => {}
            Some(_) => {
                self.interrupt(host);
                self.claim(unit);
            }
            None => self.claim(unit),
        }

        let Task {
            name,
            body,
            variables,
            selection,
            current_action,
            ..
        } = self;

        let mut ctx = ExecContext {
            task_name: name.as_str(),
            unit,
            variables,
            selection: &*selection,
            host,
            output,
            picker,
            control: Control::None,
            current_action,
        };

        match step_stmt(body, &mut ctx) {
            Ok(state) => Ok(state),
            Err(e) => {
                *ctx.current_action = None;
                Err(e.into())
            }
        }
    }

    /// End the claim after the root statement finished, keeping its final state
    pub(crate) fn finish(&mut self) -> Option<UnitId> {
        self.current_action = None;
        self.assigned_unit.take()
    }

    fn restart(&mut self) {
        self.body.reset();
        self.variables = self.initial_variables.clone();
        self.current_action = None;
    }
}

/// A reusable statement tree from which tasks are instantiated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskTemplate {
    pub name: String,
    pub priority: i64,
    pub body: Stmt,
}

impl TaskTemplate {
    pub fn new(name: impl Into<String>, priority: i64, body: Stmt) -> Self {
        Self {
            name: name.into(),
            priority,
            body,
        }
    }

    /// One independent task per selected cube, each with its own deep copy of
    /// the tree and `selected` bound to that cube. No selections yields a single
    /// task without a selection.
    pub fn instantiate(&self, selections: &[Cube]) -> Vec<Task> {
        if selections.is_empty() {
            return vec![Task::new(self.name.clone(), self.priority, self.body.fresh_copy())];
        }

        selections
            .iter()
            .map(|at| {
                Task::new(self.name.clone(), self.priority, self.body.fresh_copy())
                    .with_selection(Selection::position(*at))
            })
            .collect()
    }
}

/// Owner of every task; handles stay valid for the arena's lifetime
#[derive(Debug, Clone, Default)]
pub struct TaskArena {
    slots: Vec<Task>,
}

impl TaskArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `task` detached from any scheduler or unit
    pub fn insert(&mut self, mut task: Task) -> TaskId {
        task.schedulers.clear();
        task.release();
        let id = TaskId(self.slots.len());
        self.slots.push(task);
        id
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.slots.get(id.0)
    }

    pub fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.slots.get_mut(id.0)
    }

    pub fn require(&self, id: TaskId) -> Result<&Task, SchedulerError> {
        self.get(id).ok_or(SchedulerError::UnknownTask(id))
    }

    pub fn require_mut(&mut self, id: TaskId) -> Result<&mut Task, SchedulerError> {
        self.get_mut(id).ok_or(SchedulerError::UnknownTask(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = (TaskId, &Task)> {
        self.slots.iter().enumerate().map(|(i, t)| (TaskId(i), t))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
