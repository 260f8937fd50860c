//! Test helpers for interpreter tests
//!
//! A scripted collaborator whose action statuses come from a queue, and a
//! harness that steps statements against it.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, VecDeque};

use crate::error::EvalError;
use crate::interpreter::context::{
    EvalContext, ExecContext, Selection, SequencePicker, UnitController, World,
};
use crate::interpreter::expressions::{eval_expr, EvalResult};
use crate::interpreter::statements::step_stmt;
use crate::interpreter::types::{ActionKind, Control, ExecutionState, Expr, Stmt};
use crate::interpreter::variables::VariableStore;
use crate::types::{ActionStatus, Cube, CubeInfo, FactionId, TerrainKind, UnitId};

/// What the interpreter asked the unit collaborator to do
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Call {
    MoveTo(UnitId, Cube),
    WorkAt(UnitId, Cube),
    Attack(UnitId, UnitId),
    Follow(UnitId, UnitId),
    Abort(UnitId),
}

#[derive(Debug, Clone, Copy)]
pub struct FakeUnit {
    pub faction: FactionId,
    pub position: Cube,
    pub carrying: bool,
    pub alive: bool,
}

pub struct ScriptedHost {
    pub size: Cube,
    pub terrain: HashMap<Cube, TerrainKind>,
    pub boulders: Vec<Cube>,
    pub logs: Vec<Cube>,
    pub workshops: Vec<Cube>,
    pub units: BTreeMap<UnitId, FakeUnit>,
    pub calls: Vec<Call>,
    /// Answers to successive polls
    statuses: RefCell<VecDeque<ActionStatus>>,
    /// Answer once the queue runs dry
    then: ActionStatus,
}

impl ScriptedHost {
    /// A 10x10x2 air world with unit 1 of faction 1 at the origin
    pub fn new() -> Self {
        let mut host = Self {
            size: Cube::new(10, 10, 2),
            terrain: HashMap::new(),
            boulders: Vec::new(),
            logs: Vec::new(),
            workshops: Vec::new(),
            units: BTreeMap::new(),
            calls: Vec::new(),
            statuses: RefCell::new(VecDeque::new()),
            then: ActionStatus::Completed,
        };
        host.add_unit(1, 1, Cube::new(0, 0, 0));
        host
    }

    pub fn add_unit(&mut self, id: u32, faction: u32, position: Cube) {
        self.units.insert(
            UnitId(id),
            FakeUnit {
                faction: FactionId(faction),
                position,
                carrying: false,
                alive: true,
            },
        );
    }

    pub fn with_unit(mut self, id: u32, faction: u32, position: Cube) -> Self {
        self.add_unit(id, faction, position);
        self
    }

    pub fn with_terrain(mut self, at: Cube, kind: TerrainKind) -> Self {
        self.terrain.insert(at, kind);
        self
    }

    /// Polls answer `statuses` in order, then `then` forever
    pub fn with_statuses(
        self,
        statuses: impl IntoIterator<Item = ActionStatus>,
        then: ActionStatus,
    ) -> Self {
        Self {
            statuses: RefCell::new(statuses.into_iter().collect()),
            then,
            ..self
        }
    }

    pub fn unit_mut(&mut self, id: u32) -> &mut FakeUnit {
        self.units
            .get_mut(&UnitId(id))
            .expect("unit exists in scripted host")
    }
}

impl World for ScriptedHost {
    fn in_bounds(&self, at: Cube) -> bool {
        (0..self.size.x).contains(&at.x)
            && (0..self.size.y).contains(&at.y)
            && (0..self.size.z).contains(&at.z)
    }

    fn cube_at(&self, at: Cube) -> Option<CubeInfo> {
        if !self.in_bounds(at) {
            return None;
        }
        Some(CubeInfo::from(
            self.terrain.get(&at).copied().unwrap_or_default(),
        ))
    }

    fn units(&self) -> Vec<UnitId> {
        self.units.keys().copied().collect()
    }

    fn faction_members(&self, faction: FactionId) -> Vec<UnitId> {
        self.units
            .iter()
            .filter(|(_, u)| u.faction == faction)
            .map(|(id, _)| *id)
            .collect()
    }

    fn unit_position(&self, unit: UnitId) -> Option<Cube> {
        self.units.get(&unit).map(|u| u.position)
    }

    fn unit_faction(&self, unit: UnitId) -> Option<FactionId> {
        self.units.get(&unit).map(|u| u.faction)
    }

    fn unit_carries_item(&self, unit: UnitId) -> bool {
        self.units.get(&unit).is_some_and(|u| u.carrying)
    }

    fn unit_is_alive(&self, unit: UnitId) -> bool {
        self.units.get(&unit).is_some_and(|u| u.alive)
    }

    fn boulders(&self) -> Vec<Cube> {
        self.boulders.clone()
    }

    fn logs(&self) -> Vec<Cube> {
        self.logs.clone()
    }

    fn workshops(&self) -> Vec<Cube> {
        self.workshops.clone()
    }
}

impl UnitController for ScriptedHost {
    fn world(&self) -> &dyn World {
        self
    }

    fn move_to(&mut self, unit: UnitId, target: Cube, _sprint: bool) {
        self.calls.push(Call::MoveTo(unit, target));
    }

    fn work_at(&mut self, unit: UnitId, target: Cube) {
        self.calls.push(Call::WorkAt(unit, target));
    }

    fn attack(&mut self, unit: UnitId, target: UnitId) {
        self.calls.push(Call::Attack(unit, target));
    }

    fn follow(&mut self, unit: UnitId, target: UnitId) {
        self.calls.push(Call::Follow(unit, target));
    }

    fn abort_current_action(&mut self, unit: UnitId) {
        self.calls.push(Call::Abort(unit));
    }

    fn action_status(&self, _unit: UnitId) -> ActionStatus {
        self.statuses.borrow_mut().pop_front().unwrap_or(self.then)
    }
}

/// Everything a statement needs to be stepped outside of a task
pub struct Harness {
    pub unit: UnitId,
    pub host: ScriptedHost,
    pub variables: VariableStore,
    pub selection: Selection,
    pub output: Vec<String>,
    pub picker: SequencePicker,
    pub current_action: Option<ActionKind>,
}

impl Harness {
    pub fn new(host: ScriptedHost) -> Self {
        Self {
            unit: UnitId(1),
            host,
            variables: VariableStore::new(),
            selection: Selection::default(),
            output: Vec::new(),
            picker: SequencePicker::default(),
            current_action: None,
        }
    }

    pub fn step(&mut self, stmt: &mut Stmt) -> Result<ExecutionState, EvalError> {
        let mut ctx = ExecContext {
            task_name: "test",
            unit: self.unit,
            variables: &mut self.variables,
            selection: &self.selection,
            host: &mut self.host,
            output: &mut self.output,
            picker: &mut self.picker,
            control: Control::None,
            current_action: &mut self.current_action,
        };
        step_stmt(stmt, &mut ctx)
    }

    /// Step until terminal; returns the final state and the number of steps
    pub fn run(&mut self, stmt: &mut Stmt, max_steps: usize) -> (ExecutionState, usize) {
        for n in 1..=max_steps {
            let state = self.step(stmt).expect("step should not error");
            if state.is_terminal() {
                return (state, n);
            }
        }
        (stmt.state, max_steps)
    }

    pub fn eval(&mut self, expr: &Expr) -> Result<EvalResult, EvalError> {
        let mut ctx = EvalContext {
            unit: Some(self.unit),
            variables: &self.variables,
            selection: &self.selection,
            world: &self.host,
            picker: &mut self.picker,
        };
        eval_expr(expr, &mut ctx)
    }
}
