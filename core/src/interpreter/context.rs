//! Collaborator boundaries and evaluation contexts
//!
//! The interpreter never reaches for global state. Everything it queries or
//! affects comes in through these traits:
//!
//! - [`World`]: read-only terrain, item and unit queries
//! - [`UnitController`]: starts, polls and aborts long-running unit actions
//! - [`OutputSink`]: receives values from print statements
//! - [`Picker`]: the random source behind `next_to`

use super::types::{ActionKind, Control, Value};
use super::variables::VariableStore;
use crate::types::{ActionStatus, Cube, CubeInfo, FactionId, UnitId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/* ===================== Collaborators ===================== */

/// Read-only view of the simulated world
///
/// Enumeration order of `units`, `boulders`, `logs` and `workshops` must be
/// stable between calls; nearest-entity ties resolve to the first candidate.
pub trait World {
    fn in_bounds(&self, at: Cube) -> bool;

    /// Terrain at `at`, or `None` outside the world
    fn cube_at(&self, at: Cube) -> Option<CubeInfo>;

    fn units(&self) -> Vec<UnitId>;
    fn faction_members(&self, faction: FactionId) -> Vec<UnitId>;

    fn unit_position(&self, unit: UnitId) -> Option<Cube>;
    fn unit_faction(&self, unit: UnitId) -> Option<FactionId>;
    fn unit_carries_item(&self, unit: UnitId) -> bool;
    fn unit_is_alive(&self, unit: UnitId) -> bool;

    fn boulders(&self) -> Vec<Cube>;
    fn logs(&self) -> Vec<Cube>;
    fn workshops(&self) -> Vec<Cube>;

    /// In-bounds face neighbours of `at`
    fn directly_adjacent(&self, at: Cube) -> Vec<Cube> {
        at.directly_adjacent()
            .into_iter()
            .filter(|c| self.in_bounds(*c))
            .collect()
    }
}

/// Unit capabilities used by action statements
///
/// Starting an action replaces whatever the unit was doing and resets its
/// status to `InProgress` (or a terminal status if it resolves immediately).
pub trait UnitController {
    fn world(&self) -> &dyn World;

    fn move_to(&mut self, unit: UnitId, target: Cube, sprint: bool);
    fn work_at(&mut self, unit: UnitId, target: Cube);
    fn attack(&mut self, unit: UnitId, target: UnitId);
    fn follow(&mut self, unit: UnitId, target: UnitId);

    /// Cancel the in-flight action, if any
    fn abort_current_action(&mut self, unit: UnitId);

    /// Status of the most recently started action
    fn action_status(&self, unit: UnitId) -> ActionStatus;
}

/// Destination of print statements
pub trait OutputSink {
    fn emit(&mut self, task: &str, value: &Value);
}

/// Collects printed values as strings
impl OutputSink for Vec<String> {
    fn emit(&mut self, _task: &str, value: &Value) {
        self.push(value.to_string());
    }
}

/// Writes printed values to stdout, prefixed with the task name
#[derive(Debug, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn emit(&mut self, task: &str, value: &Value) {
        println!("[{}] {}", task, value);
    }
}

/// Random source for choices among equivalent candidates
pub trait Picker {
    /// Index in `0..len`; `len` is never zero
    fn pick(&mut self, len: usize) -> usize;
}

/// `Picker` backed by a seeded or entropy-initialised `StdRng`
#[derive(Debug, Clone)]
pub struct RandomPicker {
    rng: StdRng,
}

impl RandomPicker {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl Picker for RandomPicker {
    fn pick(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }
}

/// `Picker` replaying a fixed sequence of indices (wrapped into range), then 0
#[derive(Debug, Clone, Default)]
pub struct SequencePicker {
    picks: VecDeque<usize>,
}

impl SequencePicker {
    pub fn new(picks: impl IntoIterator<Item = usize>) -> Self {
        Self {
            picks: picks.into_iter().collect(),
        }
    }
}

impl Picker for SequencePicker {
    fn pick(&mut self, len: usize) -> usize {
        self.picks.pop_front().unwrap_or(0) % len
    }
}

/* ===================== Contexts ===================== */

/// Value handed in by the presentation layer for the `selected` expressions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default)]
    pub unit: Option<UnitId>,
    #[serde(default)]
    pub position: Option<Cube>,
}

impl Selection {
    pub fn position(at: Cube) -> Self {
        Self {
            unit: None,
            position: Some(at),
        }
    }
}

/// Everything an expression may read while evaluating
pub struct EvalContext<'a> {
    /// The unit executing the owning task
    pub unit: Option<UnitId>,
    pub variables: &'a VariableStore,
    pub selection: &'a Selection,
    pub world: &'a dyn World,
    pub picker: &'a mut dyn Picker,
}

/// Everything a statement may touch while stepping
pub struct ExecContext<'a> {
    pub task_name: &'a str,
    pub unit: UnitId,
    pub variables: &'a mut VariableStore,
    pub selection: &'a Selection,
    pub host: &'a mut dyn UnitController,
    pub output: &'a mut dyn OutputSink,
    pub picker: &'a mut dyn Picker,
    /// Active control flow (break)
    pub control: Control,
    /// The action statement currently waiting on the unit, if any
    pub current_action: &'a mut Option<ActionKind>,
}

impl<'a> ExecContext<'a> {
    /// Borrow an expression context from this step's context
    pub fn eval(&mut self) -> EvalContext<'_> {
        EvalContext {
            unit: Some(self.unit),
            variables: &*self.variables,
            selection: self.selection,
            world: self.host.world(),
            picker: &mut *self.picker,
        }
    }
}
