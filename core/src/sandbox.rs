//! Deterministic in-memory world
//!
//! `SandboxWorld` implements both collaborator traits so scenarios can run
//! without a game attached. Actions resolve one cube of movement (or one unit
//! of work) per call to [`SandboxWorld::advance`]; there is no pathfinding
//! beyond greedy steps toward the target.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::application::Application;
use crate::config::Config;
use crate::interpreter::context::{UnitController, World};
use crate::task::TaskTemplate;
use crate::types::{ActionStatus, Cube, CubeInfo, FactionId, TaskId, TerrainKind, UnitId};

/// Something a unit can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Item {
    Boulder,
    Log,
}

/// A unit as described in a scenario
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SandboxUnit {
    pub id: UnitId,
    pub faction: FactionId,
    pub position: Cube,
    #[serde(default)]
    pub carrying: Option<Item>,
    #[serde(default = "default_alive")]
    pub alive: bool,
}

fn default_alive() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Activity {
    Idle,
    Moving { target: Cube },
    Working { target: Cube, remaining: u32 },
    Following { target: UnitId },
}

#[derive(Debug, Clone)]
struct UnitState {
    unit: SandboxUnit,
    activity: Activity,
    status: ActionStatus,
}

#[derive(Debug, Clone)]
pub struct SandboxWorld {
    /// Exclusive upper bounds; the lower bound is the origin
    size: Cube,
    terrain: BTreeMap<Cube, TerrainKind>,
    boulders: Vec<Cube>,
    logs: Vec<Cube>,
    units: BTreeMap<UnitId, UnitState>,
    work_ticks: u32,
}

impl SandboxWorld {
    /// An all-air world spanning `0..size` on every axis
    pub fn new(size: Cube) -> Self {
        Self {
            size,
            terrain: BTreeMap::new(),
            boulders: Vec::new(),
            logs: Vec::new(),
            units: BTreeMap::new(),
            work_ticks: 3,
        }
    }

    pub fn with_work_ticks(mut self, ticks: u32) -> Self {
        self.work_ticks = ticks.max(1);
        self
    }

    pub fn set_terrain(&mut self, at: Cube, kind: TerrainKind) {
        if kind == TerrainKind::Air {
            self.terrain.remove(&at);
        } else {
            self.terrain.insert(at, kind);
        }
    }

    pub fn add_boulder(&mut self, at: Cube) {
        self.boulders.push(at);
    }

    pub fn add_log(&mut self, at: Cube) {
        self.logs.push(at);
    }

    pub fn add_unit(&mut self, unit: SandboxUnit) {
        self.units.insert(
            unit.id,
            UnitState {
                unit,
                activity: Activity::Idle,
                status: ActionStatus::Completed,
            },
        );
    }

    pub fn unit(&self, id: UnitId) -> Option<&SandboxUnit> {
        self.units.get(&id).map(|s| &s.unit)
    }

    pub fn kill(&mut self, id: UnitId) {
        if let Some(state) = self.units.get_mut(&id) {
            state.unit.alive = false;
            state.activity = Activity::Idle;
        }
    }

    /// Every faction some unit belongs to
    pub fn factions(&self) -> BTreeSet<FactionId> {
        self.units.values().map(|s| s.unit.faction).collect()
    }

    fn terrain_at(&self, at: Cube) -> TerrainKind {
        self.terrain.get(&at).copied().unwrap_or_default()
    }

    fn passable(&self, at: Cube) -> bool {
        self.in_bounds(at) && self.terrain_at(at).is_passable()
    }

    /// The neighbour of `from` that gets strictly closest to `target`
    fn step_toward(&self, from: Cube, target: Cube) -> Option<Cube> {
        let current = from.distance(&target);
        let mut best: Option<(Cube, f64)> = None;
        for next in from.directly_adjacent() {
            if !self.passable(next) {
                continue;
            }
            let d = next.distance(&target);
            if d >= current {
                continue;
            }
            match best {
                Some((_, best_d)) if d >= best_d => {}
                _ => best = Some((next, d)),
            }
        }
        best.map(|(c, _)| c)
    }

    /// Progress every unit's action by one tick
    pub fn advance(&mut self) {
        let ids: Vec<UnitId> = self.units.keys().copied().collect();
        for id in ids {
            let Some(state) = self.units.get(&id) else {
                continue;
            };
            if !state.unit.alive || state.status != ActionStatus::InProgress {
                continue;
            }

            let from = state.unit.position;
            let current = state.activity;
            let (activity, status, position) = match current {
                Activity::Idle => continue,

                Activity::Moving { target } => {
                    if from == target {
                        (Activity::Idle, ActionStatus::Completed, from)
                    } else {
                        match self.step_toward(from, target) {
                            Some(next) if next == target => {
                                (Activity::Idle, ActionStatus::Completed, next)
                            }
                            Some(next) => (current, ActionStatus::InProgress, next),
                            None => (Activity::Idle, ActionStatus::Failed, from),
                        }
                    }
                }

                Activity::Working { target, remaining } if remaining > 1 => (
                    Activity::Working {
                        target,
                        remaining: remaining - 1,
                    },
                    ActionStatus::InProgress,
                    from,
                ),

                Activity::Working { target, .. } => {
                    self.complete_work(id, target);
                    (Activity::Idle, ActionStatus::Completed, from)
                }

                Activity::Following { target } => match self.units.get(&target) {
                    Some(other) if other.unit.alive => {
                        let goal = other.unit.position;
                        if from.touches(&goal) {
                            (Activity::Idle, ActionStatus::Completed, from)
                        } else {
                            match self.step_toward(from, goal) {
                                Some(next) if next.touches(&goal) => {
                                    (Activity::Idle, ActionStatus::Completed, next)
                                }
                                Some(next) => (current, ActionStatus::InProgress, next),
                                None => (Activity::Idle, ActionStatus::Failed, from),
                            }
                        }
                    }
                    _ => (Activity::Idle, ActionStatus::Failed, from),
                },
            };

            if let Some(state) = self.units.get_mut(&id) {
                state.activity = activity;
                state.status = status;
                state.unit.position = position;
                trace!(unit = %id, at = %position, ?status, "Sandbox unit advanced");
            }
        }
    }

    /// Drop the carried item, or pick one up, or break terrain into one
    fn complete_work(&mut self, id: UnitId, target: Cube) {
        let carrying = self.units.get(&id).and_then(|s| s.unit.carrying);
        let picked = match carrying {
            Some(item) => {
                match item {
                    Item::Boulder => self.boulders.push(target),
                    Item::Log => self.logs.push(target),
                }
                None
            }
            None => {
                if let Some(i) = self.boulders.iter().position(|c| *c == target) {
                    self.boulders.remove(i);
                    Some(Item::Boulder)
                } else if let Some(i) = self.logs.iter().position(|c| *c == target) {
                    self.logs.remove(i);
                    Some(Item::Log)
                } else {
                    match self.terrain_at(target) {
                        TerrainKind::Rock => {
                            self.set_terrain(target, TerrainKind::Air);
                            self.boulders.push(target);
                        }
                        TerrainKind::Tree => {
                            self.set_terrain(target, TerrainKind::Air);
                            self.logs.push(target);
                        }
                        TerrainKind::Air | TerrainKind::Workshop => {}
                    }
                    None
                }
            }
        };

        if let Some(state) = self.units.get_mut(&id) {
            state.unit.carrying = picked;
        }
        debug!(unit = %id, at = %target, carrying = ?picked, "Work finished");
    }

    fn start(&mut self, unit: UnitId, activity: Activity, status: ActionStatus) {
        if let Some(state) = self.units.get_mut(&unit) {
            if !state.unit.alive {
                state.activity = Activity::Idle;
                state.status = ActionStatus::Failed;
                return;
            }
            state.activity = activity;
            state.status = status;
        }
    }
}

impl World for SandboxWorld {
    fn in_bounds(&self, at: Cube) -> bool {
        (0..self.size.x).contains(&at.x)
            && (0..self.size.y).contains(&at.y)
            && (0..self.size.z).contains(&at.z)
    }

    fn cube_at(&self, at: Cube) -> Option<CubeInfo> {
        self.in_bounds(at)
            .then(|| CubeInfo::from(self.terrain_at(at)))
    }

    fn units(&self) -> Vec<UnitId> {
        self.units.keys().copied().collect()
    }

    fn faction_members(&self, faction: FactionId) -> Vec<UnitId> {
        self.units
            .values()
            .filter(|s| s.unit.faction == faction)
            .map(|s| s.unit.id)
            .collect()
    }

    fn unit_position(&self, unit: UnitId) -> Option<Cube> {
        self.units.get(&unit).map(|s| s.unit.position)
    }

    fn unit_faction(&self, unit: UnitId) -> Option<FactionId> {
        self.units.get(&unit).map(|s| s.unit.faction)
    }

    fn unit_carries_item(&self, unit: UnitId) -> bool {
        self.units
            .get(&unit)
            .is_some_and(|s| s.unit.carrying.is_some())
    }

    fn unit_is_alive(&self, unit: UnitId) -> bool {
        self.units.get(&unit).is_some_and(|s| s.unit.alive)
    }

    fn boulders(&self) -> Vec<Cube> {
        self.boulders.clone()
    }

    fn logs(&self) -> Vec<Cube> {
        self.logs.clone()
    }

    fn workshops(&self) -> Vec<Cube> {
        self.terrain
            .iter()
            .filter(|(_, kind)| **kind == TerrainKind::Workshop)
            .map(|(at, _)| *at)
            .collect()
    }
}

impl UnitController for SandboxWorld {
    fn world(&self) -> &dyn World {
        self
    }

    fn move_to(&mut self, unit: UnitId, target: Cube, _sprint: bool) {
        let status = if self.passable(target) {
            ActionStatus::InProgress
        } else {
            ActionStatus::Failed
        };
        self.start(unit, Activity::Moving { target }, status);
    }

    fn work_at(&mut self, unit: UnitId, target: Cube) {
        let reachable = self
            .unit_position(unit)
            .is_some_and(|at| at.touches(&target) && self.in_bounds(target));
        let status = if reachable {
            ActionStatus::InProgress
        } else {
            ActionStatus::Failed
        };
        let remaining = self.work_ticks;
        self.start(unit, Activity::Working { target, remaining }, status);
    }

    /// Resolves immediately: an adjacent living target dies
    fn attack(&mut self, unit: UnitId, target: UnitId) {
        let hit = match (self.unit_position(unit), self.unit_position(target)) {
            (Some(a), Some(b)) => unit != target && a.touches(&b) && self.unit_is_alive(target),
            _ => false,
        };
        if hit {
            self.kill(target);
        }
        let status = if hit {
            ActionStatus::Completed
        } else {
            ActionStatus::Failed
        };
        self.start(unit, Activity::Idle, status);
    }

    fn follow(&mut self, unit: UnitId, target: UnitId) {
        let status = if self.unit_is_alive(target) && unit != target {
            ActionStatus::InProgress
        } else {
            ActionStatus::Failed
        };
        self.start(unit, Activity::Following { target }, status);
    }

    fn abort_current_action(&mut self, unit: UnitId) {
        if let Some(state) = self.units.get_mut(&unit) {
            if state.status == ActionStatus::InProgress {
                state.status = ActionStatus::Failed;
            }
            state.activity = Activity::Idle;
        }
    }

    fn action_status(&self, unit: UnitId) -> ActionStatus {
        self.units
            .get(&unit)
            .map_or(ActionStatus::Failed, |s| s.status)
    }
}

/* ===================== Scenarios ===================== */

/// A sandbox world plus the tasks to schedule in it, loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub world: WorldSpec,
    #[serde(default)]
    pub tasks: Vec<ScenarioTask>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSpec {
    pub size: Cube,
    #[serde(default)]
    pub terrain: Vec<TerrainPatch>,
    #[serde(default)]
    pub boulders: Vec<Cube>,
    #[serde(default)]
    pub logs: Vec<Cube>,
    #[serde(default)]
    pub units: Vec<SandboxUnit>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TerrainPatch {
    pub at: Cube,
    pub kind: TerrainKind,
}

/// A template scheduled with one faction, instantiated once per selection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioTask {
    pub faction: FactionId,
    #[serde(flatten)]
    pub template: TaskTemplate,
    #[serde(default)]
    pub selections: Vec<Cube>,
}

impl Scenario {
    pub fn from_json(source: &str) -> Result<Self> {
        serde_json::from_str(source).context("Invalid scenario")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        Self::from_json(&source).with_context(|| format!("In scenario {}", path.display()))
    }

    pub fn build_world(&self, work_ticks: u32) -> SandboxWorld {
        let layout = &self.world;
        let mut world = SandboxWorld::new(layout.size).with_work_ticks(work_ticks);
        for patch in &layout.terrain {
            world.set_terrain(patch.at, patch.kind);
        }
        for at in &layout.boulders {
            world.add_boulder(*at);
        }
        for at in &layout.logs {
            world.add_log(*at);
        }
        for unit in &layout.units {
            world.add_unit(unit.clone());
        }
        world
    }

    /// World plus an application with one scheduler per faction and every
    /// task scheduled with its faction
    pub fn setup(&self, config: Config) -> Result<(Application, SandboxWorld, Vec<TaskId>)> {
        let world = self.build_world(config.simulation.work_ticks);
        let mut app = Application::new(config);

        let mut factions = world.factions();
        factions.extend(self.tasks.iter().map(|t| t.faction));
        for faction in factions {
            app.add_scheduler(faction)?;
        }

        let mut ids = Vec::new();
        for entry in &self.tasks {
            let scheduler = app
                .scheduler_for(entry.faction)
                .with_context(|| format!("No scheduler for {}", entry.faction))?;
            for id in app.instantiate(&entry.template, &entry.selections) {
                app.schedule(scheduler, id)
                    .with_context(|| format!("Failed to schedule task '{}'", entry.template.name))?;
                ids.push(id);
            }
        }

        Ok((app, world, ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(id: u32, faction: u32, at: Cube) -> SandboxUnit {
        SandboxUnit {
            id: UnitId(id),
            faction: FactionId(faction),
            position: at,
            carrying: None,
            alive: true,
        }
    }

    #[test]
    fn test_move_one_cube_per_tick() {
        let mut world = SandboxWorld::new(Cube::new(5, 5, 1));
        world.add_unit(unit(1, 1, Cube::new(0, 0, 0)));

        world.move_to(UnitId(1), Cube::new(2, 0, 0), false);
        assert_eq!(world.action_status(UnitId(1)), ActionStatus::InProgress);

        world.advance();
        assert_eq!(world.unit_position(UnitId(1)), Some(Cube::new(1, 0, 0)));
        assert_eq!(world.action_status(UnitId(1)), ActionStatus::InProgress);

        world.advance();
        assert_eq!(world.unit_position(UnitId(1)), Some(Cube::new(2, 0, 0)));
        assert_eq!(world.action_status(UnitId(1)), ActionStatus::Completed);
    }

    #[test]
    fn test_move_blocked_fails() {
        let mut world = SandboxWorld::new(Cube::new(3, 1, 1));
        world.add_unit(unit(1, 1, Cube::new(0, 0, 0)));
        world.set_terrain(Cube::new(1, 0, 0), TerrainKind::Rock);

        world.move_to(UnitId(1), Cube::new(2, 0, 0), false);
        world.advance();
        assert_eq!(world.action_status(UnitId(1)), ActionStatus::Failed);
        assert_eq!(world.unit_position(UnitId(1)), Some(Cube::new(0, 0, 0)));
    }

    #[test]
    fn test_work_picks_up_boulder() {
        let mut world = SandboxWorld::new(Cube::new(3, 3, 1)).with_work_ticks(2);
        world.add_unit(unit(1, 1, Cube::new(0, 0, 0)));
        world.add_boulder(Cube::new(1, 0, 0));

        world.work_at(UnitId(1), Cube::new(1, 0, 0));
        world.advance();
        assert_eq!(world.action_status(UnitId(1)), ActionStatus::InProgress);
        world.advance();
        assert_eq!(world.action_status(UnitId(1)), ActionStatus::Completed);
        assert!(world.unit_carries_item(UnitId(1)));
        assert!(world.boulders().is_empty());
    }

    #[test]
    fn test_attack_requires_adjacency() {
        let mut world = SandboxWorld::new(Cube::new(5, 5, 1));
        world.add_unit(unit(1, 1, Cube::new(0, 0, 0)));
        world.add_unit(unit(2, 2, Cube::new(3, 0, 0)));
        world.add_unit(unit(3, 2, Cube::new(0, 1, 0)));

        world.attack(UnitId(1), UnitId(2));
        assert_eq!(world.action_status(UnitId(1)), ActionStatus::Failed);
        assert!(world.unit_is_alive(UnitId(2)));

        world.attack(UnitId(1), UnitId(3));
        assert_eq!(world.action_status(UnitId(1)), ActionStatus::Completed);
        assert!(!world.unit_is_alive(UnitId(3)));
    }

    #[test]
    fn test_follow_fails_when_target_dies() {
        let mut world = SandboxWorld::new(Cube::new(6, 1, 1));
        world.add_unit(unit(1, 1, Cube::new(0, 0, 0)));
        world.add_unit(unit(2, 1, Cube::new(5, 0, 0)));

        world.follow(UnitId(1), UnitId(2));
        world.advance();
        assert_eq!(world.action_status(UnitId(1)), ActionStatus::InProgress);

        world.kill(UnitId(2));
        world.advance();
        assert_eq!(world.action_status(UnitId(1)), ActionStatus::Failed);
    }

    #[test]
    fn test_out_of_bounds_cube_has_no_info() {
        let world = SandboxWorld::new(Cube::new(2, 2, 2));
        assert_eq!(world.cube_at(Cube::new(-1, 0, 0)), None);
        assert_eq!(
            world.cube_at(Cube::new(1, 1, 1)),
            Some(CubeInfo::from(TerrainKind::Air))
        );
    }

    #[test]
    fn test_scenario_setup_schedules_per_faction() {
        let source = r#"{
            "world": {
                "size": {"x": 8, "y": 8, "z": 1},
                "terrain": [{"at": {"x": 3, "y": 3, "z": 0}, "kind": "workshop"}],
                "units": [
                    {"id": 1, "faction": 1, "position": {"x": 0, "y": 0, "z": 0}},
                    {"id": 2, "faction": 2, "position": {"x": 7, "y": 7, "z": 0}}
                ]
            },
            "tasks": [
                {
                    "faction": 1,
                    "name": "go to workshop",
                    "priority": 3,
                    "body": {"type": "action", "action": "move_to",
                             "target": {"type": "workshop"}}
                }
            ]
        }"#;

        let scenario = Scenario::from_json(source).unwrap();
        let (app, world, ids) = scenario.setup(Config::default()).unwrap();

        assert_eq!(ids.len(), 1);
        assert_eq!(world.workshops(), vec![Cube::new(3, 3, 0)]);
        let s = app.scheduler_for(FactionId(1)).unwrap();
        assert!(app.are_tasks_part_of(s, &ids).unwrap());
        assert!(app.scheduler_for(FactionId(2)).is_some());
    }
}
