//! The per-tick pass over every scheduler and busy unit
//!
//! One tick runs three phases in order:
//! 1. Claims held by units that are no longer alive are interrupted
//! 2. Every idle living unit of each scheduler's faction is offered the best
//!    pending task
//! 3. Every busy unit steps its task once, in unit order
//!
//! Because assignment precedes stepping, a task claimed this tick executes its
//! first step in the same tick.

use tracing::{trace, warn};

use crate::application::Application;
use crate::error::TaskError;
use crate::interpreter::context::{OutputSink, UnitController};
use crate::interpreter::types::ExecutionState;
use crate::types::{TaskId, UnitId};

/// What happened during one tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub assigned: Vec<(UnitId, TaskId)>,
    pub completed: Vec<TaskId>,
    /// Tasks whose claim ended in failure; they are pending again
    pub failed: Vec<TaskId>,
    /// Tasks released because their unit died
    pub interrupted: Vec<TaskId>,
    pub errors: Vec<(TaskId, TaskError)>,
}

impl TickReport {
    /// Nothing was claimed, finished or failed
    pub fn is_quiet(&self) -> bool {
        self.assigned.is_empty()
            && self.completed.is_empty()
            && self.failed.is_empty()
            && self.interrupted.is_empty()
    }
}

impl Application {
    /// Run one simulation tick against `host`
    pub fn tick(&mut self, host: &mut dyn UnitController, output: &mut dyn OutputSink) -> TickReport {
        let mut report = TickReport::default();

        self.release_dead_units(host, &mut report);
        self.assign_idle_units(host, &mut report);

        let claims: Vec<(UnitId, TaskId)> = self.units.iter().map(|(u, t)| (*u, *t)).collect();
        for (unit, task) in claims {
            self.step_claim(unit, task, host, output, &mut report);
        }

        report
    }

    fn release_dead_units(&mut self, host: &mut dyn UnitController, report: &mut TickReport) {
        let dead: Vec<TaskId> = self
            .units
            .iter()
            .filter(|(unit, _)| !host.world().unit_is_alive(**unit))
            .map(|(_, task)| *task)
            .collect();

        for task in dead {
            match self.interrupt(task, host) {
                Ok(_) => report.interrupted.push(task),
                Err(e) => warn!(%task, error = %e, "Failed to interrupt task of dead unit"),
            }
        }
    }

    fn assign_idle_units(&mut self, host: &dyn UnitController, report: &mut TickReport) {
        let world = host.world();
        let offers: Vec<_> = self
            .schedulers
            .iter()
            .map(|s| (s.id(), world.faction_members(s.faction())))
            .collect();

        for (scheduler, members) in offers {
            for unit in members {
                if self.units.contains_key(&unit) || !world.unit_is_alive(unit) {
                    continue;
                }
                match self.assign_next(scheduler, unit) {
                    Ok(Some(task)) => report.assigned.push((unit, task)),
                    // Nothing left for the rest of this faction
                    Ok(None) => break,
                    Err(e) => {
                        warn!(%scheduler, %unit, error = %e, "Assignment failed");
                        break;
                    }
                }
            }
        }
    }

    fn step_claim(
        &mut self,
        unit: UnitId,
        task: TaskId,
        host: &mut dyn UnitController,
        output: &mut dyn OutputSink,
        report: &mut TickReport,
    ) {
        let Some(t) = self.tasks.get_mut(task) else {
            self.units.remove(&unit);
            return;
        };

        match t.advance(unit, host, output, self.picker.as_mut()) {
            Ok(ExecutionState::Done) => {
                self.finish(task, unit);
                report.completed.push(task);
            }
            Ok(ExecutionState::Failed) => {
                self.fail(task, unit);
                report.failed.push(task);
            }
            Ok(state) => trace!(%task, %unit, ?state, "Task stepped"),
            Err(e) => {
                warn!(%task, %unit, error = %e, "Task raised an error");
                self.fail(task, unit);
                report.failed.push(task);
                report.errors.push((task, e));
            }
        }
    }
}
