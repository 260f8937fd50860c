use tracing::debug;

use super::Scheduler;
use crate::error::{Result, SchedulerError};
use crate::interpreter::context::UnitController;
use crate::task::TaskArena;
use crate::types::{TaskId, UnitId};

impl Scheduler {
    /// Swap `replacement` into the registration slot held by `original`
    ///
    /// If `original` was executing, its action is aborted and its unit freed;
    /// that unit is returned. `replacement` starts pending from `NotStarted`.
    /// Nothing changes unless every check passes.
    pub fn replace_task(
        &mut self,
        tasks: &mut TaskArena,
        original: TaskId,
        replacement: TaskId,
        host: &mut dyn UnitController,
    ) -> Result<Option<UnitId>> {
        let slot = self.position(original)?;
        let repl = tasks.require(replacement)?;

        if self.contains(replacement) {
            return Err(SchedulerError::AlreadyScheduled {
                scheduler: self.id,
                task: replacement,
            });
        }
        if let Some(unit) = repl.assigned_unit() {
            return Err(SchedulerError::TaskAssigned {
                task: replacement,
                unit,
            });
        }
        if !repl.is_well_formed() {
            return Err(SchedulerError::IllFormed { task: replacement });
        }

        let orig = tasks.require_mut(original)?;
        let freed = orig.interrupt(host);
        orig.schedulers_mut().remove(&self.id);

        let repl = tasks.require_mut(replacement)?;
        repl.release();
        repl.schedulers_mut().insert(self.id);
        self.entries[slot].task = replacement;

        debug!(scheduler = %self.id, %original, %replacement, freed = ?freed, "Task replaced");
        Ok(freed)
    }

    /// Interrupt a member task; it returns to pending everywhere
    pub fn stop_task(
        &self,
        tasks: &mut TaskArena,
        task: TaskId,
        host: &mut dyn UnitController,
    ) -> Result<Option<UnitId>> {
        self.position(task)?;
        Ok(tasks.require_mut(task)?.interrupt(host))
    }

    /// Drop `task` from this scheduler's pool. An ongoing claim is not touched.
    pub fn remove_task(&mut self, tasks: &mut TaskArena, task: TaskId) -> Result<()> {
        let slot = self.position(task)?;
        self.entries.remove(slot);
        if let Some(t) = tasks.get_mut(task) {
            t.schedulers_mut().remove(&self.id);
        }
        Ok(())
    }
}
