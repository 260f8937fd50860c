use tracing::debug;

use super::Scheduler;
use crate::error::Result;
use crate::task::TaskArena;
use crate::types::{TaskId, UnitId};

impl Scheduler {
    /// Claim the best pending task for `unit`
    ///
    /// Ordering is priority descending, then earliest registration. Tasks
    /// already claimed elsewhere are skipped. Returns `None` when nothing is
    /// pending. The caller is responsible for `unit` not already holding a task.
    pub fn assign_next(&mut self, tasks: &mut TaskArena, unit: UnitId) -> Result<Option<TaskId>> {
        let next = self
            .ordered(tasks)
            .into_iter()
            .find(|id| tasks.get(*id).is_some_and(|t| t.assigned_unit().is_none()));

        let Some(id) = next else {
            return Ok(None);
        };

        let task = tasks.require_mut(id)?;
        task.claim(unit);
        debug!(
            scheduler = %self.id(),
            task = %id,
            name = task.name(),
            priority = task.priority(),
            %unit,
            "Task claimed"
        );

        Ok(Some(id))
    }
}
