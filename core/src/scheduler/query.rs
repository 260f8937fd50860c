use std::cmp::Reverse;

use super::Scheduler;
use crate::task::TaskArena;
use crate::types::TaskId;

/// Snapshot of a scheduler's tasks in assignment order
///
/// Taken when created; later scheduler changes do not affect it.
#[derive(Debug, Clone)]
pub struct PriorityIter {
    inner: std::vec::IntoIter<TaskId>,
}

impl Iterator for PriorityIter {
    type Item = TaskId;

    fn next(&mut self) -> Option<TaskId> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for PriorityIter {}

impl Scheduler {
    /// Every member, priority descending, ties by registration order
    pub(crate) fn ordered(&self, tasks: &TaskArena) -> Vec<TaskId> {
        let mut keyed: Vec<(Reverse<i64>, u64, TaskId)> = self
            .entries
            .iter()
            .filter_map(|e| {
                tasks
                    .get(e.task)
                    .map(|t| (Reverse(t.priority()), e.seq, e.task))
            })
            .collect();
        keyed.sort_unstable();
        keyed.into_iter().map(|(_, _, id)| id).collect()
    }

    pub fn priority_iterator(&self, tasks: &TaskArena) -> PriorityIter {
        PriorityIter {
            inner: self.ordered(tasks).into_iter(),
        }
    }

    pub fn has_all_tasks(&self, tasks: &[TaskId]) -> bool {
        tasks.iter().all(|t| self.contains(*t))
    }

    /// Members without an executing unit, in assignment order
    pub fn pending(&self, tasks: &TaskArena) -> Vec<TaskId> {
        self.ordered(tasks)
            .into_iter()
            .filter(|id| tasks.get(*id).is_some_and(|t| t.assigned_unit().is_none()))
            .collect()
    }

    /// Members currently executing under some unit, in assignment order
    pub fn assigned(&self, tasks: &TaskArena) -> Vec<TaskId> {
        self.ordered(tasks)
            .into_iter()
            .filter(|id| tasks.get(*id).is_some_and(|t| t.assigned_unit().is_some()))
            .collect()
    }
}
