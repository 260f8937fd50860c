//! Per-faction pools of tasks
//!
//! A scheduler holds the tasks registered with it and hands the best pending
//! one to an idle unit. The pending/assigned split is not stored here: a
//! member is assigned exactly when its task has an executing unit, so a task
//! claimed through one scheduler reads as assigned in every scheduler holding it.
//!
//! Operations are split by concern:
//! - `claim`: choosing and binding the next task (`assign_next`)
//! - `lifecycle`: `replace_task`, `stop_task`, `remove_task`
//! - `query`: ordering, snapshots and membership

mod claim;
mod lifecycle;
mod query;


pub use query::PriorityIter;

use crate::error::{Result, SchedulerError};
use crate::task::TaskArena;
use crate::types::{FactionId, SchedulerId, TaskId};

/// One registration: the task and when it was scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Entry {
    pub(crate) task: TaskId,
    pub(crate) seq: u64,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    id: SchedulerId,
    faction: FactionId,
    entries: Vec<Entry>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new(id: SchedulerId, faction: FactionId) -> Self {
        Self {
            id,
            faction,
            entries: Vec::new(),
            next_seq: 0,
        }
    }

    pub fn id(&self) -> SchedulerId {
        self.id
    }

    pub fn faction(&self) -> FactionId {
        self.faction
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, task: TaskId) -> bool {
        self.entries.iter().any(|e| e.task == task)
    }

    /// Add `task` to the pending pool
    ///
    /// Rejects tasks that are already members or not well-formed.
    pub fn schedule(&mut self, tasks: &mut TaskArena, task: TaskId) -> Result<()> {
        let t = tasks.require_mut(task)?;

        if self.contains(task) {
            return Err(SchedulerError::AlreadyScheduled {
                scheduler: self.id,
                task,
            });
        }
        if !t.is_well_formed() {
            return Err(SchedulerError::IllFormed { task });
        }

        t.schedulers_mut().insert(self.id);
        self.entries.push(Entry {
            task,
            seq: self.next_seq,
        });
        self.next_seq += 1;

        Ok(())
    }

    fn position(&self, task: TaskId) -> Result<usize> {
        self.entries
            .iter()
            .position(|e| e.task == task)
            .ok_or(SchedulerError::NotMember {
                scheduler: self.id,
                task,
            })
    }
}
