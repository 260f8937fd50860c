//! The facade over every task and scheduler in a simulation
//!
//! `Application` owns the task arena and one scheduler per faction, and keeps
//! the unit→task claim table. All claim bookkeeping goes through here so a
//! task is never executing under two units at once.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Result, SchedulerError};
use crate::interpreter::context::{Picker, RandomPicker, UnitController};
use crate::interpreter::types::ActionKind;
use crate::scheduler::{PriorityIter, Scheduler};
use crate::task::{Task, TaskArena, TaskTemplate};
use crate::types::{Cube, FactionId, SchedulerId, TaskId, UnitId};

pub struct Application {
    pub(crate) config: Config,
    pub(crate) tasks: TaskArena,
    pub(crate) schedulers: Vec<Scheduler>,
    /// Which task each busy unit is executing
    pub(crate) units: BTreeMap<UnitId, TaskId>,
    pub(crate) picker: Box<dyn Picker>,
}

impl Application {
    /// Create an empty application (pure instantiation, no I/O)
    pub fn new(config: Config) -> Self {
        let picker = RandomPicker::new(config.simulation.rng_seed);
        Self {
            config,
            tasks: TaskArena::new(),
            schedulers: Vec::new(),
            units: BTreeMap::new(),
            picker: Box::new(picker),
        }
    }

    /// Replace the random source behind `next_to`
    pub fn with_picker(mut self, picker: impl Picker + 'static) -> Self {
        self.picker = Box::new(picker);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /* ===================== Registration ===================== */

    pub fn add_task(&mut self, task: Task) -> TaskId {
        let id = self.tasks.insert(task);
        debug!(task = %id, "Task added");
        id
    }

    /// Add one task per selected cube from `template`
    pub fn instantiate(&mut self, template: &TaskTemplate, selections: &[Cube]) -> Vec<TaskId> {
        template
            .instantiate(selections)
            .into_iter()
            .map(|task| self.add_task(task))
            .collect()
    }

    /// Create the scheduler for `faction`; each faction has at most one
    pub fn add_scheduler(&mut self, faction: FactionId) -> Result<SchedulerId> {
        if let Some(existing) = self.scheduler_for(faction) {
            return Err(SchedulerError::DuplicateFaction {
                faction,
                scheduler: existing,
            });
        }

        let id = SchedulerId(self.schedulers.len());
        self.schedulers.push(Scheduler::new(id, faction));
        debug!(scheduler = %id, %faction, "Scheduler added");
        Ok(id)
    }

    pub fn scheduler_for(&self, faction: FactionId) -> Option<SchedulerId> {
        self.schedulers
            .iter()
            .find(|s| s.faction() == faction)
            .map(Scheduler::id)
    }

    pub fn scheduler(&self, id: SchedulerId) -> Result<&Scheduler> {
        self.schedulers
            .get(id.0)
            .ok_or(SchedulerError::UnknownScheduler(id))
    }

    pub fn schedulers(&self) -> impl Iterator<Item = &Scheduler> {
        self.schedulers.iter()
    }

    pub fn task(&self, id: TaskId) -> Result<&Task> {
        self.tasks.require(id)
    }

    pub fn tasks(&self) -> &TaskArena {
        &self.tasks
    }

    /* ===================== Scheduler operations ===================== */

    pub fn schedule(&mut self, scheduler: SchedulerId, task: TaskId) -> Result<()> {
        scheduler_mut(&mut self.schedulers, scheduler)?.schedule(&mut self.tasks, task)?;
        debug!(%scheduler, %task, "Task scheduled");
        Ok(())
    }

    /// Swap `replacement` in for `original`; returns the unit `original` freed
    pub fn replace(
        &mut self,
        scheduler: SchedulerId,
        original: TaskId,
        replacement: TaskId,
        host: &mut dyn UnitController,
    ) -> Result<Option<UnitId>> {
        let freed = scheduler_mut(&mut self.schedulers, scheduler)?.replace_task(
            &mut self.tasks,
            original,
            replacement,
            host,
        )?;
        if let Some(unit) = freed {
            self.units.remove(&unit);
        }
        Ok(freed)
    }

    pub fn are_tasks_part_of(&self, scheduler: SchedulerId, tasks: &[TaskId]) -> Result<bool> {
        Ok(self.scheduler(scheduler)?.has_all_tasks(tasks))
    }

    pub fn all_tasks_iterator(&self, scheduler: SchedulerId) -> Result<PriorityIter> {
        Ok(self.scheduler(scheduler)?.priority_iterator(&self.tasks))
    }

    /// Hand the best pending task of `scheduler` to `unit`
    pub fn assign_next(&mut self, scheduler: SchedulerId, unit: UnitId) -> Result<Option<TaskId>> {
        if let Some(&task) = self.units.get(&unit) {
            return Err(SchedulerError::UnitBusy { unit, task });
        }

        let claimed =
            scheduler_mut(&mut self.schedulers, scheduler)?.assign_next(&mut self.tasks, unit)?;
        if let Some(task) = claimed {
            self.units.insert(unit, task);
        }
        Ok(claimed)
    }

    /// Abort `task`'s action and return it to pending in every scheduler
    pub fn interrupt(
        &mut self,
        task: TaskId,
        host: &mut dyn UnitController,
    ) -> Result<Option<UnitId>> {
        let freed = self.tasks.require_mut(task)?.interrupt(host);
        if let Some(unit) = freed {
            self.units.remove(&unit);
            debug!(%task, %unit, "Task interrupted");
        }
        Ok(freed)
    }

    /// Interrupt a task through one of the schedulers holding it
    pub fn stop_task(
        &mut self,
        scheduler: SchedulerId,
        task: TaskId,
        host: &mut dyn UnitController,
    ) -> Result<Option<UnitId>> {
        let freed = self
            .schedulers
            .get(scheduler.0)
            .ok_or(SchedulerError::UnknownScheduler(scheduler))?
            .stop_task(&mut self.tasks, task, host)?;
        if let Some(unit) = freed {
            self.units.remove(&unit);
            debug!(%scheduler, %task, %unit, "Task stopped");
        }
        Ok(freed)
    }

    /// Remove `task` from `scheduler`; a running claim continues
    pub fn unschedule(&mut self, scheduler: SchedulerId, task: TaskId) -> Result<()> {
        scheduler_mut(&mut self.schedulers, scheduler)?.remove_task(&mut self.tasks, task)
    }

    /* ===================== Lookups ===================== */

    pub fn schedulers_of(&self, task: TaskId) -> Result<BTreeSet<SchedulerId>> {
        Ok(self.tasks.require(task)?.schedulers().clone())
    }

    pub fn assigned_unit(&self, task: TaskId) -> Result<Option<UnitId>> {
        Ok(self.tasks.require(task)?.assigned_unit())
    }

    pub fn assigned_task(&self, unit: UnitId) -> Option<TaskId> {
        self.units.get(&unit).copied()
    }

    pub fn name(&self, task: TaskId) -> Result<&str> {
        Ok(self.tasks.require(task)?.name())
    }

    pub fn priority(&self, task: TaskId) -> Result<i64> {
        Ok(self.tasks.require(task)?.priority())
    }

    /// Takes effect at the next assignment in every scheduler holding the task
    pub fn set_priority(&mut self, task: TaskId, priority: i64) -> Result<()> {
        self.tasks.require_mut(task)?.set_priority(priority);
        Ok(())
    }

    pub fn is_well_formed(&self, task: TaskId) -> Result<bool> {
        Ok(self.tasks.require(task)?.is_well_formed())
    }

    /// The action `task` is waiting on, if it is blocked on one
    pub fn current_action(&self, task: TaskId) -> Result<Option<ActionKind>> {
        Ok(self.tasks.require(task)?.current_action())
    }

    /* ===================== Claim endings ===================== */

    /// The task failed under `unit`: back to pending with a fresh tree
    pub(crate) fn fail(&mut self, task: TaskId, unit: UnitId) {
        self.units.remove(&unit);
        let penalty = self.config.scheduler.failure_priority_penalty;
        let Some(t) = self.tasks.get_mut(task) else {
            return;
        };

        t.release();
        if penalty != 0 {
            t.set_priority(t.priority().saturating_sub(penalty));
        }
        warn!(%task, name = t.name(), %unit, priority = t.priority(), "Task failed");
    }

    /// The task completed: the unit goes idle and the task leaves every scheduler
    pub(crate) fn finish(&mut self, task: TaskId, unit: UnitId) {
        self.units.remove(&unit);
        let Some(t) = self.tasks.get_mut(task) else {
            return;
        };

        t.finish();
        let holders: Vec<SchedulerId> = t.schedulers().iter().copied().collect();
        for id in holders {
            if let Some(s) = self.schedulers.get_mut(id.0) {
                if let Err(e) = s.remove_task(&mut self.tasks, task) {
                    warn!(%task, scheduler = %id, error = %e, "Failed to remove completed task");
                }
            }
        }
        info!(%task, %unit, "Task completed");
    }
}

fn scheduler_mut(schedulers: &mut [Scheduler], id: SchedulerId) -> Result<&mut Scheduler> {
    schedulers
        .get_mut(id.0)
        .ok_or(SchedulerError::UnknownScheduler(id))
}
