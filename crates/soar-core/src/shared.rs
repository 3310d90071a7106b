//! Thread-safe handle on the task being flown.
//!
//! The update loop and editors share one task. Editors work on a clone and
//! commit it back, so a tick never sees a half-edited task.

use crate::events::TaskEvent;
use crate::glide::GlidePolar;
use crate::models::AircraftState;
use crate::ordered_task::OrderedTask;
use crate::rules::TaskBehaviour;
use crate::stats::TaskStats;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub struct SharedTask {
    task: Mutex<OrderedTask>,
}

impl SharedTask {
    pub fn new(task: OrderedTask) -> Self {
        Self {
            task: Mutex::new(task),
        }
    }

    fn lock(&self) -> MutexGuard<'_, OrderedTask> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn with_task<R>(&self, f: impl FnOnce(&OrderedTask) -> R) -> R {
        f(&self.lock())
    }

    pub fn with_task_mut<R>(&self, f: impl FnOnce(&mut OrderedTask) -> R) -> R {
        f(&mut self.lock())
    }

    /// Run one update tick and collect the events it raised.
    pub fn update(&self, now: &AircraftState, last: &AircraftState, polar: &GlidePolar) -> (bool, Vec<TaskEvent>) {
        let mut task = self.lock();
        let full_update = task.update(now, last, polar);
        task.update_idle(now, polar);
        (full_update, task.drain_events())
    }

    pub fn stats(&self) -> TaskStats {
        self.lock().stats().clone()
    }

    /// Editable copy of the task without flight state.
    pub fn clone_task(&self, behaviour: &TaskBehaviour) -> OrderedTask {
        self.lock().clone_with_behaviour(behaviour)
    }

    pub fn commit(&self, edited: &OrderedTask) -> bool {
        self.lock().commit(edited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_shared_across_threads() {
        let shared = Arc::new(SharedTask::new(OrderedTask::new(TaskBehaviour::default())));
        let worker = {
            let shared = Arc::clone(&shared);
            std::thread::spawn(move || shared.with_task_mut(|task| task.set_name("remote")))
        };
        worker.join().unwrap();
        assert_eq!(shared.with_task(|task| task.name().to_string()), "remote");
    }

    #[test]
    fn test_commit_edited_clone() {
        let shared = SharedTask::new(OrderedTask::new(TaskBehaviour::default()));
        let mut edited = shared.clone_task(&TaskBehaviour::default());
        edited.set_name("edited");
        assert!(shared.commit(&edited));
        assert!(!shared.commit(&edited));
        assert_eq!(shared.with_task(|task| task.name().to_string()), "edited");
    }
}
