//! Inactivity timeout guard.
//!
//! Owns the single outstanding timeout task.  Every recognised gesture on
//! any button re-arms it, so the deadline always reads "time of last
//! activity + window".  When the window elapses the service shuts the
//! whole device down (see `MistFanService::run_action`).
//!
//! The guard holds at most one live handle: arming always cancels the
//! previous task before storing the new one, so the at-most-one-deadline
//! invariant is enforced here rather than by caller discipline.

use crate::scheduler::{Scheduler, TaskAction, TaskHandle};
use log::{debug, warn};

/// Single-deadline inactivity guard.
pub struct IdleTimeout {
    window_ms: u64,
    handle: Option<TaskHandle>,
}

impl IdleTimeout {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            handle: None,
        }
    }

    /// (Re-)arm the timeout: cancel any outstanding deadline and schedule
    /// a fresh one the full window from `now_ms`.
    ///
    /// Called on every gesture — a full reset of the countdown, not an
    /// extension.
    pub fn arm(&mut self, sched: &mut Scheduler, now_ms: u64) {
        if let Some(old) = self.handle.take() {
            sched.cancel(old);
        }
        self.handle = sched.schedule_once(now_ms, self.window_ms, TaskAction::IdleTimeout);
        if self.handle.is_none() {
            warn!("idle: could not arm timeout, scheduler full");
        } else {
            debug!("idle: timeout armed, fires in {}ms", self.window_ms);
        }
    }

    /// Forget the stored handle without cancelling it.
    ///
    /// Required after `Scheduler::cancel_all()`, which wipes the task the
    /// handle points at; keeping the handle could later cancel an
    /// unrelated task that reused the slot.
    pub fn invalidate(&mut self) {
        self.handle = None;
    }

    /// Whether a deadline is currently outstanding.
    pub fn is_armed(&self) -> bool {
        self.handle.is_some()
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arm_schedules_exactly_one_deadline() {
        let mut sched = Scheduler::new();
        let mut idle = IdleTimeout::new(1000);

        idle.arm(&mut sched, 0);
        idle.arm(&mut sched, 100);
        idle.arm(&mut sched, 200);

        assert!(idle.is_armed());
        assert_eq!(sched.len(), 1, "re-arming must replace, not accumulate");
    }

    #[test]
    fn rearm_moves_the_deadline() {
        let mut sched = Scheduler::new();
        let mut idle = IdleTimeout::new(1000);

        idle.arm(&mut sched, 0);
        idle.arm(&mut sched, 600);

        // Original deadline (t=1000) must not fire.
        assert!(sched.due(1000).is_empty());
        // New deadline fires at 1600.
        let due = sched.due(1600);
        assert_eq!(due.len(), 1);
        assert_eq!(sched.fire(due[0], 1600), Some(TaskAction::IdleTimeout));
    }

    #[test]
    fn invalidate_drops_the_stale_handle() {
        let mut sched = Scheduler::new();
        let mut idle = IdleTimeout::new(1000);

        idle.arm(&mut sched, 0);
        sched.cancel_all();
        idle.invalidate();

        assert!(!idle.is_armed());
        // Re-arming afterwards works normally.
        idle.arm(&mut sched, 50);
        assert_eq!(sched.len(), 1);
    }
}
