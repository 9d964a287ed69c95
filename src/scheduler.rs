//! Shared timer/scheduler engine.
//!
//! One cooperative facility multiplexes everything this firmware defers:
//! the button-poll task, one-shot pulse off-timers, the repeating mist
//! cycle, and the inactivity timeout.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Task Sources                              │
//! │                                                              │
//! │  ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌──────────┐   │
//! │  │ Button    │  │ Pulse     │  │ Repeating │  │ Idle     │   │
//! │  │ Poll      │  │ Off-Timer │  │ Cycle     │  │ Timeout  │   │
//! │  └─────┬─────┘  └─────┬─────┘  └─────┬─────┘  └─────┬────┘   │
//! │        ▼              ▼              ▼              ▼        │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │         Scheduler (due-ordered task set)               │  │
//! │  └───────────────────────┬────────────────────────────────┘  │
//! │                          ▼                                   │
//! │              MistFanService::run_action()                    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tasks are stored as plain [`TaskAction`] data rather than closures, so
//! the scheduler owns no references into the rest of the system and the
//! service interprets each action with full mutable access when it fires.
//!
//! The host loop drains one pass per tick:
//!
//! ```text
//! for handle in scheduler.due(now) {
//!     if let Some(action) = scheduler.fire(handle, now) { run(action) }
//! }
//! ```
//!
//! `due()` snapshots the pass, so a zero-interval repeating task fires
//! exactly once per pass, and a cancellation mid-pass retracts any
//! not-yet-fired task of the same pass.

use heapless::Vec;
use log::{debug, info, warn};

/// Maximum number of outstanding tasks (stack-allocated).
pub const MAX_TASKS: usize = 16;

// ═══════════════════════════════════════════════════════════════
//  Task types
// ═══════════════════════════════════════════════════════════════

/// Deferred work, interpreted by the service when it comes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskAction {
    /// Poll the button gesture detectors (zero-interval repeating).
    PollButtons,
    /// Close the mist solenoid — the tail end of a pulse.
    MistOff,
    /// Fire the next pulse of the active repeating mist cycle.
    RepeatPulse {
        /// Pulse length forwarded to `pulse()` on each firing.
        on_ms: u32,
    },
    /// The inactivity window elapsed — shut everything down.
    IdleTimeout,
}

/// Opaque, cancellable reference to a scheduled task.
///
/// Handles stay valid until the task fires (one-shots), is cancelled, or
/// `cancel_all()` wipes the task set — after which they are stale and
/// cancelling them is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskHandle(u32);

/// Internal bookkeeping for a live task.
struct TaskEntry {
    id: u32,
    /// Registration order — tie-breaker for tasks due at the same time.
    seq: u32,
    due_at_ms: u64,
    /// `Some(interval)` re-arms after each firing; `None` is one-shot.
    interval_ms: Option<u64>,
    action: TaskAction,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// The scheduler engine.
///
/// Time never advances in here — every entry point takes the caller's
/// monotonic `now_ms`, which keeps the whole engine deterministic under a
/// simulated clock.
pub struct Scheduler {
    tasks: Vec<TaskEntry, MAX_TASKS>,
    next_id: u32,
    next_seq: u32,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 1,
            next_seq: 0,
        }
    }

    /// Schedule `action` to fire once, `delay_ms` from `now_ms`.
    ///
    /// Returns `None` if the task set is full; callers log and degrade
    /// rather than panic.
    pub fn schedule_once(
        &mut self,
        now_ms: u64,
        delay_ms: u64,
        action: TaskAction,
    ) -> Option<TaskHandle> {
        self.insert(now_ms + delay_ms, None, action)
    }

    /// Schedule `action` to fire every `interval_ms`, first firing one
    /// interval from `now_ms`.
    ///
    /// The *immediate* first execution, where wanted, is the caller's
    /// responsibility — the mist cycle pulses once itself and registers
    /// the repeat for the following period.
    pub fn schedule_every(
        &mut self,
        now_ms: u64,
        interval_ms: u64,
        action: TaskAction,
    ) -> Option<TaskHandle> {
        self.insert(now_ms + interval_ms, Some(interval_ms), action)
    }

    /// Cancel a task.  Unknown or already-fired handles are a no-op.
    pub fn cancel(&mut self, handle: TaskHandle) {
        if let Some(idx) = self.index_of(handle.0) {
            debug!("scheduler: cancelled {:?}", self.tasks[idx].action);
            self.tasks.swap_remove(idx);
        }
    }

    /// Cancel every outstanding task.
    ///
    /// Any handle held across this call is stale afterwards — owners must
    /// drop their copies.
    pub fn cancel_all(&mut self) {
        info!("scheduler: cancelling all {} task(s)", self.tasks.len());
        self.tasks.clear();
    }

    /// Handles of every task due at `now_ms`, ordered by the time they
    /// became due, ties broken by registration order.
    ///
    /// Compute this once per pass, then [`fire`](Self::fire) each handle:
    /// firing re-arms repeating tasks past `now_ms`, so a task cannot run
    /// twice in one pass even at interval zero.
    pub fn due(&self, now_ms: u64) -> Vec<TaskHandle, MAX_TASKS> {
        let mut order: Vec<(u64, u32, u32), MAX_TASKS> = Vec::new();
        for t in &self.tasks {
            if t.due_at_ms <= now_ms {
                // Capacity matches the task set; push cannot fail.
                let _ = order.push((t.due_at_ms, t.seq, t.id));
            }
        }
        order.sort_unstable();

        let mut handles: Vec<TaskHandle, MAX_TASKS> = Vec::new();
        for (_, _, id) in &order {
            let _ = handles.push(TaskHandle(*id));
        }
        handles
    }

    /// Consume one due task: one-shots are removed, repeating tasks are
    /// re-armed for `now_ms + interval`.
    ///
    /// Returns `None` when the handle no longer names a due task — it was
    /// cancelled since [`due`](Self::due) was computed, or already fired
    /// this pass.
    pub fn fire(&mut self, handle: TaskHandle, now_ms: u64) -> Option<TaskAction> {
        let idx = self.index_of(handle.0)?;
        if self.tasks[idx].due_at_ms > now_ms {
            return None;
        }
        match self.tasks[idx].interval_ms {
            Some(interval) => {
                self.tasks[idx].due_at_ms = now_ms + interval;
                Some(self.tasks[idx].action)
            }
            None => Some(self.tasks.swap_remove(idx).action),
        }
    }

    /// Number of outstanding tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Whether `handle` still names a live task.
    pub fn contains(&self, handle: TaskHandle) -> bool {
        self.index_of(handle.0).is_some()
    }

    // ── Internal ──────────────────────────────────────────────────

    fn insert(
        &mut self,
        due_at_ms: u64,
        interval_ms: Option<u64>,
        action: TaskAction,
    ) -> Option<TaskHandle> {
        let id = self.next_id;
        let entry = TaskEntry {
            id,
            seq: self.next_seq,
            due_at_ms,
            interval_ms,
            action,
        };
        if self.tasks.push(entry).is_err() {
            warn!("scheduler: task set full ({MAX_TASKS}), dropping {action:?}");
            return None;
        }
        self.next_id = self.next_id.wrapping_add(1).max(1);
        self.next_seq = self.next_seq.wrapping_add(1);
        debug!("scheduler: armed {action:?} at t={due_at_ms}ms (id={id})");
        Some(TaskHandle(id))
    }

    fn index_of(&self, id: u32) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    /// Run one full pass at `now`, returning the actions that fired in order.
    fn pass(sched: &mut Scheduler, now: u64) -> std::vec::Vec<TaskAction> {
        let mut fired = std::vec::Vec::new();
        for h in sched.due(now) {
            if let Some(a) = sched.fire(h, now) {
                fired.push(a);
            }
        }
        fired
    }

    #[test]
    fn one_shot_fires_once_at_due_time() {
        let mut sched = Scheduler::new();
        sched.schedule_once(0, 100, TaskAction::MistOff).unwrap();

        assert!(pass(&mut sched, 99).is_empty());
        assert_eq!(pass(&mut sched, 100), vec![TaskAction::MistOff]);
        assert!(pass(&mut sched, 500).is_empty());
        assert!(sched.is_empty());
    }

    #[test]
    fn due_order_is_due_time_then_registration() {
        let mut sched = Scheduler::new();
        // Registered later but due earlier: fires first.
        sched.schedule_once(0, 200, TaskAction::MistOff).unwrap();
        sched.schedule_once(0, 100, TaskAction::IdleTimeout).unwrap();
        // Same due time as the first: registration order decides.
        sched.schedule_once(0, 200, TaskAction::PollButtons).unwrap();

        assert_eq!(
            pass(&mut sched, 250),
            vec![
                TaskAction::IdleTimeout,
                TaskAction::MistOff,
                TaskAction::PollButtons,
            ]
        );
    }

    #[test]
    fn repeating_rearms_at_fire_time_plus_interval() {
        let mut sched = Scheduler::new();
        sched
            .schedule_every(0, 1000, TaskAction::RepeatPulse { on_ms: 200 })
            .unwrap();

        assert!(pass(&mut sched, 999).is_empty());
        assert_eq!(pass(&mut sched, 1000).len(), 1);
        // Re-armed for 2000, not due again at 1500.
        assert!(pass(&mut sched, 1500).is_empty());
        assert_eq!(pass(&mut sched, 2000).len(), 1);
        assert_eq!(sched.len(), 1);
    }

    #[test]
    fn zero_interval_repeating_fires_once_per_pass() {
        let mut sched = Scheduler::new();
        sched.schedule_every(0, 0, TaskAction::PollButtons).unwrap();

        for now in 0..5 {
            assert_eq!(pass(&mut sched, now), vec![TaskAction::PollButtons]);
        }
        assert_eq!(sched.len(), 1);
    }

    #[test]
    fn cancel_removes_exactly_that_task() {
        let mut sched = Scheduler::new();
        let a = sched.schedule_once(0, 100, TaskAction::MistOff).unwrap();
        let b = sched.schedule_once(0, 100, TaskAction::IdleTimeout).unwrap();

        sched.cancel(a);
        assert!(!sched.contains(a));
        assert!(sched.contains(b));
        assert_eq!(pass(&mut sched, 100), vec![TaskAction::IdleTimeout]);
    }

    #[test]
    fn cancel_fired_or_unknown_handle_is_noop() {
        let mut sched = Scheduler::new();
        let h = sched.schedule_once(0, 10, TaskAction::MistOff).unwrap();
        assert_eq!(pass(&mut sched, 10).len(), 1);

        sched.cancel(h); // already fired
        sched.cancel(TaskHandle(9999)); // never existed
        assert!(sched.is_empty());
    }

    #[test]
    fn cancel_mid_pass_retracts_unfired_task() {
        let mut sched = Scheduler::new();
        let _first = sched.schedule_once(0, 100, TaskAction::MistOff).unwrap();
        let second = sched.schedule_once(0, 100, TaskAction::IdleTimeout).unwrap();

        let mut fired = std::vec::Vec::new();
        for h in sched.due(100) {
            if let Some(a) = sched.fire(h, 100) {
                // First firing cancels the second before it runs.
                sched.cancel(second);
                fired.push(a);
            }
        }
        assert_eq!(fired, vec![TaskAction::MistOff]);
    }

    #[test]
    fn cancel_all_clears_everything() {
        let mut sched = Scheduler::new();
        sched.schedule_every(0, 0, TaskAction::PollButtons).unwrap();
        sched.schedule_once(0, 100, TaskAction::MistOff).unwrap();
        let h = sched.schedule_once(0, 200, TaskAction::IdleTimeout).unwrap();

        sched.cancel_all();
        assert!(sched.is_empty());
        assert!(!sched.contains(h));
        assert!(pass(&mut sched, 1000).is_empty());
    }

    #[test]
    fn full_task_set_degrades_to_none() {
        let mut sched = Scheduler::new();
        for _ in 0..MAX_TASKS {
            assert!(sched.schedule_once(0, 10, TaskAction::MistOff).is_some());
        }
        assert!(sched.schedule_once(0, 10, TaskAction::MistOff).is_none());
    }

    #[test]
    fn task_scheduled_during_pass_waits_for_next_pass() {
        let mut sched = Scheduler::new();
        sched.schedule_once(0, 50, TaskAction::RepeatPulse { on_ms: 100 }).unwrap();

        let mut fired = std::vec::Vec::new();
        for h in sched.due(50) {
            if let Some(a) = sched.fire(h, 50) {
                fired.push(a);
                // Reacting to the firing by arming a zero-delay one-shot.
                sched.schedule_once(50, 0, TaskAction::MistOff).unwrap();
            }
        }
        assert_eq!(fired.len(), 1);
        // The new task is due but only fires on the next pass.
        assert_eq!(pass(&mut sched, 50), vec![TaskAction::MistOff]);
    }
}
