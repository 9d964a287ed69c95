//! Application service — gesture dispatch and the mist-cycle controller.
//!
//! [`MistFanService`] owns every piece of mutable control state: the
//! scheduler, the cached mist relay state, the repeating-cycle handle
//! slot, and the inactivity guard.  Gesture callbacks therefore never
//! touch globals; everything funnels through `&mut self`.
//!
//! ```text
//!  ButtonPanel ──▶ ┌────────────────────────────┐
//!                  │       MistFanService       │ ──▶ ActuatorPort
//!    Scheduler ◀──▶│  dispatch · mist cycle ·   │
//!                  │  idle guard                │
//!                  └────────────────────────────┘
//! ```
//!
//! ## Gesture map
//!
//! | Button | Gesture        | Action                                  |
//! |--------|----------------|-----------------------------------------|
//! | One    | Click          | 1 s mist pulse                          |
//! | One    | DoubleClick    | repeat: 1 s mist every 30 s pause       |
//! | One    | LongPress held | mist on while held                      |
//! | One    | 3/4/5 clicks   | repeat presets (shorter, more intense)  |
//! | Two    | Click          | fan on                                  |
//! | Two    | DoubleClick    | fan off                                 |
//! | Three  | Click          | cancel repeating cycle                  |
//! | Three  | DoubleClick    | cancel cycle + mist off + fan off       |
//!
//! Every recognised gesture re-arms the inactivity guard first.

use log::{debug, info, warn};

use crate::config::{MistCycle, SystemConfig};
use crate::drivers::button::{ButtonId, Gesture};
use crate::idle::IdleTimeout;
use crate::scheduler::{Scheduler, TaskAction, TaskHandle};

use super::ports::{ActuatorPort, ButtonPanel};

/// The application service orchestrates all control logic.
pub struct MistFanService {
    scheduler: Scheduler,
    idle: IdleTimeout,
    config: SystemConfig,
    /// Cached relay state — a hardware write is issued only on change.
    mist_on: bool,
    /// Handle slot for the single active repeating mist cycle.
    repeating: Option<TaskHandle>,
}

impl MistFanService {
    /// Construct the service from configuration.
    ///
    /// Does **not** arm anything — call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Self {
        let idle = IdleTimeout::new(config.idle_timeout_ms);
        Self {
            scheduler: Scheduler::new(),
            idle,
            config,
            mist_on: false,
            repeating: None,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Arm the button-poll task and the inactivity guard.
    pub fn start(&mut self, now_ms: u64) {
        if self
            .scheduler
            .schedule_every(now_ms, 0, TaskAction::PollButtons)
            .is_none()
        {
            warn!("service: could not arm button poll task");
        }
        self.idle.arm(&mut self.scheduler, now_ms);
        info!(
            "service started; idle timeout in {}ms",
            self.idle.window_ms()
        );
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one scheduler pass: fire every task due at `now_ms`, in the
    /// order the tasks became due.
    ///
    /// Call as often as the host loop runs.  Actions may re-schedule or
    /// cancel other tasks mid-pass; a task cancelled here will not fire
    /// later in the same pass.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut impl ActuatorPort,
        panel: &mut impl ButtonPanel,
    ) {
        for handle in self.scheduler.due(now_ms) {
            if let Some(action) = self.scheduler.fire(handle, now_ms) {
                self.run_action(action, now_ms, hw, panel);
            }
        }
    }

    fn run_action(
        &mut self,
        action: TaskAction,
        now_ms: u64,
        hw: &mut impl ActuatorPort,
        panel: &mut impl ButtonPanel,
    ) {
        match action {
            TaskAction::PollButtons => {
                for (id, gesture) in panel.poll(now_ms) {
                    self.on_gesture(id, gesture, now_ms, hw);
                }
            }

            TaskAction::MistOff => self.write_mist(hw, false),

            TaskAction::RepeatPulse { on_ms } => {
                if panel.is_long_pressed(ButtonId::One) {
                    // Don't fight a manual hold — skip this firing entirely.
                    info!("repeat pulse skipped: button one is held");
                } else {
                    self.pulse(on_ms, now_ms, hw);
                }
            }

            TaskAction::IdleTimeout => {
                info!("inactivity timeout: cancelling all tasks, outputs off");
                self.scheduler.cancel_all();
                self.repeating = None;
                self.idle.invalidate();
                self.write_mist(hw, false);
                self.fan_off(hw);
            }
        }
    }

    // ── Gesture dispatch ──────────────────────────────────────

    /// Map one recognised gesture to its device action.
    pub fn on_gesture(
        &mut self,
        id: ButtonId,
        gesture: Gesture,
        now_ms: u64,
        hw: &mut impl ActuatorPort,
    ) {
        self.idle.arm(&mut self.scheduler, now_ms);
        debug!("button {:?}: {:?}", id, gesture);

        match (id, gesture) {
            // Button One — primary mist control.
            (ButtonId::One, Gesture::Click) => self.pulse(self.config.pulse_ms, now_ms, hw),
            (ButtonId::One, Gesture::DoubleClick) => {
                self.start_repeating(self.config.cycle_double_click, now_ms, hw);
            }
            (ButtonId::One, Gesture::LongPressStart) => {
                info!("button one: long press start");
            }
            (ButtonId::One, Gesture::LongPressHeld) => self.write_mist(hw, true),
            (ButtonId::One, Gesture::LongPressStop) => {
                info!("button one: long press stop");
                self.write_mist(hw, false);
            }
            (ButtonId::One, Gesture::MultiClick(n)) => {
                info!("button one: multi-click, n={}", n);
                match n {
                    3 => self.start_repeating(self.config.cycle_triple_click, now_ms, hw),
                    4 => self.start_repeating(self.config.cycle_quad_click, now_ms, hw),
                    5 => self.start_repeating(self.config.cycle_quint_click, now_ms, hw),
                    _ => {}
                }
            }

            // Button Two — fan control.
            (ButtonId::Two, Gesture::Click) => self.fan_on(hw),
            (ButtonId::Two, Gesture::DoubleClick) => self.fan_off(hw),
            (ButtonId::Two, Gesture::MultiClick(n)) => {
                info!("button two: multi-click, n={}", n);
            }

            // Button Three — cancel / reset.
            (ButtonId::Three, Gesture::Click) => self.cancel_repeating(),
            (ButtonId::Three, Gesture::DoubleClick) => self.stop_all(hw),
            (ButtonId::Three, Gesture::MultiClick(n)) => {
                info!("button three: multi-click, n={}", n);
            }

            // Long-press hooks on Two and Three exist but do nothing
            // beyond resetting the idle guard above.
            (_, Gesture::LongPressStart | Gesture::LongPressHeld | Gesture::LongPressStop) => {}
        }
    }

    // ── Mist cycle controller ─────────────────────────────────

    /// Open the valve now and arm a one-shot close after `on_ms`.
    ///
    /// Fire-and-forget: no handle is tracked, so overlapping pulses
    /// compound and the *earliest* off-timer wins — a second pulse can be
    /// cut short by the first pulse's close.
    pub fn pulse(&mut self, on_ms: u32, now_ms: u64, hw: &mut impl ActuatorPort) {
        info!("mist pulse: on for {}ms", on_ms);
        self.write_mist(hw, true);
        if self
            .scheduler
            .schedule_once(now_ms, u64::from(on_ms), TaskAction::MistOff)
            .is_none()
        {
            warn!("pulse: could not arm off-timer, forcing mist off");
            self.write_mist(hw, false);
        }
    }

    /// Pulse immediately, then repeat every `on + off` milliseconds until
    /// cancelled.
    ///
    /// Replace-if-present: any previously running cycle is cancelled
    /// before the new handle is stored, so at most one cycle is ever
    /// active.
    pub fn start_repeating(&mut self, cycle: MistCycle, now_ms: u64, hw: &mut impl ActuatorPort) {
        info!(
            "repeating mist cycle: {}ms on, {}ms off",
            cycle.on_ms, cycle.off_ms
        );
        if let Some(old) = self.repeating.take() {
            self.scheduler.cancel(old);
        }
        // The scheduler waits a full period before the first firing, so
        // the initial pulse is ours to make.
        self.pulse(cycle.on_ms, now_ms, hw);
        self.repeating = self.scheduler.schedule_every(
            now_ms,
            u64::from(cycle.period_ms()),
            TaskAction::RepeatPulse { on_ms: cycle.on_ms },
        );
        if self.repeating.is_none() {
            warn!("start_repeating: scheduler full, cycle will not repeat");
        }
    }

    /// Cancel the active repeating cycle.  Idempotent.
    pub fn cancel_repeating(&mut self) {
        if let Some(handle) = self.repeating.take() {
            info!("repeating mist cycle cancelled");
            self.scheduler.cancel(handle);
        }
    }

    /// Cancel the repeating cycle and force both outputs off.
    ///
    /// Pending pulse off-timers are left to fire; closing an
    /// already-closed valve is a no-op under the write-on-change rule.
    pub fn stop_all(&mut self, hw: &mut impl ActuatorPort) {
        info!("stop all: cycle cancelled, mist and fan off");
        self.cancel_repeating();
        self.write_mist(hw, false);
        self.fan_off(hw);
    }

    /// Flip the relay state (diagnostics convenience).
    pub fn toggle_mist(&mut self, hw: &mut impl ActuatorPort) {
        self.write_mist(hw, !self.mist_on);
    }

    // ── Device state ──────────────────────────────────────────

    /// Write-on-change: the relay output is only touched when the
    /// requested state differs from the cache.
    fn write_mist(&mut self, hw: &mut impl ActuatorPort, on: bool) {
        if on != self.mist_on {
            info!("turning mist {}", if on { "on" } else { "off" });
            hw.mist_write(on);
            self.mist_on = on;
        }
    }

    /// Fan writes are unconditional — no change guard.
    pub fn fan_on(&mut self, hw: &mut impl ActuatorPort) {
        info!("turning fan on");
        hw.fan_write_percent(100);
    }

    pub fn fan_off(&mut self, hw: &mut impl ActuatorPort) {
        info!("turning fan off");
        hw.fan_write_percent(0);
    }

    // ── Queries ───────────────────────────────────────────────

    /// Cached mist relay state.
    pub fn mist_on(&self) -> bool {
        self.mist_on
    }

    /// Whether a repeating cycle is currently active.
    pub fn has_repeating_cycle(&self) -> bool {
        self.repeating.is_some()
    }

    /// Outstanding scheduler tasks (poll task + timers).
    pub fn scheduled_tasks(&self) -> usize {
        self.scheduler.len()
    }
}
