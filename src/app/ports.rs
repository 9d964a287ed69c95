//! Port traits — the boundary between the gesture/scheduling core and
//! the outside world.
//!
//! ```text
//!   Buttons ──▶ ButtonPanel ──▶ MistFanService ──▶ ActuatorPort ──▶ HardwareAdapter
//! ```
//!
//! The [`MistFanService`](super::service::MistFanService) consumes these
//! via generics, so the core never touches hardware directly and runs
//! unchanged against mock ports under a simulated clock.

use heapless::Vec;

use crate::drivers::button::{ButtonId, Gesture};

// ───────────────────────────────────────────────────────────────
// Actuator port (domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the service calls this to command the outputs.
///
/// Writes are fire-and-forget; there is no status to report back.  The
/// mist write-on-change policy is the *caller's* job — implementations
/// must pass every call straight through.
pub trait ActuatorPort {
    /// Drive the mist solenoid: `true` opens the valve.
    fn mist_write(&mut self, on: bool);

    /// Set fan duty as a percentage of full scale (0–100).
    fn fan_write_percent(&mut self, percent: u8);
}

// ───────────────────────────────────────────────────────────────
// Button panel port (hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port over the three gesture detectors.
///
/// `poll` runs each detector's debounce/gesture state machine once and
/// returns whatever gestures completed this tick (at most one per
/// button).  `is_long_pressed` is queried by the repeating mist cycle to
/// avoid fighting a manual hold.
pub trait ButtonPanel {
    fn poll(&mut self, now_ms: u64) -> Vec<(ButtonId, Gesture), 3>;

    fn is_long_pressed(&self, id: ButtonId) -> bool;
}
