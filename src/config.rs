//! System configuration parameters.
//!
//! All tunable parameters for the mistfan controller.  Values are
//! compile-time defaults; there is no persistent store on this board.

use serde::{Deserialize, Serialize};

/// One mist on/off cycle.  `off_ms == 0` degenerates to back-to-back
/// pulses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MistCycle {
    /// How long the mist solenoid stays open per pulse (milliseconds).
    pub on_ms: u32,
    /// Pause between pulses (milliseconds).
    pub off_ms: u32,
}

impl MistCycle {
    /// Full period of the repeating cycle.
    pub fn period_ms(&self) -> u32 {
        self.on_ms + self.off_ms
    }
}

/// Core system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Mist gestures ---
    /// Single-click pulse duration (milliseconds).
    pub pulse_ms: u32,
    /// Button One double-click: relaxed cycle.
    pub cycle_double_click: MistCycle,
    /// Button One triple-click: short pulses, twice as often.
    pub cycle_triple_click: MistCycle,
    /// Button One 4-click: long pulses.
    pub cycle_quad_click: MistCycle,
    /// Button One 5-click: long pulses, twice as often.
    pub cycle_quint_click: MistCycle,

    // --- Button timing ---
    /// Contact-bounce settle time (milliseconds).
    pub debounce_ms: u32,
    /// Window after a release in which another press extends the click
    /// sequence (milliseconds).
    pub click_window_ms: u32,
    /// Hold time before a press becomes a long press (milliseconds).
    pub long_press_ms: u32,

    // --- Power-down ---
    /// If no button is pressed for this long, fan and mist are turned off
    /// (milliseconds).  Sleep is not implemented.
    pub idle_timeout_ms: u64,

    // --- Diagnostics ---
    /// Enable per-gesture debug logging.
    pub debug_logging: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Mist gestures
            pulse_ms: 1000,
            cycle_double_click: MistCycle { on_ms: 1000, off_ms: 30_000 },
            cycle_triple_click: MistCycle { on_ms: 1000, off_ms: 15_000 },
            cycle_quad_click: MistCycle { on_ms: 3000, off_ms: 30_000 },
            cycle_quint_click: MistCycle { on_ms: 3000, off_ms: 15_000 },

            // Button timing
            debounce_ms: 50,
            click_window_ms: 400,
            long_press_ms: 800,

            // Power-down: 2 hours
            idle_timeout_ms: 2 * 60 * 60 * 1000,

            debug_logging: false,
        }
    }
}
