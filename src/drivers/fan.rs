//! Fan driver (power MOSFET on an LEDC PWM channel).
//!
//! The MOSFET gate doubles as crude speed control — the fan only runs
//! above ~70 % duty, so normal operation is full-on/full-off.  Writes are
//! immediate and unconditional; there is no write-on-change guard here
//! (unlike the mist relay path).
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the real LEDC channel via hw_init helpers.
//! On host/test: tracks state in-memory only.

use log::debug;

use crate::drivers::hw_init;
use crate::pins;

/// Duty register value for `percent`, truncated the way the LEDC divider
/// rounds: `percent / 100 * (2^bits - 1)`.  50 % at 8 bits is 127.
pub fn duty_from_percent(percent: u8, resolution_bits: u32) -> u32 {
    let max_duty = (1u32 << resolution_bits) - 1;
    u32::from(percent.min(100)) * max_duty / 100
}

pub struct FanDriver {
    percent: u8,
}

impl Default for FanDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FanDriver {
    pub fn new() -> Self {
        Self { percent: 0 }
    }

    /// Set fan speed as a percentage of full duty.
    pub fn set_percent(&mut self, percent: u8) {
        let percent = percent.min(100);
        let duty = duty_from_percent(percent, pins::PWM_RESOLUTION_BITS);
        debug!("fan: channel {} PWM {}% (duty {})", hw_init::LEDC_CH_FAN, percent, duty);
        hw_init::ledc_set(hw_init::LEDC_CH_FAN, duty);
        self.percent = percent;
    }

    pub fn current_percent(&self) -> u8 {
        self.percent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duty_endpoints_at_8_bits() {
        assert_eq!(duty_from_percent(0, 8), 0);
        assert_eq!(duty_from_percent(100, 8), 255);
    }

    #[test]
    fn duty_truncates_half_scale() {
        // 127.5 truncates to 127.
        assert_eq!(duty_from_percent(50, 8), 127);
    }

    #[test]
    fn duty_clamps_over_100_percent() {
        assert_eq!(duty_from_percent(180, 8), 255);
    }

    #[test]
    fn duty_scales_with_resolution() {
        assert_eq!(duty_from_percent(100, 10), 1023);
        assert_eq!(duty_from_percent(50, 10), 511);
        assert_eq!(duty_from_percent(100, 1), 1);
    }

    #[test]
    fn driver_tracks_last_percent() {
        let mut fan = FanDriver::new();
        fan.set_percent(100);
        assert_eq!(fan.current_percent(), 100);
        fan.set_percent(0);
        assert_eq!(fan.current_percent(), 0);
    }
}
