//! Hardware adapter — bridges the real actuators to the port boundary.
//!
//! Owns the mist valve and fan drivers, exposing them through
//! [`ActuatorPort`].  Writes pass straight through: the write-on-change
//! policy belongs to the service, not this layer.  On non-espidf targets
//! the underlying drivers use cfg-gated simulation stubs.

use crate::app::ports::ActuatorPort;
use crate::drivers::fan::FanDriver;
use crate::drivers::mist::MistValve;

/// Concrete adapter that combines both actuators behind the port trait.
pub struct HardwareAdapter {
    mist: MistValve,
    fan: FanDriver,
}

impl HardwareAdapter {
    pub fn new(mist: MistValve, fan: FanDriver) -> Self {
        Self { mist, fan }
    }

    /// Last level driven onto the mist pin (diagnostics).
    pub fn mist_is_open(&self) -> bool {
        self.mist.is_open()
    }

    /// Last fan duty percentage written (diagnostics).
    pub fn fan_percent(&self) -> u8 {
        self.fan.current_percent()
    }
}

impl ActuatorPort for HardwareAdapter {
    fn mist_write(&mut self, on: bool) {
        self.mist.write(on);
    }

    fn fan_write_percent(&mut self, percent: u8) {
        self.fan.set_percent(percent);
    }
}
