//! Mist solenoid valve driver (power MOSFET on a plain GPIO).
//!
//! A dumb actuator: the write-on-change policy lives in the service's
//! device-state cache, not here.  This driver just pushes the requested
//! level to the pin and remembers it for queries.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives the real GPIO via hw_init helpers.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init;
use crate::pins;

pub struct MistValve {
    open: bool,
}

impl Default for MistValve {
    fn default() -> Self {
        Self::new()
    }
}

impl MistValve {
    pub fn new() -> Self {
        Self { open: false }
    }

    /// Drive the solenoid: `true` opens the valve (mist on).
    pub fn write(&mut self, open: bool) {
        hw_init::gpio_write(pins::MIST_GPIO, open);
        self.open = open;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}
