//! mistfan firmware — main entry point.
//!
//! Three pushbuttons, one mist solenoid, one fan, and a single
//! cooperative poll loop:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                  Adapters (outer ring)                     │
//! │                                                            │
//! │  HardwareAdapter        Esp32TimeAdapter    Buttons        │
//! │  (ActuatorPort)         (monotonic clock)   (ButtonPanel)  │
//! │                                                            │
//! │  ─────────────── Port Trait Boundary ──────────────────    │
//! │                                                            │
//! │  ┌──────────────────────────────────────────────────────┐  │
//! │  │            MistFanService (pure logic)               │  │
//! │  │  Scheduler · Gesture Dispatch · Mist Cycle · Idle    │  │
//! │  └──────────────────────────────────────────────────────┘  │
//! └────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Module declarations ───────────────────────────────────────
pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod idle;
pub mod pins;
pub mod scheduler;

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use log::info;

use adapters::hardware::HardwareAdapter;
use adapters::time::Esp32TimeAdapter;
use app::service::MistFanService;
use config::SystemConfig;
use drivers::button::{Button, ButtonTiming, Buttons};
use drivers::fan::FanDriver;
use drivers::mist::MistValve;

#[cfg(target_os = "espidf")]
use esp_idf_hal::gpio::{AnyIOPin, PinDriver, Pull};

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    #[cfg(target_os = "espidf")]
    {
        esp_idf_svc::sys::link_patches();
        esp_idf_logger::init()?;
    }

    let config = SystemConfig::default();
    log::set_max_level(if config.debug_logging {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    });

    info!("mistfan v{} starting", env!("CARGO_PKG_VERSION"));

    // ── 2. Initialise hardware peripherals ────────────────────
    if let Err(e) = drivers::hw_init::init_peripherals() {
        // Peripheral init failure is critical — log and halt.
        log::error!("HAL init failed: {} — halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }

    // ── 3. Button pins (pull-up, active-low) ──────────────────
    let timing = ButtonTiming::from(&config);

    #[cfg(target_os = "espidf")]
    let mut buttons = {
        // SAFETY: these GPIO numbers are valid IO pins on the ESP32-S3
        // and are claimed exactly once, here, before the poll loop.
        let mut one = PinDriver::input(unsafe { AnyIOPin::new(pins::BUTTON_ONE_GPIO) })?;
        one.set_pull(Pull::Up)?;
        let mut two = PinDriver::input(unsafe { AnyIOPin::new(pins::BUTTON_TWO_GPIO) })?;
        two.set_pull(Pull::Up)?;
        let mut three = PinDriver::input(unsafe { AnyIOPin::new(pins::BUTTON_THREE_GPIO) })?;
        three.set_pull(Pull::Up)?;

        Buttons::new(
            Button::new(one, true, timing),
            Button::new(two, true, timing),
            Button::new(three, true, timing),
        )
    };

    #[cfg(not(target_os = "espidf"))]
    let mut buttons = Buttons::new(
        Button::new(sim::OpenPin, true, timing),
        Button::new(sim::OpenPin, true, timing),
        Button::new(sim::OpenPin, true, timing),
    );

    // ── 4. Adapters + service ─────────────────────────────────
    let mut hw = HardwareAdapter::new(MistValve::new(), FanDriver::new());
    let time = Esp32TimeAdapter::new();

    let mut service = MistFanService::new(config);
    service.start(time.uptime_ms());

    // The fan runs from power-on; gestures take it from there.
    service.fan_on(&mut hw);

    info!("setup complete, entering poll loop");

    // ── 5. Poll loop ──────────────────────────────────────────
    loop {
        let now = time.uptime_ms();
        service.tick(now, &mut hw, &mut buttons);
        // Yield between passes so FreeRTOS housekeeping (and the host
        // OS, in simulation) gets a slice.
        std::thread::sleep(std::time::Duration::from_millis(1));
    }
}

// ── Host simulation stubs ─────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod sim {
    //! Always-released input pin for host simulation runs.

    pub struct OpenPin;

    impl embedded_hal::digital::ErrorType for OpenPin {
        type Error = core::convert::Infallible;
    }

    impl embedded_hal::digital::InputPin for OpenPin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(true)
        }
        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(false)
        }
    }
}
