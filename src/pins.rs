//! GPIO / peripheral pin assignments for the mistfan main board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Actuators
// ---------------------------------------------------------------------------

/// Fan power MOSFET, driven by LEDC PWM.  Doubles as speed control — the
/// fan only spins above roughly 70 % duty, so on/off maps to 100 %/0 %.
pub const FAN_GPIO: i32 = 5;

/// Mist solenoid power MOSFET (plain digital output).
pub const MIST_GPIO: i32 = 7;

// ---------------------------------------------------------------------------
// Pushbuttons (active-low, internal pull-up)
// ---------------------------------------------------------------------------

/// Pushbutton closest to the connector — primary mist control.
pub const BUTTON_ONE_GPIO: i32 = 9;
/// Middle pushbutton — fan control.
pub const BUTTON_TWO_GPIO: i32 = 11;
/// Pushbutton farthest from the connector — cancel / reset.
pub const BUTTON_THREE_GPIO: i32 = 12;

// ---------------------------------------------------------------------------
// PWM configuration
// ---------------------------------------------------------------------------

/// LEDC timer resolution (bits).  8-bit gives 0 – 255 duty levels.
pub const PWM_RESOLUTION_BITS: u32 = 8;
/// LEDC base frequency for the fan MOSFET (25 kHz — inaudible).
pub const FAN_PWM_FREQ_HZ: u32 = 25_000;
