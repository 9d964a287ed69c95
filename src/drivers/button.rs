//! Debounced button driver with click, multi-click, and long-press
//! detection.
//!
//! ## Hardware
//!
//! Active-low momentary switches with internal pull-ups.  The driver is
//! purely poll-driven: `tick()` is called from the scheduler's
//! zero-interval poll task and runs the debounce + gesture state machine
//! against the sampled pin level.
//!
//! ## Gesture detection
//!
//! | Gesture        | Condition                                           |
//! |----------------|-----------------------------------------------------|
//! | Click          | One press/release, no follow-up within click window |
//! | DoubleClick    | Two presses within the click window                 |
//! | MultiClick(n)  | n ≥ 3 presses within the click window               |
//! | LongPressStart | Hold ≥ long-press threshold (fires once)            |
//! | LongPressHeld  | Every poll while the hold continues                 |
//! | LongPressStop  | Release after a long press (fires once)             |
//!
//! The pin is abstracted behind `embedded_hal::digital::InputPin`, so the
//! same state machine runs against a real GPIO on target and an in-memory
//! pin in tests.

use embedded_hal::digital::InputPin;
use heapless::Vec;

use crate::app::ports::ButtonPanel;
use crate::config::SystemConfig;

/// Identity of the physical button a gesture originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonId {
    One,
    Two,
    Three,
}

/// Gesture events emitted after debounce + classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Click,
    DoubleClick,
    /// Three or more presses; carries the observed click count.
    MultiClick(u8),
    LongPressStart,
    LongPressHeld,
    LongPressStop,
}

/// Debounce and classification thresholds.
#[derive(Debug, Clone, Copy)]
pub struct ButtonTiming {
    pub debounce_ms: u32,
    pub click_window_ms: u32,
    pub long_press_ms: u32,
}

impl Default for ButtonTiming {
    fn default() -> Self {
        Self {
            debounce_ms: 50,
            click_window_ms: 400,
            long_press_ms: 800,
        }
    }
}

impl From<&SystemConfig> for ButtonTiming {
    fn from(cfg: &SystemConfig) -> Self {
        Self {
            debounce_ms: cfg.debounce_ms,
            click_window_ms: cfg.click_window_ms,
            long_press_ms: cfg.long_press_ms,
        }
    }
}

/// Internal state machine for gesture detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Pressed { since_ms: u64 },
    LongPressed,
    Released { at_ms: u64 },
}

pub struct Button<P> {
    pin: P,
    active_low: bool,
    timing: ButtonTiming,
    /// Last raw (un-debounced) pressed reading.
    raw_pressed: bool,
    /// Raw level held steady for at least the debounce time.
    stable_pressed: bool,
    last_edge_ms: u64,
    phase: Phase,
    clicks: u8,
}

impl<P: InputPin> Button<P> {
    pub fn new(pin: P, active_low: bool, timing: ButtonTiming) -> Self {
        Self {
            pin,
            active_low,
            timing,
            raw_pressed: false,
            stable_pressed: false,
            last_edge_ms: 0,
            phase: Phase::Idle,
            clicks: 0,
        }
    }

    /// Poll the pin and advance the gesture state machine.
    /// `now_ms` is the current monotonic time in milliseconds.
    /// Returns at most one classified gesture per call.
    pub fn tick(&mut self, now_ms: u64) -> Option<Gesture> {
        // A failed pin read counts as "released" — never as a press.
        let pressed = match self.pin.is_high() {
            Ok(level) => level != self.active_low,
            Err(_) => false,
        };

        if pressed != self.raw_pressed {
            self.raw_pressed = pressed;
            self.last_edge_ms = now_ms;
        }
        if now_ms.wrapping_sub(self.last_edge_ms) >= u64::from(self.timing.debounce_ms) {
            self.stable_pressed = self.raw_pressed;
        }

        match self.phase {
            Phase::Idle => {
                if self.stable_pressed {
                    self.phase = Phase::Pressed { since_ms: now_ms };
                }
                None
            }

            Phase::Pressed { since_ms } => {
                if !self.stable_pressed {
                    self.clicks = self.clicks.saturating_add(1);
                    self.phase = Phase::Released { at_ms: now_ms };
                    None
                } else if now_ms.wrapping_sub(since_ms) >= u64::from(self.timing.long_press_ms) {
                    // A hold swallows any clicks accumulated before it.
                    self.clicks = 0;
                    self.phase = Phase::LongPressed;
                    Some(Gesture::LongPressStart)
                } else {
                    None
                }
            }

            Phase::LongPressed => {
                if self.stable_pressed {
                    Some(Gesture::LongPressHeld)
                } else {
                    self.phase = Phase::Idle;
                    Some(Gesture::LongPressStop)
                }
            }

            Phase::Released { at_ms } => {
                if self.stable_pressed {
                    self.phase = Phase::Pressed { since_ms: now_ms };
                    None
                } else if now_ms.wrapping_sub(at_ms) >= u64::from(self.timing.click_window_ms) {
                    let n = core::mem::replace(&mut self.clicks, 0);
                    self.phase = Phase::Idle;
                    match n {
                        1 => Some(Gesture::Click),
                        2 => Some(Gesture::DoubleClick),
                        _ => Some(Gesture::MultiClick(n)),
                    }
                } else {
                    None
                }
            }
        }
    }

    /// True while the button is in the long-press phase.
    pub fn is_long_pressed(&self) -> bool {
        matches!(self.phase, Phase::LongPressed)
    }

    /// Presses accumulated in the current (still open) click sequence.
    pub fn clicks(&self) -> u8 {
        self.clicks
    }
}

// ───────────────────────────────────────────────────────────────
// Button panel — the three physical buttons behind one port
// ───────────────────────────────────────────────────────────────

/// The board's three pushbuttons, polled together.
pub struct Buttons<P1, P2, P3> {
    one: Button<P1>,
    two: Button<P2>,
    three: Button<P3>,
}

impl<P1, P2, P3> Buttons<P1, P2, P3> {
    pub fn new(one: Button<P1>, two: Button<P2>, three: Button<P3>) -> Self {
        Self { one, two, three }
    }
}

impl<P1: InputPin, P2: InputPin, P3: InputPin> ButtonPanel for Buttons<P1, P2, P3> {
    fn poll(&mut self, now_ms: u64) -> Vec<(ButtonId, Gesture), 3> {
        let mut out = Vec::new();
        if let Some(g) = self.one.tick(now_ms) {
            let _ = out.push((ButtonId::One, g));
        }
        if let Some(g) = self.two.tick(now_ms) {
            let _ = out.push((ButtonId::Two, g));
        }
        if let Some(g) = self.three.tick(now_ms) {
            let _ = out.push((ButtonId::Three, g));
        }
        out
    }

    fn is_long_pressed(&self, id: ButtonId) -> bool {
        match id {
            ButtonId::One => self.one.is_long_pressed(),
            ButtonId::Two => self.two.is_long_pressed(),
            ButtonId::Three => self.three.is_long_pressed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    /// In-memory pin whose level tests flip mid-scenario.
    #[derive(Clone)]
    struct TestPin(Rc<Cell<bool>>);

    impl TestPin {
        /// Released: high, because the buttons are active-low.
        fn released() -> Self {
            TestPin(Rc::new(Cell::new(true)))
        }
        fn press(&self) {
            self.0.set(false);
        }
        fn release(&self) {
            self.0.set(true);
        }
    }

    impl embedded_hal::digital::ErrorType for TestPin {
        type Error = core::convert::Infallible;
    }

    impl InputPin for TestPin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(self.0.get())
        }
        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.0.get())
        }
    }

    fn button(pin: TestPin) -> Button<TestPin> {
        Button::new(pin, true, ButtonTiming::default())
    }

    /// Tick from `from` to `to` (exclusive) in 10 ms steps, collecting
    /// emitted gestures.
    fn run(btn: &mut Button<TestPin>, from: u64, to: u64) -> std::vec::Vec<(u64, Gesture)> {
        let mut out = std::vec::Vec::new();
        let mut t = from;
        while t < to {
            if let Some(g) = btn.tick(t) {
                out.push((t, g));
            }
            t += 10;
        }
        out
    }

    #[test]
    fn no_events_without_press() {
        let mut btn = button(TestPin::released());
        assert!(run(&mut btn, 0, 1000).is_empty());
    }

    #[test]
    fn single_click() {
        let pin = TestPin::released();
        let mut btn = button(pin.clone());

        pin.press();
        assert!(run(&mut btn, 0, 150).is_empty());
        pin.release();
        let events = run(&mut btn, 150, 1000);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].1, Gesture::Click);
        // Emitted one click window after the debounced release.
        assert!(events[0].0 >= 150 + 400);
    }

    #[test]
    fn double_click() {
        let pin = TestPin::released();
        let mut btn = button(pin.clone());

        pin.press();
        run(&mut btn, 0, 100);
        pin.release();
        run(&mut btn, 100, 250);
        pin.press();
        run(&mut btn, 250, 350);
        pin.release();
        let events = run(&mut btn, 350, 1200);
        assert_eq!(events.iter().map(|e| e.1).collect::<std::vec::Vec<_>>(), vec![
            Gesture::DoubleClick
        ]);
    }

    #[test]
    fn triple_click_reports_count() {
        let pin = TestPin::released();
        let mut btn = button(pin.clone());

        let mut t = 0;
        for _ in 0..3 {
            pin.press();
            run(&mut btn, t, t + 100);
            pin.release();
            run(&mut btn, t + 100, t + 200);
            t += 200;
        }
        let events = run(&mut btn, t, t + 600);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].1, Gesture::MultiClick(3));
    }

    #[test]
    fn five_clicks_report_five() {
        let pin = TestPin::released();
        let mut btn = button(pin.clone());

        let mut t = 0;
        for _ in 0..5 {
            pin.press();
            run(&mut btn, t, t + 100);
            pin.release();
            run(&mut btn, t + 100, t + 200);
            t += 200;
        }
        let events = run(&mut btn, t, t + 600);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].1, Gesture::MultiClick(5));
    }

    #[test]
    fn long_press_start_held_stop() {
        let pin = TestPin::released();
        let mut btn = button(pin.clone());

        pin.press();
        let events = run(&mut btn, 0, 900);
        assert_eq!(events.first().map(|e| e.1), Some(Gesture::LongPressStart));
        assert!(events[1..].iter().all(|e| e.1 == Gesture::LongPressHeld));
        assert!(btn.is_long_pressed());

        pin.release();
        let events = run(&mut btn, 900, 1100);
        assert_eq!(events.last().map(|e| e.1), Some(Gesture::LongPressStop));
        assert!(!btn.is_long_pressed());

        // A long press produces no trailing click.
        assert!(run(&mut btn, 1100, 2000).is_empty());
    }

    #[test]
    fn glitch_shorter_than_debounce_is_ignored() {
        let pin = TestPin::released();
        let mut btn = button(pin.clone());

        run(&mut btn, 0, 100);
        pin.press();
        run(&mut btn, 100, 130); // 30 ms of noise, below the 50 ms debounce
        pin.release();
        assert!(run(&mut btn, 130, 1500).is_empty());
    }

    #[test]
    fn panel_reports_originating_button() {
        let p1 = TestPin::released();
        let p2 = TestPin::released();
        let p3 = TestPin::released();
        let mut panel = Buttons::new(
            button(p1.clone()),
            button(p2.clone()),
            button(p3.clone()),
        );

        p2.press();
        let mut t = 0;
        while t < 100 {
            assert!(panel.poll(t).is_empty());
            t += 10;
        }
        p2.release();
        let mut seen = std::vec::Vec::new();
        while t < 1000 {
            seen.extend(panel.poll(t));
            t += 10;
        }
        assert_eq!(seen, vec![(ButtonId::Two, Gesture::Click)]);
        assert!(!panel.is_long_pressed(ButtonId::Two));
    }
}
