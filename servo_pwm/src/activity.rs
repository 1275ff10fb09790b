use crate::drive;

use core::cell::RefCell;
use core::convert::Infallible;
use critical_section::Mutex;
use embedded_hal::digital::v2::OutputPin;

struct Indicator<P> {
    led: Option<P>,
    countdown: u8,
}

impl<P: OutputPin<Error = Infallible>> Indicator<P> {
    // LED is active low.
    fn show(&mut self) {
        let on = self.countdown > 0;
        if let Some(led) = self.led.as_mut() {
            drive(led, !on);
        }
    }
}

/// Activity LED, lit for a number of frame ticks after each addressed transfer.
///
/// Triggered from the main loop and counted down from the timer interrupt.
/// Both only hold the critical section for a counter update and one pin write.
pub struct Activity<P> {
    state: Mutex<RefCell<Indicator<P>>>,
}

impl<P> Activity<P> {
    pub const fn new() -> Self {
        Activity {
            state: Mutex::new(RefCell::new(Indicator {
                led: None,
                countdown: 0,
            })),
        }
    }
}

impl<P> Default for Activity<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: OutputPin<Error = Infallible>> Activity<P> {
    // Take ownership of the LED and light it for `ticks`.
    pub fn attach(&self, led: P, ticks: u8) {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            state.led = Some(led);
            state.countdown = ticks;
            state.show();
        });
    }

    pub fn detach(&self) -> Option<P> {
        critical_section::with(|cs| self.state.borrow_ref_mut(cs).led.take())
    }

    // Restart the countdown. Zero switches the LED off right away.
    pub fn trigger(&self, ticks: u8) {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            state.countdown = ticks;
            state.show();
        });
    }

    /// One frame tick. Returns true on the tick that switched the LED off.
    pub fn tick(&self) -> bool {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            if state.countdown == 0 {
                return false;
            }

            state.countdown -= 1;
            if state.countdown > 0 {
                return false;
            }

            state.show();
            true
        })
    }

    pub fn remaining(&self) -> u8 {
        critical_section::with(|cs| self.state.borrow_ref(cs).countdown)
    }

    pub fn is_on(&self) -> bool {
        self.remaining() > 0
    }
}
