use crate::config::{ROUND, TICK_HZ};
use crate::error::Error;

use cortex_m::peripheral::NVIC;
use servo_pwm::Comparator;
use stm32f1xx_hal::pac::{tim2, Interrupt, TIM2};
use stm32f1xx_hal::rcc::Clocks;
use stm32f1xx_hal::timer::{Counter, Event, TimerExt};

/// Interrupt flags taken by one pass of the handler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Events {
    pub overflow: bool,
    pub compare_first: bool,
    pub compare_second: bool,
}

/// TIM2 as the frame timer. One period is one round; CC1 and CC2 end the
/// pulses of the first and second pin of the pair. Compare outputs are not
/// connected to pins, only their interrupt flags are used.
pub struct FrameTimer {
    counter: Counter<TIM2, TICK_HZ>,
}

impl FrameTimer {
    pub fn new(tim: TIM2, clocks: &Clocks) -> Result<Self, Error> {
        let mut counter = tim.counter::<TICK_HZ>(clocks);
        counter.start(ROUND)?;

        // Compare values written during a round are loaded at the next update.
        let regs = registers();
        regs.ccmr1_output()
            .modify(|_, w| w.oc1pe().set_bit().oc2pe().set_bit());
        regs.dier.modify(|_, w| w.cc1ie().set_bit().cc2ie().set_bit());

        Ok(FrameTimer { counter })
    }

    // Start taking interrupts. Flags raised before this point are dropped.
    pub fn enable_interrupt(&mut self) {
        self.counter.listen(Event::Update);
        self.take_events();
        unsafe { NVIC::unmask(Interrupt::TIM2) };
    }

    pub fn take_events(&mut self) -> Events {
        let regs = registers();
        let sr = regs.sr.read();
        let events = Events {
            overflow: sr.uif().bit_is_set(),
            compare_first: sr.cc1if().bit_is_set(),
            compare_second: sr.cc2if().bit_is_set(),
        };

        // Flags are cleared by writing zero, so a flag raised after the read survives.
        regs.sr.write(|w| {
            w.uif()
                .bit(!events.overflow)
                .cc1if()
                .bit(!events.compare_first)
                .cc2if()
                .bit(!events.compare_second)
        });

        events
    }
}

impl Comparator for FrameTimer {
    fn arm(&mut self, first: u8, second: u8) {
        let regs = registers();
        regs.ccr[0].write(|w| w.ccr().bits(first.into()));
        regs.ccr[1].write(|w| w.ccr().bits(second.into()));
    }
}

// The HAL has no compare-only mode, so the compare channels are driven
// through the registers. TIM2 itself is owned by `counter`.
fn registers() -> &'static tim2::RegisterBlock {
    unsafe { &*TIM2::ptr() }
}
