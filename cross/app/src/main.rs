#![no_std]
#![no_main]

mod board;
mod config;
mod error;
mod frame_timer;

use panic_probe as _;
// use panic_halt as _;

use crate::board::{Board, Bus, Led, ServoPin};
use crate::config::{ACTIVITY_TICKS, BOOT_BLINK_TICKS};
use crate::frame_timer::FrameTimer;

use core::cell::RefCell;
use cortex_m_rt::entry;
use critical_section::Mutex;
use i2c_slave::{Outcome, Slave};
use rtt_target::{rprintln, rtt_init_print};
use servo_pwm::{Activity, ChannelStore, Engine, Half, Receiver, CHANNELS};
use stm32f1xx_hal::pac;
use stm32f1xx_hal::pac::interrupt;

type FrameEngine = Engine<'static, ServoPin, Led, FrameTimer>;

static STORE: ChannelStore = ChannelStore::new();
static ACTIVITY: Activity<Led> = Activity::new();
static ENGINE: Mutex<RefCell<Option<FrameEngine>>> = Mutex::new(RefCell::new(None));

#[entry]
fn main() -> ! {
    rtt_init_print!();
    rprintln!("servo controller, {} channels", CHANNELS);

    let dp = pac::Peripherals::take().unwrap();
    let board = match Board::new(dp) {
        Ok(board) => board,
        Err(error) => panic!("board init failed: {:?}", error),
    };

    ACTIVITY.attach(board.led, BOOT_BLINK_TICKS);

    let mut engine = Engine::new(&STORE, &ACTIVITY, board.servos, board.frame_timer);
    critical_section::with(|cs| {
        engine.comparator().enable_interrupt();
        ENGINE.borrow_ref_mut(cs).replace(engine);
    });

    let mut slave: Slave<Bus, CHANNELS> = Slave::new(board.bus, board.address);
    let mut receiver = Receiver::new(&STORE, &ACTIVITY, ACTIVITY_TICKS);
    let mut frames: u32 = 0;

    rprintln!("listening at {}", slave.address());

    // Nothing else to do: the bus is sampled as fast as the core allows.
    loop {
        match slave.poll(&mut receiver) {
            Ok(Outcome::Received(_)) => frames = frames.wrapping_add(1),
            Ok(Outcome::Idle | Outcome::Rejected(_)) | Err(nb::Error::WouldBlock) => {}
            Err(nb::Error::Other(error)) => {
                rprintln!("bus error {:?} after {} frames", error, frames);
                if let Err(error) = slave.reset() {
                    rprintln!("bus reset failed {:?}", error);
                }
            }
        }
    }
}

#[interrupt]
fn TIM2() {
    critical_section::with(|cs| {
        let mut slot = ENGINE.borrow_ref_mut(cs);
        let Some(engine) = slot.as_mut() else {
            return;
        };

        let events = engine.comparator().take_events();
        // A compare pending together with the overflow belongs to the round that just ended.
        if events.compare_first {
            engine.on_compare(Half::First);
        }
        if events.compare_second {
            engine.on_compare(Half::Second);
        }
        if events.overflow {
            engine.on_overflow();
        }
    });
}
