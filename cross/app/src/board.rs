#![deny(unsafe_code)]

use crate::config::{ADDRESS_HIGH_BITS, MCU_XTAL_HZ, PCLK1_HZ, SYSCLK_HZ};
use crate::error::Error;
use crate::frame_timer::FrameTimer;

use i2c_slave::{Address, BitBangBus};
use rtt_target::rprintln;
use servo_pwm::CHANNELS;
use stm32f1xx_hal::gpio::{ErasedPin, Floating, Input, OpenDrain, Output, PinState, PushPull};
use stm32f1xx_hal::gpio::{PB6, PB7, PC13};
use stm32f1xx_hal::pac;
use stm32f1xx_hal::prelude::*;

pub type ServoPin = ErasedPin<Output<PushPull>>;
pub type Led = PC13<Output<PushPull>>;

type Scl = PB6<Input<Floating>>;
type Sda = PB7<Output<OpenDrain>>;
pub type Bus = BitBangBus<Sda, Scl>;

pub struct Board {
    pub servos: [ServoPin; CHANNELS],
    pub led: Led,
    pub bus: Bus,
    pub address: Address,
    pub frame_timer: FrameTimer,
}

impl Board {
    pub fn new(dp: pac::Peripherals) -> Result<Self, Error> {
        // Freeze the frame timer while the core is halted by the debugger.
        dp.DBGMCU.cr.modify(|_, w| w.dbg_tim2_stop().set_bit());

        // Configure the clock.
        let mut flash = dp.FLASH.constrain();
        let rcc = dp.RCC.constrain();
        let clocks = rcc
            .cfgr
            .use_hse(MCU_XTAL_HZ.Hz())
            .sysclk(SYSCLK_HZ.Hz())
            .pclk1(PCLK1_HZ.Hz())
            .freeze(&mut flash.acr);

        rprintln!(
            "sysclk {} Hz, pclk1 {} Hz",
            clocks.sysclk().raw(),
            clocks.pclk1().raw()
        );

        // Acquire the GPIO peripherals.
        let mut gpioa = dp.GPIOA.split();
        let mut gpiob = dp.GPIOB.split();
        let mut gpioc = dp.GPIOC.split();

        let servos = [
            gpioa.pa0.into_push_pull_output(&mut gpioa.crl).erase(),
            gpioa.pa1.into_push_pull_output(&mut gpioa.crl).erase(),
            gpioa.pa2.into_push_pull_output(&mut gpioa.crl).erase(),
            gpioa.pa3.into_push_pull_output(&mut gpioa.crl).erase(),
            gpioa.pa4.into_push_pull_output(&mut gpioa.crl).erase(),
            gpioa.pa5.into_push_pull_output(&mut gpioa.crl).erase(),
            gpioa.pa6.into_push_pull_output(&mut gpioa.crl).erase(),
            gpioa.pa7.into_push_pull_output(&mut gpioa.crl).erase(),
            gpiob.pb0.into_push_pull_output(&mut gpiob.crl).erase(),
            gpiob.pb1.into_push_pull_output(&mut gpiob.crl).erase(),
        ];

        // Active low, starts dark.
        let led = gpioc
            .pc13
            .into_push_pull_output_with_state(&mut gpioc.crh, PinState::High);

        // Straps pull to ground, an open strap reads as one.
        let straps = [
            gpiob.pb12.into_pull_up_input(&mut gpiob.crh).is_high(),
            gpiob.pb13.into_pull_up_input(&mut gpiob.crh).is_high(),
            gpiob.pb14.into_pull_up_input(&mut gpiob.crh).is_high(),
            gpiob.pb15.into_pull_up_input(&mut gpiob.crh).is_high(),
        ];
        let address = Address::new(strapped_address(ADDRESS_HIGH_BITS, straps))?;
        rprintln!("bus address {}", address);

        let scl = gpiob.pb6.into_floating_input(&mut gpiob.crl);
        let sda = gpiob.pb7.into_open_drain_output(&mut gpiob.crl);
        let bus = BitBangBus::new(sda, scl)?;

        let frame_timer = FrameTimer::new(dp.TIM2, &clocks)?;

        Ok(Board {
            servos,
            led,
            bus,
            address,
            frame_timer,
        })
    }
}

// PB12 is bit 0.
fn strapped_address(high_bits: u8, straps: [bool; 4]) -> u8 {
    straps
        .iter()
        .rev()
        .fold(high_bits, |address, &strap| (address << 1) | u8::from(strap))
}
