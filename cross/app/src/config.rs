#![deny(unsafe_code)]

use fugit::TimerDurationU32;

pub const MCU_XTAL_HZ: u32 = 8_000_000;
pub const SYSCLK_HZ: u32 = 72_000_000;
pub const PCLK1_HZ: u32 = 36_000_000;

//-----------------------------------------------------------------------------

// Frame timer tick, 16 us. A channel value is a pulse width in these ticks.
pub const TICK_HZ: u32 = 62_500;
// One round per timer period. Five rounds make a 20.48 ms servo frame.
pub const ROUND: TimerDurationU32<TICK_HZ> = TimerDurationU32::from_ticks(256);

//-----------------------------------------------------------------------------

// Address bits 6..4. Bits 3..0 come from the straps on PB15..PB12.
pub const ADDRESS_HIGH_BITS: u8 = 0b000;

//-----------------------------------------------------------------------------

// Activity LED on-times, in rounds.
pub const ACTIVITY_TICKS: u8 = 20;
pub const BOOT_BLINK_TICKS: u8 = 100;
