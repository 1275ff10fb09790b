#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

//! Ten hobby servos on one timer.
//!
//! Channels are serviced in five rounds of two (channel `i` and `i + 5`).
//! Each round is one period of the timer: both pins of the pair go high on
//! overflow and each is pulled low by its own compare match, so a channel
//! value is its pulse width in timer ticks. Five rounds make one servo frame.

mod activity;
mod channels;
mod engine;
mod receiver;
mod round;

pub use activity::Activity;
pub use channels::{Channel, ChannelStore};
pub use engine::{Comparator, Engine};
pub use receiver::Receiver;
pub use round::{Half, Round};

use core::convert::Infallible;
use core::fmt::{Display, Formatter};
use embedded_hal::digital::v2::OutputPin;

pub const CHANNELS: usize = 10;
pub const ROUNDS: usize = CHANNELS / 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Error {
    InvalidChannel(usize),
    InvalidRound(usize),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match *self {
            Error::InvalidChannel(index) => write!(f, "no servo channel {}", index),
            Error::InvalidRound(index) => write!(f, "no round {}", index),
        }
    }
}

fn drive<P: OutputPin<Error = Infallible>>(pin: &mut P, high: bool) {
    let result = if high { pin.set_high() } else { pin.set_low() };
    result.unwrap_or_else(|never| match never {})
}
