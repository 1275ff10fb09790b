#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

mod address;
mod bitbang;
mod slave;

pub use address::{Address, InvalidAddress, BROADCAST};
pub use bitbang::BitBangBus;
pub use slave::{Handler, Outcome, Slave, State};

use core::fmt::{Display, Formatter};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Error<E> {
    Pin(E),
    NothingToAcknowledge,
}

impl<E> From<E> for Error<E> {
    fn from(pin_error: E) -> Self {
        Error::Pin(pin_error)
    }
}

impl<E: Display> Display for Error<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Pin(error) => error.fmt(f),
            Error::NothingToAcknowledge => f.pad("no received byte to acknowledge"),
        }
    }
}

/// Something the bus reported since the last poll.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BusEvent {
    Start,
    Stop,
    Byte(u8),
    /// The acknowledge bit requested by `SlaveBus::acknowledge` has been clocked out.
    Acknowledged,
}

/// Slave side of a two-wire bus, driven by polling. None of the calls block,
/// so callers can put their own timeout around `poll`.
pub trait SlaveBus {
    type Error;

    /// Stop taking part in the current transfer and release SDA.
    /// Traffic is ignored until the next START.
    fn release(&mut self) -> Result<(), Self::Error>;

    /// Sample the bus once. `WouldBlock` until there is an event to report.
    fn poll(&mut self) -> nb::Result<BusEvent, Self::Error>;

    /// Acknowledge the byte returned by the last poll.
    fn acknowledge(&mut self) -> Result<(), Self::Error>;
}
