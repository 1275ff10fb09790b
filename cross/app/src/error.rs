#![deny(unsafe_code)]

use core::convert::Infallible;
use i2c_slave::InvalidAddress;

#[derive(Debug)]
pub enum Error {
    Timer(stm32f1xx_hal::timer::Error),
    Bus(i2c_slave::Error<Infallible>),
    Address(InvalidAddress),
}

impl From<stm32f1xx_hal::timer::Error> for Error {
    fn from(timer_error: stm32f1xx_hal::timer::Error) -> Self {
        Error::Timer(timer_error)
    }
}

impl From<i2c_slave::Error<Infallible>> for Error {
    fn from(bus_error: i2c_slave::Error<Infallible>) -> Self {
        Error::Bus(bus_error)
    }
}

impl From<InvalidAddress> for Error {
    fn from(address_error: InvalidAddress) -> Self {
        Error::Address(address_error)
    }
}
