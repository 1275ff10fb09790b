use crate::{BusEvent, Error, SlaveBus};

use embedded_hal::digital::v2::{InputPin, OutputPin};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Lines {
    sda: bool,
    scl: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AckSlot {
    // Byte delivered, waiting for acknowledge() or release().
    Undecided,
    // Acknowledge requested while SCL is still high after the eighth bit.
    Armed,
    // SDA pulled low, waiting for the ninth clock.
    Driving,
    // Ninth clock is high, SDA is released once it falls.
    Clocked,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Framing {
    // Not part of a transfer, only START and STOP are reported.
    Idle,
    Shifting { data: u8, bits: u8 },
    Ack(AckSlot),
}

/// Slave side of the bus on two plain GPIOs, with no hardware assist.
///
/// Both lines are sampled on every poll. SDA changing while SCL is high is a
/// START (falling) or STOP (rising); otherwise data bits are shifted in on SCL
/// rising edges, MSB first. The acknowledge bit is driven by pulling SDA low
/// from the falling edge after the eighth bit to the falling edge after the
/// ninth. SCL is only read, clock stretching is not supported.
///
/// The pins must be polled much faster than the bus clock: one missed SCL
/// edge loses the byte.
pub struct BitBangBus<SDA, SCL> {
    sda: SDA,
    scl: SCL,
    lines: Lines,
    framing: Framing,
}

impl<SDA, SCL, E> BitBangBus<SDA, SCL>
where
    SDA: InputPin<Error = E> + OutputPin<Error = E>,
    SCL: InputPin<Error = E>,
{
    /// SDA must be an open-drain output: high releases the line.
    pub fn new(mut sda: SDA, scl: SCL) -> Result<Self, Error<E>> {
        sda.set_high()?;
        let lines = Lines {
            sda: sda.is_high()?,
            scl: scl.is_high()?,
        };

        Ok(BitBangBus {
            sda,
            scl,
            lines,
            framing: Framing::Idle,
        })
    }

    fn sample(&self) -> Result<Lines, E> {
        Ok(Lines {
            scl: self.scl.is_high()?,
            sda: self.sda.is_high()?,
        })
    }
}

impl<SDA, SCL, E> SlaveBus for BitBangBus<SDA, SCL>
where
    SDA: InputPin<Error = E> + OutputPin<Error = E>,
    SCL: InputPin<Error = E>,
{
    type Error = Error<E>;

    fn release(&mut self) -> Result<(), Self::Error> {
        self.sda.set_high()?;
        self.framing = Framing::Idle;

        Ok(())
    }

    fn poll(&mut self) -> nb::Result<BusEvent, Self::Error> {
        let now = self.sample().map_err(Error::Pin)?;
        let before = core::mem::replace(&mut self.lines, now);

        if before.scl && now.scl && before.sda != now.sda {
            self.sda.set_high().map_err(Error::Pin)?;

            return if now.sda {
                self.framing = Framing::Idle;
                Ok(BusEvent::Stop)
            } else {
                self.framing = Framing::Shifting { data: 0, bits: 0 };
                Ok(BusEvent::Start)
            };
        }

        let rising = !before.scl && now.scl;
        let falling = before.scl && !now.scl;

        match self.framing {
            Framing::Idle => Err(nb::Error::WouldBlock),

            Framing::Shifting { data, bits } => {
                if !rising {
                    return Err(nb::Error::WouldBlock);
                }

                let data = (data << 1) | u8::from(now.sda);
                let bits = bits + 1;
                if bits < 8 {
                    self.framing = Framing::Shifting { data, bits };
                    return Err(nb::Error::WouldBlock);
                }

                self.framing = Framing::Ack(AckSlot::Undecided);
                Ok(BusEvent::Byte(data))
            }

            Framing::Ack(AckSlot::Undecided) => {
                if rising {
                    // Ninth clock came without a decision: the controller saw a NACK.
                    self.framing = Framing::Idle;
                }
                Err(nb::Error::WouldBlock)
            }

            Framing::Ack(AckSlot::Armed) => {
                if !now.scl {
                    self.sda.set_low().map_err(Error::Pin)?;
                    self.framing = Framing::Ack(AckSlot::Driving);
                }
                Err(nb::Error::WouldBlock)
            }

            Framing::Ack(AckSlot::Driving) => {
                if rising {
                    self.framing = Framing::Ack(AckSlot::Clocked);
                }
                Err(nb::Error::WouldBlock)
            }

            Framing::Ack(AckSlot::Clocked) => {
                if !falling {
                    return Err(nb::Error::WouldBlock);
                }

                self.sda.set_high().map_err(Error::Pin)?;
                self.framing = Framing::Shifting { data: 0, bits: 0 };
                Ok(BusEvent::Acknowledged)
            }
        }
    }

    fn acknowledge(&mut self) -> Result<(), Self::Error> {
        if self.framing != Framing::Ack(AckSlot::Undecided) {
            return Err(Error::NothingToAcknowledge);
        }

        if self.lines.scl {
            self.framing = Framing::Ack(AckSlot::Armed);
        } else {
            // SCL already fell after the eighth bit.
            self.sda.set_low()?;
            self.framing = Framing::Ack(AckSlot::Driving);
        }

        Ok(())
    }
}
