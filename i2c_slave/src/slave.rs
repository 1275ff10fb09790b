use crate::{Address, BusEvent, SlaveBus};

/// Receiver of the data bytes of an accepted frame.
pub trait Handler {
    /// The address byte matched. Called before any data byte is delivered.
    fn addressed(&mut self);

    /// Byte `index` of the current frame.
    fn write(&mut self, index: usize, value: u8);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum State {
    /// Lines not configured yet. Left on the first poll.
    Reset,
    WaitStart,
    AddressPhase,
    /// Acknowledge bit in flight. `next` is the index of the next data byte.
    Acknowledge { next: usize },
    DataPhase { index: usize },
}

/// How a pass through the state machine ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// STOP without an addressed transfer.
    Idle,
    /// The address byte did not match and was not acknowledged.
    Rejected(u8),
    /// Addressed transfer finished after this many data bytes.
    Received(usize),
}

/// Write-only slave receiving frames of up to `LEN` data bytes.
pub struct Slave<B, const LEN: usize> {
    bus: B,
    address: Address,
    state: State,
    received: usize,
}

impl<B: SlaveBus, const LEN: usize> Slave<B, LEN> {
    pub fn new(bus: B, address: Address) -> Self {
        Slave {
            bus,
            address,
            state: State::Reset,
            received: 0,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn state(&self) -> State {
        self.state
    }

    // Drop whatever transfer is in progress and wait for the next START.
    pub fn reset(&mut self) -> Result<(), B::Error> {
        self.bus.release()?;
        self.state = State::WaitStart;
        self.received = 0;

        Ok(())
    }

    /// Poll the bus once and advance the state machine.
    ///
    /// Returns `WouldBlock` while waiting on the bus and the outcome once a
    /// transfer is over. Data bytes are handed to `handler` as they arrive, so
    /// a transfer cut short by STOP leaves the bytes already written in place.
    pub fn poll<H: Handler>(&mut self, handler: &mut H) -> nb::Result<Outcome, B::Error> {
        if self.state == State::Reset {
            self.reset()?;
        }

        let event = self.bus.poll()?;

        match (self.state, event) {
            (_, BusEvent::Stop) => {
                let outcome = self.outcome();
                self.reset()?;
                Ok(outcome)
            }

            (State::Reset | State::WaitStart, BusEvent::Start) => {
                self.state = State::AddressPhase;
                Err(nb::Error::WouldBlock)
            }
            (State::Reset | State::WaitStart, _) => Err(nb::Error::WouldBlock),

            (State::AddressPhase, BusEvent::Byte(byte)) => {
                if !self.address.accepts(byte) {
                    self.reset()?;
                    return Ok(Outcome::Rejected(byte));
                }

                handler.addressed();
                self.bus.acknowledge()?;
                self.state = State::Acknowledge { next: 0 };
                Err(nb::Error::WouldBlock)
            }
            (State::AddressPhase, _) => Err(nb::Error::WouldBlock),

            (State::Acknowledge { .. } | State::DataPhase { .. }, BusEvent::Start) => {
                // Repeated START ends this transfer and addresses the bus again.
                let outcome = self.outcome();
                self.state = State::AddressPhase;
                self.received = 0;
                Ok(outcome)
            }

            (State::Acknowledge { next }, BusEvent::Acknowledged) => {
                if next < LEN {
                    self.state = State::DataPhase { index: next };
                    return Err(nb::Error::WouldBlock);
                }

                // Frame is full, further bytes are not acknowledged.
                let outcome = self.outcome();
                self.reset()?;
                Ok(outcome)
            }
            (State::Acknowledge { .. }, BusEvent::Byte(_)) => Err(nb::Error::WouldBlock),

            (State::DataPhase { index }, BusEvent::Byte(value)) => {
                handler.write(index, value);
                self.received += 1;
                self.bus.acknowledge()?;
                self.state = State::Acknowledge { next: index + 1 };
                Err(nb::Error::WouldBlock)
            }
            (State::DataPhase { .. }, BusEvent::Acknowledged) => Err(nb::Error::WouldBlock),
        }
    }

    fn outcome(&self) -> Outcome {
        match self.state {
            State::Acknowledge { .. } | State::DataPhase { .. } => Outcome::Received(self.received),
            _ => Outcome::Idle,
        }
    }
}
