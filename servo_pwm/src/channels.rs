use crate::{Error, CHANNELS};

use core::sync::atomic::{AtomicU8, Ordering};

/// Index of a servo channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Channel(pub(crate) u8);

impl Channel {
    pub const fn new(index: usize) -> Result<Self, Error> {
        if index < CHANNELS {
            Ok(Channel(index as u8))
        } else {
            Err(Error::InvalidChannel(index))
        }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub fn all() -> impl Iterator<Item = Channel> {
        (0..CHANNELS as u8).map(Channel)
    }
}

impl TryFrom<usize> for Channel {
    type Error = Error;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Channel::new(index)
    }
}

/// Pulse width of every channel, in timer ticks. Zero turns the channel off.
///
/// Written from the main loop, read from the timer interrupt. Each channel is
/// its own atomic byte, so a reader sees either the old or the new value of a
/// channel and no lock is ever taken.
pub struct ChannelStore {
    values: [AtomicU8; CHANNELS],
}

impl ChannelStore {
    pub const fn new() -> Self {
        #[allow(clippy::declare_interior_mutable_const)]
        const OFF: AtomicU8 = AtomicU8::new(0);

        ChannelStore {
            values: [OFF; CHANNELS],
        }
    }

    pub fn get(&self, channel: Channel) -> u8 {
        self.values[channel.index()].load(Ordering::Relaxed)
    }

    pub fn set(&self, channel: Channel, value: u8) {
        self.values[channel.index()].store(value, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> [u8; CHANNELS] {
        let mut values = [0; CHANNELS];
        for channel in Channel::all() {
            values[channel.index()] = self.get(channel);
        }
        values
    }
}

impl Default for ChannelStore {
    fn default() -> Self {
        Self::new()
    }
}
