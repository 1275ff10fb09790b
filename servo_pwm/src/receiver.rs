use crate::{Activity, Channel, ChannelStore};

use core::convert::Infallible;
use embedded_hal::digital::v2::OutputPin;
use i2c_slave::Handler;

/// Applies received frames to the channel store.
///
/// Byte `i` of a frame is the pulse width of channel `i`, and each byte is
/// stored as soon as it is acknowledged. A short frame leaves the remaining
/// channels untouched.
pub struct Receiver<'a, L> {
    channels: &'a ChannelStore,
    activity: &'a Activity<L>,
    on_ticks: u8,
}

impl<'a, L> Receiver<'a, L> {
    pub fn new(channels: &'a ChannelStore, activity: &'a Activity<L>, on_ticks: u8) -> Self {
        Receiver {
            channels,
            activity,
            on_ticks,
        }
    }
}

impl<'a, L: OutputPin<Error = Infallible>> Handler for Receiver<'a, L> {
    fn addressed(&mut self) {
        self.activity.trigger(self.on_ticks);
    }

    fn write(&mut self, index: usize, value: u8) {
        // Past the last channel: dropped, the bus layer will not ack it anyway.
        if let Ok(channel) = Channel::new(index) {
            self.channels.set(channel, value);
        }
    }
}
