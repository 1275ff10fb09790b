use core::fmt::{Display, Formatter};

/// Address byte every slave answers to.
pub const BROADCAST: u8 = 0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InvalidAddress(pub u8);

impl Display for InvalidAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "address {:#04x} does not fit in 7 bits", self.0)
    }
}

/// 7-bit slave address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(u8);

impl Address {
    pub const fn new(address: u8) -> Result<Self, InvalidAddress> {
        if address > 0x7f {
            Err(InvalidAddress(address))
        } else {
            Ok(Address(address))
        }
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    // Address as it appears on the wire: shifted left, write direction.
    pub const fn wire(self) -> u8 {
        self.0 << 1
    }

    // The whole byte is compared, so read requests to this address are not accepted.
    pub const fn accepts(self, byte: u8) -> bool {
        byte == BROADCAST || byte == self.wire()
    }
}

impl TryFrom<u8> for Address {
    type Error = InvalidAddress;

    fn try_from(address: u8) -> Result<Self, Self::Error> {
        Address::new(address)
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}
