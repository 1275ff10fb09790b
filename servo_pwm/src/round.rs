use crate::{Channel, Error, ROUNDS};

/// Which pin of a round's pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Half {
    First,
    Second,
}

/// One timer period, servicing channels `i` and `i + ROUNDS`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Round(u8);

impl Round {
    pub const FIRST: Round = Round(0);
    pub const LAST: Round = Round(ROUNDS as u8 - 1);

    pub const fn new(index: usize) -> Result<Self, Error> {
        if index < ROUNDS {
            Ok(Round(index as u8))
        } else {
            Err(Error::InvalidRound(index))
        }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn next(self) -> Round {
        if self.0 == Self::LAST.0 {
            Self::FIRST
        } else {
            Round(self.0 + 1)
        }
    }

    pub const fn channel(self, half: Half) -> Channel {
        match half {
            Half::First => Channel(self.0),
            Half::Second => Channel(self.0 + ROUNDS as u8),
        }
    }
}
