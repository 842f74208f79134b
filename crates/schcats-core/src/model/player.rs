use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PlayerId {
    Zero = 0,
    One = 1,
}

impl PlayerId {
    pub const BOTH: [PlayerId; 2] = [PlayerId::Zero, PlayerId::One];

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(PlayerId::Zero),
            1 => Some(PlayerId::One),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn opponent(self) -> PlayerId {
        match self {
            PlayerId::Zero => PlayerId::One,
            PlayerId::One => PlayerId::Zero,
        }
    }

    /// Player who opens round `round_idx`; alternates by parity.
    pub const fn starting_for_round(round_idx: u32) -> PlayerId {
        if round_idx % 2 == 0 {
            PlayerId::Zero
        } else {
            PlayerId::One
        }
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.index())
    }
}
