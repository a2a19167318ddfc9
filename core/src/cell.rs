use serde::{Deserialize, Serialize};

/// What the engine knows about a single board position.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellStatus {
    Covered,
    /// Believed to be a mine. Never revealed afterwards.
    Flagged,
    /// Revealed with the number of mined neighbors.
    Revealed(u8),
    /// Sentinel for out-of-bounds lookups.
    Invalid,
}

impl CellStatus {
    pub const fn is_covered(self) -> bool {
        matches!(self, Self::Covered)
    }

    pub const fn is_flagged(self) -> bool {
        matches!(self, Self::Flagged)
    }

    pub const fn is_revealed(self) -> bool {
        matches!(self, Self::Revealed(_))
    }

    pub const fn is_unrevealed(self) -> bool {
        matches!(self, Self::Covered | Self::Flagged)
    }

    pub const fn revealed_count(self) -> Option<u8> {
        match self {
            Self::Revealed(count) => Some(count),
            _ => None,
        }
    }

    pub(crate) const fn symbol(self) -> char {
        match self {
            Self::Covered => '#',
            Self::Flagged => 'F',
            Self::Revealed(0) => '.',
            Self::Revealed(count) if count <= 8 => (b'0' + count) as char,
            Self::Revealed(_) | Self::Invalid => '?',
        }
    }
}

impl Default for CellStatus {
    fn default() -> Self {
        Self::Covered
    }
}
