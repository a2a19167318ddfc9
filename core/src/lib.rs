use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::ops::Index;

pub use agent::*;
pub use analysis::*;
pub use board::*;
pub use budget::*;
pub use cell::*;
pub use config::*;
pub use deduce::*;
pub use error::*;
pub use generator::*;
pub use host::*;
pub use types::*;

mod agent;
mod analysis;
mod board;
mod budget;
mod cell;
mod config;
mod deduce;
mod error;
mod generator;
mod host;
mod types;

/// Host feedback acknowledging a flag action.
pub const FLAG_ACK: i32 = -1;

/// One move handed back to the host.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Reveal(Coord2),
    Flag(Coord2),
    Stop,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    Reveal,
    Flag,
    Stop,
}

impl Action {
    pub const fn kind(self) -> ActionKind {
        match self {
            Self::Reveal(_) => ActionKind::Reveal,
            Self::Flag(_) => ActionKind::Flag,
            Self::Stop => ActionKind::Stop,
        }
    }

    pub const fn coords(self) -> Option<Coord2> {
        match self {
            Self::Reveal(coords) | Self::Flag(coords) => Some(coords),
            Self::Stop => None,
        }
    }

    /// Numeric form `(kind, x, y)`; stopping is `(Stop, -1, -1)`.
    pub fn to_wire(self) -> (ActionKind, i32, i32) {
        match self.coords() {
            Some((x, y)) => (self.kind(), x.into(), y.into()),
            None => (self.kind(), -1, -1),
        }
    }
}

/// Decoded host answer to the previous action.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Feedback {
    Revealed(u8),
    FlagAck,
}

impl TryFrom<i32> for Feedback {
    type Error = EngineError;

    fn try_from(raw: i32) -> Result<Self> {
        match raw {
            0..=8 => Ok(Self::Revealed(raw as u8)),
            FLAG_ACK => Ok(Self::FlagAck),
            _ => Err(EngineError::InvalidFeedback(raw)),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub size: Coord2,
    pub mines: CellCount,
}

impl GameConfig {
    pub const fn new_unchecked(size: Coord2, mines: CellCount) -> Self {
        Self { size, mines }
    }

    pub fn new((rows, cols): Coord2, mines: CellCount) -> Self {
        let rows = rows.clamp(1, Coord::MAX);
        let cols = cols.clamp(1, Coord::MAX);
        let mines = mines.min(mult(rows, cols));
        Self::new_unchecked((rows, cols), mines)
    }

    pub const fn beginner() -> Self {
        Self::new_unchecked((9, 9), 10)
    }

    pub const fn intermediate() -> Self {
        Self::new_unchecked((16, 16), 40)
    }

    pub const fn expert() -> Self {
        Self::new_unchecked((16, 30), 99)
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }
}

/// Where the mines are. Only the host knows this.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MineLayout {
    mine_mask: Array2<bool>,
    mine_count: CellCount,
}

impl MineLayout {
    pub fn from_mine_mask(mine_mask: Array2<bool>) -> Self {
        let mine_count = mine_mask
            .iter()
            .filter(|&&is_mine| is_mine)
            .count()
            .try_into()
            .unwrap();
        Self {
            mine_mask,
            mine_count,
        }
    }

    pub fn from_mine_coords(size: Coord2, mine_coords: &[Coord2]) -> Result<Self> {
        let mut mine_mask: Array2<bool> = Array2::default(size.to_nd_index());

        for &coords in mine_coords {
            if !in_bounds(coords, size) {
                return Err(EngineError::InvalidCoords);
            }
            mine_mask[coords.to_nd_index()] = true;
        }

        Ok(Self::from_mine_mask(mine_mask))
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        if in_bounds(coords, self.size()) {
            Ok(coords)
        } else {
            Err(EngineError::InvalidCoords)
        }
    }

    pub fn size(&self) -> Coord2 {
        let dim = self.mine_mask.dim();
        (dim.0.try_into().unwrap(), dim.1.try_into().unwrap())
    }

    pub fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mine_count
    }

    pub fn total_cells(&self) -> CellCount {
        self.mine_mask.len().try_into().unwrap()
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    pub fn contains_mine(&self, coords: Coord2) -> bool {
        self[coords]
    }

    pub fn adjacent_mine_count(&self, coords: Coord2) -> u8 {
        self.mine_mask
            .iter_neighbors(coords)
            .filter(|&pos| self[pos])
            .count()
            .try_into()
            .unwrap()
    }
}

impl Index<Coord2> for MineLayout {
    type Output = bool;

    fn index(&self, (x, y): Coord2) -> &Self::Output {
        &self.mine_mask[(x as usize, y as usize)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feedback_decodes_numbers_and_flag_ack() {
        assert_eq!(Feedback::try_from(0), Ok(Feedback::Revealed(0)));
        assert_eq!(Feedback::try_from(8), Ok(Feedback::Revealed(8)));
        assert_eq!(Feedback::try_from(FLAG_ACK), Ok(Feedback::FlagAck));
        assert_eq!(Feedback::try_from(9), Err(EngineError::InvalidFeedback(9)));
        assert_eq!(Feedback::try_from(-3), Err(EngineError::InvalidFeedback(-3)));
    }

    #[test]
    fn stop_has_negative_wire_coordinates() {
        assert_eq!(Action::Stop.to_wire(), (ActionKind::Stop, -1, -1));
        assert_eq!(Action::Reveal((2, 5)).to_wire(), (ActionKind::Reveal, 2, 5));
    }

    #[test]
    fn layout_counts_adjacent_mines() {
        let layout = MineLayout::from_mine_coords((3, 3), &[(0, 0), (2, 2)]).unwrap();

        assert_eq!(layout.mine_count(), 2);
        assert_eq!(layout.safe_cell_count(), 7);
        assert_eq!(layout.adjacent_mine_count((1, 1)), 2);
        assert_eq!(layout.adjacent_mine_count((0, 2)), 0);
        assert!(layout.contains_mine((2, 2)));
    }

    #[test]
    fn layout_rejects_out_of_bounds_mines() {
        assert_eq!(
            MineLayout::from_mine_coords((2, 2), &[(2, 0)]),
            Err(EngineError::InvalidCoords)
        );
    }

    #[test]
    fn game_config_clamps_mines_to_board() {
        let config = GameConfig::new((0, 4), 10);

        assert_eq!(config.size, (1, 4));
        assert_eq!(config.mines, 4);
    }
}
