use ndarray::Array2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeSet;
use std::fmt;

use crate::*;

/// Neighbor list that never spills to the heap.
pub type Neighbors = SmallVec<[Coord2; 8]>;

/// The engine's authoritative picture of the board.
///
/// `all_covered` always has exactly `covered_count` entries, and
/// `frontier_covered` is exactly the covered cells with at least one revealed
/// neighbor. Flagged cells are neither covered nor part of the frontier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoardState {
    grid: Array2<CellStatus>,
    total_mines: CellCount,
    covered_count: CellCount,
    flagged_count: CellCount,
    all_covered: BTreeSet<Coord2>,
    frontier_covered: BTreeSet<Coord2>,
}

impl BoardState {
    pub fn new(size: Coord2, total_mines: CellCount) -> Result<Self> {
        if size.0 == 0 || size.1 == 0 {
            return Err(EngineError::EmptyBoard);
        }

        let total_cells = mult(size.0, size.1);
        if total_mines > total_cells {
            return Err(EngineError::TooManyMines);
        }

        let all_covered = (0..size.0)
            .flat_map(|x| (0..size.1).map(move |y| (x, y)))
            .collect();

        Ok(Self {
            grid: Array2::default(size.to_nd_index()),
            total_mines,
            covered_count: total_cells,
            flagged_count: 0,
            all_covered,
            frontier_covered: BTreeSet::new(),
        })
    }

    pub fn size(&self) -> Coord2 {
        let dim = self.grid.dim();
        (dim.0.try_into().unwrap(), dim.1.try_into().unwrap())
    }

    pub fn rows(&self) -> Coord {
        self.size().0
    }

    pub fn cols(&self) -> Coord {
        self.size().1
    }

    pub fn total_mines(&self) -> CellCount {
        self.total_mines
    }

    pub fn covered_count(&self) -> CellCount {
        self.covered_count
    }

    pub fn flagged_count(&self) -> CellCount {
        self.flagged_count
    }

    /// Mines not accounted for by a flag.
    pub fn mines_left(&self) -> CellCount {
        self.total_mines.saturating_sub(self.flagged_count)
    }

    pub fn all_covered(&self) -> &BTreeSet<Coord2> {
        &self.all_covered
    }

    pub fn frontier_covered(&self) -> &BTreeSet<Coord2> {
        &self.frontier_covered
    }

    pub fn contains(&self, coords: Coord2) -> bool {
        in_bounds(coords, self.size())
    }

    pub fn status(&self, coords: Coord2) -> CellStatus {
        if self.contains(coords) {
            self.grid[coords.to_nd_index()]
        } else {
            CellStatus::Invalid
        }
    }

    /// Every remaining covered cell must hold one of the unflagged mines.
    pub fn is_done(&self) -> bool {
        self.covered_count <= self.mines_left()
    }

    /// Records a revealed number. Returns `false` for out-of-bounds or
    /// contradictory updates (revealing a flag, changing a number).
    pub fn reveal(&mut self, coords: Coord2, number: u8) -> bool {
        if number > 8 {
            return false;
        }

        match self.status(coords) {
            CellStatus::Covered => {
                self.grid[coords.to_nd_index()] = CellStatus::Revealed(number);
                self.uncover(coords);
                for neighbor in self.neighbors(coords) {
                    if self.status(neighbor).is_covered() {
                        self.frontier_covered.insert(neighbor);
                    }
                }
                true
            }
            CellStatus::Revealed(previous) => previous == number,
            CellStatus::Flagged | CellStatus::Invalid => false,
        }
    }

    /// Marks a covered cell as a mine. Flagging twice is a no-op that still
    /// succeeds; flagging a revealed cell is refused.
    pub fn flag(&mut self, coords: Coord2) -> bool {
        match self.status(coords) {
            CellStatus::Covered => {
                self.grid[coords.to_nd_index()] = CellStatus::Flagged;
                self.uncover(coords);
                self.flagged_count += 1;
                true
            }
            CellStatus::Flagged => true,
            CellStatus::Revealed(_) | CellStatus::Invalid => false,
        }
    }

    fn uncover(&mut self, coords: Coord2) {
        self.covered_count -= 1;
        self.all_covered.remove(&coords);
        self.frontier_covered.remove(&coords);
    }

    pub fn neighbors(&self, coords: Coord2) -> NeighborIter {
        self.grid.iter_neighbors(coords)
    }

    pub fn count_neighbors_of(&self, coords: Coord2, predicate: impl Fn(CellStatus) -> bool) -> u8 {
        self.grid
            .iter_neighbor_cells(coords)
            .filter(|&cell| predicate(cell))
            .count()
            .try_into()
            .unwrap()
    }

    pub fn collect_neighbors_of(
        &self,
        coords: Coord2,
        predicate: impl Fn(CellStatus) -> bool,
    ) -> Neighbors {
        self.grid
            .iter_neighbor_cells_with_index(coords)
            .filter(|&(_, cell)| predicate(cell))
            .map(|(pos, _)| pos)
            .collect()
    }

    pub fn cells(&self) -> &Array2<CellStatus> {
        &self.grid
    }

    /// Checks the bookkeeping invariants against a full rescan of the grid.
    pub fn is_consistent(&self) -> bool {
        let (x_end, y_end) = self.size();
        let mut covered = BTreeSet::new();
        let mut frontier = BTreeSet::new();
        let mut flagged = 0;

        for x in 0..x_end {
            for y in 0..y_end {
                let coords = (x, y);
                match self.status(coords) {
                    CellStatus::Covered => {
                        covered.insert(coords);
                        if self.count_neighbors_of(coords, CellStatus::is_revealed) > 0 {
                            frontier.insert(coords);
                        }
                    }
                    CellStatus::Flagged => flagged += 1,
                    _ => {}
                }
            }
        }

        usize::from(self.covered_count) == self.all_covered.len()
            && covered == self.all_covered
            && frontier == self.frontier_covered
            && flagged == self.flagged_count
    }
}

impl fmt::Display for BoardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.grid.rows() {
            for cell in row {
                write!(f, "{}", cell.symbol())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
