use hashbrown::HashMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::*;

/// Tentative label for a frontier cell during enumeration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    Bomb,
    Safe,
}

impl Tag {
    /// Branch order is Bomb then Safe.
    const FIRST: Tag = Tag::Bomb;

    const fn next_branch(self) -> Option<Tag> {
        match self {
            Tag::Bomb => Some(Tag::Safe),
            Tag::Safe => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnumerationMode {
    /// Every frontier cell takes part.
    Full,
    /// Only the first `cap` frontier cells take part.
    Bounded { cap: usize },
}

/// One consistent labeling, aligned with [`Enumeration::cells`].
pub type Assignment = Vec<Tag>;

/// Output of one enumeration pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Enumeration {
    pub mode: EnumerationMode,
    /// Enumerated frontier cells in row-major order.
    pub cells: Vec<Coord2>,
    pub assignments: Vec<Assignment>,
    /// `false` when the assignment limit cut the search short.
    pub complete: bool,
    /// Number of tentative labels tried.
    pub nodes: u64,
}

impl Enumeration {
    fn empty(mode: EnumerationMode) -> Self {
        Self {
            mode,
            cells: Vec::new(),
            assignments: Vec::new(),
            complete: true,
            nodes: 0,
        }
    }
}

/// Enumerates every labeling of the frontier that agrees with all revealed
/// numbers, without touching `board`.
pub fn enumerate_frontier(
    board: &BoardState,
    mode: EnumerationMode,
    assignment_limit: usize,
) -> Enumeration {
    let cells: Vec<Coord2> = match mode {
        EnumerationMode::Full => board.frontier_covered().iter().copied().collect(),
        EnumerationMode::Bounded { cap } => {
            board.frontier_covered().iter().copied().take(cap).collect()
        }
    };

    if cells.is_empty() {
        return Enumeration::empty(mode);
    }

    let search = Search::new(board, cells, assignment_limit);
    let enumeration = search.run(mode);
    debug!(
        "Enumerated {} cells ({:?}): {} assignments, {} nodes{}",
        enumeration.cells.len(),
        enumeration.mode,
        enumeration.assignments.len(),
        enumeration.nodes,
        if enumeration.complete { "" } else { ", incomplete" }
    );
    enumeration
}

/// Backtracking state: the board is read-only, tentative labels live in
/// `hypothesis` keyed by position in `cells`.
struct Search<'a> {
    board: &'a BoardState,
    cells: Vec<Coord2>,
    index_of: HashMap<Coord2, usize>,
    hypothesis: Vec<Option<Tag>>,
    bombs: CellCount,
    mines_left: CellCount,
    /// All covered cells are enumerated, so the bomb total is exact.
    exact_total: bool,
    assignment_limit: usize,
}

impl<'a> Search<'a> {
    fn new(board: &'a BoardState, cells: Vec<Coord2>, assignment_limit: usize) -> Self {
        let index_of = cells
            .iter()
            .enumerate()
            .map(|(index, &coords)| (coords, index))
            .collect();
        let exact_total = cells.len() == usize::from(board.covered_count());

        Self {
            board,
            hypothesis: vec![None; cells.len()],
            index_of,
            cells,
            bombs: 0,
            mines_left: board.mines_left(),
            exact_total,
            assignment_limit,
        }
    }

    fn run(mut self, mode: EnumerationMode) -> Enumeration {
        let mut assignments = Vec::new();
        let mut complete = true;
        let mut nodes = 0;

        // Next branch to try at each depth; the stack depth is the index of
        // the cell being labeled.
        let mut frames: Vec<Option<Tag>> = vec![Some(Tag::FIRST)];

        while !frames.is_empty() {
            let depth = frames.len() - 1;
            let Some(tag) = frames[depth].take() else {
                self.assign(depth, None);
                frames.pop();
                continue;
            };
            frames[depth] = tag.next_branch();

            self.assign(depth, Some(tag));
            nodes += 1;

            if !self.accepts(depth) {
                continue;
            }

            if depth + 1 < self.cells.len() {
                frames.push(Some(Tag::FIRST));
                continue;
            }

            if self.exact_total && self.bombs != self.mines_left {
                continue;
            }

            if assignments.len() >= self.assignment_limit {
                warn!(
                    "Assignment limit {} reached, enumeration stopped early",
                    self.assignment_limit
                );
                complete = false;
                break;
            }

            assignments.push(
                self.hypothesis
                    .iter()
                    .map(|tag| tag.unwrap_or(Tag::Safe))
                    .collect(),
            );
        }

        Enumeration {
            mode,
            cells: self.cells,
            assignments,
            complete,
            nodes,
        }
    }

    fn assign(&mut self, index: usize, tag: Option<Tag>) {
        if self.hypothesis[index] == Some(Tag::Bomb) {
            self.bombs -= 1;
        }
        if tag == Some(Tag::Bomb) {
            self.bombs += 1;
        }
        self.hypothesis[index] = tag;
    }

    /// Checks the global mine budget and every revealed neighbor of the cell
    /// just labeled at `index`.
    fn accepts(&self, index: usize) -> bool {
        if self.bombs > self.mines_left {
            return false;
        }

        if self.exact_total {
            let unlabeled = self.cells.len() - index - 1;
            if usize::from(self.bombs) + unlabeled < usize::from(self.mines_left) {
                return false;
            }
        }

        self.board
            .neighbors(self.cells[index])
            .all(|clue| self.clue_holds(clue))
    }

    fn clue_holds(&self, clue: Coord2) -> bool {
        let Some(number) = self.board.status(clue).revealed_count() else {
            return true;
        };

        let mut flagged = 0u8;
        let mut undefined = 0u8;

        for neighbor in self.board.neighbors(clue) {
            match self.index_of.get(&neighbor) {
                Some(&index) => match self.hypothesis[index] {
                    Some(Tag::Bomb) => flagged += 1,
                    Some(Tag::Safe) => {}
                    None => undefined += 1,
                },
                // Covered cells left out of a bounded pass stay open.
                None => match self.board.status(neighbor) {
                    CellStatus::Flagged => flagged += 1,
                    CellStatus::Covered => undefined += 1,
                    _ => {}
                },
            }
        }

        !(number > flagged + undefined
            || flagged > number
            || (undefined == 0 && flagged != number))
    }
}
