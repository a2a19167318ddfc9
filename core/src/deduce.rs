use log::{trace, warn};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::*;

/// Pending work for the decision loop. Lives as long as the game.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkQueues {
    /// Cells proven safe, popped most-recent first.
    pub to_uncover: Vec<Coord2>,
    /// Revealed cells whose constraint has to be (re)checked.
    pub to_process: VecDeque<Coord2>,
    /// Flags not yet reported to the host. Only filled when flags are emitted.
    pub to_flag: VecDeque<Coord2>,
    emit_flags: bool,
}

impl WorkQueues {
    pub fn new(emit_flags: bool) -> Self {
        Self {
            emit_flags,
            ..Default::default()
        }
    }

    pub fn is_idle(&self) -> bool {
        self.to_uncover.is_empty() && self.to_process.is_empty() && self.to_flag.is_empty()
    }

    pub fn mark_safe(&mut self, coords: Coord2) {
        self.to_uncover.push(coords);
    }

    /// Flags `coords` and schedules its revealed neighbors for another look.
    /// Returns `false` if the board refused the flag.
    pub fn commit_mine(&mut self, board: &mut BoardState, coords: Coord2) -> bool {
        if board.status(coords).is_flagged() {
            return true;
        }
        if !board.flag(coords) {
            warn!("Refusing to flag {coords:?}, status is {:?}", board.status(coords));
            return false;
        }

        self.to_process
            .extend(board.collect_neighbors_of(coords, CellStatus::is_revealed));
        if self.emit_flags {
            self.to_flag.push_back(coords);
        }
        true
    }
}

/// Result of checking one revealed cell on its own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Deduction {
    /// The cell's count says nothing new.
    Nothing,
    /// All flags are placed, the remaining covered neighbors are safe.
    AllSafe(Neighbors),
    /// Every covered neighbor must be a mine.
    AllMines(Neighbors),
    /// The count can no longer be satisfied.
    Contradiction,
}

/// Applies the two counting rules to a single revealed cell and commits the
/// result to `board` and `queues`.
pub fn deduce_single_point(
    board: &mut BoardState,
    queues: &mut WorkQueues,
    coords: Coord2,
) -> Deduction {
    let Some(number) = board.status(coords).revealed_count() else {
        return Deduction::Nothing;
    };

    let covered = board.count_neighbors_of(coords, CellStatus::is_covered);
    let flagged = board.count_neighbors_of(coords, CellStatus::is_flagged);

    if flagged > number || covered + flagged < number {
        warn!("Clue {number} at {coords:?} is unsatisfiable: {flagged} flagged, {covered} covered");
        return Deduction::Contradiction;
    }

    if covered == 0 {
        return Deduction::Nothing;
    }

    if flagged == number {
        let safe = board.collect_neighbors_of(coords, CellStatus::is_covered);
        trace!("{coords:?} is satisfied, {} neighbors are safe", safe.len());
        for &pos in &safe {
            queues.mark_safe(pos);
        }
        Deduction::AllSafe(safe)
    } else if covered + flagged == number {
        let mines = board.collect_neighbors_of(coords, CellStatus::is_covered);
        trace!("{coords:?} needs every covered neighbor, flagging {}", mines.len());
        for &pos in &mines {
            queues.commit_mine(board, pos);
        }
        Deduction::AllMines(mines)
    } else {
        Deduction::Nothing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(size: Coord2, mines: CellCount) -> BoardState {
        BoardState::new(size, mines).unwrap()
    }

    #[test]
    fn single_covered_neighbor_of_one_is_flagged() {
        let mut board = board((2, 2), 1);
        board.reveal((0, 0), 1);
        board.reveal((0, 1), 1);
        board.reveal((1, 0), 1);
        let mut queues = WorkQueues::new(false);

        let deduction = deduce_single_point(&mut board, &mut queues, (0, 0));

        assert_eq!(deduction, Deduction::AllMines(Neighbors::from_slice(&[(1, 1)])));
        assert_eq!(board.status((1, 1)), CellStatus::Flagged);
        assert!(queues.to_uncover.is_empty());
        assert!(queues.to_process.contains(&(0, 1)));
        assert!(queues.to_process.contains(&(1, 0)));
        assert!(board.is_consistent());
    }

    #[test]
    fn satisfied_clue_marks_remaining_neighbor_safe() {
        let mut board = board((1, 3), 1);
        board.flag((0, 0));
        board.reveal((0, 1), 1);
        let mut queues = WorkQueues::new(false);

        let deduction = deduce_single_point(&mut board, &mut queues, (0, 1));

        assert_eq!(deduction, Deduction::AllSafe(Neighbors::from_slice(&[(0, 2)])));
        assert_eq!(queues.to_uncover, vec![(0, 2)]);
        assert_eq!(board.status((0, 2)), CellStatus::Covered);
    }

    #[test]
    fn zero_marks_every_neighbor_safe() {
        let mut board = board((3, 3), 1);
        board.reveal((0, 0), 0);
        let mut queues = WorkQueues::new(false);

        deduce_single_point(&mut board, &mut queues, (0, 0));

        assert_eq!(queues.to_uncover, vec![(0, 1), (1, 0), (1, 1)]);
    }

    #[test]
    fn ambiguous_clue_does_nothing() {
        let mut board = board((2, 2), 1);
        board.reveal((0, 0), 1);
        let mut queues = WorkQueues::new(false);

        let deduction = deduce_single_point(&mut board, &mut queues, (0, 0));

        assert_eq!(deduction, Deduction::Nothing);
        assert!(queues.is_idle());
    }

    #[test]
    fn fully_resolved_clue_does_nothing() {
        let mut board = board((1, 2), 1);
        board.flag((0, 1));
        board.reveal((0, 0), 1);
        let mut queues = WorkQueues::new(false);

        assert_eq!(
            deduce_single_point(&mut board, &mut queues, (0, 0)),
            Deduction::Nothing
        );
    }

    #[test]
    fn overflagged_clue_is_a_contradiction() {
        let mut board = board((1, 3), 2);
        board.flag((0, 0));
        board.flag((0, 2));
        board.reveal((0, 1), 1);
        let mut queues = WorkQueues::new(false);

        assert_eq!(
            deduce_single_point(&mut board, &mut queues, (0, 1)),
            Deduction::Contradiction
        );
    }

    #[test]
    fn emitted_flags_are_queued_for_the_host() {
        let mut board = board((1, 2), 1);
        board.reveal((0, 0), 1);
        let mut queues = WorkQueues::new(true);

        deduce_single_point(&mut board, &mut queues, (0, 0));

        assert_eq!(queues.to_flag, VecDeque::from([(0, 1)]));
    }

    #[test]
    fn non_revealed_cells_are_ignored() {
        let mut board = board((2, 2), 1);
        let mut queues = WorkQueues::new(false);

        assert_eq!(
            deduce_single_point(&mut board, &mut queues, (0, 0)),
            Deduction::Nothing
        );
    }
}
