use log::{debug, info, warn};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use web_time::Instant;

use crate::*;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostState {
    #[default]
    Playing,
    Won,
    Lost,
    /// The agent stopped with safe cells still covered.
    Abandoned,
}

impl HostState {
    pub const fn is_finished(self) -> bool {
        !matches!(self, Self::Playing)
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
enum HostCell {
    #[default]
    Hidden,
    Flagged,
    Revealed,
}

/// Referee holding the real layout. Reveals open exactly one cell, there is
/// no flood fill: zero regions are the agent's job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Host {
    layout: MineLayout,
    board: Array2<HostCell>,
    revealed_count: CellCount,
    state: HostState,
    triggered_mine: Option<Coord2>,
}

impl Host {
    pub fn new(layout: MineLayout) -> Self {
        let size = layout.size();
        Self {
            layout,
            board: Array2::default(size.to_nd_index()),
            revealed_count: 0,
            state: HostState::default(),
            triggered_mine: None,
        }
    }

    pub fn layout(&self) -> &MineLayout {
        &self.layout
    }

    pub fn state(&self) -> HostState {
        self.state
    }

    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.triggered_mine
    }

    pub fn revealed_count(&self) -> CellCount {
        self.revealed_count
    }

    /// Carries out `action` and returns the feedback for the agent's next
    /// turn, or `None` once the game is over.
    pub fn apply(&mut self, action: Action) -> Result<Option<i32>> {
        if self.state.is_finished() {
            return Err(EngineError::AlreadyEnded);
        }

        match action {
            Action::Reveal(coords) => self.reveal(coords),
            Action::Flag(coords) => {
                let coords = self.layout.validate_coords(coords)?;
                match self.board[coords.to_nd_index()] {
                    HostCell::Revealed => Err(EngineError::NotCovered),
                    _ => {
                        self.board[coords.to_nd_index()] = HostCell::Flagged;
                        Ok(Some(FLAG_ACK))
                    }
                }
            }
            Action::Stop => {
                self.state = if self.revealed_count == self.layout.safe_cell_count() {
                    HostState::Won
                } else {
                    HostState::Abandoned
                };
                Ok(None)
            }
        }
    }

    /// Ends a game the agent would not finish.
    pub fn abandon(&mut self) {
        if !self.state.is_finished() {
            self.state = HostState::Abandoned;
        }
    }

    fn reveal(&mut self, coords: Coord2) -> Result<Option<i32>> {
        let coords = self.layout.validate_coords(coords)?;
        if self.board[coords.to_nd_index()] != HostCell::Hidden {
            return Err(EngineError::NotCovered);
        }

        if self.layout.contains_mine(coords) {
            debug!("Mine hit at {coords:?}");
            self.triggered_mine = Some(coords);
            self.state = HostState::Lost;
            return Ok(None);
        }

        self.board[coords.to_nd_index()] = HostCell::Revealed;
        self.revealed_count += 1;

        if self.revealed_count == self.layout.safe_cell_count() {
            self.state = HostState::Won;
            return Ok(None);
        }

        Ok(Some(self.layout.adjacent_mine_count(coords).into()))
    }
}

/// Summary of one simulated game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameReport {
    pub outcome: HostState,
    pub turns: u32,
    pub revealed: CellCount,
    pub safe_cells: CellCount,
    /// Cells the agent believes are mines but are not.
    pub misflagged: CellCount,
    /// The losing reveal was a guess rather than a deduction.
    pub lost_on_guess: bool,
    pub elapsed: Duration,
    pub stats: AgentStats,
}

/// Plays one game between a fresh [`Agent`] and a [`Host`] for `layout`,
/// opening `start` on the agent's behalf.
pub fn play_game(
    layout: MineLayout,
    start: Coord2,
    config: AgentConfig,
    turn_limit: u32,
) -> Result<GameReport> {
    let started_at = Instant::now();
    let (rows, cols) = layout.size();
    let total_mines = layout.mine_count();
    let safe_cells = layout.safe_cell_count();
    let mut host = Host::new(layout);

    let Some(mut feedback) = host.apply(Action::Reveal(start))? else {
        info!("Game decided by the opening reveal: {:?}", host.state());
        return Ok(GameReport {
            outcome: host.state(),
            turns: 0,
            revealed: host.revealed_count(),
            safe_cells,
            misflagged: 0,
            lost_on_guess: host.state() == HostState::Lost,
            elapsed: started_at.elapsed(),
            stats: AgentStats::default(),
        });
    };

    let mut agent = Agent::with_config(rows, cols, total_mines, start, config)?;
    let mut turns = 0;

    loop {
        if turns >= turn_limit {
            warn!("Turn limit of {turn_limit} reached, abandoning game");
            host.abandon();
            break;
        }

        let action = agent.get_action(feedback);
        turns += 1;

        match host.apply(action)? {
            Some(next) => feedback = next,
            None => break,
        }
    }

    let misflagged = agent
        .board()
        .cells()
        .indexed_iter()
        .filter(|&((x, y), status)| {
            status.is_flagged() && !host.layout()[(x as Coord, y as Coord)]
        })
        .count()
        .try_into()
        .unwrap();

    let report = GameReport {
        outcome: host.state(),
        turns,
        revealed: host.revealed_count(),
        safe_cells,
        misflagged,
        lost_on_guess: host.state() == HostState::Lost && agent.last_was_guess(),
        elapsed: started_at.elapsed(),
        stats: agent.stats().clone(),
    };
    info!(
        "{:?} after {} turns, {}/{} safe cells revealed, {} guesses",
        report.outcome, report.turns, report.revealed, report.safe_cells, report.stats.guesses
    );
    Ok(report)
}
