use log::{debug, info, trace, warn};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use web_time::Instant;

use crate::*;

/// Counters collected over one game.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStats {
    pub turns: u32,
    pub reveals: u32,
    pub flags_emitted: u32,
    pub safe_deductions: u32,
    pub mine_deductions: u32,
    pub full_passes: u32,
    pub bounded_passes: u32,
    pub skipped_passes: u32,
    pub incomplete_passes: u32,
    pub assignments: u64,
    pub guesses: u32,
}

/// Snapshot of what the agent currently believes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Knowledge {
    pub cells: Array2<CellStatus>,
    pub mines_left: CellCount,
    pub fallback: Option<RiskEstimate>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
enum Pending {
    Reveal(Coord2),
    Flag(Coord2),
}

/// Turn-by-turn decision loop for one game.
///
/// Each call to [`Agent::get_action`] consumes the host's answer to the
/// previous action and produces exactly one new action.
#[derive(Clone, Debug)]
pub struct Agent {
    config: AgentConfig,
    board: BoardState,
    queues: WorkQueues,
    /// Action whose feedback arrives with the next call.
    pending: Option<Pending>,
    stopped: bool,
    started_at: Instant,
    max_pass_cost: Duration,
    /// Standing lowest-risk candidate; present while it is current.
    fallback: Option<RiskEstimate>,
    last_was_guess: bool,
    stats: AgentStats,
}

impl Agent {
    /// Creates an agent for a board whose cell `first` the host has already
    /// revealed; its number is the feedback of the first turn.
    pub fn new(rows: Coord, cols: Coord, total_mines: CellCount, first: Coord2) -> Result<Self> {
        Self::with_config(rows, cols, total_mines, first, AgentConfig::default())
    }

    pub fn with_config(
        rows: Coord,
        cols: Coord,
        total_mines: CellCount,
        first: Coord2,
        config: AgentConfig,
    ) -> Result<Self> {
        let board = BoardState::new((rows, cols), total_mines)?;
        if !board.contains(first) {
            return Err(EngineError::InvalidCoords);
        }

        Ok(Self {
            queues: WorkQueues::new(config.emit_flags),
            config,
            board,
            pending: Some(Pending::Reveal(first)),
            stopped: false,
            started_at: Instant::now(),
            max_pass_cost: Duration::ZERO,
            fallback: None,
            last_was_guess: false,
            stats: AgentStats::default(),
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn board(&self) -> &BoardState {
        &self.board
    }

    pub fn queues(&self) -> &WorkQueues {
        &self.queues
    }

    pub fn stats(&self) -> &AgentStats {
        &self.stats
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Whether the most recent reveal was a guess rather than a proven-safe cell.
    pub fn last_was_guess(&self) -> bool {
        self.last_was_guess
    }

    pub fn knowledge(&self) -> Knowledge {
        Knowledge {
            cells: self.board.cells().clone(),
            mines_left: self.board.mines_left(),
            fallback: self.fallback,
        }
    }

    /// Consumes the host's answer to the previous action and returns the next
    /// one. Once [`Action::Stop`] has been returned every later call stops too.
    pub fn get_action(&mut self, feedback: i32) -> Action {
        if self.stopped {
            return Action::Stop;
        }
        self.stats.turns += 1;

        if let Err(err) = self.ingest(feedback) {
            warn!("Stopping after bad feedback: {err}");
            return self.stop();
        }

        self.decide()
    }

    fn ingest(&mut self, raw: i32) -> Result<()> {
        let feedback = Feedback::try_from(raw)?;

        match (self.pending.take(), feedback) {
            (Some(Pending::Reveal(coords)), Feedback::Revealed(number)) => {
                if !self.board.reveal(coords, number) {
                    return Err(EngineError::InvalidFeedback(raw));
                }
                trace!("{coords:?} revealed {number}");
                self.queues.to_process.push_back(coords);
                // Neighbors lost a covered cell, so their counts may now resolve.
                self.queues
                    .to_process
                    .extend(self.board.collect_neighbors_of(coords, CellStatus::is_revealed));
                Ok(())
            }
            (Some(Pending::Flag(coords)), Feedback::FlagAck) => {
                trace!("{coords:?} flag acknowledged");
                Ok(())
            }
            (None, _) => Err(EngineError::AlreadyEnded),
            (Some(_), _) => Err(EngineError::InvalidFeedback(raw)),
        }
    }

    fn decide(&mut self) -> Action {
        let mut enumerated = false;

        loop {
            if self.board.is_done() {
                info!(
                    "Done after {} turns, {} covered cells left for {} mines",
                    self.stats.turns,
                    self.board.covered_count(),
                    self.board.mines_left()
                );
                return self.stop();
            }

            if let Some(coords) = self.queues.to_flag.pop_front() {
                self.pending = Some(Pending::Flag(coords));
                self.stats.flags_emitted += 1;
                return Action::Flag(coords);
            }

            while let Some(coords) = self.queues.to_uncover.pop() {
                if self.board.status(coords).is_covered() {
                    return self.reveal(coords, false);
                }
            }

            if let Some(coords) = self.queues.to_process.pop_front() {
                match deduce_single_point(&mut self.board, &mut self.queues, coords) {
                    Deduction::AllSafe(cells) => {
                        self.stats.safe_deductions += cells.len() as u32
                    }
                    Deduction::AllMines(cells) => {
                        self.stats.mine_deductions += cells.len() as u32
                    }
                    Deduction::Nothing | Deduction::Contradiction => {}
                }
                continue;
            }

            if !enumerated && !self.board.frontier_covered().is_empty() {
                enumerated = true;
                self.run_enumeration();
                continue;
            }

            return self.guess();
        }
    }

    fn run_enumeration(&mut self) {
        let frontier_len = self.board.frontier_covered().len();
        let cap = self.config.bounded_cap;
        let plan = self.config.time_budget.plan(
            self.started_at.elapsed(),
            frontier_len,
            cap,
            self.max_pass_cost,
        );

        let (mode, extraction) = match plan {
            PassPlan::Skip => {
                warn!("Out of time, skipping enumeration of {frontier_len} frontier cells");
                self.stats.skipped_passes += 1;
                return;
            }
            PassPlan::Bounded => {
                self.stats.bounded_passes += 1;
                (EnumerationMode::Bounded { cap }, Extraction::FirstFact)
            }
            PassPlan::Full => {
                self.stats.full_passes += 1;
                (EnumerationMode::Full, Extraction::All)
            }
        };

        let pass_start = Instant::now();
        let enumeration = enumerate_frontier(&self.board, mode, self.config.assignment_limit);
        let facts = aggregate(&enumeration, extraction);

        self.record_pass_cost(plan, pass_start.elapsed());
        if !enumeration.complete {
            self.stats.incomplete_passes += 1;
        }
        self.stats.assignments += enumeration.assignments.len() as u64;

        self.apply(facts);
    }

    /// Only full passes count towards the cost that decides when to switch
    /// to bounded ones.
    fn record_pass_cost(&mut self, plan: PassPlan, cost: Duration) {
        if plan == PassPlan::Full {
            self.max_pass_cost = self.max_pass_cost.max(cost);
        }
    }

    fn apply(&mut self, facts: Facts) {
        for coords in facts.mines {
            if self.queues.commit_mine(&mut self.board, coords) {
                self.stats.mine_deductions += 1;
            }
        }
        for coords in facts.safe {
            self.queues.mark_safe(coords);
            self.stats.safe_deductions += 1;
        }

        if !self.queues.to_uncover.is_empty() {
            return;
        }

        if let Some(candidate) = facts.lowest_risk {
            if self
                .fallback
                .is_none_or(|current| candidate.is_lower_than(&current))
            {
                debug!(
                    "New fallback {:?} with risk {:.3}",
                    candidate.coords,
                    candidate.probability()
                );
                self.fallback = Some(candidate);
            }
        }
    }

    fn guess(&mut self) -> Action {
        // Every mine is flagged, whatever is still covered is safe.
        if self.board.mines_left() == 0 {
            if let Some(&coords) = self.board.all_covered().first() {
                return self.reveal(coords, false);
            }
        }

        if self.config.fallback == FallbackStrategy::LowestRisk {
            if let Some(candidate) = self.fallback.take() {
                if self.board.status(candidate.coords).is_covered() {
                    debug!(
                        "Guessing lowest-risk {:?} ({:.3})",
                        candidate.coords,
                        candidate.probability()
                    );
                    return self.reveal(candidate.coords, true);
                }
            }
        }

        let target = self
            .board
            .frontier_covered()
            .first()
            .or_else(|| self.board.all_covered().first())
            .copied();

        match target {
            Some(coords) => {
                debug!("Guessing {coords:?} without a risk estimate");
                self.reveal(coords, true)
            }
            None => self.stop(),
        }
    }

    fn reveal(&mut self, coords: Coord2, guess: bool) -> Action {
        self.pending = Some(Pending::Reveal(coords));
        self.last_was_guess = guess;
        self.stats.reveals += 1;
        if guess {
            self.stats.guesses += 1;
        }
        Action::Reveal(coords)
    }

    fn stop(&mut self) -> Action {
        self.stopped = true;
        self.pending = None;
        Action::Stop
    }
}
