use core::time::Duration;
use sapper_core::*;

const GAMES: u64 = 40;

fn layout(seed: u64, config: GameConfig, start: Coord2, start_cell: StartCell) -> MineLayout {
    RandomLayoutGenerator::new(seed, start, start_cell).generate(config)
}

/// Drives one game turn by turn, checking the agent's board after each step.
fn play_checked(layout: MineLayout, start: Coord2, config: AgentConfig) -> (HostState, Agent) {
    let (rows, cols) = layout.size();
    let total_cells = layout.total_cells();
    let mines = layout.mine_count();
    let mut host = Host::new(layout);
    let mut agent = Agent::with_config(rows, cols, mines, start, config).unwrap();

    let Some(mut feedback) = host.apply(Action::Reveal(start)).unwrap() else {
        return (host.state(), agent);
    };
    let mut covered = agent.board().covered_count();

    // Every turn reveals or flags a covered cell, except the last.
    for _ in 0..=total_cells {
        let action = agent.get_action(feedback);

        let board = agent.board();
        assert!(board.is_consistent(), "inconsistent board:\n{board}");
        assert!(board.covered_count() <= covered, "covered count grew");
        covered = board.covered_count();

        match action {
            Action::Reveal(coords) => assert!(board.status(coords).is_covered()),
            // Flags are committed before they are reported.
            Action::Flag(coords) => assert!(board.status(coords).is_flagged()),
            Action::Stop => {}
        }

        match host.apply(action).unwrap() {
            Some(next) => feedback = next,
            None => return (host.state(), agent),
        }
    }
    panic!("game did not end within {total_cells} turns");
}

fn assert_sound(host_state: HostState, agent: &Agent, layout: &MineLayout) {
    for ((x, y), status) in agent.board().cells().indexed_iter() {
        let coords = (x as Coord, y as Coord);
        if status.is_flagged() {
            assert!(layout.contains_mine(coords), "misflagged {coords:?}");
        }
    }
    if host_state == HostState::Lost {
        assert!(agent.last_was_guess(), "lost on a deduced move");
    }
    assert_ne!(host_state, HostState::Abandoned);
}

#[test]
fn beginner_games_are_sound() {
    let config = GameConfig::beginner();
    let start = (4, 4);
    let mut won = 0;

    for seed in 0..GAMES {
        let layout = layout(seed, config, start, StartCell::AlwaysZero);
        let (state, agent) = play_checked(layout.clone(), start, AgentConfig::default());

        assert_sound(state, &agent, &layout);
        if state == HostState::Won {
            won += 1;
        }
    }
    assert!(won > 0, "never won a beginner game");
}

#[test]
fn emitted_flags_keep_games_sound() {
    let config = GameConfig::beginner();
    let agent_config = AgentConfig {
        emit_flags: true,
        ..AgentConfig::default()
    };

    for seed in 0..GAMES {
        let layout = layout(seed, config, (0, 0), StartCell::SimpleSafe);
        let (state, agent) = play_checked(layout.clone(), (0, 0), agent_config);

        assert_sound(state, &agent, &layout);
        assert_eq!(
            agent.stats().flags_emitted,
            agent.board().flagged_count() as u32
        );
    }
}

#[test]
fn bounded_only_passes_stay_sound() {
    // A spent budget below the floor never allows a full pass.
    let agent_config = AgentConfig {
        time_budget: TimeBudget {
            total: Duration::ZERO,
            floor: Duration::from_secs(3600),
        },
        bounded_cap: 6,
        ..AgentConfig::default()
    };
    let config = GameConfig::new((8, 8), 10);

    for seed in 0..GAMES {
        let layout = layout(seed, config, (3, 3), StartCell::AlwaysZero);
        let (state, agent) = play_checked(layout.clone(), (3, 3), agent_config);

        assert_sound(state, &agent, &layout);
        assert_eq!(agent.stats().full_passes, 0);
    }
}

#[test]
fn tiny_assignment_limit_only_weakens_play() {
    let agent_config = AgentConfig {
        assignment_limit: 2,
        ..AgentConfig::default()
    };
    let config = GameConfig::beginner();

    for seed in 0..GAMES {
        let layout = layout(seed, config, (4, 4), StartCell::AlwaysZero);
        let (state, agent) = play_checked(layout.clone(), (4, 4), agent_config);

        assert_sound(state, &agent, &layout);
    }
}

#[test]
fn play_game_reports_match_manual_runs() {
    let config = GameConfig::intermediate();
    let start = (8, 8);

    for seed in 0..8 {
        let layout = layout(seed, config, start, StartCell::AlwaysZero);
        let report = play_game(layout, start, AgentConfig::default(), 10_000).unwrap();

        assert_eq!(report.misflagged, 0);
        assert_ne!(report.outcome, HostState::Abandoned);
        if report.outcome == HostState::Lost {
            assert!(report.lost_on_guess);
        } else {
            assert_eq!(report.revealed, report.safe_cells);
        }
    }
}

#[test]
fn report_serializes_to_json() {
    let layout = MineLayout::from_mine_coords((1, 6), &[(0, 1)]).unwrap();
    let report = play_game(layout, (0, 3), AgentConfig::default(), 100).unwrap();

    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["outcome"], "Won");
    assert_eq!(json["stats"]["guesses"], 0);
}
