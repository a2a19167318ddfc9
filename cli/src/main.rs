use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use sapper_core::*;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use web_time::{SystemTime, UNIX_EPOCH};

mod logger;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: clap_verbosity_flag::Verbosity,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Let the agent play simulated games against random layouts
    Play(PlayArgs),
}

#[derive(clap::Args, Debug)]
struct PlayArgs {
    #[arg(long, default_value_t = 9)]
    rows: Coord,

    #[arg(long, default_value_t = 9)]
    cols: Coord,

    #[arg(long, default_value_t = 10)]
    mines: CellCount,

    /// Force a seed instead of random, game `n` uses `seed + n`
    #[arg(short, long)]
    seed: Option<u64>,

    #[arg(short, long, default_value_t = 1)]
    games: u64,

    /// Agent configuration as JSON, missing fields use defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// What the opening reveal is guaranteed to hit
    #[arg(long, value_enum, default_value_t = StartArg::Zero)]
    start: StartArg,

    /// Report flags to the host as actions
    #[arg(long)]
    emit_flags: bool,

    /// Wall-clock budget per game in seconds, overrides the config file
    #[arg(long)]
    budget_secs: Option<u64>,

    /// Give up on a game after this many turns
    #[arg(long, default_value_t = 100_000)]
    turn_limit: u32,

    /// Print reports as JSON instead of a text summary
    #[arg(long)]
    json: bool,
}

#[derive(ValueEnum, Copy, Clone, Debug)]
enum StartArg {
    Zero,
    Safe,
    Random,
}

impl From<StartArg> for StartCell {
    fn from(start: StartArg) -> Self {
        match start {
            StartArg::Zero => StartCell::AlwaysZero,
            StartArg::Safe => StartCell::SimpleSafe,
            StartArg::Random => StartCell::Random,
        }
    }
}

#[derive(Serialize, Debug, Default)]
struct Summary {
    seed: u64,
    won: u64,
    lost: u64,
    lost_on_guess: u64,
    abandoned: u64,
    guesses: u64,
    misflagged: u64,
    elapsed: Duration,
    games: Vec<GameReport>,
}

impl Summary {
    fn record(&mut self, report: GameReport) {
        match report.outcome {
            HostState::Won => self.won += 1,
            HostState::Lost => self.lost += 1,
            HostState::Abandoned | HostState::Playing => self.abandoned += 1,
        }
        if report.lost_on_guess {
            self.lost_on_guess += 1;
        }
        self.guesses += u64::from(report.stats.guesses);
        self.misflagged += u64::from(report.misflagged);
        self.elapsed += report.elapsed;
        self.games.push(report);
    }

    fn print_text(&self) {
        let games = self.games.len() as u64;
        let win_rate = if games == 0 {
            0.0
        } else {
            100.0 * self.won as f64 / games as f64
        };

        println!("seed:        {}", self.seed);
        println!("games:       {games}");
        println!("won:         {} ({win_rate:.1}%)", self.won);
        println!(
            "lost:        {} ({} on a guess)",
            self.lost, self.lost_on_guess
        );
        println!("abandoned:   {}", self.abandoned);
        println!("guesses:     {}", self.guesses);
        println!("misflagged:  {}", self.misflagged);
        println!("time:        {:.3}s", self.elapsed.as_secs_f64());
        if games > 0 {
            println!(
                "mean:        {:.3}ms",
                1000.0 * self.elapsed.as_secs_f64() / games as f64
            );
        }
    }
}

fn random_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|since| since.as_nanos() as u64)
        .unwrap_or_default()
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<AgentConfig> {
    let Some(path) = path else {
        return Ok(AgentConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid agent config {}", path.display()))
}

fn play(args: PlayArgs) -> anyhow::Result<()> {
    if args.rows == 0 || args.cols == 0 {
        bail!("Board must have at least one row and one column");
    }
    let config = GameConfig::new((args.rows, args.cols), args.mines);
    if config.mines != args.mines {
        bail!(
            "{} mines do not fit on a {}x{} board",
            args.mines,
            args.rows,
            args.cols
        );
    }

    let mut agent_config = load_config(args.config.as_ref())?;
    if args.emit_flags {
        agent_config.emit_flags = true;
    }
    if let Some(secs) = args.budget_secs {
        agent_config.time_budget.total = Duration::from_secs(secs);
    }
    log::debug!("agent config: {agent_config:?}");

    let seed = args.seed.unwrap_or_else(random_seed);
    log::debug!("seed: {seed}");

    let start = (args.rows / 2, args.cols / 2);
    let mut summary = Summary {
        seed,
        ..Summary::default()
    };

    for game in 0..args.games {
        let layout = RandomLayoutGenerator::new(seed.wrapping_add(game), start, args.start.into())
            .generate(config);
        let report = play_game(layout, start, agent_config, args.turn_limit)
            .with_context(|| format!("Game {game} failed"))?;
        log::info!(
            "game {game}: {:?} in {} turns",
            report.outcome,
            report.turns
        );
        summary.record(report);
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        summary.print_text();
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init(args.verbose.log_level_filter())?;

    match args.command {
        Command::Play(play_args) => play(play_args),
    }
}
