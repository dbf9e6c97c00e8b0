use anyhow::{anyhow, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rand::{rngs::StdRng, SeedableRng};
use tracing_subscriber::EnvFilter;

use hidden_connect4::self_play::{play_game, GameRecord, MatchSummary, Outcome};
use hidden_connect4::*;

mod display;
use display::*;

/// Plays the hidden Connect 4 engine against a simulated opponent.
#[derive(Debug, Parser)]
#[command(name = "hidden-connect4", version, about)]
struct Cli {
    /// Number of games to play.
    #[arg(short, long, default_value_t = 10)]
    games: usize,

    /// Plies searched below each candidate move.
    #[arg(short, long, default_value_t = DEPTH)]
    depth: usize,

    /// Seed for the opponent's move choices.
    #[arg(long)]
    seed: Option<u64>,

    /// Let the opponent move first.
    #[arg(long)]
    opponent_first: bool,

    /// Draw the final board of every game.
    #[arg(long)]
    show: bool,

    /// Log each decision of the engine.
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow!("installing the log subscriber: {}", err))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    if cli.games == 0 {
        return Err(anyhow!("at least one game must be played"));
    }

    let seed = cli.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    println!("Welcome to hidden Connect 4 (seed {})\n", seed);

    // keep the engine out here so its cache is re-used across games
    let mut engine = SearchEngine::new().with_depth(cli.depth);
    let first = if cli.opponent_first {
        Player::Opponent
    } else {
        Player::Engine
    };

    let progress = ProgressBar::new(cli.games as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("Playing games: {bar:40.cyan/blue} {pos}/{len} {msg}")
            .progress_chars("█▓▒░  "),
    );

    let mut summary = MatchSummary::default();
    let mut records: Vec<GameRecord> = Vec::with_capacity(cli.games);
    for _ in 0..cli.games {
        let record = play_game(&mut engine, &mut rng, first)?;
        summary.record(record.outcome);
        records.push(record);

        progress.inc(1);
        progress.set_message(&format!(
            "({} won, {} lost, {} drawn)",
            summary.engine_wins, summary.opponent_wins, summary.draws
        ));
    }
    progress.finish();

    if cli.show {
        for (index, record) in records.iter().enumerate() {
            println!(
                "\nGame {}: {} in {} moves ({}), at most {} positions believed",
                index + 1,
                match record.outcome {
                    Outcome::EngineWin => "engine wins",
                    Outcome::OpponentWin => "opponent wins",
                    Outcome::Draw => "draw",
                },
                record.moves.len(),
                record.moves,
                record.max_belief_size,
            );
            display(&record.final_state, &record.visibility)?;
        }
    }

    println!(
        "\nEngine won {} of {} games, lost {}, drew {}.",
        summary.engine_wins,
        summary.games(),
        summary.opponent_wins,
        summary.draws
    );
    println!(
        "Searched {} belief states, {} cached, {} cache hits.",
        engine.node_count,
        engine.cache().len(),
        engine.cache_hits
    );
    Ok(())
}
