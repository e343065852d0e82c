//! Headless battle runner.
//!
//! # Usage
//!
//! ```bash
//! # Run a replay and print outcome and hash
//! cargo run -p pyre_headless -- run --content data/content.ron --replay data/replays/push.ron
//!
//! # Dump the final state as JSON
//! cargo run -p pyre_headless -- run -c data/content.ron -r data/replays/push.ron --dump-state out.json
//!
//! # Check determinism across 32 parallel runs
//! cargo run -p pyre_headless -- verify -c data/content.ron -r data/replays/push.ron --runs 32
//!
//! # Compare against a pinned hash
//! cargo run -p pyre_headless -- golden -c data/content.ron -r data/replays/push.ron --expected 0x2d2cad384021d555
//!
//! # Seeds
//! cargo run -p pyre_headless -- seed new
//! cargo run -p pyre_headless -- seed encounter --run-seed 42 --floor 3 --node D9A54F62-7BB7-4C06-AF0D-7E79D407F7B3
//! ```
//!
//! Logs go to stderr; results go to stdout.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use rand::RngCore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pyre_core::seed::SeedFactory;
use pyre_headless::{
    check_golden, load_config_or_default, load_content, load_replay, parse_hash, parse_node_id,
    run_replay, verify_replay, HeadlessError,
};

#[derive(Parser)]
#[command(name = "pyre_headless")]
#[command(about = "Headless lane battle runner for replay verification and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a replay to completion
    Run {
        /// Content catalog (RON)
        #[arg(short, long)]
        content: PathBuf,

        /// Replay file (RON, or bincode with a .bin extension)
        #[arg(short, long)]
        replay: PathBuf,

        /// Battle config (RON); defaults apply when omitted
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write the final battle state as JSON
        #[arg(long)]
        dump_state: Option<PathBuf>,
    },

    /// Run a replay several times in parallel and compare hashes
    Verify {
        /// Content catalog (RON)
        #[arg(short, long)]
        content: PathBuf,

        /// Replay file
        #[arg(short, long)]
        replay: PathBuf,

        /// Battle config (RON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Number of runs
        #[arg(short = 'n', long, default_value = "8", value_parser = clap::value_parser!(u32).range(1..))]
        runs: u32,
    },

    /// Compare a replay's hash against a pinned value
    Golden {
        /// Content catalog (RON)
        #[arg(short, long)]
        content: PathBuf,

        /// Replay file
        #[arg(short, long)]
        replay: PathBuf,

        /// Battle config (RON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Expected hash, decimal or 0x-prefixed hex
        #[arg(short, long, value_parser = parse_hash)]
        expected: u64,
    },

    /// Generate or derive seeds
    Seed {
        #[command(subcommand)]
        action: SeedAction,
    },
}

#[derive(Subcommand)]
enum SeedAction {
    /// Mint a fresh run seed from OS entropy
    New,

    /// Derive the seed for one encounter node
    Encounter {
        /// Run seed
        #[arg(long)]
        run_seed: u64,

        /// Floor (map column) index
        #[arg(long)]
        floor: i64,

        /// Node identifier as a UUID or 32 hex digits
        #[arg(long, value_parser = parse_node_id)]
        node: u128,

        /// Extra salt mixed into the seed
        #[arg(long, default_value = "0")]
        salt: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging to stderr (stdout is for results)
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    let result = match cli.command {
        Commands::Run {
            content,
            replay,
            config,
            dump_state,
        } => cmd_run(&content, &replay, config.as_deref(), dump_state.as_deref()),
        Commands::Verify {
            content,
            replay,
            config,
            runs,
        } => cmd_verify(&content, &replay, config.as_deref(), runs),
        Commands::Golden {
            content,
            replay,
            config,
            expected,
        } => cmd_golden(&content, &replay, config.as_deref(), expected),
        Commands::Seed { action } => {
            cmd_seed(action);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Run one replay and print its report.
fn cmd_run(
    content: &Path,
    replay: &Path,
    config: Option<&Path>,
    dump_state: Option<&Path>,
) -> Result<(), HeadlessError> {
    tracing::info!("Running replay: {}", replay.display());

    let content = load_content(content)?;
    let replay = load_replay(replay)?;
    let config = load_config_or_default(config)?;

    let (report, state) = run_replay(&replay, &content, config)?;

    println!("outcome: {:?}", report.outcome);
    println!("tick: {}", report.digest.tick);
    println!(
        "pyres: player {} / enemy {}",
        report.digest.player_pyre_hp, report.digest.enemy_pyre_hp
    );
    println!(
        "units: player {} / enemy {}",
        report.digest.player_units, report.digest.enemy_units
    );
    println!("hash: {:016x} ({})", report.hash, report.hash);

    if let Some(path) = dump_state {
        let json = serde_json::to_string_pretty(&state)?;
        std::fs::write(path, json)?;
        tracing::info!("Final state written to {}", path.display());
    }

    Ok(())
}

/// Check that repeated runs agree.
fn cmd_verify(
    content: &Path,
    replay: &Path,
    config: Option<&Path>,
    runs: u32,
) -> Result<(), HeadlessError> {
    let content = load_content(content)?;
    let replay = load_replay(replay)?;
    let config = load_config_or_default(config)?;

    let report = verify_replay(&replay, &content, config, runs)?;

    if report.is_deterministic() {
        let hash = report.hashes.first().copied().unwrap_or_default();
        eprintln!("PASS: All {} runs produced identical results", runs);
        println!("hash: {:016x}", hash);
    } else {
        eprintln!("FAIL: Non-determinism detected!");
        for hash in report.unique_hashes() {
            eprintln!("  {:016x}", hash);
        }
        std::process::exit(1);
    }

    Ok(())
}

/// Compare a replay against a pinned hash.
fn cmd_golden(
    content: &Path,
    replay: &Path,
    config: Option<&Path>,
    expected: u64,
) -> Result<(), HeadlessError> {
    let content = load_content(content)?;
    let replay = load_replay(replay)?;
    let config = load_config_or_default(config)?;

    let check = check_golden(&replay, &content, config, expected)?;

    eprintln!("  Expected hash: {:016x}", check.expected);
    eprintln!("  Actual hash:   {:016x}", check.actual);
    if check.passed() {
        eprintln!("PASS: Golden hash matches");
    } else {
        eprintln!("FAIL: Golden hash mismatch");
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_seed(action: SeedAction) {
    match action {
        SeedAction::New => {
            let seed = SeedFactory::make_run_seed(|| rand::rngs::OsRng.next_u64());
            println!("{}", seed);
        }
        SeedAction::Encounter {
            run_seed,
            floor,
            node,
            salt,
        } => {
            let seed = SeedFactory::encounter_seed(run_seed, floor, node, salt);
            println!("{}", seed);
        }
    }
}
