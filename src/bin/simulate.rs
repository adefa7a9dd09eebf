//! Headless game runner.
//!
//! Feeds a scripted event sequence through the same stream pipeline the
//! interactive game uses and prints what happened.
//!
//! Usage:
//!   cargo run --bin simulate -- [OPTIONS]
//!
//! Examples:
//!   cargo run --bin simulate                                # flap once, then fall
//!   cargo run --bin simulate -- -e "flap,tick*40,flap,tick*40" -s 42
//!   cargo run --bin simulate -- --config game.json --json

use clap::Parser;
use flapstream::build_info;
use flapstream::config::GameConfig;
use flapstream::errors::FlapResult;
use flapstream::logging;
use flapstream::simulator::{run_script, EventScript, SimConfig};
use std::path::PathBuf;
use std::process::ExitCode;

/// Run scripted input through the flapstream pipeline
#[derive(Parser)]
#[command(author, version = build_info::VERSION_LINE, about, long_about = None)]
struct Args {
    /// Comma-separated event tags, each optionally repeated with `*N`
    #[arg(short, long, default_value = "flap,tick*400")]
    events: String,

    /// Level seed
    #[arg(short, long, default_value_t = 1)]
    seed: u64,

    /// JSON config file (keys and timings)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn run(args: &Args) -> FlapResult<String> {
    logging::init(args.verbose, None)?;
    let game = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };
    let script: EventScript = args.events.parse()?;
    let config = SimConfig {
        seed: args.seed,
        game,
    };

    let report = run_script(&script, &config)?;
    Ok(if args.json {
        report.to_json()
    } else {
        report.to_text()
    })
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("simulate: {err}");
            ExitCode::FAILURE
        }
    }
}
