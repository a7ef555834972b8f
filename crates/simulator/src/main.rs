//! Simulator CLI
//!
//! Simulate a batch of games and persist them, or print statistics for a
//! run that was already written.

use anyhow::{bail, Context};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use simulator::{
    analyze_run, Config, Orchestrator, RawConfig, ResultWriter, StandardPlayers,
    DEFAULT_CONFIG_FILE,
};
use std::path::{Path, PathBuf};
use toml::Value;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "simulator")]
#[command(about = "Batch chess game simulator")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Simulate a batch of games (default)
    Run(RunArgs),
    /// Print statistics for a finished run directory
    Analyze { run_dir: PathBuf },
}

/// Command-line values override the config file. They are kept as text so
/// that validation reports bad values the same way for both sources.
#[derive(Args, Debug)]
struct RunArgs {
    /// Print each game's outcome as it finishes
    #[arg(long)]
    verbosity: bool,
    /// Number of games to simulate
    #[arg(long)]
    simulations: Option<String>,
    /// Opponent of the random player: random or engine
    #[arg(long)]
    opponent: Option<String>,
    /// Engine executable (UCI)
    #[arg(long)]
    engine: Option<String>,
    /// Games played in parallel
    #[arg(long)]
    threads: Option<String>,
    /// Existing directory that receives the run directory
    #[arg(long)]
    output: Option<String>,
    /// Engine thinking time per move, in milliseconds
    #[arg(long)]
    move_time_ms: Option<String>,
    /// Config file [default: config.toml, if present]
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for the pairing shuffle
    #[arg(long)]
    seed: Option<u64>,
}

impl RunArgs {
    fn overrides(&self) -> RawConfig {
        let text = |v: &Option<String>| v.clone().map(Value::String);
        RawConfig {
            verbosity: self.verbosity.then_some(Value::Boolean(true)),
            simulations: text(&self.simulations),
            opponent: text(&self.opponent),
            engine: text(&self.engine),
            threads: text(&self.threads),
            output: text(&self.output),
            move_time_ms: text(&self.move_time_ms),
        }
    }

    fn load_config(&self) -> anyhow::Result<Config> {
        let file = match &self.config {
            Some(path) => RawConfig::load(path)?,
            None => RawConfig::load_optional(Path::new(DEFAULT_CONFIG_FILE))?,
        };
        let raw = file.merge(self.overrides());
        Config::validate(&raw).context("invalid configuration")
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "info" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = args.load_config()?;
    init_tracing(config.verbosity);

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let writer = ResultWriter::new(&config.output_dir);
    let orchestrator = Orchestrator::new(config.clone(), StandardPlayers::from_config(&config));
    let mut roster = orchestrator.build_roster(&mut rng);
    let batch = orchestrator.run(&mut roster)?;

    let report = writer
        .write_run(Local::now().naive_local(), &config, &roster)
        .context("failed to persist results")?;

    println!(
        "Simulated {} games ({} failed) in {:.1}s, results in {}",
        roster.len(),
        batch.failed,
        batch.elapsed.as_secs_f64(),
        report.run_dir.display()
    );

    if !report.failed.is_empty() {
        for failure in &report.failed {
            eprintln!("{}: {}", failure.contest, failure.error);
        }
        bail!("{} contests could not be written", report.failed.len());
    }
    Ok(())
}

fn analyze(run_dir: PathBuf) -> anyhow::Result<()> {
    init_tracing(false);
    let stats = analyze_run(&run_dir)
        .with_context(|| format!("failed to analyze {}", run_dir.display()))?;
    print!("{stats}");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Run(args)) => run(args),
        Some(Command::Analyze { run_dir }) => analyze(run_dir),
        None => run(cli.run),
    }
}
