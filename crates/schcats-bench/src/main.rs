use std::path::PathBuf;

use clap::Parser;

use schcats_bench::config::{BenchmarkConfig, ResolvedOutputs};
use schcats_bench::driver::MatchRunner;
use schcats_bench::logging::init_logging;

/// Match harness for the claim-and-doubt agents.
#[derive(Debug, Parser)]
#[command(
    name = "schcats-bench",
    author,
    version,
    about = "Deterministic schcats match harness"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of matches to play per seating.
    #[arg(long, value_name = "MATCHES")]
    matches: Option<usize>,

    /// Override the number of rounds in each match.
    #[arg(long, value_name = "ROUNDS")]
    rounds: Option<u32>,

    /// Override the base seed; match `m` deals from `seed + m`.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Play every match in the configured seating only.
    #[arg(long)]
    no_swap: bool,

    /// Exit after validating the configuration (no matches are played).
    #[arg(long)]
    validate_only: bool,

    /// Log per-candidate decision detail regardless of config (forces SCHCATS_DECISION_DETAILS=1).
    #[arg(long)]
    log_decision_details: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = BenchmarkConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(matches) = cli.matches {
        config.matches.count = matches;
    }

    if let Some(rounds) = cli.rounds {
        config.matches.rounds_per_match = rounds;
    }

    if let Some(seed) = cli.seed {
        config.matches.seed = seed;
    }

    if cli.no_swap {
        config.matches.swap_seats = false;
    }

    if cli.log_decision_details {
        config.logging.decision_details = true;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let matches = config.matches.count;
    let rounds = config.matches.rounds_per_match;
    let names = config
        .agents
        .iter()
        .map(|agent| agent.name.as_str())
        .collect::<Vec<_>>()
        .join(" vs ");

    println!(
        "Loaded configuration '{run_id}': {names} ({matches} matches × {rounds} rounds, seat swap {})",
        if config.matches.swap_seats { "on" } else { "off" }
    );

    let _logging_guard = init_logging(&config.logging, &outputs)?;
    let runner = MatchRunner::new(config, outputs)?;

    if cli.validate_only {
        println!("Validation-only mode: no matches played.");
        return Ok(());
    }

    let summary = runner.run()?;
    println!(
        "Run complete for '{run_id}': {} matches × {} seatings → {} rows at {}",
        summary.matches_played,
        summary.seatings,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    if let Some(rounds_path) = summary.rounds_path.as_ref() {
        println!("Round records: {}", rounds_path.display());
    }
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(rate) = summary.focus_win_rate {
        println!("Focus agent seat-averaged win rate: {:.1}%", rate * 100.0);
    }
    if let Some(plot_path) = summary.plot_path.as_ref() {
        println!("Win rate plot: {}", plot_path.display());
    }
    if let Some(telemetry_path) = summary.telemetry_path.as_ref() {
        println!("Telemetry log: {}", telemetry_path.display());
    }
    if let Some(outputs) = summary.telemetry_outputs.as_ref() {
        println!("Telemetry summary (JSON): {}", outputs.json_path.display());
        println!(
            "Telemetry summary (Markdown): {}",
            outputs.markdown_path.display()
        );
        println!(
            "  Decisions: {} events, {} doubts, {} fallback activations",
            outputs.summary.decisions.count,
            outputs.summary.decisions.doubts,
            outputs.summary.fallback.activations
        );
    }

    Ok(())
}
