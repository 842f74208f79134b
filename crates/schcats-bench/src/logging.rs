use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::Level;
use tracing_appender::non_blocking::{NonBlockingBuilder, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LoggingConfig, ResolvedOutputs};

/// Read by the agents to decide whether per-candidate scores are logged.
pub const DECISION_DETAILS_ENV: &str = "SCHCATS_DECISION_DETAILS";

const TELEMETRY_FILE: &str = "telemetry.jsonl";

/// Keeps the non-blocking writer flushing until the run ends.
pub struct LoggingGuard {
    _worker: WorkerGuard,
    pub telemetry_path: PathBuf,
}

/// Directory that receives `telemetry.jsonl`: next to the summary table.
pub fn telemetry_dir(outputs: &ResolvedOutputs) -> PathBuf {
    outputs
        .summary_md
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn telemetry_path(outputs: &ResolvedOutputs) -> PathBuf {
    telemetry_dir(outputs).join(TELEMETRY_FILE)
}

/// Installs the JSON subscriber that writes match and decision events to
/// `telemetry.jsonl`. Returns `None` when structured logging is off.
pub fn init_logging(
    logging: &LoggingConfig,
    outputs: &ResolvedOutputs,
) -> Result<Option<LoggingGuard>> {
    if !logging.enable_structured {
        return Ok(None);
    }

    if logging.decision_details {
        // SAFETY: called from `main` before any match thread starts.
        unsafe { std::env::set_var(DECISION_DETAILS_ENV, "1") };
    }

    let dir = telemetry_dir(outputs);
    fs::create_dir_all(&dir)
        .with_context(|| format!("creating telemetry directory at {}", dir.display()))?;
    let telemetry_path = dir.join(TELEMETRY_FILE);
    let file = File::create(&telemetry_path)
        .with_context(|| format!("creating telemetry file at {}", telemetry_path.display()))?;

    // Telemetry is summarised after the run, so events must not be dropped.
    let (writer, worker) = NonBlockingBuilder::default().lossy(false).finish(file);
    let level = logging.level().unwrap_or(Level::INFO);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .json()
        .with_current_span(true)
        .with_writer(writer)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("installing the telemetry subscriber")?;

    Ok(Some(LoggingGuard {
        _worker: worker,
        telemetry_path,
    }))
}
