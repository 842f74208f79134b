use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse telemetry JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize)]
pub struct TelemetrySummary {
    pub decisions: DecisionTelemetrySummary,
    pub fallback: FallbackTelemetrySummary,
    pub rounds: RoundTelemetrySummary,
}

#[derive(Debug, Default, Serialize)]
pub struct DecisionTelemetrySummary {
    pub count: usize,
    pub doubts: usize,
    /// Mean truth probability of the claim an agent answered.
    pub avg_standing_probability: Option<f64>,
    /// Mean truth probability of the claims agents made.
    pub avg_chosen_probability: Option<f64>,
    pub avg_predicted_doubt: Option<f64>,
    pub per_agent: BTreeMap<String, AgentDecisionCounts>,
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct AgentDecisionCounts {
    pub decisions: usize,
    pub doubts: usize,
    pub modes: BTreeMap<String, usize>,
}

#[derive(Debug, Default, Serialize)]
pub struct FallbackTelemetrySummary {
    pub activations: usize,
    pub per_agent: BTreeMap<String, usize>,
}

#[derive(Debug, Default, Serialize)]
pub struct RoundTelemetrySummary {
    pub count: usize,
    pub claims_held: usize,
    pub avg_events: Option<f64>,
}

#[derive(Debug)]
struct Average {
    sum: f64,
    count: usize,
}

impl Average {
    fn new() -> Self {
        Self { sum: 0.0, count: 0 }
    }

    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// Aggregate decision, fallback, and round telemetry emitted during a run.
pub fn summarise_telemetry(path: &Path) -> Result<TelemetrySummary, TelemetryError> {
    if !path.exists() {
        return Ok(TelemetrySummary::default());
    }

    let file = File::open(path).map_err(|source| TelemetryError::Io {
        context: "opening telemetry log",
        source,
    })?;
    let reader = BufReader::new(file);

    let mut summary = TelemetrySummary::default();
    let mut standing_avg = Average::new();
    let mut chosen_avg = Average::new();
    let mut predicted_avg = Average::new();
    let mut events_avg = Average::new();

    for line in reader.lines() {
        let line = line.map_err(|source| TelemetryError::Io {
            context: "reading telemetry line",
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let payload: Value = serde_json::from_str(&line)?;
        let target = payload
            .get("target")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let fields = payload
            .get("fields")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        match target {
            "schcats_bot::decision" => {
                let decisions = &mut summary.decisions;
                decisions.count += 1;
                let doubted = fields
                    .get("doubted")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                if doubted {
                    decisions.doubts += 1;
                }

                if let Some(p) = probability(&fields, "standing_probability") {
                    standing_avg.add(p);
                }
                if let Some(p) = probability(&fields, "chosen_probability") {
                    chosen_avg.add(p);
                }
                if let Some(p) = probability(&fields, "predicted_doubt") {
                    predicted_avg.add(p);
                }

                let agent = label(&fields, "agent");
                let mode = label(&fields, "mode");
                let counts = decisions.per_agent.entry(agent).or_default();
                counts.decisions += 1;
                if doubted {
                    counts.doubts += 1;
                }
                *counts.modes.entry(mode).or_insert(0) += 1;
            }
            "schcats_bot::fallback" => {
                summary.fallback.activations += 1;
                *summary
                    .fallback
                    .per_agent
                    .entry(label(&fields, "agent"))
                    .or_insert(0) += 1;
            }
            "schcats_bench::round" => {
                summary.rounds.count += 1;
                if fields
                    .get("claim_held")
                    .and_then(Value::as_bool)
                    .unwrap_or(false)
                {
                    summary.rounds.claims_held += 1;
                }
                if let Some(events) = fields.get("events").and_then(Value::as_f64) {
                    events_avg.add(events);
                }
            }
            _ => {}
        }
    }

    summary.decisions.avg_standing_probability = standing_avg.mean();
    summary.decisions.avg_chosen_probability = chosen_avg.mean();
    summary.decisions.avg_predicted_doubt = predicted_avg.mean();
    summary.rounds.avg_events = events_avg.mean();

    Ok(summary)
}

/// Probabilities are logged as `-1` when they do not apply.
fn probability(fields: &Map<String, Value>, key: &str) -> Option<f64> {
    fields
        .get(key)
        .and_then(Value::as_f64)
        .filter(|p| (0.0..=1.0).contains(p))
}

fn label(fields: &Map<String, Value>, key: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .unwrap_or("<unset>")
        .to_string()
}

pub fn write_summary_outputs(
    telemetry_path: &Path,
    output_dir: &Path,
) -> Result<Option<TelemetryOutputs>, TelemetryError> {
    if !telemetry_path.exists() {
        return Ok(None);
    }

    let summary = summarise_telemetry(telemetry_path)?;
    let json_path = output_dir.join("telemetry_summary.json");
    let md_path = output_dir.join("telemetry_summary.md");

    std::fs::write(
        &json_path,
        serde_json::to_vec_pretty(&summary).map_err(TelemetryError::from)?,
    )
    .map_err(|source| TelemetryError::Io {
        context: "writing telemetry summary json",
        source,
    })?;

    let markdown = render_markdown(&summary, telemetry_path);
    std::fs::write(&md_path, markdown).map_err(|source| TelemetryError::Io {
        context: "writing telemetry summary markdown",
        source,
    })?;

    Ok(Some(TelemetryOutputs {
        summary,
        json_path,
        markdown_path: md_path,
    }))
}

pub fn append_highlights_to_markdown(
    summary_path: &Path,
    outputs: &TelemetryOutputs,
) -> Result<(), TelemetryError> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(summary_path)
        .map_err(|source| TelemetryError::Io {
            context: "opening summary markdown for telemetry append",
            source,
        })?;

    let mut section = String::new();
    section.push_str("\n## Telemetry Highlights\n");
    let decisions = &outputs.summary.decisions;
    section.push_str(&format!("- Decisions captured: {}\n", decisions.count));
    section.push_str(&format!("- Doubts: {}\n", decisions.doubts));
    if let Some(value) = decisions.avg_standing_probability {
        section.push_str(&format!("- Avg truth probability faced: {:.3}\n", value));
    }
    if let Some(value) = decisions.avg_chosen_probability {
        section.push_str(&format!("- Avg truth probability claimed: {:.3}\n", value));
    }
    section.push_str(&format!(
        "- Fallback activations: {}\n",
        outputs.summary.fallback.activations
    ));

    section.push_str("\n### Decision Modes\n");
    if decisions.per_agent.is_empty() {
        section.push_str("- <none>\n");
    } else {
        for (agent, counts) in &decisions.per_agent {
            let modes = counts
                .modes
                .iter()
                .map(|(mode, count)| format!("{mode} {count}"))
                .collect::<Vec<_>>()
                .join(", ");
            section.push_str(&format!("- {}: {}\n", agent, modes));
        }
    }

    write!(file, "{section}").map_err(|source| TelemetryError::Io {
        context: "writing telemetry highlights",
        source,
    })?;

    Ok(())
}

fn render_markdown(summary: &TelemetrySummary, telemetry_path: &Path) -> String {
    let mut output = String::new();
    output.push_str("# Telemetry Summary\n\n");
    output.push_str(&format!("- Source: `{}`\n", telemetry_path.display()));
    output.push('\n');

    let decisions = &summary.decisions;
    output.push_str("## Decisions\n");
    output.push_str(&format!("- Events: {}\n", decisions.count));
    output.push_str(&format!("- Doubts: {}\n", decisions.doubts));
    if let Some(value) = decisions.avg_standing_probability {
        output.push_str(&format!("- Avg standing-claim probability: {:.3}\n", value));
    }
    if let Some(value) = decisions.avg_chosen_probability {
        output.push_str(&format!("- Avg chosen-claim probability: {:.3}\n", value));
    }
    if let Some(value) = decisions.avg_predicted_doubt {
        output.push_str(&format!("- Avg predicted doubt: {:.3}\n", value));
    }
    for (agent, counts) in &decisions.per_agent {
        output.push_str(&format!(
            "- {}: {} decisions, {} doubts\n",
            agent, counts.decisions, counts.doubts
        ));
        for (mode, count) in &counts.modes {
            output.push_str(&format!("  - {}: {}\n", mode, count));
        }
    }
    output.push('\n');

    output.push_str("## Fallback\n");
    output.push_str(&format!("- Activations: {}\n", summary.fallback.activations));
    for (agent, count) in &summary.fallback.per_agent {
        output.push_str(&format!("  - {}: {}\n", agent, count));
    }
    output.push('\n');

    output.push_str("## Rounds\n");
    output.push_str(&format!("- Resolved: {}\n", summary.rounds.count));
    output.push_str(&format!("- Claims held: {}\n", summary.rounds.claims_held));
    if let Some(value) = summary.rounds.avg_events {
        output.push_str(&format!("- Avg public events per round: {:.2}\n", value));
    }
    output
}

#[derive(Debug)]
pub struct TelemetryOutputs {
    pub summary: TelemetrySummary,
    pub json_path: PathBuf,
    pub markdown_path: PathBuf,
}
