use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::config::{AgentConfig, AgentKind, BenchmarkConfig};
use crate::driver::{MatchOutcome, Seating};

const Z_95: f64 = 1.959963984540054;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("agent '{0}' defined in results but missing from configuration")]
    UnknownAgent(String),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render plot: {0}")]
    Plot(String),
}

/// Round wins and losses for one agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WinStats {
    pub wins: u32,
    pub losses: u32,
}

impl WinStats {
    pub fn add(&mut self, wins: u32, losses: u32) {
        self.wins += wins;
        self.losses += losses;
    }

    pub fn total(&self) -> u32 {
        self.wins + self.losses
    }

    pub fn win_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            n => f64::from(self.wins) / f64::from(n),
        }
    }

    pub fn ci(&self, confidence: f64) -> (f64, f64) {
        wilson_interval(self.wins, self.total(), confidence)
    }
}

/// Two-sided normal quantile for `confidence`.
pub fn z_score(confidence: f64) -> f64 {
    Normal::new(0.0, 1.0)
        .map(|normal| normal.inverse_cdf(1.0 - (1.0 - confidence) / 2.0))
        .unwrap_or(Z_95)
}

/// Wilson score interval for `wins` successes out of `n`, clamped to `[0, 1]`.
pub fn wilson_interval(wins: u32, n: u32, confidence: f64) -> (f64, f64) {
    if n == 0 {
        return (0.0, 0.0);
    }
    let n = f64::from(n);
    let p = f64::from(wins) / n;
    let z = z_score(confidence);
    let z2 = z * z;

    let denom = 1.0 + z2 / n;
    let centre = (p + z2 / (2.0 * n)) / denom;
    let half = z * ((p * (1.0 - p) / n) + z2 / (4.0 * n * n)).sqrt() / denom;
    ((centre - half).max(0.0), (centre + half).min(1.0))
}

pub struct AnalyticsCollector {
    confidence: f64,
    focus: String,
    agents: HashMap<String, AgentAccumulator>,
    agent_order: Vec<String>,
    seatings: Vec<SeatingAccumulator>,
}

impl AnalyticsCollector {
    pub fn new(config: &BenchmarkConfig) -> Self {
        let mut agents = HashMap::new();
        let mut order = Vec::new();
        for agent in &config.agents {
            agents.insert(agent.name.clone(), AgentAccumulator::new(agent.clone()));
            order.push(agent.name.clone());
        }

        Self {
            confidence: config.metrics.confidence,
            focus: config.focus_agent().to_string(),
            agents,
            agent_order: order,
            seatings: Vec::new(),
        }
    }

    pub fn record_match(&mut self, outcome: &MatchOutcome) -> Result<(), AnalyticsError> {
        let [p0, p1] = &outcome.seats;

        for (seat, other) in [(p0, p1), (p1, p0)] {
            let acc = self
                .agents
                .get_mut(&seat.agent_name)
                .ok_or_else(|| AnalyticsError::UnknownAgent(seat.agent_name.clone()))?;
            acc.rounds.add(seat.wins, other.wins);
            acc.per_seat[seat.seat.index()].add(seat.wins, other.wins);
            acc.per_seating[outcome.seating.index()].add(seat.wins, other.wins);
            match seat.wins.cmp(&other.wins) {
                std::cmp::Ordering::Greater => acc.matches.add(1, 0),
                std::cmp::Ordering::Less => acc.matches.add(0, 1),
                std::cmp::Ordering::Equal => acc.match_draws += 1,
            }
            acc.decisions += u64::from(seat.metrics.decisions);
            acc.total_ms += seat.metrics.total_ms;
        }

        let index = match self
            .seatings
            .iter()
            .position(|s| s.seating == outcome.seating)
        {
            Some(index) => index,
            None => {
                self.seatings.push(SeatingAccumulator {
                    seating: outcome.seating,
                    p0_agent: p0.agent_name.clone(),
                    p1_agent: p1.agent_name.clone(),
                    matches: 0,
                    p0_rounds: WinStats::default(),
                });
                self.seatings.len() - 1
            }
        };
        let seating = &mut self.seatings[index];
        seating.matches += 1;
        seating.p0_rounds.add(p0.wins, p1.wins);

        Ok(())
    }

    pub fn finalize(mut self) -> AnalyticsSummary {
        let confidence = self.confidence;
        let mut reports = Vec::new();
        for name in &self.agent_order {
            if let Some(acc) = self.agents.remove(name) {
                reports.push(acc.into_report(confidence));
            }
        }

        let focus_seat_average = reports
            .iter()
            .find(|report| report.name == self.focus)
            .and_then(|report| report.seating_average);

        let seatings = self
            .seatings
            .into_iter()
            .map(|acc| SeatingReport {
                seating: acc.seating,
                p0_agent: acc.p0_agent,
                p1_agent: acc.p1_agent,
                matches: acc.matches,
                p0_win_rate: acc.p0_rounds.win_rate(),
                p0_ci: acc.p0_rounds.ci(confidence),
                p0_rounds: acc.p0_rounds,
            })
            .collect();

        AnalyticsSummary {
            confidence,
            focus: self.focus,
            focus_seat_average,
            agents: reports,
            seatings,
        }
    }
}

struct AgentAccumulator {
    config: AgentConfig,
    rounds: WinStats,
    per_seat: [WinStats; 2],
    per_seating: [WinStats; 2],
    matches: WinStats,
    match_draws: u32,
    decisions: u64,
    total_ms: f64,
}

impl AgentAccumulator {
    fn new(config: AgentConfig) -> Self {
        Self {
            config,
            rounds: WinStats::default(),
            per_seat: [WinStats::default(); 2],
            per_seating: [WinStats::default(); 2],
            matches: WinStats::default(),
            match_draws: 0,
            decisions: 0,
            total_ms: 0.0,
        }
    }

    fn into_report(self, confidence: f64) -> AgentReport {
        let played: Vec<f64> = self
            .per_seating
            .iter()
            .filter(|stats| stats.total() > 0)
            .map(WinStats::win_rate)
            .collect();
        let seating_average = if played.is_empty() {
            None
        } else {
            Some(played.iter().sum::<f64>() / played.len() as f64)
        };

        let avg_latency = if self.decisions == 0 {
            0.0
        } else {
            self.total_ms / self.decisions as f64
        };

        AgentReport {
            name: self.config.name,
            kind: self.config.kind,
            params: self.config.params,
            win_rate: self.rounds.win_rate(),
            ci: self.rounds.ci(confidence),
            rounds: self.rounds,
            seat_win_rates: self.per_seat.map(|stats| stats.win_rate()),
            seating_average,
            matches: self.matches,
            match_draws: self.match_draws,
            average_ms_per_decision: avg_latency,
        }
    }
}

struct SeatingAccumulator {
    seating: Seating,
    p0_agent: String,
    p1_agent: String,
    matches: u32,
    p0_rounds: WinStats,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub confidence: f64,
    pub focus: String,
    pub focus_seat_average: Option<f64>,
    pub agents: Vec<AgentReport>,
    pub seatings: Vec<SeatingReport>,
}

impl AnalyticsSummary {
    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        let pct = (self.confidence * 100.0).round();
        let mut rows = String::new();
        rows.push_str("# Match Summary\n\n");
        if let Some(rate) = self.focus_seat_average {
            rows.push_str(&format!(
                "Focus agent `{}`: seat-averaged round win rate {:.1}%\n\n",
                self.focus,
                rate * 100.0
            ));
        }

        rows.push_str("## Agents\n\n");
        rows.push_str(&format!(
            "| Agent | Kind | Rounds | Wins | Win % | {pct}% CI | Match W-L-D | Win % as P0 | Win % as P1 | Avg ms/decision |\n"
        ));
        rows.push_str("|-------|------|--------|------|-------|--------|-------------|-------------|-------------|-----------------|\n");
        for agent in &self.agents {
            rows.push_str(&format!(
                "| {name} | {kind:?} | {rounds} | {wins} | {win:.1}% | [{ci_low:.3}, {ci_high:.3}] | {mw}-{ml}-{md} | {p0:.1}% | {p1:.1}% | {latency:.3} |\n",
                name = agent.name,
                kind = agent.kind,
                rounds = agent.rounds.total(),
                wins = agent.rounds.wins,
                win = agent.win_rate * 100.0,
                ci_low = agent.ci.0,
                ci_high = agent.ci.1,
                mw = agent.matches.wins,
                ml = agent.matches.losses,
                md = agent.match_draws,
                p0 = agent.seat_win_rates[0] * 100.0,
                p1 = agent.seat_win_rates[1] * 100.0,
                latency = agent.average_ms_per_decision,
            ));
        }

        rows.push_str("\n## Seatings\n\n");
        rows.push_str(&format!(
            "| Seating | P0 | P1 | Matches | P0 rounds | P0 win % | {pct}% CI |\n"
        ));
        rows.push_str("|---------|----|----|---------|-----------|----------|--------|\n");
        for seating in &self.seatings {
            rows.push_str(&format!(
                "| {label} | {p0} | {p1} | {matches} | {rounds} | {win:.1}% | [{ci_low:.3}, {ci_high:.3}] |\n",
                label = seating.seating.as_str(),
                p0 = seating.p0_agent,
                p1 = seating.p1_agent,
                matches = seating.matches,
                rounds = seating.p0_rounds.total(),
                win = seating.p0_win_rate * 100.0,
                ci_low = seating.p0_ci.0,
                ci_high = seating.p0_ci.1,
            ));
        }

        fs::write(path.as_ref(), rows).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })?;
        Ok(())
    }

    pub fn render_plot(&self, dir: impl AsRef<Path>) -> Result<PathBuf, AnalyticsError> {
        let dir = dir.as_ref();
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|e| AnalyticsError::Io {
                context: "creating plots directory",
                source: e,
            })?;
        }

        let output_path = dir.join("win_rate.png");
        let focus = self.focus.clone();
        let agents = self.agents.clone();

        let prev_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(|_| {}));

        let plot_attempt = std::panic::catch_unwind(move || {
            let root = BitMapBackend::new(&output_path, (800, 480)).into_drawing_area();
            root.fill(&WHITE)
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            let width = agents.len() as f64;
            let mut chart = ChartBuilder::on(&root)
                .margin(20)
                .caption("Round win rate with confidence interval", ("sans-serif", 22))
                .set_label_area_size(LabelAreaPosition::Left, 50)
                .set_label_area_size(LabelAreaPosition::Bottom, 60)
                .build_cartesian_2d(0.0..width, 0.0..1.0)
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            chart
                .configure_mesh()
                .disable_mesh()
                .y_desc("Win rate")
                .x_desc("Agent")
                .x_labels(agents.len() * 2 + 1)
                .x_label_formatter(&|x| {
                    let idx = x.floor() as usize;
                    if (x - idx as f64 - 0.5).abs() < 0.25 {
                        agents
                            .get(idx)
                            .map(|agent| agent.name.clone())
                            .unwrap_or_default()
                    } else {
                        String::new()
                    }
                })
                .draw()
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            chart
                .draw_series(agents.iter().enumerate().map(|(idx, agent)| {
                    let color = if agent.name == focus { &GREEN } else { &BLUE };
                    let left = idx as f64 + 0.2;
                    Rectangle::new([(left, 0.0), (left + 0.6, agent.win_rate)], color.filled())
                }))
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            chart
                .draw_series(agents.iter().enumerate().map(|(idx, agent)| {
                    let x = idx as f64 + 0.5;
                    PathElement::new(vec![(x, agent.ci.0), (x, agent.ci.1)], BLACK.stroke_width(2))
                }))
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            chart
                .draw_series(LineSeries::new(
                    vec![(0.0, 0.5), (width, 0.5)],
                    BLACK.mix(0.4),
                ))
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            drop(chart);

            root.present()
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            drop(root);

            Ok(output_path)
        });

        std::panic::set_hook(prev_hook);

        match plot_attempt {
            Ok(result) => result,
            Err(_) => Err(AnalyticsError::Plot(
                "plotters panicked while rendering (missing font support?)".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub name: String,
    pub kind: AgentKind,
    pub params: serde_yaml::Value,
    pub rounds: WinStats,
    pub win_rate: f64,
    pub ci: (f64, f64),
    pub seat_win_rates: [f64; 2],
    /// Mean of the per-seating win rates, so each seating counts equally.
    pub seating_average: Option<f64>,
    pub matches: WinStats,
    pub match_draws: u32,
    pub average_ms_per_decision: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeatingReport {
    pub seating: Seating,
    pub p0_agent: String,
    pub p1_agent: String,
    pub matches: u32,
    pub p0_rounds: WinStats,
    pub p0_win_rate: f64,
    pub p0_ci: (f64, f64),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{DecisionSummary, SeatResult};
    use schcats_core::model::player::PlayerId;

    const CONFIG_YAML: &str = r#"
run_id: "analytics"
matches:
  count: 2
agents:
  - name: "tom0"
    kind: "zero_order"
  - name: "tom1"
    kind: "first_order"
outputs:
  jsonl: "out/matches.jsonl"
  summary_md: "out/summary.md"
  plots_dir: "out/plots"
"#;

    fn config() -> BenchmarkConfig {
        let mut cfg: BenchmarkConfig = serde_yaml::from_str(CONFIG_YAML).expect("yaml");
        cfg.validate().expect("valid");
        cfg
    }

    fn seat(seat: PlayerId, agent_index: usize, name: &str, wins: u32) -> SeatResult {
        SeatResult {
            seat,
            agent_index,
            agent_name: name.to_string(),
            wins,
            metrics: DecisionSummary {
                decisions: 10,
                total_ms: 1.0,
            },
        }
    }

    fn outcome(seating: Seating, p0_wins: u32, p1_wins: u32) -> MatchOutcome {
        let (p0, p1) = match seating {
            Seating::Original => ((0, "tom0"), (1, "tom1")),
            Seating::Swapped => ((1, "tom1"), (0, "tom0")),
        };
        MatchOutcome {
            match_id: format!("M00000_{}", seating.as_str()),
            match_index: 0,
            seating,
            seed: 0,
            rounds: p0_wins + p1_wins,
            seats: [
                seat(PlayerId::Zero, p0.0, p0.1, p0_wins),
                seat(PlayerId::One, p1.0, p1.1, p1_wins),
            ],
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn wilson_matches_reference_values() {
        let (lo, hi) = wilson_interval(50, 100, 0.95);
        assert!(approx(lo, 0.403831), "lo = {lo}");
        assert!(approx(hi, 0.596169), "hi = {hi}");

        let (lo, hi) = wilson_interval(0, 10, 0.95);
        assert!(approx(lo, 0.0));
        assert!(approx(hi, 0.277533), "hi = {hi}");

        let (lo, hi) = wilson_interval(10, 10, 0.95);
        assert!(approx(lo, 0.722467), "lo = {lo}");
        assert!(approx(hi, 1.0));
    }

    #[test]
    fn wilson_of_empty_sample_is_zero() {
        assert_eq!(wilson_interval(0, 0, 0.95), (0.0, 0.0));
        assert_eq!(WinStats::default().win_rate(), 0.0);
    }

    #[test]
    fn z_score_tracks_confidence() {
        assert!(approx(z_score(0.95), Z_95));
        assert!(z_score(0.99) > z_score(0.95));
        let narrow = wilson_interval(30, 60, 0.8);
        let wide = wilson_interval(30, 60, 0.99);
        assert!(wide.0 < narrow.0 && wide.1 > narrow.1);
    }

    #[test]
    fn collector_averages_focus_over_seatings() {
        let mut collector = AnalyticsCollector::new(&config());
        collector
            .record_match(&outcome(Seating::Original, 4, 6))
            .expect("record");
        collector
            .record_match(&outcome(Seating::Swapped, 8, 2))
            .expect("record");
        let summary = collector.finalize();

        let tom1 = summary
            .agents
            .iter()
            .find(|a| a.name == "tom1")
            .expect("tom1 report");
        assert_eq!(tom1.rounds, WinStats { wins: 14, losses: 6 });
        assert!(approx(tom1.win_rate, 0.7));
        assert_eq!(tom1.matches, WinStats { wins: 2, losses: 0 });
        assert!(approx(tom1.seat_win_rates[0], 0.8));
        assert!(approx(tom1.seat_win_rates[1], 0.6));

        assert_eq!(summary.focus, "tom1");
        assert!(approx(summary.focus_seat_average.expect("focus played"), 0.7));
        assert_eq!(summary.seatings.len(), 2);
        assert_eq!(summary.seatings[1].p0_agent, "tom1");
    }

    #[test]
    fn decision_latency_is_pooled_across_matches() {
        let mut collector = AnalyticsCollector::new(&config());
        let mut slow = outcome(Seating::Original, 2, 2);
        slow.seats[1].metrics = DecisionSummary {
            decisions: 30,
            total_ms: 9.0,
        };
        collector.record_match(&slow).expect("record");
        collector
            .record_match(&outcome(Seating::Swapped, 2, 2))
            .expect("record");
        let summary = collector.finalize();

        let tom1 = summary
            .agents
            .iter()
            .find(|a| a.name == "tom1")
            .expect("tom1 report");
        // (9.0 + 1.0) ms over (30 + 10) decisions, not the mean of per-match averages.
        assert!(approx(tom1.average_ms_per_decision, 0.25));
        let tom0 = &summary.agents[0];
        assert!(approx(tom0.average_ms_per_decision, 0.1));
    }

    #[test]
    fn unknown_agents_are_rejected() {
        let mut collector = AnalyticsCollector::new(&config());
        let mut bad = outcome(Seating::Original, 1, 1);
        bad.seats[0].agent_name = "ghost".to_string();
        let err = collector.record_match(&bad).expect_err("ghost is not configured");
        assert!(matches!(err, AnalyticsError::UnknownAgent(name) if name == "ghost"));
    }

    #[test]
    fn markdown_lists_agents_and_seatings() {
        let mut collector = AnalyticsCollector::new(&config());
        collector
            .record_match(&outcome(Seating::Original, 3, 2))
            .expect("record");
        let summary = collector.finalize();

        let file = tempfile::NamedTempFile::new().expect("temp file");
        summary.write_markdown(file.path()).expect("write markdown");
        let contents = std::fs::read_to_string(file.path()).expect("read markdown");
        assert!(contents.contains("# Match Summary"));
        assert!(contents.contains("| tom0 | ZeroOrder | 5 | 3 | 60.0%"));
        assert!(contents.contains("| original | tom0 | tom1 | 1 | 5 | 60.0%"));
        assert!(contents.contains("Focus agent `tom1`"));
    }
}
