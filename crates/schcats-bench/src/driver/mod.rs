mod seating;

pub use seating::Seating;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use schcats_bot::{
    Agent, AgentError, FirstOrderAgent, FirstOrderParams, ZeroOrderAgent, ZeroOrderParams,
};
use schcats_core::game::error::GameError;
use schcats_core::game::match_state::{MatchConfig, MatchState, StepOutcome};
use schcats_core::game::round::FinishedRound;
use schcats_core::game::serialization::RoundRecord;
use schcats_core::model::player::PlayerId;
use schcats_core::model::score::ScoreBoard;
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event, info_span};

use crate::analytics::{AnalyticsCollector, AnalyticsError};
use crate::config::{AgentConfig, AgentKind, BenchmarkConfig, ResolvedOutputs};
use crate::logging::{telemetry_dir, telemetry_path};
use crate::telemetry::{
    TelemetryError, TelemetryOutputs, append_highlights_to_markdown, write_summary_outputs,
};

const SEAT_SEED_OFFSETS: [u64; 2] = [1000, 2000];

/// Runs `matches.count` matches between the two configured agents and writes every output.
pub struct MatchRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    agents: Vec<AgentBlueprint>,
    logging_enabled: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub matches_played: usize,
    pub seatings: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub rounds_path: Option<PathBuf>,
    pub summary_path: PathBuf,
    pub plot_path: Option<PathBuf>,
    pub focus_win_rate: Option<f64>,
    pub telemetry_path: Option<PathBuf>,
    pub telemetry_outputs: Option<TelemetryOutputs>,
}

impl MatchRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, DriverError> {
        let agents = AgentBlueprint::from_configs(&config.agents)?;
        if agents.len() != 2 {
            return Err(DriverError::SeatCount {
                found: agents.len(),
            });
        }

        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            agents,
        })
    }

    /// Play every match, streaming one JSONL row per match to disk.
    pub fn run(&self) -> Result<RunSummary, DriverError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;
        if let Some(path) = self.outputs.rounds_jsonl.as_ref() {
            ensure_parent(path.parent())?;
        }
        if !self.outputs.plots_dir.as_os_str().is_empty() {
            fs::create_dir_all(&self.outputs.plots_dir)?;
        }

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rounds_writer = match self.outputs.rounds_jsonl.as_ref() {
            Some(path) => Some(BufWriter::new(File::create(path)?)),
            None => None,
        };
        let seatings = Seating::schedule(self.config.matches.swap_seats);
        let mut analytics = AnalyticsCollector::new(&self.config);
        let mut rows_written = 0usize;

        for match_index in 0..self.config.matches.count {
            for &seating in seatings {
                let outcome = self.play_one(match_index, seating, rounds_writer.as_mut())?;
                analytics.record_match(&outcome)?;
                write_match_row(&mut writer, &self.config.run_id, &outcome)?;
                rows_written += 1;
            }
        }

        writer.flush()?;
        if let Some(rounds) = rounds_writer.as_mut() {
            rounds.flush()?;
        }

        let summary = analytics.finalize();
        summary.write_markdown(&self.outputs.summary_md)?;
        let plot_path = match summary.render_plot(&self.outputs.plots_dir) {
            Ok(path) => Some(path),
            Err(err) => {
                eprintln!("WARN: {}", err);
                None
            }
        };

        let telemetry_dir = telemetry_dir(&self.outputs);
        let telemetry_path = if self.logging_enabled {
            Some(telemetry_path(&self.outputs))
        } else {
            None
        };

        let telemetry_outputs = if let Some(path) = telemetry_path.as_ref() {
            write_summary_outputs(path, &telemetry_dir)?
        } else {
            None
        };

        if let Some(outputs) = telemetry_outputs.as_ref() {
            append_highlights_to_markdown(&self.outputs.summary_md, outputs)?;
        }

        Ok(RunSummary {
            matches_played: self.config.matches.count,
            seatings: seatings.len(),
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            rounds_path: self.outputs.rounds_jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            plot_path,
            focus_win_rate: summary.focus_seat_average,
            telemetry_path,
            telemetry_outputs,
        })
    }

    fn play_one(
        &self,
        match_index: usize,
        seating: Seating,
        mut rounds_writer: Option<&mut BufWriter<File>>,
    ) -> Result<MatchOutcome, DriverError> {
        let base_seed = self.config.matches.seed;
        let offset = match_index as u64;
        let env_seed = base_seed.wrapping_add(offset);
        let match_id = format!("M{match_index:05}_{}", seating.as_str());

        let mut agents: [Box<dyn Agent>; 2] = PlayerId::BOTH.map(|seat| {
            let seed = base_seed
                .wrapping_add(SEAT_SEED_OFFSETS[seat.index()])
                .wrapping_add(offset);
            self.agents[seating.agent_for(seat)].spawn(seed)
        });
        let names = PlayerId::BOTH.map(|seat| self.agents[seating.agent_for(seat)].name.clone());

        let mut state = MatchState::new(
            MatchConfig {
                rounds_per_match: self.config.matches.rounds_per_match,
            },
            env_seed,
        );

        let span = info_span!(
            "match",
            run_id = %self.config.run_id,
            match_id = %match_id,
            seating = seating.as_str()
        );
        let _entered = span.enter();

        let run_id = self.config.run_id.as_str();
        let logging_enabled = self.logging_enabled;
        let result = play_match_with(&mut state, &mut agents, |finished| {
            if logging_enabled && tracing::enabled!(Level::INFO) {
                let claim = finished.claim().to_string();
                event!(
                    target: "schcats_bench::round",
                    Level::INFO,
                    round = finished.round_idx(),
                    winner = %names[finished.winner().index()],
                    claim = %claim,
                    claimant = %finished.claimant(),
                    claim_held = finished.claim_held(),
                    events = finished.public().history().len(),
                );
            }
            if let Some(writer) = rounds_writer.as_mut() {
                let row = RoundRow {
                    run_id,
                    match_id: &match_id,
                    record: RoundRecord::capture(finished),
                };
                serde_json::to_writer(&mut **writer, &row)?;
                writer.write_all(b"\n")?;
            }
            Ok(())
        })?;

        if self.logging_enabled && tracing::enabled!(Level::INFO) {
            event!(
                target: "schcats_bench::match",
                Level::INFO,
                p0_agent = %names[0],
                p1_agent = %names[1],
                p0_wins = result.scores.wins(PlayerId::Zero),
                p1_wins = result.scores.wins(PlayerId::One),
                decisions = result.decisions[0].decisions + result.decisions[1].decisions,
            );
        }

        let seats = PlayerId::BOTH.map(|seat| SeatResult {
            seat,
            agent_index: seating.agent_for(seat),
            agent_name: names[seat.index()].clone(),
            wins: result.scores.wins(seat),
            metrics: result.decisions[seat.index()].clone(),
        });

        Ok(MatchOutcome {
            match_id,
            match_index,
            seating,
            seed: env_seed,
            rounds: result.rounds,
            seats,
        })
    }
}

/// Drive `state` to the end of its match, validating every action through `step`.
pub fn play_match(
    state: &mut MatchState,
    agents: &mut [Box<dyn Agent>; 2],
) -> Result<MatchResult, DriverError> {
    play_match_with(state, agents, |_| Ok(()))
}

/// Like [`play_match`], calling `on_round` with each finished round before the next deal is played.
pub fn play_match_with<F>(
    state: &mut MatchState,
    agents: &mut [Box<dyn Agent>; 2],
    mut on_round: F,
) -> Result<MatchResult, DriverError>
where
    F: FnMut(&FinishedRound) -> Result<(), DriverError>,
{
    let mut metrics = [DecisionMetrics::default(), DecisionMetrics::default()];
    let mut rounds = 0u32;

    while !state.is_done() {
        let player = state.turn();
        let seat = player.index();

        let start = Instant::now();
        let action = agents[seat].act(&state.observation(player));
        metrics[seat].record(start.elapsed());

        let round = state.round_index();
        let outcome = state
            .step(player, &action)
            .map_err(|source| DriverError::Game {
                round,
                player,
                agent: agents[seat].name().to_string(),
                action: action.to_string(),
                source,
            })?;

        if let StepOutcome::RoundEnded { winner, .. } = outcome {
            rounds += 1;
            for me in PlayerId::BOTH {
                let obs = state.last_round_observation(me)?;
                agents[me.index()].observe_round_end(me, winner, &obs);
            }
            if let Some(finished) = state.last_finished_round() {
                on_round(finished)?;
            }
        }
    }

    Ok(MatchResult {
        scores: *state.scores(),
        rounds,
        decisions: metrics.map(DecisionMetrics::finalize),
    })
}

fn ensure_parent(path: Option<&Path>) -> Result<(), DriverError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_match_row(
    writer: &mut BufWriter<File>,
    run_id: &str,
    outcome: &MatchOutcome,
) -> Result<(), DriverError> {
    let [p0, p1] = &outcome.seats;
    let winner = match p0.wins.cmp(&p1.wins) {
        std::cmp::Ordering::Greater => Some(p0.agent_name.clone()),
        std::cmp::Ordering::Less => Some(p1.agent_name.clone()),
        std::cmp::Ordering::Equal => None,
    };
    let row = MatchRow {
        run_id: run_id.to_string(),
        match_id: outcome.match_id.clone(),
        match_index: outcome.match_index,
        seating: outcome.seating.as_str(),
        seed: outcome.seed,
        rounds: outcome.rounds,
        p0_agent: p0.agent_name.clone(),
        p1_agent: p1.agent_name.clone(),
        p0_wins: p0.wins,
        p1_wins: p1.wins,
        winner,
    };

    serde_json::to_writer(&mut *writer, &row)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Final scores of one driven match.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub scores: ScoreBoard,
    pub rounds: u32,
    pub decisions: [DecisionSummary; 2],
}

pub struct MatchOutcome {
    pub match_id: String,
    pub match_index: usize,
    pub seating: Seating,
    pub seed: u64,
    pub rounds: u32,
    pub seats: [SeatResult; 2],
}

pub struct SeatResult {
    pub seat: PlayerId,
    pub agent_index: usize,
    pub agent_name: String,
    pub wins: u32,
    pub metrics: DecisionSummary,
}

#[derive(Default)]
struct DecisionMetrics {
    total: Duration,
    decisions: u32,
}

impl DecisionMetrics {
    fn record(&mut self, duration: Duration) {
        self.total += duration;
        self.decisions += 1;
    }

    fn finalize(self) -> DecisionSummary {
        DecisionSummary {
            decisions: self.decisions,
            total_ms: self.total.as_secs_f64() * 1000.0,
        }
    }
}

/// Decision timing; kept out of the JSONL rows so they stay reproducible.
#[derive(Debug, Clone)]
pub struct DecisionSummary {
    pub decisions: u32,
    pub total_ms: f64,
}

#[derive(Serialize)]
struct MatchRow {
    run_id: String,
    match_id: String,
    match_index: usize,
    seating: &'static str,
    seed: u64,
    rounds: u32,
    p0_agent: String,
    p1_agent: String,
    p0_wins: u32,
    p1_wins: u32,
    winner: Option<String>,
}

#[derive(Serialize)]
struct RoundRow<'a> {
    run_id: &'a str,
    match_id: &'a str,
    #[serde(flatten)]
    record: RoundRecord,
}

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to parse params for agent '{name}': {source}")]
    Params {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid params for agent '{name}': {source}")]
    Agent {
        name: String,
        #[source]
        source: AgentError,
    },
    #[error("configuration requires exactly 2 agents but found {found}")]
    SeatCount { found: usize },
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("agent '{agent}' ({player}) chose rejected action '{action}' in round {round}: {source}")]
    Game {
        round: u32,
        player: PlayerId,
        agent: String,
        action: String,
        #[source]
        source: GameError,
    },
    #[error("match bookkeeping failed: {0}")]
    State(#[from] GameError),
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
    #[error("telemetry summarisation failed: {0}")]
    Telemetry(#[from] TelemetryError),
}

struct AgentBlueprint {
    name: String,
    implementation: AgentImplementation,
}

enum AgentImplementation {
    ZeroOrder(ZeroOrderParams),
    FirstOrder(FirstOrderParams),
}

impl AgentBlueprint {
    fn from_configs(configs: &[AgentConfig]) -> Result<Vec<Self>, DriverError> {
        configs.iter().map(Self::from_config).collect()
    }

    fn from_config(config: &AgentConfig) -> Result<Self, DriverError> {
        let name = config.name.clone();
        let params_error = |source| DriverError::Params {
            name: config.name.clone(),
            source,
        };
        let agent_error = |source| DriverError::Agent {
            name: config.name.clone(),
            source,
        };

        let implementation = match config.kind {
            AgentKind::ZeroOrder => {
                let params = config.zero_order_params().map_err(params_error)?;
                params.validate().map_err(agent_error)?;
                AgentImplementation::ZeroOrder(params)
            }
            AgentKind::FirstOrder => {
                let params = config.first_order_params().map_err(params_error)?;
                params.validate().map_err(agent_error)?;
                AgentImplementation::FirstOrder(params)
            }
        };

        Ok(Self {
            name,
            implementation,
        })
    }

    fn spawn(&self, seed: u64) -> Box<dyn Agent> {
        match &self.implementation {
            AgentImplementation::ZeroOrder(params) => {
                Box::new(ZeroOrderAgent::new(self.name.clone(), *params, seed))
            }
            AgentImplementation::FirstOrder(params) => {
                Box::new(FirstOrderAgent::new(self.name.clone(), *params, seed))
            }
        }
    }
}
