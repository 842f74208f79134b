use super::{Candidate, Decision};
use schcats_core::game::state::Observation;
use tracing::{Level, event};

pub(crate) const DETAILS_ENV: &str = "SCHCATS_DECISION_DETAILS";

pub(crate) fn log_decision(agent: &str, obs: &Observation<'_>, decision: &Decision) {
    if !tracing::enabled!(Level::INFO) {
        return;
    }

    let action = decision.action.to_string();
    let chosen_probability = decision.chosen.map(|c| c.probability).unwrap_or(-1.0);
    let predicted_doubt = decision
        .chosen
        .and_then(|c| c.predicted_doubt)
        .unwrap_or(-1.0);
    let has_choice = decision.chosen.is_some();
    let score = decision.chosen.map(|c| c.score).unwrap_or(0.0);

    event!(
        target: "schcats_bot::decision",
        Level::INFO,
        agent = %agent,
        player = %obs.me,
        round = obs.public.round_idx(),
        phase = decision.phase.as_str(),
        mode = decision.mode.as_str(),
        action = %action,
        doubted = decision.action.is_doubt(),
        standing_probability = decision.standing_probability.unwrap_or(-1.0),
        chosen_probability,
        predicted_doubt,
        has_choice,
        score,
        candidate_count = decision.candidates.len(),
    );

    if !decision_details_enabled() {
        return;
    }

    let mut ranked: Vec<&Candidate> = decision.candidates.iter().collect();
    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    let top_claims: Vec<String> = ranked.iter().take(5).map(|c| c.claim.to_string()).collect();
    let top_scores: Vec<f64> = ranked.iter().take(5).map(|c| c.score).collect();
    let top_probabilities: Vec<f64> = ranked.iter().take(5).map(|c| c.probability).collect();
    let hand: Vec<String> = obs.hand.iter().map(|card| card.to_string()).collect();

    event!(
        target: "schcats_bot::decision_detail",
        Level::INFO,
        agent = %agent,
        player = %obs.me,
        round = obs.public.round_idx(),
        hand = ?hand,
        top_claims = ?top_claims,
        top_scores = ?top_scores,
        top_probabilities = ?top_probabilities,
    );
}

pub(crate) fn log_fallback_armed(agent: &str, streak: u32) {
    event!(
        target: "schcats_bot::fallback",
        Level::INFO,
        agent = %agent,
        streak,
    );
}

/// Per-candidate decision detail is logged only when `SCHCATS_DECISION_DETAILS` is truthy.
pub fn decision_details_enabled() -> bool {
    std::env::var(DETAILS_ENV)
        .map(|raw| matches!(raw.trim(), "1" | "true" | "TRUE" | "on" | "ON"))
        .unwrap_or(false)
}
