pub mod first_order;
mod telemetry;
pub mod zero_order;

pub use telemetry::decision_details_enabled;

use rand::Rng;
use schcats_core::game::action::Action;
use schcats_core::game::state::Observation;
use schcats_core::model::card::Category;
use schcats_core::model::claim::Claim;
use schcats_core::model::player::PlayerId;

/// Decision-making interface shared by every agent.
pub trait Agent: Send {
    fn name(&self) -> &str;

    /// Chooses a legal action for the player `obs` belongs to. Only called on that player's turn.
    fn act(&mut self, obs: &Observation<'_>) -> Action;

    /// Called once per finished round with the frozen post-doubt observation.
    fn observe_round_end(&mut self, me: PlayerId, winner: PlayerId, obs: &Observation<'_>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionPhase {
    Opening,
    Responding,
}

impl DecisionPhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            DecisionPhase::Opening => "opening",
            DecisionPhase::Responding => "responding",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionMode {
    Standard,
    RiskAverse,
    Predictive,
    Fallback,
}

impl DecisionMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            DecisionMode::Standard => "standard",
            DecisionMode::RiskAverse => "risk_averse",
            DecisionMode::Predictive => "predictive",
            DecisionMode::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub claim: Claim,
    pub probability: f64,
    pub predicted_doubt: Option<f64>,
    pub score: f64,
}

/// A chosen action plus the numbers behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub action: Action,
    pub phase: DecisionPhase,
    pub mode: DecisionMode,
    /// Truth probability of the standing claim when responding.
    pub standing_probability: Option<f64>,
    pub chosen: Option<Candidate>,
    pub candidates: Vec<Candidate>,
}

impl Decision {
    pub(crate) fn doubt(
        phase: DecisionPhase,
        mode: DecisionMode,
        standing_probability: Option<f64>,
        candidates: Vec<Candidate>,
    ) -> Self {
        Self {
            action: Action::Doubt,
            phase,
            mode,
            standing_probability,
            chosen: None,
            candidates,
        }
    }
}

const SCORE_TIE_EPSILON: f64 = 1e-12;

/// Highest-scoring candidate; exact ties are broken with `rng`.
pub(crate) fn pick_best<R: Rng + ?Sized>(candidates: &[Candidate], rng: &mut R) -> Option<Candidate> {
    let best = candidates
        .iter()
        .map(|candidate| candidate.score)
        .fold(f64::NEG_INFINITY, f64::max);
    let tied: Vec<&Candidate> = candidates
        .iter()
        .filter(|candidate| candidate.score >= best - SCORE_TIE_EPSILON)
        .collect();
    match tied.len() {
        0 => None,
        1 => Some(*tied[0]),
        n => Some(*tied[rng.gen_range(0..n)]),
    }
}

/// Own positions that support `category` and are not public yet.
pub(crate) fn evidence_for(obs: &Observation<'_>, category: Category) -> Vec<usize> {
    let revealed = obs.public.revealed(obs.me);
    obs.hand
        .supporting_positions(category)
        .into_iter()
        .filter(|position| !revealed.contains_key(position))
        .collect()
}

/// Effective-strength distance from the standing claim (or from nothing).
pub(crate) fn jump(from: Option<Claim>, to: Claim) -> f64 {
    let base = from.map(|claim| claim.strength().effective).unwrap_or(0);
    f64::from(to.strength().effective.saturating_sub(base))
}
