use super::telemetry::log_decision;
use super::{Agent, Candidate, Decision, DecisionMode, DecisionPhase, evidence_for, jump, pick_best};
use crate::memory::RoundMemory;
use crate::params::ZeroOrderParams;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use schcats_core::game::action::Action;
use schcats_core::game::state::Observation;
use schcats_core::inference::truth_probability;
use schcats_core::model::card::Category;
use schcats_core::model::claim::Claim;
use schcats_core::model::player::PlayerId;
use schcats_core::rules::{MAX_CLAIM_QUANTITY, stronger_claims};

/// Plays from its own hand and one round of explicit memory.
pub struct ZeroOrderAgent {
    name: String,
    params: ZeroOrderParams,
    memory: Option<RoundMemory>,
    rng: StdRng,
}

impl ZeroOrderAgent {
    pub fn new(name: impl Into<String>, params: ZeroOrderParams, seed: u64) -> Self {
        Self {
            name: name.into(),
            params,
            memory: None,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn params(&self) -> &ZeroOrderParams {
        &self.params
    }

    pub fn memory(&self) -> Option<&RoundMemory> {
        self.memory.as_ref()
    }

    pub fn decide(&mut self, obs: &Observation<'_>) -> Decision {
        decide(obs, self.memory.as_ref(), &self.params, false, &mut self.rng)
    }
}

impl Agent for ZeroOrderAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn act(&mut self, obs: &Observation<'_>) -> Action {
        let decision = self.decide(obs);
        log_decision(&self.name, obs, &decision);
        decision.action
    }

    fn observe_round_end(&mut self, _me: PlayerId, _winner: PlayerId, obs: &Observation<'_>) {
        self.memory = Some(RoundMemory::from_finished(obs));
    }
}

/// The zero-order procedure. `fallback` only changes the reported mode.
pub(crate) fn decide<R: Rng + ?Sized>(
    obs: &Observation<'_>,
    memory: Option<&RoundMemory>,
    params: &ZeroOrderParams,
    fallback: bool,
    rng: &mut R,
) -> Decision {
    let risk_averse = memory.is_some_and(|memory| memory.opponent_doubted);
    let mode = match (fallback, risk_averse) {
        (true, _) => DecisionMode::Fallback,
        (false, true) => DecisionMode::RiskAverse,
        (false, false) => DecisionMode::Standard,
    };

    match obs.public.current_claim() {
        None => open(obs, params, risk_averse, mode, rng),
        Some(current) => respond(obs, current, params, risk_averse, mode, rng),
    }
}

fn open<R: Rng + ?Sized>(
    obs: &Observation<'_>,
    params: &ZeroOrderParams,
    risk_averse: bool,
    mode: DecisionMode,
    rng: &mut R,
) -> Decision {
    let candidates = score_candidates(obs, None, params);
    let best = pick_best(&candidates, rng)
        .unwrap_or_else(|| candidate(obs, None, Claim::new(1, Category::Dead), params));

    let (chosen, reveal) = if risk_averse {
        let smaller = Claim::new(best.claim.quantity.saturating_sub(1).max(1), best.claim.category);
        (candidate(obs, None, smaller, params), Vec::new())
    } else {
        (best, evidence_for(obs, best.claim.category))
    };

    Decision {
        action: Action::claim_with_reveal(chosen.claim, reveal),
        phase: DecisionPhase::Opening,
        mode,
        standing_probability: None,
        chosen: Some(chosen),
        candidates,
    }
}

fn respond<R: Rng + ?Sized>(
    obs: &Observation<'_>,
    current: Claim,
    params: &ZeroOrderParams,
    risk_averse: bool,
    mode: DecisionMode,
    rng: &mut R,
) -> Decision {
    let standing = truth_probability(obs, current);
    let threshold = if risk_averse {
        params.risk_averse_doubt_threshold
    } else {
        params.doubt_threshold
    };
    if standing < threshold {
        return Decision::doubt(DecisionPhase::Responding, mode, Some(standing), Vec::new());
    }

    let candidates = score_candidates(obs, Some(current), params);
    let best = pick_best(&candidates, rng).filter(|best| best.score >= params.min_raise_score);
    let Some(best) = best else {
        return Decision::doubt(DecisionPhase::Responding, mode, Some(standing), candidates);
    };

    let reveal = if risk_averse {
        Vec::new()
    } else {
        evidence_for(obs, best.claim.category)
    };
    Decision {
        action: Action::claim_with_reveal(best.claim, reveal),
        phase: DecisionPhase::Responding,
        mode,
        standing_probability: Some(standing),
        chosen: Some(best),
        candidates,
    }
}

fn score_candidates(
    obs: &Observation<'_>,
    current: Option<Claim>,
    params: &ZeroOrderParams,
) -> Vec<Candidate> {
    stronger_claims(current, MAX_CLAIM_QUANTITY)
        .into_iter()
        .map(|claim| candidate(obs, current, claim, params))
        .collect()
}

fn candidate(
    obs: &Observation<'_>,
    current: Option<Claim>,
    claim: Claim,
    params: &ZeroOrderParams,
) -> Candidate {
    let probability = truth_probability(obs, claim);
    // Openings have no standing claim, so only the size penalty applies.
    let jump_cost = match current {
        Some(_) => params.jump_penalty * jump(current, claim),
        None => 0.0,
    };
    Candidate {
        claim,
        probability,
        predicted_doubt: None,
        score: probability - jump_cost - params.size_penalty * f64::from(claim.quantity),
    }
}
