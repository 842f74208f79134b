use super::telemetry::{log_decision, log_fallback_armed};
use super::{Agent, Candidate, Decision, DecisionMode, DecisionPhase, evidence_for, jump, pick_best};
use crate::memory::RoundMemory;
use crate::params::FirstOrderParams;
use crate::traits::OpponentTraits;
use rand::SeedableRng;
use rand::rngs::StdRng;
use schcats_core::game::action::Action;
use schcats_core::game::state::Observation;
use schcats_core::inference::truth_probability;
use schcats_core::model::card::Category;
use schcats_core::model::claim::Claim;
use schcats_core::model::player::PlayerId;
use schcats_core::rules::{MAX_CLAIM_QUANTITY, stronger_claims};

/// Models the opponent's disposition and predicts whether a claim will be doubted.
pub struct FirstOrderAgent {
    name: String,
    params: FirstOrderParams,
    memory: Option<RoundMemory>,
    traits: OpponentTraits,
    doubt_streak: u32,
    fallback_rounds: u32,
    fallback_used: bool,
    rng: StdRng,
}

impl FirstOrderAgent {
    pub fn new(name: impl Into<String>, params: FirstOrderParams, seed: u64) -> Self {
        Self {
            name: name.into(),
            params,
            memory: None,
            traits: OpponentTraits::default(),
            doubt_streak: 0,
            fallback_rounds: 0,
            fallback_used: false,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn params(&self) -> &FirstOrderParams {
        &self.params
    }

    pub fn memory(&self) -> Option<&RoundMemory> {
        self.memory.as_ref()
    }

    pub fn traits(&self) -> &OpponentTraits {
        &self.traits
    }

    /// Rounds still to be played with the zero-order procedure.
    pub fn fallback_rounds(&self) -> u32 {
        self.fallback_rounds
    }

    pub fn predicted_doubt(&self, probability: f64) -> f64 {
        predicted_doubt(probability, &self.traits, &self.params)
    }

    pub fn decide(&mut self, obs: &Observation<'_>) -> Decision {
        if self.fallback_rounds > 0 {
            self.fallback_used = true;
            return super::zero_order::decide(
                obs,
                self.memory.as_ref(),
                &self.params.fallback,
                true,
                &mut self.rng,
            );
        }

        match obs.public.current_claim() {
            None => self.open(obs),
            Some(current) => self.respond(obs, current),
        }
    }

    fn open(&mut self, obs: &Observation<'_>) -> Decision {
        let candidates = self.score_candidates(obs, None);
        let best = pick_best(&candidates, &mut self.rng)
            .unwrap_or_else(|| self.candidate(obs, None, Claim::new(1, Category::Dead)));
        Decision {
            action: Action::claim_with_reveal(best.claim, evidence_for(obs, best.claim.category)),
            phase: DecisionPhase::Opening,
            mode: DecisionMode::Predictive,
            standing_probability: None,
            chosen: Some(best),
            candidates,
        }
    }

    fn respond(&mut self, obs: &Observation<'_>, current: Claim) -> Decision {
        let standing = truth_probability(obs, current);
        let credence = self.params.claim_credence * (1.0 - self.traits.bluffiness);
        let adjusted = standing + (1.0 - standing) * credence;
        if adjusted < self.params.doubt_threshold {
            return Decision::doubt(
                DecisionPhase::Responding,
                DecisionMode::Predictive,
                Some(standing),
                Vec::new(),
            );
        }

        let candidates = self.score_candidates(obs, Some(current));
        let best = pick_best(&candidates, &mut self.rng)
            .filter(|best| best.score >= self.params.min_raise_score);
        let Some(best) = best else {
            return Decision::doubt(
                DecisionPhase::Responding,
                DecisionMode::Predictive,
                Some(standing),
                candidates,
            );
        };
        Decision {
            action: Action::claim_with_reveal(best.claim, evidence_for(obs, best.claim.category)),
            phase: DecisionPhase::Responding,
            mode: DecisionMode::Predictive,
            standing_probability: Some(standing),
            chosen: Some(best),
            candidates,
        }
    }

    fn score_candidates(&self, obs: &Observation<'_>, current: Option<Claim>) -> Vec<Candidate> {
        stronger_claims(current, MAX_CLAIM_QUANTITY)
            .into_iter()
            .map(|claim| self.candidate(obs, current, claim))
            .collect()
    }

    fn candidate(&self, obs: &Observation<'_>, current: Option<Claim>, claim: Claim) -> Candidate {
        let probability = truth_probability(obs, claim);
        let doubt = self.predicted_doubt(probability);
        let continuation = (1.0 - self.params.jump_penalty * jump(current, claim)).max(0.0);
        Candidate {
            claim,
            probability,
            predicted_doubt: Some(doubt),
            score: doubt * probability
                + (1.0 - doubt) * self.params.continuation_weight * continuation,
        }
    }
}

impl Agent for FirstOrderAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn act(&mut self, obs: &Observation<'_>) -> Action {
        let decision = self.decide(obs);
        log_decision(&self.name, obs, &decision);
        decision.action
    }

    fn observe_round_end(&mut self, _me: PlayerId, _winner: PlayerId, obs: &Observation<'_>) {
        let memory = RoundMemory::from_finished(obs);
        self.memory = Some(memory);
        self.traits.observe_round(obs, &self.params);

        if self.fallback_used {
            self.fallback_rounds = self.fallback_rounds.saturating_sub(1);
            self.fallback_used = false;
        }
        self.doubt_streak = if memory.opponent_doubted {
            self.doubt_streak + 1
        } else {
            0
        };
        if self.fallback_rounds == 0 && self.doubt_streak >= self.params.fallback_after_doubts {
            log_fallback_armed(&self.name, self.doubt_streak);
            self.fallback_rounds = 1;
        }
    }
}

/// Chance the opponent doubts a claim whose truth probability is `probability`.
pub fn predicted_doubt(
    probability: f64,
    traits: &OpponentTraits,
    params: &FirstOrderParams,
) -> f64 {
    let logit = params.doubt_bias
        + params.truth_weight * (0.5 - probability)
        + params.conservative_weight * (traits.conservativeness - 0.5)
        - params.bluff_weight * (traits.bluffiness - 0.5);
    1.0 / (1.0 + (-logit).exp())
}

#[cfg(test)]
mod tests {
    use super::{FirstOrderAgent, predicted_doubt};
    use crate::agent::zero_order::ZeroOrderAgent;
    use crate::agent::{Agent, DecisionMode};
    use crate::params::{FirstOrderParams, ZeroOrderParams};
    use crate::traits::OpponentTraits;
    use schcats_core::game::action::Action;
    use schcats_core::game::match_state::{MatchConfig, MatchState, StepOutcome};
    use schcats_core::game::round::{RoundState, RoundTransition};
    use schcats_core::model::card::{Card, Category};
    use schcats_core::model::claim::Claim;
    use schcats_core::model::hand::Hand;
    use schcats_core::model::player::PlayerId;

    fn hands() -> [Hand; 2] {
        [
            Hand::with_cards(vec![
                Card::Alive,
                Card::Dead,
                Card::Empty,
                Card::Dead,
                Card::Alive,
                Card::Hup,
            ]),
            Hand::with_cards(vec![
                Card::Dead,
                Card::Dead,
                Card::Empty,
                Card::Dead,
                Card::Empty,
                Card::Dead,
            ]),
        ]
    }

    /// Finished round in which `doubter` doubted an opening claim of one Dead.
    fn finished_round(doubter: PlayerId) -> MatchState {
        let opener = doubter.opponent();
        let round = RoundState::from_hands(hands(), 0, opener);
        let mut state = MatchState::with_round(MatchConfig { rounds_per_match: 4 }, 0, round);
        state
            .step(opener, &Action::claim(Claim::new(1, Category::Dead)))
            .unwrap();
        state.step(doubter, &Action::Doubt).unwrap();
        state
    }

    fn traits(conservativeness: f64, bluffiness: f64) -> OpponentTraits {
        OpponentTraits {
            conservativeness,
            bluffiness,
        }
    }

    #[test]
    fn predicted_doubt_moves_with_traits_and_truth() {
        let params = FirstOrderParams::default();
        let grid = [0.0, 0.25, 0.5, 0.75, 1.0];
        for &p in &grid {
            for &c in &grid {
                for &b in &grid {
                    let base = predicted_doubt(p, &traits(c, b), &params);
                    assert!((0.0..=1.0).contains(&base));
                    if c < 1.0 {
                        assert!(predicted_doubt(p, &traits(c + 0.25, b), &params) > base);
                    }
                    if b < 1.0 {
                        assert!(predicted_doubt(p, &traits(c, b + 0.25), &params) < base);
                    }
                    if p < 1.0 {
                        assert!(predicted_doubt(p + 0.25, &traits(c, b), &params) < base);
                    }
                }
            }
        }
    }

    #[test]
    fn bluffy_opponents_get_doubted_sooner() {
        let round = RoundState::from_hands(hands(), 0, PlayerId::Zero);
        let RoundTransition::Continued { next, .. } = round
            .apply(PlayerId::Zero, &Action::claim(Claim::new(3, Category::Alive)))
            .unwrap()
        else {
            panic!("claim should continue");
        };
        let obs = next.observation(PlayerId::One);
        let params = FirstOrderParams {
            doubt_threshold: 0.999,
            claim_credence: 1.0,
            min_raise_score: -10.0,
            ..FirstOrderParams::default()
        };

        let mut trusting = FirstOrderAgent::new("tom1", params, 4);
        trusting.traits.bluffiness = 0.0;
        assert!(!trusting.decide(&obs).action.is_doubt());

        let mut suspicious = FirstOrderAgent::new("tom1", params, 4);
        suspicious.traits.bluffiness = 1.0;
        let decision = suspicious.decide(&obs);
        assert!(decision.action.is_doubt());
        assert!(decision.standing_probability.unwrap() < 0.999);
    }

    #[test]
    fn two_doubting_rounds_arm_one_fallback_round() {
        let mut agent = FirstOrderAgent::new("tom1", FirstOrderParams::default(), 1);
        let doubted = finished_round(PlayerId::One);
        let obs = doubted.last_round_observation(PlayerId::Zero).unwrap();

        agent.observe_round_end(PlayerId::Zero, PlayerId::One, &obs);
        assert_eq!(agent.fallback_rounds(), 0);
        agent.observe_round_end(PlayerId::Zero, PlayerId::One, &obs);
        assert_eq!(agent.fallback_rounds(), 1);

        // Armed but unused: a finished round without a decision keeps it armed.
        let calm = finished_round(PlayerId::Zero);
        let calm_obs = calm.last_round_observation(PlayerId::Zero).unwrap();
        agent.observe_round_end(PlayerId::Zero, PlayerId::Zero, &calm_obs);
        assert_eq!(agent.fallback_rounds(), 1);

        let fresh = MatchState::new(MatchConfig::default(), 12);
        let decision = agent.decide(&fresh.observation(PlayerId::Zero));
        assert_eq!(decision.mode, DecisionMode::Fallback);

        agent.observe_round_end(PlayerId::Zero, PlayerId::Zero, &calm_obs);
        assert_eq!(agent.fallback_rounds(), 0);
        let decision = agent.decide(&fresh.observation(PlayerId::Zero));
        assert_eq!(decision.mode, DecisionMode::Predictive);
    }

    #[test]
    fn consecutive_doubts_keep_fallback_armed() {
        let mut agent = FirstOrderAgent::new("tom1", FirstOrderParams::default(), 1);
        let doubted = finished_round(PlayerId::One);
        let obs = doubted.last_round_observation(PlayerId::Zero).unwrap();
        let fresh = MatchState::new(MatchConfig::default(), 12);

        agent.observe_round_end(PlayerId::Zero, PlayerId::One, &obs);
        agent.observe_round_end(PlayerId::Zero, PlayerId::One, &obs);
        assert_eq!(agent.fallback_rounds(), 1);
        let decision = agent.decide(&fresh.observation(PlayerId::Zero));
        assert_eq!(decision.mode, DecisionMode::Fallback);

        // Rounds two and three are a doubting pair of their own.
        agent.observe_round_end(PlayerId::Zero, PlayerId::One, &obs);
        assert_eq!(agent.fallback_rounds(), 1);
        let decision = agent.decide(&fresh.observation(PlayerId::Zero));
        assert_eq!(decision.mode, DecisionMode::Fallback);

        let calm = finished_round(PlayerId::Zero);
        let calm_obs = calm.last_round_observation(PlayerId::Zero).unwrap();
        agent.observe_round_end(PlayerId::Zero, PlayerId::Zero, &calm_obs);
        assert_eq!(agent.fallback_rounds(), 0);
        let decision = agent.decide(&fresh.observation(PlayerId::Zero));
        assert_eq!(decision.mode, DecisionMode::Predictive);
    }

    #[test]
    fn plays_a_full_match_against_zero_order() {
        let mut state = MatchState::new(MatchConfig { rounds_per_match: 12 }, 77);
        let mut agents: [Box<dyn Agent>; 2] = [
            Box::new(FirstOrderAgent::new("tom1", FirstOrderParams::default(), 1001)),
            Box::new(ZeroOrderAgent::new("tom0", ZeroOrderParams::default(), 2001)),
        ];
        while !state.is_done() {
            let actor = state.turn();
            let action = agents[actor.index()].act(&state.observation(actor));
            if let StepOutcome::RoundEnded { winner, .. } = state.step(actor, &action).unwrap() {
                for player in PlayerId::BOTH {
                    let obs = state.last_round_observation(player).unwrap();
                    agents[player.index()].observe_round_end(player, winner, &obs);
                }
            }
        }
        assert_eq!(state.scores().rounds_played(), 12);
    }
}
