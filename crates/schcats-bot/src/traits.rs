use crate::memory::RoundActivity;
use crate::params::FirstOrderParams;
use schcats_core::game::state::{ActionKind, Observation};
use schcats_core::rules::check_claim_is_true;
use serde::Serialize;

/// Running estimates of the opponent's disposition, both in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OpponentTraits {
    pub conservativeness: f64,
    pub bluffiness: f64,
}

impl Default for OpponentTraits {
    fn default() -> Self {
        Self {
            conservativeness: 0.5,
            bluffiness: 0.5,
        }
    }
}

impl OpponentTraits {
    /// Folds one finished round into the estimates.
    pub fn observe_round(&mut self, obs: &Observation<'_>, params: &FirstOrderParams) {
        let activity = RoundActivity::of(obs, obs.opponent());
        self.update_conservativeness(&activity, params);

        if let Some(held) = doubted_opponent_claim(obs) {
            self.update_bluffiness(held, params.bluff_step);
        }
    }

    pub fn update_conservativeness(&mut self, activity: &RoundActivity, params: &FirstOrderParams) {
        if activity.actions() == 0 {
            return;
        }
        let evidence_factor = (activity.evidence as f64 / params.evidence_saturation).min(1.0);
        let target = activity.doubt_rate() * (1.0 - evidence_factor);
        let updated =
            self.conservativeness + params.trait_smoothing * (target - self.conservativeness);
        self.conservativeness = updated.clamp(0.0, 1.0);
    }

    pub fn update_bluffiness(&mut self, claim_held: bool, step: f64) {
        let delta = if claim_held { -step } else { step };
        self.bluffiness = (self.bluffiness + delta).clamp(0.0, 1.0);
    }
}

/// Whether the opponent's claim held, when the round ended with us doubting it.
fn doubted_opponent_claim(obs: &Observation<'_>) -> Option<bool> {
    let hands = obs.showdown()?;
    let history = obs.public.history();
    let last = history.last()?;
    if last.kind != ActionKind::Doubt || last.player != obs.me {
        return None;
    }
    Some(check_claim_is_true(last.claim, hands))
}
