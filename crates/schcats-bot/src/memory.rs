use schcats_core::game::state::{ActionKind, Observation};
use schcats_core::model::claim::Claim;
use schcats_core::model::player::PlayerId;
use schcats_core::rules::check_claim_is_true;
use serde::Serialize;

/// What an agent remembers about the opponent from the previous round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RoundMemory {
    pub opponent_doubted: bool,
    pub opponent_evidence_revealed: usize,
    pub opponent_last_claim: Option<Claim>,
    /// `None` when the opponent made no claim or the hands were not disclosed.
    pub opponent_last_claim_was_true: Option<bool>,
}

impl RoundMemory {
    /// Built from a finished-round observation; never from live state.
    pub fn from_finished(obs: &Observation<'_>) -> Self {
        let opponent = obs.opponent();
        let activity = RoundActivity::of(obs, opponent);
        let opponent_last_claim = obs
            .public
            .last_claim_by(opponent)
            .map(|event| event.claim);
        let opponent_last_claim_was_true = match (opponent_last_claim, obs.showdown()) {
            (Some(claim), Some(hands)) => Some(check_claim_is_true(claim, hands)),
            _ => None,
        };

        Self {
            opponent_doubted: activity.doubts > 0,
            opponent_evidence_revealed: activity.evidence,
            opponent_last_claim,
            opponent_last_claim_was_true,
        }
    }
}

/// Counts of one player's public actions in a round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RoundActivity {
    pub claims: usize,
    pub doubts: usize,
    pub evidence: usize,
}

impl RoundActivity {
    pub fn of(obs: &Observation<'_>, player: PlayerId) -> Self {
        obs.public
            .events_by(player)
            .fold(Self::default(), |mut acc, event| {
                match event.kind {
                    ActionKind::Claim => {
                        acc.claims += 1;
                        acc.evidence += event.newly_revealed;
                    }
                    ActionKind::Doubt => acc.doubts += 1,
                }
                acc
            })
    }

    pub fn actions(&self) -> usize {
        self.claims + self.doubts
    }

    pub fn doubt_rate(&self) -> f64 {
        self.doubts as f64 / self.actions().max(1) as f64
    }
}
