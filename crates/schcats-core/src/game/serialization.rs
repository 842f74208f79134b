use super::round::FinishedRound;
use super::state::PublicEvent;
use crate::model::claim::Claim;
use crate::model::hand::Hand;
use crate::model::player::PlayerId;
use serde::{Deserialize, Serialize};

/// Everything about a finished round, flattened for JSONL output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundRecord {
    pub round_idx: u32,
    pub starting_player: PlayerId,
    pub hands: [Hand; 2],
    pub history: Vec<PublicEvent>,
    pub final_claim: Claim,
    pub claimant: PlayerId,
    pub doubter: PlayerId,
    pub claim_held: bool,
    pub winner: PlayerId,
}

impl RoundRecord {
    pub fn capture(finished: &FinishedRound) -> Self {
        RoundRecord {
            round_idx: finished.round_idx(),
            starting_player: finished.public().starting_player(),
            hands: finished.hands().clone(),
            history: finished.public().history().to_vec(),
            final_claim: finished.claim(),
            claimant: finished.claimant(),
            doubter: finished.doubter(),
            claim_held: finished.claim_held(),
            winner: finished.winner(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
