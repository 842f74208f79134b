use crate::model::card::{Card, Category};
use crate::model::claim::Claim;
use crate::model::player::PlayerId;
use thiserror::Error;

/// Failures surfaced synchronously by the state machine. Nothing is retried or corrected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("{actual} acted out of turn; waiting on {expected}")]
    NotYourTurn { expected: PlayerId, actual: PlayerId },
    #[error("cannot doubt before any claim has been made")]
    DoubtWithoutClaim,
    #[error("claim '{proposed}' is not stronger than current claim '{current}'")]
    ClaimNotStronger { proposed: Claim, current: Claim },
    #[error("claim quantity must be at least one")]
    ZeroQuantity,
    #[error("reveal index {index} is outside a hand of {hand_size} cards")]
    RevealOutOfRange { index: usize, hand_size: usize },
    #[error("card '{card}' at position {index} does not support '{category}'")]
    RevealMismatch {
        index: usize,
        card: Card,
        category: Category,
    },
    #[error("no round has finished yet")]
    NoFinishedRound,
    #[error("match is already finished")]
    MatchFinished,
    #[error("unrecognized action '{0}'")]
    UnrecognizedAction(String),
    #[error("malformed action '{input}': {reason}")]
    MalformedAction { input: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    IllegalMove,
    Precondition,
    UnrecognizedAction,
}

impl GameError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            GameError::NotYourTurn { .. }
            | GameError::DoubtWithoutClaim
            | GameError::ClaimNotStronger { .. }
            | GameError::ZeroQuantity
            | GameError::RevealOutOfRange { .. }
            | GameError::RevealMismatch { .. } => ErrorKind::IllegalMove,
            GameError::NoFinishedRound | GameError::MatchFinished => ErrorKind::Precondition,
            GameError::UnrecognizedAction(_) | GameError::MalformedAction { .. } => {
                ErrorKind::UnrecognizedAction
            }
        }
    }
}
