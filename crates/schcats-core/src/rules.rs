//! Claim ordering and adjudication.
//!
//! Successive claims within a round must be strictly stronger; that constraint is
//! enforced by [`crate::game::round::RoundState`], not here.

use crate::model::card::Category;
use crate::model::claim::{Claim, ClaimStrength};
use crate::model::hand::{HAND_SIZE, Hand};

/// Largest quantity worth claiming: every card in both hands.
pub const MAX_CLAIM_QUANTITY: u8 = (2 * HAND_SIZE) as u8;

pub const fn claim_strength(claim: Claim) -> ClaimStrength {
    claim.strength()
}

pub fn is_stronger(new: Claim, old: Claim) -> bool {
    claim_strength(new) > claim_strength(old)
}

/// Ground truth at doubt time: supporting cards (category or wildcard) across every hand.
pub fn check_claim_is_true(claim: Claim, hands: &[Hand]) -> bool {
    let support: usize = hands.iter().map(|hand| hand.support_for(claim.category)).sum();
    support >= usize::from(claim.quantity)
}

/// Claims with quantity `1..=max_quantity` strictly stronger than `current`, weakest first.
pub fn stronger_claims(current: Option<Claim>, max_quantity: u8) -> Vec<Claim> {
    let mut claims: Vec<Claim> = (1..=max_quantity)
        .flat_map(|quantity| {
            Category::ALL
                .iter()
                .map(move |&category| Claim::new(quantity, category))
        })
        .filter(|claim| current.is_none_or(|current| is_stronger(*claim, current)))
        .collect();
    claims.sort();
    claims
}
