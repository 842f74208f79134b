//! Claim plausibility from one player's point of view.
//!
//! Known cards are the observer's own hand plus whatever the opponent has revealed.
//! The opponent's concealed slots are a uniform draw without replacement from the
//! rest of the deck, so the number of supporting cards among them is hypergeometric.

use crate::game::state::Observation;
use crate::model::claim::Claim;
use crate::model::deck::{DECK_SIZE, supporting_copies};
use crate::model::hand::HAND_SIZE;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClaimEstimate {
    pub claim: Claim,
    pub probability: f64,
    /// Supporting cards already visible to the observer.
    pub known_support: usize,
    /// Supporting cards still required from the concealed slots.
    pub needed: usize,
    pub unknown_slots: usize,
    /// Cards the concealed slots are drawn from.
    pub population: usize,
    /// Supporting cards left in that population.
    pub successes: usize,
}

pub fn estimate_claim(obs: &Observation<'_>, claim: Claim) -> ClaimEstimate {
    let category = claim.category;
    let opponent_revealed = obs.opponent_revealed();

    let known_support = obs.hand.support_for(category)
        + opponent_revealed
            .values()
            .filter(|card| card.supports(category))
            .count();
    let known_cards = obs.hand.len() + opponent_revealed.len();
    let unknown_slots = HAND_SIZE.saturating_sub(opponent_revealed.len());
    let population = DECK_SIZE.saturating_sub(known_cards);
    let successes = supporting_copies(category)
        .saturating_sub(known_support)
        .min(population);
    let quantity = usize::from(claim.quantity);
    let needed = quantity.saturating_sub(known_support);

    let probability = if needed == 0 {
        1.0
    } else if needed > unknown_slots {
        0.0
    } else {
        hypergeometric_upper_tail(population, successes, unknown_slots, needed)
    };

    ClaimEstimate {
        claim,
        probability,
        known_support,
        needed,
        unknown_slots,
        population,
        successes,
    }
}

/// Probability that `claim` holds given what `obs` can see.
pub fn truth_probability(obs: &Observation<'_>, claim: Claim) -> f64 {
    estimate_claim(obs, claim).probability
}

/// `P(X >= at_least)` for `X ~ Hypergeometric(population, successes, draws)`, summed
/// over exact integer counts with a single final division.
pub fn hypergeometric_upper_tail(
    population: usize,
    successes: usize,
    draws: usize,
    at_least: usize,
) -> f64 {
    if at_least == 0 {
        return 1.0;
    }
    if draws > population || successes > population {
        return 0.0;
    }
    let failures = population - successes;
    let top = draws.min(successes);
    if at_least > top {
        return 0.0;
    }

    let favourable: u128 = (at_least..=top)
        .filter(|x| draws - x <= failures)
        .map(|x| binomial(successes, x) * binomial(failures, draws - x))
        .sum();
    let total = binomial(population, draws);
    favourable as f64 / total as f64
}

/// `C(n, k)`; exact because each partial product is itself a binomial coefficient.
pub fn binomial(n: usize, k: usize) -> u128 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut acc: u128 = 1;
    for i in 0..k {
        acc = acc * (n - i) as u128 / (i + 1) as u128;
    }
    acc
}
