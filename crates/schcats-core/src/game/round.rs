use crate::game::action::Action;
use crate::game::error::GameError;
use crate::game::state::{Observation, PublicEvent, PublicState};
use crate::model::card::Card;
use crate::model::claim::Claim;
use crate::model::deck::Deck;
use crate::model::hand::{HAND_SIZE, Hand};
use crate::model::player::PlayerId;
use crate::rules::{self, MAX_CLAIM_QUANTITY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    AwaitingFirstClaim,
    AwaitingResponse { claimant: PlayerId },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundState {
    hands: [Hand; 2],
    public: PublicState,
    phase: RoundPhase,
}

/// Result of applying one action to a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundTransition {
    Continued { next: RoundState, event: PublicEvent },
    Resolved(FinishedRound),
}

impl RoundState {
    /// Player 0 receives the first `HAND_SIZE` cards, player 1 the next `HAND_SIZE`.
    pub fn deal(deck: &Deck, round_idx: u32, starting_player: PlayerId) -> Self {
        let cards = deck.cards();
        let hands = [
            Hand::with_cards(cards[..HAND_SIZE].to_vec()),
            Hand::with_cards(cards[HAND_SIZE..2 * HAND_SIZE].to_vec()),
        ];
        Self::from_hands(hands, round_idx, starting_player)
    }

    pub fn from_hands(hands: [Hand; 2], round_idx: u32, starting_player: PlayerId) -> Self {
        Self {
            hands,
            public: PublicState::new(round_idx, starting_player),
            phase: RoundPhase::AwaitingFirstClaim,
        }
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn hand(&self, player: PlayerId) -> &Hand {
        &self.hands[player.index()]
    }

    pub fn public(&self) -> &PublicState {
        &self.public
    }

    pub fn turn(&self) -> PlayerId {
        self.public.turn()
    }

    pub fn observation(&self, player: PlayerId) -> Observation<'_> {
        Observation::new(player, self.hand(player), &self.public)
    }

    pub fn apply(&self, player: PlayerId, action: &Action) -> Result<RoundTransition, GameError> {
        let expected = self.public.turn();
        if player != expected {
            return Err(GameError::NotYourTurn {
                expected,
                actual: player,
            });
        }

        match action {
            Action::Doubt => self.resolve_doubt(player).map(RoundTransition::Resolved),
            Action::MakeClaim { claim, reveal } => self.accept_claim(player, *claim, reveal),
        }
    }

    fn resolve_doubt(&self, doubter: PlayerId) -> Result<FinishedRound, GameError> {
        let RoundPhase::AwaitingResponse { claimant } = self.phase else {
            return Err(GameError::DoubtWithoutClaim);
        };
        let claim = self
            .public
            .current_claim()
            .ok_or(GameError::DoubtWithoutClaim)?;

        let mut public = self.public.clone();
        public.record_doubt(doubter, claim);
        let claim_held = rules::check_claim_is_true(claim, &self.hands);
        let winner = if claim_held { claimant } else { doubter };

        Ok(FinishedRound {
            hands: self.hands.clone(),
            public,
            claim,
            claimant,
            doubter,
            claim_held,
            winner,
        })
    }

    fn accept_claim(
        &self,
        player: PlayerId,
        claim: Claim,
        reveal: &[usize],
    ) -> Result<RoundTransition, GameError> {
        if claim.quantity == 0 {
            return Err(GameError::ZeroQuantity);
        }
        if let Some(current) = self.public.current_claim() {
            if !rules::is_stronger(claim, current) {
                return Err(GameError::ClaimNotStronger {
                    proposed: claim,
                    current,
                });
            }
        }
        let fresh = self.validate_reveal(player, claim, reveal)?;

        let mut next = self.clone();
        let event = next.public.record_claim(player, claim, &fresh);
        next.phase = RoundPhase::AwaitingResponse { claimant: player };
        Ok(RoundTransition::Continued { next, event })
    }

    /// Positions not yet public, paired with their cards. Repeats are skipped.
    fn validate_reveal(
        &self,
        player: PlayerId,
        claim: Claim,
        reveal: &[usize],
    ) -> Result<Vec<(usize, Card)>, GameError> {
        let hand = self.hand(player);
        let mut fresh: Vec<(usize, Card)> = Vec::with_capacity(reveal.len());
        for &index in reveal {
            let card = hand.get(index).ok_or(GameError::RevealOutOfRange {
                index,
                hand_size: hand.len(),
            })?;
            if self.public.is_revealed(player, index) || fresh.iter().any(|(i, _)| *i == index) {
                continue;
            }
            if !card.supports(claim.category) {
                return Err(GameError::RevealMismatch {
                    index,
                    card,
                    category: claim.category,
                });
            }
            fresh.push((index, card));
        }
        Ok(fresh)
    }

    /// Admissible actions for `player`; empty when it is not their turn.
    pub fn legal_actions(&self, player: PlayerId) -> Vec<Action> {
        if player != self.public.turn() {
            return Vec::new();
        }
        let current = self.public.current_claim();
        let mut actions = Vec::new();
        if current.is_some() {
            actions.push(Action::Doubt);
        }
        let hand = self.hand(player);
        for claim in rules::stronger_claims(current, MAX_CLAIM_QUANTITY) {
            let reveal: Vec<usize> = hand
                .supporting_positions(claim.category)
                .into_iter()
                .filter(|pos| !self.public.is_revealed(player, *pos))
                .collect();
            actions.push(Action::claim(claim));
            if !reveal.is_empty() {
                actions.push(Action::claim_with_reveal(claim, reveal));
            }
        }
        actions
    }
}

/// Frozen copy of a round at the moment a doubt resolved it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedRound {
    hands: [Hand; 2],
    public: PublicState,
    claim: Claim,
    claimant: PlayerId,
    doubter: PlayerId,
    claim_held: bool,
    winner: PlayerId,
}

impl FinishedRound {
    pub fn hands(&self) -> &[Hand; 2] {
        &self.hands
    }

    pub fn public(&self) -> &PublicState {
        &self.public
    }

    pub fn round_idx(&self) -> u32 {
        self.public.round_idx()
    }

    pub fn claim(&self) -> Claim {
        self.claim
    }

    pub fn claimant(&self) -> PlayerId {
        self.claimant
    }

    pub fn doubter(&self) -> PlayerId {
        self.doubter
    }

    pub fn claim_held(&self) -> bool {
        self.claim_held
    }

    pub fn winner(&self) -> PlayerId {
        self.winner
    }

    pub fn observation(&self, player: PlayerId) -> Observation<'_> {
        Observation::after_round(player, &self.hands, &self.public)
    }
}
