use crate::model::card::Card;
use crate::model::claim::Claim;
use crate::model::hand::Hand;
use crate::model::player::PlayerId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Claim,
    Doubt,
}

/// One entry of the round's public history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicEvent {
    pub player: PlayerId,
    pub kind: ActionKind,
    /// The claim made, or the claim being doubted.
    pub claim: Claim,
    pub newly_revealed: usize,
}

impl PublicEvent {
    pub const fn claim(player: PlayerId, claim: Claim, newly_revealed: usize) -> Self {
        Self {
            player,
            kind: ActionKind::Claim,
            claim,
            newly_revealed,
        }
    }

    pub const fn doubt(player: PlayerId, claim: Claim) -> Self {
        Self {
            player,
            kind: ActionKind::Doubt,
            claim,
            newly_revealed: 0,
        }
    }
}

/// Everything both players can see during a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicState {
    current_claim: Option<Claim>,
    revealed: [BTreeMap<usize, Card>; 2],
    turn: PlayerId,
    round_idx: u32,
    starting_player: PlayerId,
    history: Vec<PublicEvent>,
}

impl PublicState {
    pub fn new(round_idx: u32, starting_player: PlayerId) -> Self {
        Self {
            current_claim: None,
            revealed: [BTreeMap::new(), BTreeMap::new()],
            turn: starting_player,
            round_idx,
            starting_player,
            history: Vec::new(),
        }
    }

    pub fn current_claim(&self) -> Option<Claim> {
        self.current_claim
    }

    /// Evidence `player` has disclosed this round, keyed by hand position.
    pub fn revealed(&self, player: PlayerId) -> &BTreeMap<usize, Card> {
        &self.revealed[player.index()]
    }

    pub fn is_revealed(&self, player: PlayerId, position: usize) -> bool {
        self.revealed[player.index()].contains_key(&position)
    }

    pub fn turn(&self) -> PlayerId {
        self.turn
    }

    pub fn round_idx(&self) -> u32 {
        self.round_idx
    }

    pub fn starting_player(&self) -> PlayerId {
        self.starting_player
    }

    pub fn history(&self) -> &[PublicEvent] {
        &self.history
    }

    pub fn events_by(&self, player: PlayerId) -> impl Iterator<Item = &PublicEvent> {
        self.history.iter().filter(move |event| event.player == player)
    }

    /// Most recent claim event made by `player`.
    pub fn last_claim_by(&self, player: PlayerId) -> Option<&PublicEvent> {
        self.history
            .iter()
            .rev()
            .find(|event| event.player == player && event.kind == ActionKind::Claim)
    }

    pub(crate) fn record_claim(
        &mut self,
        player: PlayerId,
        claim: Claim,
        newly_revealed: &[(usize, Card)],
    ) -> PublicEvent {
        self.revealed[player.index()].extend(newly_revealed.iter().copied());
        let event = PublicEvent::claim(player, claim, newly_revealed.len());
        self.history.push(event);
        self.current_claim = Some(claim);
        self.turn = player.opponent();
        event
    }

    pub(crate) fn record_doubt(&mut self, player: PlayerId, claim: Claim) -> PublicEvent {
        let event = PublicEvent::doubt(player, claim);
        self.history.push(event);
        event
    }
}

/// A single player's view: own hand plus public state. The opponent's concealed
/// cards are only present in the showdown of a finished round.
#[derive(Debug, Clone, Copy)]
pub struct Observation<'a> {
    pub me: PlayerId,
    pub hand: &'a Hand,
    pub public: &'a PublicState,
    showdown: Option<&'a [Hand; 2]>,
}

impl<'a> Observation<'a> {
    pub fn new(me: PlayerId, hand: &'a Hand, public: &'a PublicState) -> Self {
        Self {
            me,
            hand,
            public,
            showdown: None,
        }
    }

    pub(crate) fn after_round(
        me: PlayerId,
        hands: &'a [Hand; 2],
        public: &'a PublicState,
    ) -> Self {
        Self {
            me,
            hand: &hands[me.index()],
            public,
            showdown: Some(hands),
        }
    }

    pub fn opponent(&self) -> PlayerId {
        self.me.opponent()
    }

    pub fn is_my_turn(&self) -> bool {
        self.public.turn() == self.me
    }

    pub fn opponent_revealed(&self) -> &'a BTreeMap<usize, Card> {
        self.public.revealed(self.me.opponent())
    }

    /// Both hands, available only once a doubt has resolved the round.
    pub fn showdown(&self) -> Option<&'a [Hand; 2]> {
        self.showdown
    }
}

#[cfg(test)]
mod tests {
    use super::{ActionKind, PublicState};
    use crate::model::card::{Card, Category};
    use crate::model::claim::Claim;
    use crate::model::player::PlayerId;

    #[test]
    fn claim_records_evidence_and_flips_turn() {
        let mut public = PublicState::new(0, PlayerId::Zero);
        let claim = Claim::new(2, Category::Dead);
        let event = public.record_claim(PlayerId::Zero, claim, &[(1, Card::Dead), (4, Card::Hup)]);

        assert_eq!(event.newly_revealed, 2);
        assert_eq!(public.turn(), PlayerId::One);
        assert_eq!(public.current_claim(), Some(claim));
        assert!(public.is_revealed(PlayerId::Zero, 4));
        assert!(public.revealed(PlayerId::One).is_empty());
    }

    #[test]
    fn last_claim_by_skips_doubts() {
        let mut public = PublicState::new(1, PlayerId::One);
        let first = Claim::new(1, Category::Alive);
        public.record_claim(PlayerId::One, first, &[]);
        public.record_doubt(PlayerId::Zero, first);

        let last = public.last_claim_by(PlayerId::One).unwrap();
        assert_eq!(last.claim, first);
        assert!(public.last_claim_by(PlayerId::Zero).is_none());
        assert_eq!(public.history().last().unwrap().kind, ActionKind::Doubt);
    }

    #[test]
    fn serializes_revealed_positions() {
        let mut public = PublicState::new(0, PlayerId::Zero);
        public.record_claim(PlayerId::Zero, Claim::new(1, Category::Empty), &[(3, Card::Empty)]);
        let json = serde_json::to_string(&public).unwrap();
        let back: PublicState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, public);
    }
}
