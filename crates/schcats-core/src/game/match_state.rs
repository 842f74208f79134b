use crate::game::action::Action;
use crate::game::error::GameError;
use crate::game::round::{FinishedRound, RoundPhase, RoundState, RoundTransition};
use crate::game::state::{Observation, PublicEvent};
use crate::model::deck::Deck;
use crate::model::player::PlayerId;
use crate::model::score::ScoreBoard;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ROUNDS_PER_MATCH: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    pub rounds_per_match: u32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            rounds_per_match: DEFAULT_ROUNDS_PER_MATCH,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    InProgress,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continued(PublicEvent),
    RoundEnded {
        winner: PlayerId,
        claim_held: bool,
        match_done: bool,
    },
}

#[derive(Debug, Clone)]
pub struct MatchState {
    config: MatchConfig,
    scores: ScoreBoard,
    current_round: RoundState,
    last_finished: Option<FinishedRound>,
    phase: MatchPhase,
    rng: StdRng,
}

impl MatchState {
    pub fn new(config: MatchConfig, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let deck = Deck::shuffled(&mut rng);
        Self {
            config,
            scores: ScoreBoard::new(),
            current_round: RoundState::deal(&deck, 0, PlayerId::Zero),
            last_finished: None,
            phase: MatchPhase::InProgress,
            rng,
        }
    }

    /// Starts from a known deal instead of a shuffled one.
    pub fn with_round(config: MatchConfig, seed: u64, round: RoundState) -> Self {
        let mut state = Self::new(config, seed);
        state.current_round = round;
        state
    }

    /// Zero scores and start round 0 with player 0 first. The RNG keeps its stream,
    /// so successive matches see fresh deals.
    pub fn reset_match(&mut self) {
        self.scores = ScoreBoard::new();
        self.last_finished = None;
        self.phase = MatchPhase::InProgress;
        self.reset_round(0, PlayerId::Zero);
    }

    pub fn reset_round(&mut self, round_idx: u32, starting_player: PlayerId) {
        let deck = Deck::shuffled(&mut self.rng);
        self.current_round = RoundState::deal(&deck, round_idx, starting_player);
    }

    pub fn step(&mut self, player: PlayerId, action: &Action) -> Result<StepOutcome, GameError> {
        if self.phase == MatchPhase::Done {
            return Err(GameError::MatchFinished);
        }

        match self.current_round.apply(player, action)? {
            RoundTransition::Continued { next, event } => {
                self.current_round = next;
                Ok(StepOutcome::Continued(event))
            }
            RoundTransition::Resolved(finished) => {
                let winner = finished.winner();
                let claim_held = finished.claim_held();
                let next_idx = finished.round_idx() + 1;
                self.scores.record_win(winner);
                self.last_finished = Some(finished);

                let match_done = next_idx >= self.config.rounds_per_match;
                if match_done {
                    self.phase = MatchPhase::Done;
                } else {
                    self.reset_round(next_idx, PlayerId::starting_for_round(next_idx));
                }
                Ok(StepOutcome::RoundEnded {
                    winner,
                    claim_held,
                    match_done,
                })
            }
        }
    }

    pub fn legal_actions(&self, player: PlayerId) -> Vec<Action> {
        match self.phase {
            MatchPhase::InProgress => self.current_round.legal_actions(player),
            MatchPhase::Done => Vec::new(),
        }
    }

    pub fn observation(&self, player: PlayerId) -> Observation<'_> {
        self.current_round.observation(player)
    }

    pub fn last_round_observation(&self, player: PlayerId) -> Result<Observation<'_>, GameError> {
        self.last_finished
            .as_ref()
            .map(|finished| finished.observation(player))
            .ok_or(GameError::NoFinishedRound)
    }

    pub fn last_finished_round(&self) -> Option<&FinishedRound> {
        self.last_finished.as_ref()
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn scores(&self) -> &ScoreBoard {
        &self.scores
    }

    pub fn round(&self) -> &RoundState {
        &self.current_round
    }

    pub fn round_index(&self) -> u32 {
        self.current_round.public().round_idx()
    }

    pub fn round_phase(&self) -> RoundPhase {
        self.current_round.phase()
    }

    pub fn turn(&self) -> PlayerId {
        self.current_round.turn()
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == MatchPhase::Done
    }
}

#[cfg(test)]
mod tests {
    use super::{MatchConfig, MatchPhase, MatchState, StepOutcome};
    use crate::game::action::Action;
    use crate::game::error::{ErrorKind, GameError};
    use crate::game::round::RoundState;
    use crate::model::card::{Card, Category};
    use crate::model::claim::Claim;
    use crate::model::hand::Hand;
    use crate::model::player::PlayerId;
    use proptest::prelude::*;

    fn config(rounds: u32) -> MatchConfig {
        MatchConfig {
            rounds_per_match: rounds,
        }
    }

    /// Opening claim of one Dead, immediately doubted.
    fn play_quick_round(state: &mut MatchState) -> StepOutcome {
        let opener = state.turn();
        state
            .step(opener, &Action::claim(Claim::new(1, Category::Dead)))
            .unwrap();
        state.step(opener.opponent(), &Action::Doubt).unwrap()
    }

    #[test]
    fn new_match_starts_round_zero_with_player_zero() {
        let state = MatchState::new(config(4), 7);
        assert_eq!(state.round_index(), 0);
        assert_eq!(state.turn(), PlayerId::Zero);
        assert_eq!(state.scores().rounds_played(), 0);
        assert_eq!(
            state.last_round_observation(PlayerId::Zero).unwrap_err(),
            GameError::NoFinishedRound
        );
    }

    #[test]
    fn same_seed_deals_same_hands() {
        let a = MatchState::new(config(4), 42);
        let b = MatchState::new(config(4), 42);
        assert_eq!(a.round(), b.round());
        let c = MatchState::new(config(4), 43);
        assert_ne!(a.round(), c.round());
    }

    #[test]
    fn starting_player_alternates_by_parity() {
        let mut state = MatchState::new(config(6), 3);
        let mut starters = Vec::new();
        while !state.is_done() {
            starters.push(state.round().public().starting_player());
            play_quick_round(&mut state);
        }
        assert_eq!(starters.len(), 6);
        for (idx, starter) in starters.iter().enumerate() {
            assert_eq!(*starter, PlayerId::starting_for_round(idx as u32));
        }
        assert_eq!(state.scores().rounds_played(), 6);
    }

    #[test]
    fn steps_after_match_end_fail() {
        let mut state = MatchState::new(config(1), 11);
        let outcome = play_quick_round(&mut state);
        assert!(matches!(
            outcome,
            StepOutcome::RoundEnded {
                match_done: true,
                ..
            }
        ));
        assert_eq!(state.phase(), MatchPhase::Done);
        let err = state.step(state.turn(), &Action::Doubt).unwrap_err();
        assert_eq!(err, GameError::MatchFinished);
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert!(state.legal_actions(state.turn()).is_empty());
    }

    #[test]
    fn snapshot_survives_redeal() {
        let p0 = Hand::with_cards(vec![Card::Empty; 6]);
        let p1 = Hand::with_cards(vec![Card::Dead; 6]);
        let round = RoundState::from_hands([p0.clone(), p1.clone()], 0, PlayerId::Zero);
        let mut state = MatchState::with_round(config(3), 5, round);

        state
            .step(
                PlayerId::Zero,
                &Action::claim_with_reveal(Claim::new(3, Category::Empty), vec![0]),
            )
            .unwrap();
        let outcome = state.step(PlayerId::One, &Action::Doubt).unwrap();
        assert_eq!(
            outcome,
            StepOutcome::RoundEnded {
                winner: PlayerId::Zero,
                claim_held: true,
                match_done: false
            }
        );

        assert_eq!(state.round_index(), 1);
        assert_eq!(state.turn(), PlayerId::One);
        assert!(state.round().public().history().is_empty());

        let obs = state.last_round_observation(PlayerId::One).unwrap();
        assert_eq!(*obs.hand, p1);
        assert_eq!(obs.public.history().len(), 2);
        assert_eq!(obs.opponent_revealed().len(), 1);
        assert_eq!(obs.showdown().unwrap()[0], p0);
    }

    #[test]
    fn reset_match_clears_scores_and_snapshot() {
        let mut state = MatchState::new(config(5), 9);
        play_quick_round(&mut state);
        play_quick_round(&mut state);
        state.reset_match();
        assert_eq!(state.scores().rounds_played(), 0);
        assert_eq!(state.round_index(), 0);
        assert_eq!(state.turn(), PlayerId::Zero);
        assert!(state.last_finished_round().is_none());
    }

    fn pick(actions: &[Action], choice: usize) -> Action {
        actions[choice % actions.len()].clone()
    }

    proptest! {
        #[test]
        fn scores_always_sum_to_rounds_played(
            seed in any::<u64>(),
            choices in proptest::collection::vec(any::<usize>(), 1..200)
        ) {
            let mut state = MatchState::new(config(4), seed);
            let mut resolved = 0u32;
            for choice in choices {
                if state.is_done() {
                    break;
                }
                let actor = state.turn();
                let action = pick(&state.legal_actions(actor), choice);
                if let StepOutcome::RoundEnded { .. } = state.step(actor, &action).unwrap() {
                    resolved += 1;
                }
                prop_assert_eq!(state.scores().rounds_played(), resolved);
            }
        }

        #[test]
        fn rejected_actions_leave_state_unchanged(
            seed in any::<u64>(),
            quantity in 0u8..=12,
            cat in 0usize..3,
            reveal in proptest::collection::vec(0usize..8, 0..4)
        ) {
            let mut state = MatchState::new(config(2), seed);
            state.step(PlayerId::Zero, &Action::claim(Claim::new(4, Category::Alive))).unwrap();
            let before = state.round().clone();
            let action = Action::claim_with_reveal(Claim::new(quantity, Category::ALL[cat]), reveal);
            let current = state.round().public().current_claim();
            match state.step(PlayerId::One, &action) {
                Ok(_) => {
                    let now = state.round().public().current_claim();
                    prop_assert!(now > current);
                }
                Err(err) => {
                    prop_assert_eq!(err.kind(), ErrorKind::IllegalMove);
                    prop_assert_eq!(state.round(), &before);
                }
            }
        }
    }
}
