use crate::model::player::PlayerId;
use serde::{Deserialize, Serialize};

/// Round wins per player over a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreBoard {
    wins: [u32; 2],
}

impl ScoreBoard {
    pub const fn new() -> Self {
        Self { wins: [0; 2] }
    }

    pub fn record_win(&mut self, player: PlayerId) {
        self.wins[player.index()] += 1;
    }

    pub fn wins(&self, player: PlayerId) -> u32 {
        self.wins[player.index()]
    }

    pub fn rounds_played(&self) -> u32 {
        self.wins.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::ScoreBoard;
    use crate::model::player::PlayerId;

    #[test]
    fn records_round_wins() {
        let mut board = ScoreBoard::new();
        board.record_win(PlayerId::One);
        board.record_win(PlayerId::One);
        board.record_win(PlayerId::Zero);
        assert_eq!(board.wins(PlayerId::One), 2);
        assert_eq!(board.rounds_played(), 3);
    }
}
