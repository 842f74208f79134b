use schcats_core::model::player::PlayerId;
use serde::Serialize;

/// Assignment of the two configured agents to seats for one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Seating {
    /// Agent 0 sits in seat P0.
    Original,
    /// Agent 1 sits in seat P0.
    Swapped,
}

impl Seating {
    pub const ALL: [Seating; 2] = [Seating::Original, Seating::Swapped];

    /// Seatings played for each match index.
    pub fn schedule(swap_seats: bool) -> &'static [Seating] {
        if swap_seats {
            &Self::ALL
        } else {
            &Self::ALL[..1]
        }
    }

    /// Index into the agent list for whoever occupies `seat`.
    pub const fn agent_for(self, seat: PlayerId) -> usize {
        match self {
            Seating::Original => seat.index(),
            Seating::Swapped => seat.opponent().index(),
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Seating::Original => 0,
            Seating::Swapped => 1,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Seating::Original => "original",
            Seating::Swapped => "swapped",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_respects_swap_flag() {
        assert_eq!(Seating::schedule(false), &[Seating::Original]);
        assert_eq!(
            Seating::schedule(true),
            &[Seating::Original, Seating::Swapped]
        );
    }

    #[test]
    fn swapped_seating_mirrors_original() {
        for seat in PlayerId::BOTH {
            assert_eq!(Seating::Original.agent_for(seat), seat.index());
            assert_eq!(
                Seating::Swapped.agent_for(seat),
                seat.opponent().index()
            );
        }
    }
}
