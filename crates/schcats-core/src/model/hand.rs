use crate::model::card::{Card, Category};
use serde::{Deserialize, Serialize};

pub const HAND_SIZE: usize = 6;

/// Cards dealt to one player for a round. Order is preserved: reveals address positions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn with_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<Card> {
        self.cards.get(position).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn support_for(&self, category: Category) -> usize {
        self.cards.iter().filter(|card| card.supports(category)).count()
    }

    /// Positions of every card that could be revealed as evidence for `category`.
    pub fn supporting_positions(&self, category: Category) -> Vec<usize> {
        self.cards
            .iter()
            .enumerate()
            .filter(|(_, card)| card.supports(category))
            .map(|(idx, _)| idx)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::Hand;
    use crate::model::card::{Card, Category};

    #[test]
    fn dealt_order_is_preserved() {
        let hand = Hand::with_cards(vec![Card::Hup, Card::Alive, Card::Dead]);
        assert_eq!(hand.get(0), Some(Card::Hup));
        assert_eq!(hand.get(2), Some(Card::Dead));
        assert_eq!(hand.get(3), None);
    }

    #[test]
    fn support_counts_wildcards() {
        let hand = Hand::with_cards(vec![
            Card::Alive,
            Card::Hup,
            Card::Dead,
            Card::Alive,
            Card::Empty,
            Card::Hup,
        ]);
        assert_eq!(hand.support_for(Category::Alive), 4);
        assert_eq!(hand.support_for(Category::Empty), 3);
        assert_eq!(hand.supporting_positions(Category::Dead), vec![1, 2, 5]);
    }
}
