use crate::model::card::{Card, Category};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Copies of each card in the deck, indexed by `Card as usize`.
pub const COMPOSITION: [usize; 4] = [20, 20, 8, 4];
pub const DECK_SIZE: usize = 52;

#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    pub fn standard() -> Self {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        for card in Card::ALL {
            cards.extend(std::iter::repeat(card).take(copies_of(card)));
        }
        Self { cards }
    }

    pub fn shuffled<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::standard();
        deck.shuffle_in_place(rng);
        deck
    }

    pub fn shuffled_with_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::shuffled(&mut rng)
    }

    pub fn shuffle_in_place<R: rand::Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn into_cards(self) -> Vec<Card> {
        self.cards
    }
}

/// Shuffled fixed-composition deck drawn from `rng`.
pub fn make_deck<R: rand::Rng + ?Sized>(rng: &mut R) -> Vec<Card> {
    Deck::shuffled(rng).into_cards()
}

pub const fn copies_of(card: Card) -> usize {
    COMPOSITION[card as usize]
}

/// Cards in the full deck that would support a claim on `category`.
pub const fn supporting_copies(category: Category) -> usize {
    copies_of(category.card()) + copies_of(Card::Hup)
}

#[cfg(test)]
mod tests {
    use super::{DECK_SIZE, Deck, copies_of, make_deck, supporting_copies};
    use crate::model::card::{Card, Category};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn standard_deck_has_fixed_composition() {
        let deck = Deck::standard();
        assert_eq!(deck.cards().len(), DECK_SIZE);
        for card in Card::ALL {
            let count = deck.cards().iter().filter(|&&c| c == card).count();
            assert_eq!(count, copies_of(card), "{card} count");
        }
    }

    #[test]
    fn supporting_copies_include_wildcards() {
        assert_eq!(supporting_copies(Category::Alive), 24);
        assert_eq!(supporting_copies(Category::Dead), 24);
        assert_eq!(supporting_copies(Category::Empty), 12);
    }

    #[test]
    fn shuffle_with_seed_is_deterministic() {
        let deck_a = Deck::shuffled_with_seed(42);
        let deck_b = Deck::shuffled_with_seed(42);
        assert_eq!(deck_a.cards(), deck_b.cards());
    }

    #[test]
    fn shuffle_with_different_seeds_differs() {
        let deck_a = Deck::shuffled_with_seed(1);
        let deck_b = Deck::shuffled_with_seed(2);
        assert_ne!(deck_a.cards(), deck_b.cards());
    }

    #[test]
    fn make_deck_preserves_composition_across_shuffles() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..5 {
            let mut cards = make_deck(&mut rng);
            cards.sort();
            assert_eq!(cards, Deck::standard().into_cards());
        }
    }
}
