pub mod card;
pub mod claim;
pub mod deck;
pub mod hand;
pub mod player;
pub mod score;
