pub mod action;
pub mod error;
pub mod match_state;
pub mod round;
pub mod serialization;
pub mod state;
