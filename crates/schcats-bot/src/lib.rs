pub mod agent;
pub mod memory;
pub mod params;
pub mod traits;

pub use agent::first_order::FirstOrderAgent;
pub use agent::zero_order::ZeroOrderAgent;
pub use agent::{Agent, Candidate, Decision, DecisionMode, DecisionPhase};
pub use memory::{RoundActivity, RoundMemory};
pub use params::{AgentError, FirstOrderParams, ZeroOrderParams};
pub use traits::OpponentTraits;
