pub mod draw;
pub mod pairs;
pub mod sequence;
pub mod session;

pub use pairs::PairSampler;
pub use sequence::{PlannerState, ReshuffleTrigger, SequencePlanner};
pub use session::{AdvanceTicket, GameSession, PlayMode, Presented, RoundOutcome};
