//! Duel simulation: match state, tick orchestration, sessions and reports

pub mod context;
pub mod events;
pub mod report;
pub mod session;
pub mod tick;

pub use context::{MatchContext, PendingReward};
pub use events::{CombatEvent, EventSnapshot, MatchOutcome, MatchResult};
pub use report::{GamePhase, MatchReport, SideReport};
pub use session::{DuelSession, Policies};
pub use tick::{run_duel_tick, DecisionMaker, Passive};
