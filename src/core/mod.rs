pub mod config;
pub mod error;
pub mod schedule;
pub mod types;

pub use config::{AgentConfig, DuelConfig};
pub use error::{DuelError, Result};
pub use schedule::{CancelToken, Schedule};
pub use types::{Facing, Millis, Role};
