//! Melee combat: resources, armor, attack timing, state machine, hit resolution

pub mod armor;
pub mod attack;
pub mod constants;
pub mod hitbox;
pub mod machine;
pub mod resolution;
pub mod resources;
pub mod state;

pub use armor::{ArmorPiece, ArmorSet, ArmorZone};
pub use attack::{AttackKind, AttackPhase};
pub use hitbox::HitVolume;
pub use machine::{handle_event, issue, kill};
pub use resolution::{resolve_hits, strike, StrikeResult};
pub use resources::{ResourceTick, Resources};
pub use state::{ActionOutcome, ActionState, BlockPhase, MoveIntent, RejectReason, TimedEvent};
