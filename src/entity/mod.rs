pub mod combatant;

pub use combatant::{CombatStats, Combatant, HeroState, KnightState, RoleState};
