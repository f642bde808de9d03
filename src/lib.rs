//! Arc Duel - two-combatant melee duel driven by online learning policies

pub mod actions;
pub mod combat;
pub mod core;
pub mod entity;
pub mod learning;
pub mod simulation;
pub mod spatial;
