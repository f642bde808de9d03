//! Attack kinds and phases

use serde::{Deserialize, Serialize};

use crate::core::types::Millis;

/// Kinds of swing a combatant can commit to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackKind {
    Light,
    Heavy,
    Special,
    /// Knight's fallback when too winded for a heavy swing
    Kick,
}

impl AttackKind {
    pub fn stamina_cost(self) -> f32 {
        match self {
            AttackKind::Light => 15.0,
            AttackKind::Heavy => 25.0,
            AttackKind::Special => 40.0,
            AttackKind::Kick => 10.0,
        }
    }

    pub fn base_damage(self) -> f32 {
        match self {
            AttackKind::Light => 10.0,
            AttackKind::Heavy => 15.0,
            AttackKind::Special => 25.0,
            AttackKind::Kick => 5.0,
        }
    }

    /// Stamina regeneration pause after committing; heavier swings wind you longer
    pub fn regen_delay_ms(self) -> Millis {
        match self {
            AttackKind::Kick => 300,
            AttackKind::Light => 400,
            AttackKind::Heavy => 700,
            AttackKind::Special => 1000,
        }
    }

    /// Time spent in Recovery after the active window closes
    pub fn recovery_ms(self) -> Millis {
        match self {
            AttackKind::Light => 250,
            AttackKind::Kick => 300,
            AttackKind::Heavy => 400,
            AttackKind::Special => 550,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AttackKind::Light => "light_attack",
            AttackKind::Heavy => "heavy_attack",
            AttackKind::Special => "special_attack",
            AttackKind::Kick => "kick",
        }
    }
}

/// Phases of a committed attack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackPhase {
    /// Preparation, no hit possible, still cancellable
    Windup,
    /// Hit volume is live
    Active,
    /// Cooling down before returning to idle
    Recovery,
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [AttackKind; 4] = [
        AttackKind::Kick,
        AttackKind::Light,
        AttackKind::Heavy,
        AttackKind::Special,
    ];

    #[test]
    fn test_heavier_attacks_cost_more() {
        for pair in KINDS.windows(2) {
            assert!(pair[0].stamina_cost() < pair[1].stamina_cost());
            assert!(pair[0].base_damage() < pair[1].base_damage());
            assert!(pair[0].regen_delay_ms() < pair[1].regen_delay_ms());
        }
    }

    #[test]
    fn test_documented_costs() {
        assert_eq!(AttackKind::Heavy.stamina_cost(), 25.0);
        assert_eq!(AttackKind::Special.stamina_cost(), 40.0);
        assert_eq!(AttackKind::Kick.base_damage(), 5.0);
    }
}
