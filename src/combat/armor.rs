//! Zone-based armor
//!
//! Each combatant wears four armor zones. A zone reduces incoming damage by
//! its reduction fraction until its durability is worn through, at which
//! point the fraction is halved once and stays there.

use serde::{Deserialize, Serialize};

/// Where a hit (or a blocked blow) lands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArmorZone {
    Head,
    Torso,
    /// Arms and legs
    Limb,
    /// Only worn by blocked blows
    Shield,
}

impl ArmorZone {
    pub fn all() -> [ArmorZone; 4] {
        [
            ArmorZone::Head,
            ArmorZone::Torso,
            ArmorZone::Limb,
            ArmorZone::Shield,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            ArmorZone::Head => "head",
            ArmorZone::Torso => "torso",
            ArmorZone::Limb => "limb",
            ArmorZone::Shield => "shield",
        }
    }
}

/// One armor zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmorPiece {
    /// Fraction of damage removed, in [0, 1]
    pub reduction: f32,
    /// Remaining durability, never negative
    pub durability: f32,
    /// Set once the reduction has been halved
    degraded: bool,
}

impl ArmorPiece {
    pub fn new(reduction: f32, durability: f32) -> Self {
        Self {
            reduction: reduction.clamp(0.0, 1.0),
            durability: durability.max(0.0),
            degraded: false,
        }
    }

    /// Wear the zone by `amount` of (pre-armor) damage
    ///
    /// Returns true when this call halved the reduction. The halving happens
    /// exactly once, on the first wear that finds durability at or below zero.
    pub fn wear(&mut self, amount: f32) -> bool {
        self.durability = (self.durability - amount.max(0.0)).max(0.0);
        if self.durability <= 0.0 && !self.degraded {
            self.reduction *= 0.5;
            self.degraded = true;
            return true;
        }
        false
    }
}

/// Full armor loadout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmorSet {
    pub head: ArmorPiece,
    pub torso: ArmorPiece,
    pub limb: ArmorPiece,
    pub shield: ArmorPiece,
}

impl ArmorSet {
    /// Light gear: agile duelist
    pub fn hero() -> Self {
        Self {
            head: ArmorPiece::new(0.10, 30.0),
            torso: ArmorPiece::new(0.15, 50.0),
            limb: ArmorPiece::new(0.05, 20.0),
            shield: ArmorPiece::new(0.30, 60.0),
        }
    }

    /// Heavy plate
    pub fn knight() -> Self {
        Self {
            head: ArmorPiece::new(0.15, 40.0),
            torso: ArmorPiece::new(0.25, 80.0),
            limb: ArmorPiece::new(0.10, 40.0),
            shield: ArmorPiece::new(0.40, 100.0),
        }
    }

    pub fn zone(&self, zone: ArmorZone) -> &ArmorPiece {
        match zone {
            ArmorZone::Head => &self.head,
            ArmorZone::Torso => &self.torso,
            ArmorZone::Limb => &self.limb,
            ArmorZone::Shield => &self.shield,
        }
    }

    pub fn zone_mut(&mut self, zone: ArmorZone) -> &mut ArmorPiece {
        match zone {
            ArmorZone::Head => &mut self.head,
            ArmorZone::Torso => &mut self.torso,
            ArmorZone::Limb => &mut self.limb,
            ArmorZone::Shield => &mut self.shield,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wear_halves_once_at_zero_crossing() {
        let mut piece = ArmorPiece::new(0.2, 25.0);
        assert!(!piece.wear(10.0));
        assert_eq!(piece.reduction, 0.2);

        assert!(piece.wear(20.0));
        assert_eq!(piece.durability, 0.0);
        assert!((piece.reduction - 0.1).abs() < 1e-6);

        assert!(!piece.wear(20.0));
        assert!((piece.reduction - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_worn_out_zone_halves_on_first_hit() {
        // Durability already at zero but never degraded
        let mut head = ArmorPiece::new(0.15, 0.0);
        assert!(head.wear(10.0));
        assert!((head.reduction - 0.075).abs() < 1e-6);
        assert!(!head.wear(10.0));
        assert!((head.reduction - 0.075).abs() < 1e-6);
    }

    #[test]
    fn test_construction_clamps() {
        let piece = ArmorPiece::new(1.5, -3.0);
        assert_eq!(piece.reduction, 1.0);
        assert_eq!(piece.durability, 0.0);
    }

    #[test]
    fn test_knight_outarmors_hero() {
        let hero = ArmorSet::hero();
        let knight = ArmorSet::knight();
        for zone in ArmorZone::all() {
            assert!(knight.zone(zone).reduction >= hero.zone(zone).reduction);
        }
    }
}
