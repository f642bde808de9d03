//! Core type definitions used throughout the codebase

use std::f32::consts::{FRAC_PI_4, PI, TAU};

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Simulation time in milliseconds (monotonic, starts at 0 each match)
pub type Millis = u64;

/// The two fixed combatant roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// Player-side duelist, driven by the protagonist policy
    Protagonist,
    /// Armored opponent, driven by the antagonist policy
    Antagonist,
}

impl Role {
    pub const BOTH: [Role; 2] = [Role::Protagonist, Role::Antagonist];

    /// Stable identity used for persistence and telemetry
    pub fn id(self) -> &'static str {
        match self {
            Role::Protagonist => "hero",
            Role::Antagonist => "knight",
        }
    }

    pub fn opponent(self) -> Role {
        match self {
            Role::Protagonist => Role::Antagonist,
            Role::Antagonist => Role::Protagonist,
        }
    }

    /// Slot in a `[T; 2]` pair
    pub fn index(self) -> usize {
        match self {
            Role::Protagonist => 0,
            Role::Antagonist => 1,
        }
    }
}

/// Eight compass facings. Screen space: +x is east, +y is south.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[repr(u8)]
pub enum Facing {
    #[default]
    East = 0,
    SouthEast = 1,
    South = 2,
    SouthWest = 3,
    West = 4,
    NorthWest = 5,
    North = 6,
    NorthEast = 7,
}

impl Facing {
    pub const ALL: [Facing; 8] = [
        Facing::East,
        Facing::SouthEast,
        Facing::South,
        Facing::SouthWest,
        Facing::West,
        Facing::NorthWest,
        Facing::North,
        Facing::NorthEast,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(index: u8) -> Self {
        Self::ALL[(index % 8) as usize]
    }

    /// Angle in radians, measured from +x toward +y
    pub fn angle(self) -> f32 {
        self.index() as f32 * FRAC_PI_4
    }

    pub fn unit_vector(self) -> Vec2 {
        Vec2::from_angle(self.angle())
    }

    /// Snap a direction vector to the nearest compass facing
    ///
    /// Returns None for (near) zero vectors.
    pub fn from_vector(v: Vec2) -> Option<Self> {
        if v.length_squared() < 1e-6 {
            return None;
        }
        let octant = (angle_of(v) / FRAC_PI_4).round() as i32;
        Some(Self::from_index(octant.rem_euclid(8) as u8))
    }

    pub fn name(self) -> &'static str {
        match self {
            Facing::East => "east",
            Facing::SouthEast => "southeast",
            Facing::South => "south",
            Facing::SouthWest => "southwest",
            Facing::West => "west",
            Facing::NorthWest => "northwest",
            Facing::North => "north",
            Facing::NorthEast => "northeast",
        }
    }
}

/// Angle of a vector in radians, range (-PI, PI]
pub fn angle_of(v: Vec2) -> f32 {
    v.y.atan2(v.x)
}

/// Absolute shortest angular difference between two angles, in [0, PI]
pub fn angle_between(a: f32, b: f32) -> f32 {
    let mut diff = (a - b) % TAU;
    if diff > PI {
        diff -= TAU;
    } else if diff < -PI {
        diff += TAU;
    }
    diff.abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_pairing() {
        assert_eq!(Role::Protagonist.opponent(), Role::Antagonist);
        assert_eq!(Role::Antagonist.opponent(), Role::Protagonist);
        assert_ne!(Role::Protagonist.index(), Role::Antagonist.index());
        assert_eq!(Role::Protagonist.id(), "hero");
    }

    #[test]
    fn test_facing_snaps_to_nearest_octant() {
        assert_eq!(Facing::from_vector(Vec2::new(1.0, 0.1)), Some(Facing::East));
        assert_eq!(Facing::from_vector(Vec2::new(0.0, 5.0)), Some(Facing::South));
        assert_eq!(Facing::from_vector(Vec2::new(-1.0, -1.0)), Some(Facing::NorthWest));
        assert_eq!(Facing::from_vector(Vec2::new(-3.0, 0.2)), Some(Facing::West));
        assert_eq!(Facing::from_vector(Vec2::ZERO), None);
    }

    #[test]
    fn test_facing_index_roundtrip() {
        for facing in Facing::ALL {
            assert_eq!(Facing::from_index(facing.index()), facing);
            assert_eq!(Facing::from_vector(facing.unit_vector()), Some(facing));
        }
    }

    #[test]
    fn test_angle_between_wraps() {
        let d = angle_between(170f32.to_radians(), (-170f32).to_radians());
        assert!((d - 20f32.to_radians()).abs() < 1e-4);
        assert!(angle_between(0.0, PI) <= PI + 1e-6);
    }
}
