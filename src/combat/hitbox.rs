//! Transient hit volumes spawned during an attack's active window

use glam::Vec2;

use crate::combat::attack::AttackKind;
use crate::combat::constants::{HIT_VOLUME_HALF_EXTENT, HIT_VOLUME_REACH};
use crate::core::types::{Facing, Millis, Role};

/// Axis-aligned square placed in front of the attacker
#[derive(Debug, Clone, PartialEq)]
pub struct HitVolume {
    pub id: u64,
    pub attacker: Role,
    /// Only this role can be hit by the volume
    pub target: Role,
    pub kind: AttackKind,
    pub center: Vec2,
    pub half_extent: f32,
    pub expires_at: Millis,
}

impl HitVolume {
    /// Place a volume at reach distance along `facing`
    pub fn in_front_of(
        id: u64,
        attacker: Role,
        kind: AttackKind,
        origin: Vec2,
        facing: Facing,
        expires_at: Millis,
    ) -> Self {
        Self {
            id,
            attacker,
            target: attacker.opponent(),
            kind,
            center: origin + facing.unit_vector() * HIT_VOLUME_REACH,
            half_extent: HIT_VOLUME_HALF_EXTENT,
            expires_at,
        }
    }

    /// Point of the volume closest to `p` (p itself when inside)
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        let min = self.center - Vec2::splat(self.half_extent);
        let max = self.center + Vec2::splat(self.half_extent);
        p.clamp(min, max)
    }

    /// Does the volume touch a circular body?
    pub fn intersects_circle(&self, center: Vec2, radius: f32) -> bool {
        self.closest_point(center).distance_squared(center) <= radius * radius
    }

    pub fn is_expired(&self, now: Millis) -> bool {
        now >= self.expires_at
    }
}
