//! Position integration inside the arena

use glam::Vec2;

use crate::core::types::Millis;
use crate::entity::Combatant;

/// Axis-aligned arena, origin at the top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
}

impl Arena {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn clamp(&self, p: Vec2) -> Vec2 {
        p.clamp(Vec2::ZERO, Vec2::new(self.width, self.height))
    }
}

/// Advance a body by its velocity. Dead bodies do not move.
pub fn integrate(combatant: &mut Combatant, dt: Millis, arena: &Arena) {
    if combatant.is_dead() {
        combatant.velocity = Vec2::ZERO;
        return;
    }
    let next = combatant.position + combatant.velocity * (dt as f32 / 1000.0);
    let clamped = arena.clamp(next);
    if clamped != next {
        // Against the wall: drop the blocked component
        if clamped.x != next.x {
            combatant.velocity.x = 0.0;
        }
        if clamped.y != next.y {
            combatant.velocity.y = 0.0;
        }
    }
    combatant.position = clamped;
}
