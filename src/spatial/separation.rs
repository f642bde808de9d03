//! Separation constraint between the two bodies
//!
//! Runs every tick, independent of what the combatants are doing:
//! - `enforce` pushes overlapping bodies apart to the minimum separation
//! - `constrain_velocities` zeroes any velocity that would close the gap
//!   below the minimum within the lookahead, or that exceeds the speed cap
//! - `resolve_contact` is the hard reset for bodies that touched anyway

use glam::Vec2;

use crate::combat::constants::{
    CONTACT_DISTANCE, CONTACT_RESET_SEPARATION, MAX_BODY_SPEED, MIN_SEPARATION,
    SEPARATION_LOOKAHEAD_MS,
};
use crate::core::types::Millis;
use crate::entity::Combatant;

#[derive(Debug, Clone, PartialEq)]
pub struct SeparationSolver {
    pub min_separation: f32,
    pub contact_distance: f32,
    pub contact_reset: f32,
    pub lookahead_ms: Millis,
    pub max_speed: f32,
}

impl Default for SeparationSolver {
    fn default() -> Self {
        Self {
            min_separation: MIN_SEPARATION,
            contact_distance: CONTACT_DISTANCE,
            contact_reset: CONTACT_RESET_SEPARATION,
            lookahead_ms: SEPARATION_LOOKAHEAD_MS,
            max_speed: MAX_BODY_SPEED,
        }
    }
}

impl SeparationSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push the bodies apart if closer than the minimum. Returns true if moved.
    pub fn enforce(&self, a: &mut Combatant, b: &mut Combatant) -> bool {
        if a.position.distance(b.position) >= self.min_separation {
            return false;
        }
        push_apart(a, b, self.min_separation);
        true
    }

    /// Hard reset after the bodies touched. Returns true on contact.
    pub fn resolve_contact(&self, a: &mut Combatant, b: &mut Combatant) -> bool {
        if a.position.distance(b.position) >= self.contact_distance {
            return false;
        }
        push_apart(a, b, self.contact_reset);
        true
    }

    /// Zero velocities that would break the constraint one lookahead ahead
    pub fn constrain_velocities(&self, a: &mut Combatant, b: &mut Combatant) {
        let dt = self.lookahead_ms as f32 / 1000.0;
        let (pa, pb) = (a.position, b.position);
        let current = pa.distance(pb);

        for (mover, other) in [(a, pb), (b, pa)] {
            if mover.velocity.length() > self.max_speed {
                mover.velocity = Vec2::ZERO;
                continue;
            }
            let predicted = (mover.position + mover.velocity * dt).distance(other);
            if predicted < self.min_separation && predicted < current {
                mover.velocity = Vec2::ZERO;
            }
        }
    }
}

/// Separate along the connecting line until `target` apart, zeroing velocities
///
/// A dead body stays put and the living one covers the whole correction.
fn push_apart(a: &mut Combatant, b: &mut Combatant, target: f32) {
    let delta = b.position - a.position;
    let distance = delta.length();
    let axis = if distance > 1e-4 { delta / distance } else { Vec2::X };
    let deficit = target - distance;

    let (share_a, share_b) = match (a.is_dead(), b.is_dead()) {
        (true, false) => (0.0, 1.0),
        (false, true) => (1.0, 0.0),
        _ => (0.5, 0.5),
    };
    a.position -= axis * deficit * share_a;
    b.position += axis * deficit * share_b;
    a.velocity = Vec2::ZERO;
    b.velocity = Vec2::ZERO;
}
