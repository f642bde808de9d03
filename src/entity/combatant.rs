//! The unified combatant record
//!
//! Both duelists share one data layout. Behavior that differs by role
//! (decision bookkeeping, aggression) lives in `RoleState`, selected by the
//! role tag rather than by separate types.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::actions::Command;
use crate::combat::armor::ArmorSet;
use crate::combat::constants::{
    AGGRESSION_AFTER_HIT, AGGRESSION_GROWTH_PER_SEC, HERO_MAX_HEALTH, KNIGHT_MAX_HEALTH,
    MAX_AGGRESSION, MAX_STAMINA,
};
use crate::combat::resources::Resources;
use crate::combat::state::ActionState;
use crate::core::schedule::CancelToken;
use crate::core::types::{Facing, Millis, Role};
use crate::learning::encoder::StateKey;

/// Hero-only bookkeeping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HeroState {
    /// Consecutive decisions taken far from the knight without closing in
    pub far_streak: u32,
}

/// Knight-only bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnightState {
    /// Rises while the knight fails to land hits, in [0, MAX_AGGRESSION]
    pub aggression: f32,
    /// Substitute an active choice whenever the policy picks idle
    pub idle_override: bool,
    pub far_streak: u32,
    pub block_streak: u32,
}

impl Default for KnightState {
    fn default() -> Self {
        Self {
            aggression: 0.0,
            idle_override: true,
            far_streak: 0,
            block_streak: 0,
        }
    }
}

impl KnightState {
    pub fn grow_aggression(&mut self, dt: Millis) {
        let grown = self.aggression + AGGRESSION_GROWTH_PER_SEC * dt as f32 / 1000.0;
        self.aggression = grown.clamp(0.0, MAX_AGGRESSION);
    }

    pub fn calm_after_hit(&mut self) {
        self.aggression = AGGRESSION_AFTER_HIT;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RoleState {
    Hero(HeroState),
    Knight(KnightState),
}

impl RoleState {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Protagonist => RoleState::Hero(HeroState::default()),
            Role::Antagonist => RoleState::Knight(KnightState::default()),
        }
    }
}

/// Per-match tallies for reporting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatStats {
    pub attacks_issued: u32,
    pub hits_landed: u32,
    pub crits: u32,
    pub blocks: u32,
    pub dodges: u32,
    pub rejected_actions: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combatant {
    pub role: Role,
    pub position: Vec2,
    pub velocity: Vec2,
    pub facing: Facing,
    pub health: f32,
    pub max_health: f32,
    pub resources: Resources,
    pub armor: ArmorSet,
    pub action: ActionState,
    /// Bumped whenever pending scheduled follow-ups must be abandoned
    pub generation: u32,
    dead: bool,
    /// Hits are ignored until this time
    pub hit_immunity_until: Millis,
    /// Damage tint for presentation
    pub flashing: bool,
    pub flash_until: Millis,
    /// Knockback impulse still carrying the body
    pub knocked_back: bool,
    pub knockback_until: Millis,
    /// Earliest time of the next policy decision
    pub next_decision_at: Millis,
    /// Encoded state at the last decision, for deferred rewards
    pub last_state: Option<StateKey>,
    /// Action chosen at the last decision (before any idle substitution)
    pub last_action: Option<Command>,
    pub role_state: RoleState,
    pub stats: CombatStats,
}

impl Combatant {
    /// Fresh combatant with full resources
    pub fn new(role: Role, position: Vec2, facing: Facing) -> Self {
        let (max_health, armor) = match role {
            Role::Protagonist => (HERO_MAX_HEALTH, ArmorSet::hero()),
            Role::Antagonist => (KNIGHT_MAX_HEALTH, ArmorSet::knight()),
        };
        Self {
            role,
            position,
            velocity: Vec2::ZERO,
            facing,
            health: max_health,
            max_health,
            resources: Resources::new(MAX_STAMINA),
            armor,
            action: ActionState::Idle,
            generation: 0,
            dead: false,
            hit_immunity_until: 0,
            flashing: false,
            flash_until: 0,
            knocked_back: false,
            knockback_until: 0,
            next_decision_at: 0,
            last_state: None,
            last_action: None,
            role_state: RoleState::for_role(role),
            stats: CombatStats::default(),
        }
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_health <= 0.0 {
            return 0.0;
        }
        self.health / self.max_health
    }

    /// Token for events that belong to the current action
    pub fn cancel_token(&self) -> CancelToken {
        CancelToken {
            role: self.role,
            generation: self.generation,
        }
    }

    /// Invalidate every scheduled follow-up of the current action
    pub fn bump_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Remove health, floored at zero. Returns the amount actually removed.
    ///
    /// No-op once dead.
    pub fn apply_damage(&mut self, amount: f32) -> f32 {
        if self.dead || amount <= 0.0 {
            return 0.0;
        }
        let before = self.health;
        self.health = (self.health - amount).max(0.0);
        before - self.health
    }

    /// One-way transition into death. Returns false if already dead.
    pub fn mark_dead(&mut self) -> bool {
        if self.dead {
            return false;
        }
        self.dead = true;
        self.health = 0.0;
        self.action = ActionState::Dead;
        self.velocity = Vec2::ZERO;
        self.knocked_back = false;
        self.flashing = false;
        self.bump_generation();
        true
    }

    pub fn is_immune(&self, now: Millis) -> bool {
        now < self.hit_immunity_until || matches!(self.action, ActionState::Dodging)
    }

    pub fn aggression(&self) -> Option<f32> {
        match &self.role_state {
            RoleState::Knight(k) => Some(k.aggression),
            RoleState::Hero(_) => None,
        }
    }

    pub fn knight_state_mut(&mut self) -> Option<&mut KnightState> {
        match &mut self.role_state {
            RoleState::Knight(k) => Some(k),
            RoleState::Hero(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_combatant_full_resources() {
        let knight = Combatant::new(Role::Antagonist, Vec2::ZERO, Facing::West);
        assert_eq!(knight.health, KNIGHT_MAX_HEALTH);
        assert_eq!(knight.resources.stamina, MAX_STAMINA);
        assert_eq!(knight.action, ActionState::Idle);
        assert_eq!(knight.aggression(), Some(0.0));
    }

    #[test]
    fn test_damage_floors_at_zero() {
        let mut hero = Combatant::new(Role::Protagonist, Vec2::ZERO, Facing::East);
        assert_eq!(hero.apply_damage(30.0), 30.0);
        assert_eq!(hero.apply_damage(500.0), 70.0);
        assert_eq!(hero.health, 0.0);
    }

    #[test]
    fn test_death_is_one_way() {
        let mut hero = Combatant::new(Role::Protagonist, Vec2::ZERO, Facing::East);
        let generation = hero.generation;
        assert!(hero.mark_dead());
        assert!(!hero.mark_dead());
        assert_eq!(hero.generation, generation + 1);
        assert_eq!(hero.apply_damage(10.0), 0.0);
        assert_eq!(hero.action, ActionState::Dead);
    }

    #[test]
    fn test_aggression_grows_and_resets() {
        let mut knight = KnightState::default();
        knight.grow_aggression(10_000);
        assert!((knight.aggression - 80.0).abs() < 1e-3);
        knight.grow_aggression(1_000_000);
        assert_eq!(knight.aggression, MAX_AGGRESSION);
        knight.calm_after_hit();
        assert_eq!(knight.aggression, AGGRESSION_AFTER_HIT);
    }
}
