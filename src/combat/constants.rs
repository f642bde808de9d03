//! Combat constants - all tunable values in one place
//!
//! Distances are world units, speeds are units per second, times are
//! simulation milliseconds.

use crate::core::types::Millis;

// Bodies
pub const BODY_RADIUS: f32 = 40.0;
pub const HERO_MAX_HEALTH: f32 = 100.0;
pub const KNIGHT_MAX_HEALTH: f32 = 150.0;
pub const MAX_STAMINA: f32 = 100.0;

// Movement
pub const HERO_MOVE_SPEED: f32 = 180.0;
pub const KNIGHT_APPROACH_SPEED: f32 = 120.0;
pub const MOVE_COMMAND_MS: Millis = 300;
pub const LUNGE_SPEED: f32 = 320.0;
pub const LUNGE_DURATION_MS: Millis = 250;
pub const LUNGE_ANGLE_DEGREES: f32 = 45.0;

// Knight drifts toward the hero while it has nothing better to do
pub const OMINOUS_APPROACH_BASE_SPEED: f32 = 30.0;
pub const OMINOUS_APPROACH_SPEED_PER_AGGRESSION: f32 = 0.3;
pub const OMINOUS_APPROACH_MIN_DISTANCE: f32 = 70.0;

// Idle substitution ranges for the knight
pub const IDLE_SUBSTITUTE_ATTACK_RANGE: f32 = 100.0;
pub const IDLE_SUBSTITUTE_LUNGE_RANGE: f32 = 200.0;

// Attack timing
pub const ATTACK_WINDUP_MS: Millis = 100;
pub const HIT_VOLUME_LIFETIME_MS: Millis = 200;
pub const HIT_VOLUME_REACH: f32 = 60.0;
pub const HIT_VOLUME_HALF_EXTENT: f32 = 20.0;

// Blocking
pub const BLOCK_START_MS: Millis = 120;
pub const BLOCK_HALF_ARC_DEGREES: f32 = 45.0;
pub const BLOCK_STAMINA_COST: f32 = 15.0;

// Dodging
pub const DODGE_STAMINA_COST: f32 = 30.0;
pub const DODGE_REGEN_DELAY_MS: Millis = 300;
pub const DODGE_DURATION_MS: Millis = 250;
pub const DODGE_SPEED: f32 = 350.0;

// Hit reaction
pub const HIT_STAGGER_MS: Millis = 200;
pub const HIT_IMMUNITY_MS: Millis = 200;
pub const HIT_FLASH_MS: Millis = 200;
pub const KNOCKBACK_SPEED: f32 = 220.0;
pub const KNOCKBACK_MS: Millis = 150;
// Special attacks landing on the knight shove it harder and longer
pub const SPECIAL_KNOCKBACK_SPEED: f32 = 380.0;
pub const SPECIAL_KNOCKBACK_MS: Millis = 250;

// Damage
pub const CRIT_CHANCE: f64 = 0.10;
pub const CRIT_MULTIPLIER: f32 = 1.5;
pub const HEAD_ZONE_RATIO: f32 = 0.3;
pub const TORSO_ZONE_RATIO: f32 = 0.7;

// Stamina
pub const STAMINA_REGEN_PER_SEC: f32 = 25.0;
pub const EXHAUSTION_MS: Millis = 1000;
pub const EXHAUSTION_RECOVERY_STAMINA: f32 = 10.0;

// Aggression (knight only)
pub const MAX_AGGRESSION: f32 = 200.0;
pub const AGGRESSION_GROWTH_PER_SEC: f32 = 8.0;
pub const AGGRESSION_AFTER_HIT: f32 = 5.0;

// Separation
pub const MIN_SEPARATION: f32 = 85.0;
pub const CONTACT_RESET_SEPARATION: f32 = 90.0;
pub const CONTACT_DISTANCE: f32 = 2.0 * BODY_RADIUS;
pub const SEPARATION_LOOKAHEAD_MS: Millis = 50;
pub const MAX_BODY_SPEED: f32 = 500.0;

// Death
pub const DEATH_SEQUENCE_MS: Millis = 1500;
