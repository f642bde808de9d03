//! Duel configuration with documented defaults
//!
//! Two layers live here:
//! - `AgentConfig`: per-combatant learning hyperparameters. Never fails to
//!   load; anything missing or out of range silently falls back to its default.
//! - `DuelConfig`: match-level knobs (tick length, spawn points, cooldowns).
//!
//! Combat tunables (damage, costs, timings) are in `combat::constants`.

use std::fs;
use std::path::{Path, PathBuf};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::combat::constants::MIN_SEPARATION;
use crate::core::error::{DuelError, Result};
use crate::core::types::{Millis, Role};

pub const DEFAULT_LEARNING_RATE: f64 = 0.1;
pub const DEFAULT_DISCOUNT_FACTOR: f64 = 0.9;
pub const DEFAULT_EPSILON_START: f64 = 0.5;
pub const DEFAULT_EPSILON_MIN: f64 = 0.05;
pub const DEFAULT_DECAY_STEPS: u64 = 3000;

/// Learning hyperparameters for one policy agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Step size of the Bellman update, in (0, 1]
    pub learning_rate: f64,
    /// Weight of future value, in [0, 1]
    pub discount_factor: f64,
    /// Exploration probability at step 0
    pub epsilon_start: f64,
    /// Exploration floor once decay is complete
    pub epsilon_min: f64,
    /// Number of decisions over which epsilon decays linearly
    pub decay_steps: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            learning_rate: DEFAULT_LEARNING_RATE,
            discount_factor: DEFAULT_DISCOUNT_FACTOR,
            epsilon_start: DEFAULT_EPSILON_START,
            epsilon_min: DEFAULT_EPSILON_MIN,
            decay_steps: DEFAULT_DECAY_STEPS,
        }
    }
}

impl AgentConfig {
    /// Replace every invalid field with its documented default
    pub fn sanitized(&self) -> Self {
        let unit = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);

        let learning_rate = if self.learning_rate.is_finite()
            && self.learning_rate > 0.0
            && self.learning_rate <= 1.0
        {
            self.learning_rate
        } else {
            DEFAULT_LEARNING_RATE
        };
        let discount_factor = if unit(self.discount_factor) {
            self.discount_factor
        } else {
            DEFAULT_DISCOUNT_FACTOR
        };
        let epsilon_start = if unit(self.epsilon_start) {
            self.epsilon_start
        } else {
            DEFAULT_EPSILON_START
        };
        let mut epsilon_min = if unit(self.epsilon_min) {
            self.epsilon_min
        } else {
            DEFAULT_EPSILON_MIN
        };
        if epsilon_min > epsilon_start {
            epsilon_min = DEFAULT_EPSILON_MIN.min(epsilon_start);
        }
        let decay_steps = if self.decay_steps == 0 {
            DEFAULT_DECAY_STEPS
        } else {
            self.decay_steps
        };

        Self {
            learning_rate,
            discount_factor,
            epsilon_start,
            epsilon_min,
            decay_steps,
        }
    }

    /// Linear epsilon decrement per decision
    pub fn decay_rate(&self) -> f64 {
        (self.epsilon_start - self.epsilon_min) / self.decay_steps as f64
    }
}

/// Load `<dir>/<agent_id>.toml`; each missing or invalid field takes its default
pub fn load_agent_config(dir: &Path, agent_id: &str) -> AgentConfig {
    let path = agent_config_path(dir, agent_id);

    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::debug!("No agent config at {:?} ({}), using defaults", path, e);
            return AgentConfig::default();
        }
    };

    let table = match contents.parse::<toml::Table>() {
        Ok(table) => table,
        Err(e) => {
            tracing::warn!("Failed to parse agent config {:?}: {}; using defaults", path, e);
            return AgentConfig::default();
        }
    };

    // Per-key fallback
    let defaults = AgentConfig::default();
    let float = |key: &str, fallback: f64| match table.get(key) {
        None => fallback,
        Some(value) => value
            .as_float()
            .or_else(|| value.as_integer().map(|i| i as f64))
            .unwrap_or_else(|| {
                tracing::warn!("Invalid {} in {:?}: {}; using default", key, path, value);
                fallback
            }),
    };
    let decay_steps = match table.get("decay_steps") {
        None => defaults.decay_steps,
        Some(value) => value
            .as_integer()
            .and_then(|i| u64::try_from(i).ok())
            .unwrap_or_else(|| {
                tracing::warn!("Invalid decay_steps in {:?}: {}; using default", path, value);
                defaults.decay_steps
            }),
    };

    AgentConfig {
        learning_rate: float("learning_rate", defaults.learning_rate),
        discount_factor: float("discount_factor", defaults.discount_factor),
        epsilon_start: float("epsilon_start", defaults.epsilon_start),
        epsilon_min: float("epsilon_min", defaults.epsilon_min),
        decay_steps,
    }
    .sanitized()
}

fn agent_config_path(dir: &Path, agent_id: &str) -> PathBuf {
    dir.join(format!("{}.toml", agent_id))
}

/// Match-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuelConfig {
    /// Simulation step length
    ///
    /// 16ms approximates a 60Hz frame loop. All timers are expressed in
    /// milliseconds so variable steps are also accepted by the tick loop.
    pub tick_ms: Millis,

    /// Seed for combat randomness (crits, lunge side) and agent exploration
    pub seed: u64,

    /// Minimum time between two protagonist decisions
    pub hero_decision_cooldown_ms: Millis,

    /// Minimum time between two antagonist decisions
    ///
    /// Slower than the hero: the knight is heavier and commits longer.
    pub knight_decision_cooldown_ms: Millis,

    /// Arena extent; positions are clamped to [0, width] x [0, height]
    pub arena_width: f32,
    pub arena_height: f32,

    pub hero_spawn: Vec2,
    pub knight_spawn: Vec2,

    /// Matches running longer than this end in a draw
    pub max_match_ms: Millis,

    /// Upper bound between a death and the outcome signal, in case the
    /// death-sequence completion never arrives
    pub outcome_backup_ms: Millis,
}

impl Default for DuelConfig {
    fn default() -> Self {
        Self {
            tick_ms: 16,
            seed: 42,
            hero_decision_cooldown_ms: 250,
            knight_decision_cooldown_ms: 350,
            arena_width: 800.0,
            arena_height: 600.0,
            hero_spawn: Vec2::new(200.0, 300.0),
            knight_spawn: Vec2::new(600.0, 300.0),
            max_match_ms: 120_000,
            outcome_backup_ms: 3_000,
        }
    }
}

impl DuelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decision_cooldown(&self, role: Role) -> Millis {
        match role {
            Role::Protagonist => self.hero_decision_cooldown_ms,
            Role::Antagonist => self.knight_decision_cooldown_ms,
        }
    }

    pub fn spawn(&self, role: Role) -> Vec2 {
        match role {
            Role::Protagonist => self.hero_spawn,
            Role::Antagonist => self.knight_spawn,
        }
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.tick_ms == 0 {
            return Err("tick_ms must be positive".into());
        }

        if self.hero_decision_cooldown_ms < self.tick_ms
            || self.knight_decision_cooldown_ms < self.tick_ms
        {
            return Err(format!(
                "decision cooldowns ({}, {}) should be >= tick_ms ({})",
                self.hero_decision_cooldown_ms, self.knight_decision_cooldown_ms, self.tick_ms
            ));
        }

        if !(self.arena_width > 0.0 && self.arena_height > 0.0) {
            return Err("arena dimensions must be positive".into());
        }

        for role in Role::BOTH {
            let p = self.spawn(role);
            if p.x < 0.0 || p.y < 0.0 || p.x > self.arena_width || p.y > self.arena_height {
                return Err(format!("{} spawn {:?} lies outside the arena", role.id(), p));
            }
        }

        if self.hero_spawn.distance(self.knight_spawn) < MIN_SEPARATION {
            return Err(format!(
                "spawn points are closer than the minimum separation ({})",
                MIN_SEPARATION
            ));
        }

        if self.max_match_ms <= self.tick_ms {
            return Err("max_match_ms must exceed tick_ms".into());
        }

        Ok(())
    }
}

/// Load and validate a duel config from a TOML file
pub fn load_duel_config(path: &Path) -> Result<DuelConfig> {
    let contents = fs::read_to_string(path)?;
    let config: DuelConfig = toml::from_str(&contents)?;
    config.validate().map_err(DuelError::InvalidConfig)?;
    Ok(config)
}
