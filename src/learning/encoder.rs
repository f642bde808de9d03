//! State encoder: continuous combat state to a small discrete key
//!
//! The two roles see different slices of the world. The hero tracks both
//! health bars; the knight ignores health entirely and instead tracks its
//! own aggression.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::Combatant;
use crate::core::types::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistanceBin {
    Close,
    Medium,
    Far,
}

impl DistanceBin {
    pub fn from_distance(distance: f32) -> Self {
        if distance < 80.0 {
            DistanceBin::Close
        } else if distance < 200.0 {
            DistanceBin::Medium
        } else {
            DistanceBin::Far
        }
    }

    fn tag(self) -> &'static str {
        match self {
            DistanceBin::Close => "close",
            DistanceBin::Medium => "medium",
            DistanceBin::Far => "far",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthBin {
    High,
    Mid,
    Low,
}

impl HealthBin {
    pub fn from_fraction(fraction: f32) -> Self {
        if fraction > 0.6 {
            HealthBin::High
        } else if fraction > 0.3 {
            HealthBin::Mid
        } else {
            HealthBin::Low
        }
    }

    fn tag(self) -> &'static str {
        match self {
            HealthBin::High => "high",
            HealthBin::Mid => "mid",
            HealthBin::Low => "low",
        }
    }
}

/// What the opponent is doing, from its attack/block state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityBin {
    Attacking,
    Blocking,
    Idle,
}

impl ActivityBin {
    pub fn of(combatant: &Combatant) -> Self {
        if combatant.action.is_attacking() {
            ActivityBin::Attacking
        } else if combatant.action.is_blocking() {
            ActivityBin::Blocking
        } else {
            ActivityBin::Idle
        }
    }

    fn tag(self) -> &'static str {
        match self {
            ActivityBin::Attacking => "attacking",
            ActivityBin::Blocking => "blocking",
            ActivityBin::Idle => "idle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggressionBin {
    Low,
    Medium,
    High,
    Extreme,
}

impl AggressionBin {
    pub fn from_level(level: f32) -> Self {
        if level < 50.0 {
            AggressionBin::Low
        } else if level < 100.0 {
            AggressionBin::Medium
        } else if level < 150.0 {
            AggressionBin::High
        } else {
            AggressionBin::Extreme
        }
    }

    fn tag(self) -> &'static str {
        match self {
            AggressionBin::Low => "low",
            AggressionBin::Medium => "medium",
            AggressionBin::High => "high",
            AggressionBin::Extreme => "extreme",
        }
    }
}

/// Discretized view of the duel from one role's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncodedState {
    Protagonist {
        distance: DistanceBin,
        own_health: HealthBin,
        opponent_health: HealthBin,
        opponent_activity: ActivityBin,
    },
    Antagonist {
        distance: DistanceBin,
        opponent_activity: ActivityBin,
        aggression: AggressionBin,
    },
    /// Marker used as "next state" for win/loss updates
    Terminal,
}

impl EncodedState {
    pub fn distance(&self) -> Option<DistanceBin> {
        match *self {
            EncodedState::Protagonist { distance, .. } => Some(distance),
            EncodedState::Antagonist { distance, .. } => Some(distance),
            EncodedState::Terminal => None,
        }
    }

    pub fn key(&self) -> StateKey {
        StateKey(self.to_string())
    }
}

impl fmt::Display for EncodedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodedState::Protagonist {
                distance,
                own_health,
                opponent_health,
                opponent_activity,
            } => write!(
                f,
                "hero:{}:{}:{}:{}",
                distance.tag(),
                own_health.tag(),
                opponent_health.tag(),
                opponent_activity.tag()
            ),
            EncodedState::Antagonist {
                distance,
                opponent_activity,
                aggression,
            } => write!(
                f,
                "knight:{}:{}:{}",
                distance.tag(),
                opponent_activity.tag(),
                aggression.tag()
            ),
            EncodedState::Terminal => write!(f, "terminal"),
        }
    }
}

/// Opaque, stable Q-table key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateKey(String);

impl StateKey {
    pub fn terminal() -> Self {
        EncodedState::Terminal.key()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Rebuild a key read back from persistence
    pub fn from_raw(raw: impl Into<String>) -> Self {
        StateKey(raw.into())
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encode the duel from `role`'s point of view
pub fn encode(role: Role, own: &Combatant, opponent: &Combatant) -> EncodedState {
    let distance = DistanceBin::from_distance(own.position.distance(opponent.position));
    let opponent_activity = ActivityBin::of(opponent);

    match role {
        Role::Protagonist => EncodedState::Protagonist {
            distance,
            own_health: HealthBin::from_fraction(own.health_fraction()),
            opponent_health: HealthBin::from_fraction(opponent.health_fraction()),
            opponent_activity,
        },
        Role::Antagonist => EncodedState::Antagonist {
            distance,
            opponent_activity,
            aggression: AggressionBin::from_level(own.aggression().unwrap_or(0.0)),
        },
    }
}
