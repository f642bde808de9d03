//! Outbound events: combat log, telemetry snapshots, match outcome

use serde::{Deserialize, Serialize};

use crate::combat::armor::ArmorZone;
use crate::combat::attack::AttackKind;
use crate::combat::state::RejectReason;
use crate::core::types::{Millis, Role};
use crate::entity::Combatant;

/// Winner and loser of a decided match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub winner: Role,
    pub loser: Role,
}

impl MatchOutcome {
    pub fn winner_id(&self) -> &'static str {
        self.winner.id()
    }

    pub fn loser_id(&self) -> &'static str {
        self.loser.id()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchResult {
    Victory(MatchOutcome),
    /// Time limit reached with both combatants standing
    Draw,
}

impl MatchResult {
    pub fn winner(&self) -> Option<Role> {
        match self {
            MatchResult::Victory(outcome) => Some(outcome.winner),
            MatchResult::Draw => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            MatchResult::Victory(outcome) => format!("{}_wins", outcome.winner_id()),
            MatchResult::Draw => "draw".to_string(),
        }
    }
}

/// Notable things that happened during a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    AttackIssued {
        role: Role,
        kind: AttackKind,
    },
    ActionRejected {
        role: Role,
        action: String,
        reason: RejectReason,
    },
    Blocked {
        defender: Role,
        attacker: Role,
    },
    Hit {
        attacker: Role,
        victim: Role,
        zone: ArmorZone,
        damage: f32,
        critical: bool,
    },
    ExhaustionStarted(Role),
    ExhaustionEnded(Role),
    Died(Role),
    MatchEnded(MatchResult),
}

/// Telemetry record consumed by presentation layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSnapshot {
    pub time: Millis,
    pub actor_id: String,
    pub position: [f32; 2],
    /// 0 = east, increasing clockwise on screen
    pub facing_index: u8,
    pub health_fraction: f32,
    pub stamina_fraction: f32,
    pub action: String,
}

impl EventSnapshot {
    pub fn capture(time: Millis, combatant: &Combatant, action: &str) -> Self {
        Self {
            time,
            actor_id: combatant.role.id().to_string(),
            position: combatant.position.to_array(),
            facing_index: combatant.facing.index(),
            health_fraction: combatant.health_fraction(),
            stamina_fraction: combatant.resources.fraction(),
            action: action.to_string(),
        }
    }
}
