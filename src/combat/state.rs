//! Per-combatant action state
//!
//! Every combatant is always in exactly one `ActionState`. The attack lives
//! inside the state, so a second concurrent attack is unrepresentable.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::combat::attack::{AttackKind, AttackPhase};
use crate::core::types::{Facing, Millis, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockPhase {
    /// Raising the guard
    Start,
    /// Looping guard stance
    Holding,
}

/// Why a combatant is moving under its own power
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MoveIntent {
    /// Walk along a compass direction
    Direction(Facing),
    /// Close straight in on the opponent, re-aimed every tick
    Approach,
    /// Short diagonal burst along a fixed unit direction
    Lunge(Vec2),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum ActionState {
    #[default]
    Idle,
    Moving(MoveIntent),
    Attacking {
        kind: AttackKind,
        phase: AttackPhase,
        started_at: Millis,
    },
    Blocking(BlockPhase),
    Dodging,
    /// Hit stagger, cannot be cancelled
    TakingDamage,
    Dead,
}

impl ActionState {
    /// States no new action may interrupt
    pub fn is_uninterruptible(&self) -> bool {
        matches!(
            self,
            ActionState::Attacking {
                phase: AttackPhase::Active | AttackPhase::Recovery,
                ..
            } | ActionState::Dodging
                | ActionState::TakingDamage
                | ActionState::Dead
        )
    }

    pub fn is_attacking(&self) -> bool {
        matches!(self, ActionState::Attacking { .. })
    }

    pub fn attack(&self) -> Option<(AttackKind, AttackPhase)> {
        match *self {
            ActionState::Attacking { kind, phase, .. } => Some((kind, phase)),
            _ => None,
        }
    }

    pub fn is_blocking(&self) -> bool {
        matches!(self, ActionState::Blocking(_))
    }

    pub fn is_moving(&self) -> bool {
        matches!(self, ActionState::Moving(_))
    }

    /// Short label for telemetry snapshots
    pub fn label(&self) -> &'static str {
        match self {
            ActionState::Idle => "idle",
            ActionState::Moving(MoveIntent::Direction(_)) => "move",
            ActionState::Moving(MoveIntent::Approach) => "approach",
            ActionState::Moving(MoveIntent::Lunge(_)) => "lunge",
            ActionState::Attacking { kind, .. } => kind.name(),
            ActionState::Blocking(_) => "block",
            ActionState::Dodging => "dodge",
            ActionState::TakingDamage => "hurt",
            ActionState::Dead => "dead",
        }
    }
}

/// Why the state machine refused an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RejectReason {
    Dead,
    AlreadyAttacking,
    InsufficientStamina,
    Uninterruptible,
    Exhausted,
    MatchOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionOutcome {
    Accepted,
    Rejected(RejectReason),
}

impl ActionOutcome {
    pub fn is_accepted(self) -> bool {
        matches!(self, ActionOutcome::Accepted)
    }
}

/// Delayed effects driven through the match schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimedEvent {
    /// Wind-up finished: spawn the hit volume
    AttackActive(Role),
    /// Active window closed
    AttackRecover(Role),
    /// Recovery finished: back to idle
    AttackEnd(Role),
    BlockSettle(Role),
    DodgeEnd(Role),
    StaggerEnd(Role),
    KnockbackEnd(Role),
    MoveEnd(Role),
    FlashEnd(Role),
    HitVolumeExpire(u64),
    /// Stand-in for the death animation reporting completion
    DeathSequenceEnd(Role),
    /// Fallback in case the death sequence never reports
    OutcomeBackup,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attacking(phase: AttackPhase) -> ActionState {
        ActionState::Attacking {
            kind: AttackKind::Light,
            phase,
            started_at: 0,
        }
    }

    #[test]
    fn test_windup_is_interruptible() {
        assert!(!attacking(AttackPhase::Windup).is_uninterruptible());
        assert!(attacking(AttackPhase::Active).is_uninterruptible());
        assert!(attacking(AttackPhase::Recovery).is_uninterruptible());
    }

    #[test]
    fn test_uninterruptible_states() {
        assert!(ActionState::Dodging.is_uninterruptible());
        assert!(ActionState::TakingDamage.is_uninterruptible());
        assert!(ActionState::Dead.is_uninterruptible());
        assert!(!ActionState::Idle.is_uninterruptible());
        assert!(!ActionState::Blocking(BlockPhase::Holding).is_uninterruptible());
        assert!(!ActionState::Moving(MoveIntent::Approach).is_uninterruptible());
    }

    #[test]
    fn test_labels() {
        assert_eq!(attacking(AttackPhase::Windup).label(), "light_attack");
        assert_eq!(ActionState::Blocking(BlockPhase::Start).label(), "block");
        assert_eq!(ActionState::default().label(), "idle");
    }
}
