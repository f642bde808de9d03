//! Reward shaping
//!
//! Rewards are produced as separate components so each one becomes its own
//! Bellman update. Decision-time shaping looks at the action a combatant
//! chose last time against the distance it finds itself at now.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::actions::{AntagonistAction, Command, ProtagonistAction};
use crate::core::types::{angle_between, angle_of};
use crate::entity::{Combatant, RoleState};
use crate::learning::encoder::DistanceBin;

// ============================================================================
// OUTCOME REWARDS
// ============================================================================

/// Attacker reward for a hit that dealt damage
pub const HIT_REWARD: f64 = 10.0;
/// Victim reward for taking damage
pub const HIT_TAKEN_PENALTY: f64 = -5.0;
pub const VICTORY_REWARD: f64 = 100.0;
pub const DEFEAT_PENALTY: f64 = -100.0;

// ============================================================================
// KNIGHT SHAPING
// ============================================================================

/// Charged immediately whenever the knight's policy picks idle
pub const IDLE_PENALTY: f64 = -10.0;
pub const NOT_APPROACHING_BASE: f64 = 1.0;
pub const NOT_APPROACHING_PER_STREAK: f64 = 0.5;
pub const FAR_FROM_OPPONENT_PENALTY: f64 = -1.0;
pub const APPROACH_BONUS: f64 = 1.0;
pub const LUNGE_BONUS: f64 = 1.5;
/// Consecutive blocks tolerated before the streak penalty starts
pub const BLOCK_STREAK_TOLERANCE: u32 = 3;

// ============================================================================
// HERO SHAPING
// ============================================================================

pub const HERO_FAR_PENALTY_PER_STREAK: f64 = 0.5;
/// Move directions within this angle of the opponent count as closing
pub const CLOSING_ANGLE_DEGREES: f32 = 45.0;

// ============================================================================
// SHARED
// ============================================================================

pub const MEDIUM_RANGE_ENGAGE: f64 = 0.5;
pub const MEDIUM_RANGE_PASSIVE: f64 = -0.5;
pub const CLOSE_RANGE_ATTACK: f64 = 1.0;
/// Cap on any single escalating penalty
pub const MAX_STREAK_PENALTY: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RewardReason {
    HitLanded,
    HitTaken,
    Victory,
    Defeat,
    IdleChosen,
    /// Far away without choosing to close in (hero)
    StayedFar,
    /// Far away without choosing approach (knight)
    NotApproaching,
    FarFromOpponent,
    ApproachBonus,
    LungeBonus,
    MediumEngaged,
    MediumPassive,
    CloseAttack,
    BlockStreak,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub reason: RewardReason,
    pub value: f64,
}

impl Reward {
    pub fn new(reason: RewardReason, value: f64) -> Self {
        Self { reason, value }
    }
}

/// Attacker and victim rewards for a damaging hit
///
/// The knight's reward grows with its aggression at the moment of impact.
pub fn hit_rewards(attacker: &Combatant) -> (Reward, Reward) {
    let scale = match attacker.aggression() {
        Some(aggression) => 1.0 + aggression as f64 / 100.0,
        None => 1.0,
    };
    (
        Reward::new(RewardReason::HitLanded, HIT_REWARD * scale),
        Reward::new(RewardReason::HitTaken, HIT_TAKEN_PENALTY),
    )
}

pub fn victory_reward() -> Reward {
    Reward::new(RewardReason::Victory, VICTORY_REWARD)
}

pub fn defeat_reward() -> Reward {
    Reward::new(RewardReason::Defeat, DEFEAT_PENALTY)
}

pub fn idle_penalty() -> Reward {
    Reward::new(RewardReason::IdleChosen, IDLE_PENALTY)
}

/// Shaping rewards for the previous decision, judged from the current position
///
/// Updates the combatant's streak counters. Returns nothing when no action
/// has been recorded yet.
pub fn shaping_rewards(combatant: &mut Combatant, opponent_position: Vec2) -> Vec<Reward> {
    let Some(last) = combatant.last_action else {
        return Vec::new();
    };
    let to_opponent = opponent_position - combatant.position;
    let bin = DistanceBin::from_distance(to_opponent.length());

    match (&mut combatant.role_state, last) {
        (RoleState::Hero(hero), Command::Protagonist(action)) => {
            let closing = is_closing(action, to_opponent);
            let mut rewards = Vec::new();
            match bin {
                DistanceBin::Far => {
                    if closing {
                        hero.far_streak = 0;
                    } else {
                        hero.far_streak += 1;
                        let penalty = (HERO_FAR_PENALTY_PER_STREAK * hero.far_streak as f64)
                            .min(MAX_STREAK_PENALTY);
                        rewards.push(Reward::new(RewardReason::StayedFar, -penalty));
                    }
                }
                DistanceBin::Medium => {
                    hero.far_streak = 0;
                    if action.attack_kind().is_some() || closing {
                        rewards.push(Reward::new(RewardReason::MediumEngaged, MEDIUM_RANGE_ENGAGE));
                    } else {
                        rewards.push(Reward::new(RewardReason::MediumPassive, MEDIUM_RANGE_PASSIVE));
                    }
                }
                DistanceBin::Close => {
                    hero.far_streak = 0;
                    if action.attack_kind().is_some() {
                        rewards.push(Reward::new(RewardReason::CloseAttack, CLOSE_RANGE_ATTACK));
                    }
                }
            }
            rewards
        }
        (RoleState::Knight(knight), Command::Antagonist(action)) => {
            let mut rewards = Vec::new();
            match bin {
                DistanceBin::Far => {
                    if action == AntagonistAction::Approach {
                        knight.far_streak = 0;
                        rewards.push(Reward::new(RewardReason::ApproachBonus, APPROACH_BONUS));
                    } else {
                        let penalty = (NOT_APPROACHING_BASE
                            + NOT_APPROACHING_PER_STREAK * knight.far_streak as f64)
                            .min(MAX_STREAK_PENALTY);
                        knight.far_streak += 1;
                        rewards.push(Reward::new(RewardReason::NotApproaching, -penalty));
                        rewards.push(Reward::new(
                            RewardReason::FarFromOpponent,
                            FAR_FROM_OPPONENT_PENALTY,
                        ));
                    }
                }
                DistanceBin::Medium => {
                    knight.far_streak = 0;
                    match action {
                        AntagonistAction::LungeLeft | AntagonistAction::LungeRight => {
                            rewards.push(Reward::new(RewardReason::LungeBonus, LUNGE_BONUS));
                        }
                        AntagonistAction::Attack | AntagonistAction::Approach => {
                            rewards.push(Reward::new(RewardReason::MediumEngaged, MEDIUM_RANGE_ENGAGE));
                        }
                        AntagonistAction::Block | AntagonistAction::Idle => {
                            rewards.push(Reward::new(RewardReason::MediumPassive, MEDIUM_RANGE_PASSIVE));
                        }
                    }
                }
                DistanceBin::Close => {
                    knight.far_streak = 0;
                    if action == AntagonistAction::Attack {
                        rewards.push(Reward::new(RewardReason::CloseAttack, CLOSE_RANGE_ATTACK));
                    }
                }
            }

            if action == AntagonistAction::Block {
                knight.block_streak += 1;
                if knight.block_streak > BLOCK_STREAK_TOLERANCE {
                    let excess = (knight.block_streak - BLOCK_STREAK_TOLERANCE) as f64;
                    rewards.push(Reward::new(RewardReason::BlockStreak, -excess));
                }
            } else {
                knight.block_streak = 0;
            }
            rewards
        }
        (_, other) => {
            tracing::warn!(
                "Command {} recorded for the wrong role ({})",
                other.name(),
                combatant.role.id()
            );
            Vec::new()
        }
    }
}

/// Did a hero move head toward the opponent?
fn is_closing(action: ProtagonistAction, to_opponent: Vec2) -> bool {
    match action {
        ProtagonistAction::Move(direction) if to_opponent.length_squared() > 0.0 => {
            angle_between(direction.angle(), angle_of(to_opponent))
                <= CLOSING_ANGLE_DEGREES.to_radians() + 1e-4
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Facing, Role};

    fn knight_at(last: AntagonistAction) -> Combatant {
        let mut knight = Combatant::new(Role::Antagonist, Vec2::ZERO, Facing::East);
        knight.last_action = Some(Command::Antagonist(last));
        knight
    }

    fn hero_at(last: ProtagonistAction) -> Combatant {
        let mut hero = Combatant::new(Role::Protagonist, Vec2::ZERO, Facing::East);
        hero.last_action = Some(Command::Protagonist(last));
        hero
    }

    fn reasons(rewards: &[Reward]) -> Vec<RewardReason> {
        rewards.iter().map(|r| r.reason).collect()
    }

    #[test]
    fn test_far_knight_gets_two_penalties() {
        let mut knight = knight_at(AntagonistAction::Block);
        let rewards = shaping_rewards(&mut knight, Vec2::new(210.0, 0.0));
        let reasons = reasons(&rewards);
        assert!(reasons.contains(&RewardReason::NotApproaching));
        assert!(reasons.contains(&RewardReason::FarFromOpponent));
        assert!(rewards.iter().all(|r| r.value < 0.0));
    }

    #[test]
    fn test_not_approaching_escalates_and_caps() {
        let mut knight = knight_at(AntagonistAction::Attack);
        let first = shaping_rewards(&mut knight, Vec2::new(300.0, 0.0));
        assert_eq!(first[0].value, -1.0);
        let second = shaping_rewards(&mut knight, Vec2::new(300.0, 0.0));
        assert_eq!(second[0].value, -1.5);
        for _ in 0..20 {
            shaping_rewards(&mut knight, Vec2::new(300.0, 0.0));
        }
        let capped = shaping_rewards(&mut knight, Vec2::new(300.0, 0.0));
        assert_eq!(capped[0].value, -MAX_STREAK_PENALTY);
    }

    #[test]
    fn test_approach_while_far_is_bonus() {
        let mut knight = knight_at(AntagonistAction::Approach);
        let rewards = shaping_rewards(&mut knight, Vec2::new(300.0, 0.0));
        assert_eq!(reasons(&rewards), vec![RewardReason::ApproachBonus]);
    }

    #[test]
    fn test_lunge_at_medium_is_bonus() {
        let mut knight = knight_at(AntagonistAction::LungeLeft);
        let rewards = shaping_rewards(&mut knight, Vec2::new(150.0, 0.0));
        assert_eq!(rewards, vec![Reward::new(RewardReason::LungeBonus, LUNGE_BONUS)]);
    }

    #[test]
    fn test_block_streak_penalty() {
        let mut knight = knight_at(AntagonistAction::Block);
        for _ in 0..3 {
            let r = shaping_rewards(&mut knight, Vec2::new(50.0, 0.0));
            assert!(!reasons(&r).contains(&RewardReason::BlockStreak));
        }
        let r = shaping_rewards(&mut knight, Vec2::new(50.0, 0.0));
        assert!(r.contains(&Reward::new(RewardReason::BlockStreak, -1.0)));

        knight.last_action = Some(Command::Antagonist(AntagonistAction::Attack));
        shaping_rewards(&mut knight, Vec2::new(50.0, 0.0));
        assert_eq!(knight.knight_state_mut().unwrap().block_streak, 0);
    }

    #[test]
    fn test_hero_closing_move_resets_far_streak() {
        let mut hero = hero_at(ProtagonistAction::Move(Facing::West));
        let away = shaping_rewards(&mut hero, Vec2::new(400.0, 0.0));
        assert_eq!(reasons(&away), vec![RewardReason::StayedFar]);

        hero.last_action = Some(Command::Protagonist(ProtagonistAction::Move(Facing::East)));
        let toward = shaping_rewards(&mut hero, Vec2::new(400.0, 0.0));
        assert!(toward.is_empty());
    }

    #[test]
    fn test_hero_diagonal_counts_as_closing() {
        let mut hero = hero_at(ProtagonistAction::Move(Facing::SouthEast));
        let rewards = shaping_rewards(&mut hero, Vec2::new(150.0, 0.0));
        assert_eq!(reasons(&rewards), vec![RewardReason::MediumEngaged]);
    }

    #[test]
    fn test_hero_close_attack_rewarded() {
        let mut hero = hero_at(ProtagonistAction::LightAttack);
        let rewards = shaping_rewards(&mut hero, Vec2::new(60.0, 0.0));
        assert_eq!(reasons(&rewards), vec![RewardReason::CloseAttack]);
    }

    #[test]
    fn test_knight_hit_scaled_by_aggression() {
        let mut knight = Combatant::new(Role::Antagonist, Vec2::ZERO, Facing::East);
        knight.knight_state_mut().unwrap().aggression = 50.0;
        let (attacker, victim) = hit_rewards(&knight);
        assert_eq!(attacker.value, 15.0);
        assert_eq!(victim.value, HIT_TAKEN_PENALTY);

        let hero = Combatant::new(Role::Protagonist, Vec2::ZERO, Facing::East);
        assert_eq!(hit_rewards(&hero).0.value, HIT_REWARD);
    }

    #[test]
    fn test_no_last_action_no_shaping() {
        let mut hero = Combatant::new(Role::Protagonist, Vec2::ZERO, Facing::East);
        assert!(shaping_rewards(&mut hero, Vec2::new(400.0, 0.0)).is_empty());
    }
}
