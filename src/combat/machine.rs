//! Combat state machine
//!
//! `issue` turns a chosen command into a state transition (or a typed
//! rejection). `handle_event` advances the timed follow-ups the transitions
//! scheduled. Both are no-ops on a dead combatant.

use glam::Vec2;
use rand::Rng;

use crate::actions::{AntagonistAction, Command, ProtagonistAction};
use crate::combat::attack::{AttackKind, AttackPhase};
use crate::combat::constants::*;
use crate::combat::hitbox::HitVolume;
use crate::combat::resources::ResourceTick;
use crate::combat::state::{
    ActionOutcome, ActionState, BlockPhase, MoveIntent, RejectReason, TimedEvent,
};
use crate::core::types::{Facing, Role};
use crate::learning::reward::{defeat_reward, victory_reward};
use crate::simulation::context::MatchContext;
use crate::simulation::events::CombatEvent;

/// Execute a command for its role
pub fn issue(ctx: &mut MatchContext, command: Command) -> ActionOutcome {
    let role = command.role();
    let outcome = match command {
        Command::Protagonist(action) => match action {
            ProtagonistAction::Move(direction) => move_toward(ctx, role, direction),
            ProtagonistAction::LightAttack => attack(ctx, role, AttackKind::Light),
            ProtagonistAction::HeavyAttack => attack(ctx, role, AttackKind::Heavy),
            ProtagonistAction::SpecialAttack => attack(ctx, role, AttackKind::Special),
            ProtagonistAction::Block => block(ctx, role),
            ProtagonistAction::Dodge => dodge(ctx, role),
        },
        Command::Antagonist(action) => match action {
            AntagonistAction::Attack => {
                let kind = knight_attack_kind(ctx.combatant(role).resources.stamina);
                attack(ctx, role, kind)
            }
            AntagonistAction::Approach => approach(ctx, role),
            AntagonistAction::LungeLeft => lunge(ctx, role, -1.0),
            AntagonistAction::LungeRight => lunge(ctx, role, 1.0),
            AntagonistAction::Block => block(ctx, role),
            AntagonistAction::Idle => hold(ctx, role),
        },
    };

    if let ActionOutcome::Rejected(reason) = outcome {
        let combatant = ctx.combatant_mut(role);
        combatant.stats.rejected_actions += 1;
        tracing::debug!("{} rejected {} ({:?})", role.id(), command.name(), reason);
        ctx.events.push(CombatEvent::ActionRejected {
            role,
            action: command.name().to_string(),
            reason,
        });
    }
    outcome
}

/// Heavy swing, or a kick when too winded for one
pub fn knight_attack_kind(stamina: f32) -> AttackKind {
    if stamina < AttackKind::Heavy.stamina_cost() && stamina >= AttackKind::Kick.stamina_cost() {
        AttackKind::Kick
    } else {
        AttackKind::Heavy
    }
}

/// Active replacement for a knight that chose to stand still
pub fn substitute_idle(ctx: &mut MatchContext) -> AntagonistAction {
    let distance = ctx.distance();
    if distance < IDLE_SUBSTITUTE_ATTACK_RANGE {
        AntagonistAction::Attack
    } else if distance < IDLE_SUBSTITUTE_LUNGE_RANGE {
        if ctx.rng.gen_bool(0.5) {
            AntagonistAction::LungeLeft
        } else {
            AntagonistAction::LungeRight
        }
    } else {
        AntagonistAction::Approach
    }
}

fn common_guard(ctx: &MatchContext, role: Role) -> Option<RejectReason> {
    if ctx.is_decided() {
        return Some(RejectReason::MatchOver);
    }
    let combatant = ctx.combatant(role);
    if combatant.is_dead() {
        return Some(RejectReason::Dead);
    }
    None
}

fn attack(ctx: &mut MatchContext, role: Role, kind: AttackKind) -> ActionOutcome {
    if let Some(reason) = common_guard(ctx, role) {
        return ActionOutcome::Rejected(reason);
    }
    let now = ctx.now;
    let combatant = ctx.combatant_mut(role);

    if combatant.action.is_attacking() {
        return ActionOutcome::Rejected(RejectReason::AlreadyAttacking);
    }
    if combatant.action.is_uninterruptible() {
        return ActionOutcome::Rejected(RejectReason::Uninterruptible);
    }
    if !combatant.resources.can_afford(kind.stamina_cost()) {
        return ActionOutcome::Rejected(RejectReason::InsufficientStamina);
    }

    combatant
        .resources
        .spend(kind.stamina_cost(), kind.regen_delay_ms());
    combatant.velocity = Vec2::ZERO;
    combatant.knocked_back = false;
    combatant.bump_generation();
    combatant.action = ActionState::Attacking {
        kind,
        phase: AttackPhase::Windup,
        started_at: now,
    };
    combatant.stats.attacks_issued += 1;
    let token = combatant.cancel_token();

    ctx.schedule
        .schedule(now + ATTACK_WINDUP_MS, Some(token), TimedEvent::AttackActive(role));
    tracing::debug!("{} winds up {} at {}ms", role.id(), kind.name(), now);
    ctx.events.push(CombatEvent::AttackIssued { role, kind });
    ctx.snapshot(role, kind.name());
    ActionOutcome::Accepted
}

fn move_toward(ctx: &mut MatchContext, role: Role, direction: Facing) -> ActionOutcome {
    if let Some(reason) = mobility_guard(ctx, role) {
        return ActionOutcome::Rejected(reason);
    }
    let now = ctx.now;
    let combatant = ctx.combatant_mut(role);
    combatant.bump_generation();
    combatant.facing = direction;
    combatant.velocity = direction.unit_vector() * HERO_MOVE_SPEED;
    combatant.knocked_back = false;
    combatant.action = ActionState::Moving(MoveIntent::Direction(direction));
    let token = combatant.cancel_token();
    ctx.schedule
        .schedule(now + MOVE_COMMAND_MS, Some(token), TimedEvent::MoveEnd(role));
    ActionOutcome::Accepted
}

fn approach(ctx: &mut MatchContext, role: Role) -> ActionOutcome {
    if let Some(reason) = mobility_guard(ctx, role) {
        return ActionOutcome::Rejected(reason);
    }
    let now = ctx.now;
    let dir = ctx.to_opponent(role).normalize_or_zero();
    let combatant = ctx.combatant_mut(role);
    combatant.bump_generation();
    combatant.velocity = dir * KNIGHT_APPROACH_SPEED;
    combatant.knocked_back = false;
    combatant.action = ActionState::Moving(MoveIntent::Approach);
    let token = combatant.cancel_token();
    ctx.schedule
        .schedule(now + MOVE_COMMAND_MS, Some(token), TimedEvent::MoveEnd(role));
    ActionOutcome::Accepted
}

/// Diagonal burst toward the opponent; `side` -1 veers left, +1 right
fn lunge(ctx: &mut MatchContext, role: Role, side: f32) -> ActionOutcome {
    if let Some(reason) = mobility_guard(ctx, role) {
        return ActionOutcome::Rejected(reason);
    }
    let now = ctx.now;
    let toward = ctx.to_opponent(role).normalize_or_zero();
    let toward = if toward == Vec2::ZERO {
        ctx.combatant(role).facing.unit_vector()
    } else {
        toward
    };
    let dir = Vec2::from_angle(side * LUNGE_ANGLE_DEGREES.to_radians()).rotate(toward);

    let combatant = ctx.combatant_mut(role);
    combatant.bump_generation();
    combatant.velocity = dir * LUNGE_SPEED;
    combatant.knocked_back = false;
    combatant.action = ActionState::Moving(MoveIntent::Lunge(dir));
    let token = combatant.cancel_token();
    ctx.schedule
        .schedule(now + LUNGE_DURATION_MS, Some(token), TimedEvent::MoveEnd(role));
    ActionOutcome::Accepted
}

fn mobility_guard(ctx: &MatchContext, role: Role) -> Option<RejectReason> {
    if let Some(reason) = common_guard(ctx, role) {
        return Some(reason);
    }
    let combatant = ctx.combatant(role);
    if combatant.action.is_uninterruptible() {
        return Some(RejectReason::Uninterruptible);
    }
    if combatant.resources.exhausted {
        return Some(RejectReason::Exhausted);
    }
    None
}

fn block(ctx: &mut MatchContext, role: Role) -> ActionOutcome {
    if let Some(reason) = common_guard(ctx, role) {
        return ActionOutcome::Rejected(reason);
    }
    let now = ctx.now;
    let combatant = ctx.combatant_mut(role);
    if combatant.resources.exhausted {
        return ActionOutcome::Rejected(RejectReason::Exhausted);
    }
    if combatant.action.is_uninterruptible() {
        return ActionOutcome::Rejected(RejectReason::Uninterruptible);
    }
    if combatant.action.is_blocking() {
        // Guard already up
        return ActionOutcome::Accepted;
    }

    combatant.bump_generation();
    combatant.velocity = Vec2::ZERO;
    combatant.knocked_back = false;
    combatant.action = ActionState::Blocking(BlockPhase::Start);
    let token = combatant.cancel_token();
    ctx.schedule
        .schedule(now + BLOCK_START_MS, Some(token), TimedEvent::BlockSettle(role));
    ctx.snapshot(role, "block");
    ActionOutcome::Accepted
}

fn dodge(ctx: &mut MatchContext, role: Role) -> ActionOutcome {
    if let Some(reason) = common_guard(ctx, role) {
        return ActionOutcome::Rejected(reason);
    }
    let now = ctx.now;
    let away = -ctx.to_opponent(role).normalize_or_zero();
    let combatant = ctx.combatant_mut(role);
    if combatant.action.is_uninterruptible() {
        return ActionOutcome::Rejected(RejectReason::Uninterruptible);
    }
    if !combatant.resources.can_afford(DODGE_STAMINA_COST) {
        return ActionOutcome::Rejected(RejectReason::InsufficientStamina);
    }

    let dir = if away == Vec2::ZERO {
        -combatant.facing.unit_vector()
    } else {
        away
    };
    combatant
        .resources
        .spend(DODGE_STAMINA_COST, DODGE_REGEN_DELAY_MS);
    combatant.bump_generation();
    combatant.velocity = dir * DODGE_SPEED;
    combatant.knocked_back = false;
    combatant.action = ActionState::Dodging;
    combatant.stats.dodges += 1;
    let token = combatant.cancel_token();
    ctx.schedule
        .schedule(now + DODGE_DURATION_MS, Some(token), TimedEvent::DodgeEnd(role));
    ctx.snapshot(role, "dodge");
    ActionOutcome::Accepted
}

/// Explicit idle: keep whatever is in progress
fn hold(ctx: &mut MatchContext, role: Role) -> ActionOutcome {
    match common_guard(ctx, role) {
        Some(reason) => ActionOutcome::Rejected(reason),
        None => ActionOutcome::Accepted,
    }
}

/// Advance a scheduled follow-up
///
/// Every arm re-checks the state it expects, so a late or duplicated event
/// leaves the combatant untouched.
pub fn handle_event(ctx: &mut MatchContext, event: TimedEvent) {
    let now = ctx.now;
    match event {
        TimedEvent::AttackActive(role) => {
            let combatant = ctx.combatant(role);
            if combatant.is_dead() {
                return;
            }
            let ActionState::Attacking {
                kind,
                phase: AttackPhase::Windup,
                started_at,
            } = combatant.action
            else {
                return;
            };
            let (origin, facing) = (combatant.position, combatant.facing);
            let id = ctx.next_volume_id();
            let expires_at = now + HIT_VOLUME_LIFETIME_MS;
            ctx.hit_volumes
                .push(HitVolume::in_front_of(id, role, kind, origin, facing, expires_at));
            ctx.schedule
                .schedule(expires_at, None, TimedEvent::HitVolumeExpire(id));

            let combatant = ctx.combatant_mut(role);
            combatant.action = ActionState::Attacking {
                kind,
                phase: AttackPhase::Active,
                started_at,
            };
            let token = combatant.cancel_token();
            ctx.schedule
                .schedule(expires_at, Some(token), TimedEvent::AttackRecover(role));
        }
        TimedEvent::AttackRecover(role) => {
            let combatant = ctx.combatant_mut(role);
            let ActionState::Attacking {
                kind,
                phase: AttackPhase::Active,
                started_at,
            } = combatant.action
            else {
                return;
            };
            combatant.action = ActionState::Attacking {
                kind,
                phase: AttackPhase::Recovery,
                started_at,
            };
            let token = combatant.cancel_token();
            ctx.hit_volumes.retain(|v| v.attacker != role);
            ctx.schedule.schedule(
                now + kind.recovery_ms(),
                Some(token),
                TimedEvent::AttackEnd(role),
            );
        }
        TimedEvent::AttackEnd(role) => {
            let toward = ctx.to_opponent(role);
            let combatant = ctx.combatant_mut(role);
            if !matches!(
                combatant.action,
                ActionState::Attacking {
                    phase: AttackPhase::Recovery,
                    ..
                }
            ) {
                return;
            }
            combatant.action = ActionState::Idle;
            combatant.bump_generation();
            if let Some(facing) = Facing::from_vector(toward) {
                combatant.facing = facing;
            }
        }
        TimedEvent::BlockSettle(role) => {
            let combatant = ctx.combatant_mut(role);
            if combatant.action == ActionState::Blocking(BlockPhase::Start) {
                combatant.action = ActionState::Blocking(BlockPhase::Holding);
            }
        }
        TimedEvent::DodgeEnd(role) => {
            let combatant = ctx.combatant_mut(role);
            if combatant.action == ActionState::Dodging {
                combatant.action = ActionState::Idle;
                combatant.velocity = Vec2::ZERO;
            }
        }
        TimedEvent::StaggerEnd(role) => {
            let combatant = ctx.combatant_mut(role);
            if combatant.action == ActionState::TakingDamage {
                combatant.action = ActionState::Idle;
            }
        }
        TimedEvent::MoveEnd(role) => {
            let combatant = ctx.combatant_mut(role);
            if combatant.action.is_moving() {
                combatant.action = ActionState::Idle;
                combatant.velocity = Vec2::ZERO;
            }
        }
        TimedEvent::KnockbackEnd(role) => {
            let combatant = ctx.combatant_mut(role);
            if combatant.knocked_back && now >= combatant.knockback_until {
                combatant.knocked_back = false;
                if !combatant.is_dead() {
                    combatant.velocity = Vec2::ZERO;
                }
            }
        }
        TimedEvent::FlashEnd(role) => {
            let combatant = ctx.combatant_mut(role);
            if now >= combatant.flash_until {
                combatant.flashing = false;
            }
        }
        TimedEvent::HitVolumeExpire(id) => {
            ctx.hit_volumes.retain(|v| v.id != id);
        }
        TimedEvent::DeathSequenceEnd(_) | TimedEvent::OutcomeBackup => ctx.emit_outcome(),
    }
}

/// React to a resource tick result
pub fn on_resource_tick(ctx: &mut MatchContext, role: Role, tick: ResourceTick) {
    match tick {
        ResourceTick::Steady => {}
        ResourceTick::ExhaustionStarted => {
            let combatant = ctx.combatant_mut(role);
            if combatant.action.is_blocking() || combatant.action.is_moving() {
                combatant.action = ActionState::Idle;
                combatant.bump_generation();
            }
            if !combatant.knocked_back {
                combatant.velocity = Vec2::ZERO;
            }
            tracing::debug!("{} exhausted at {}ms", role.id(), ctx.now);
            ctx.events.push(CombatEvent::ExhaustionStarted(role));
        }
        ResourceTick::ExhaustionEnded => {
            tracing::debug!("{} recovered from exhaustion", role.id());
            ctx.events.push(CombatEvent::ExhaustionEnded(role));
        }
    }
}

/// One-way death transition
///
/// Returns false when `role` was already dead.
pub fn kill(ctx: &mut MatchContext, role: Role) -> bool {
    if !ctx.combatant_mut(role).mark_dead() {
        return false;
    }
    ctx.hit_volumes.retain(|v| v.attacker != role);
    tracing::info!("{} falls at {}ms", role.id(), ctx.now);
    ctx.events.push(CombatEvent::Died(role));
    ctx.snapshot(role, "dead");

    if !ctx.is_decided() {
        ctx.push_reward(role.opponent(), victory_reward(), true);
        ctx.push_reward(role, defeat_reward(), true);
        ctx.begin_outcome(role);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::DuelConfig;
    use crate::actions::catalog::ActionCatalog;

    fn ctx() -> MatchContext {
        MatchContext::new(DuelConfig::default())
    }

    fn hero_cmd(action: ProtagonistAction) -> Command {
        Command::Protagonist(action)
    }

    fn run_events(ctx: &mut MatchContext, until: u64) {
        ctx.now = until;
        loop {
            let combatants = &ctx.combatants;
            let Some(event) = ctx.schedule.pop_due(until, |t| {
                combatants[t.role.index()].generation == t.generation
            }) else {
                break;
            };
            handle_event(ctx, event);
        }
    }

    #[test]
    fn test_attack_goes_through_phases() {
        let mut ctx = ctx();
        assert!(issue(&mut ctx, hero_cmd(ProtagonistAction::LightAttack)).is_accepted());
        assert_eq!(ctx.combatant(Role::Protagonist).resources.stamina, 85.0);

        run_events(&mut ctx, ATTACK_WINDUP_MS);
        assert_eq!(
            ctx.combatant(Role::Protagonist).action.attack(),
            Some((AttackKind::Light, AttackPhase::Active))
        );
        assert_eq!(ctx.hit_volumes.len(), 1);

        run_events(&mut ctx, ATTACK_WINDUP_MS + HIT_VOLUME_LIFETIME_MS);
        assert_eq!(
            ctx.combatant(Role::Protagonist).action.attack(),
            Some((AttackKind::Light, AttackPhase::Recovery))
        );
        assert!(ctx.hit_volumes.is_empty());

        run_events(&mut ctx, 10_000);
        assert_eq!(ctx.combatant(Role::Protagonist).action, ActionState::Idle);
    }

    #[test]
    fn test_second_attack_is_noop() {
        let mut ctx = ctx();
        issue(&mut ctx, hero_cmd(ProtagonistAction::LightAttack));
        let before = ctx.combatant(Role::Protagonist).clone();
        let outcome = issue(&mut ctx, hero_cmd(ProtagonistAction::HeavyAttack));
        assert_eq!(
            outcome,
            ActionOutcome::Rejected(RejectReason::AlreadyAttacking)
        );
        let after = ctx.combatant(Role::Protagonist);
        assert_eq!(after.resources, before.resources);
        assert_eq!(after.action, before.action);
    }

    #[test]
    fn test_special_rejected_without_stamina() {
        let mut ctx = ctx();
        ctx.combatant_mut(Role::Protagonist).resources.stamina = 35.0;
        let outcome = issue(&mut ctx, hero_cmd(ProtagonistAction::SpecialAttack));
        assert_eq!(
            outcome,
            ActionOutcome::Rejected(RejectReason::InsufficientStamina)
        );
        let hero = ctx.combatant(Role::Protagonist);
        assert_eq!(hero.resources.stamina, 35.0);
        assert_eq!(hero.action, ActionState::Idle);
        assert_eq!(hero.resources.regen_delay_ms, 0);
    }

    #[test]
    fn test_windup_cancelled_by_block() {
        let mut ctx = ctx();
        issue(&mut ctx, hero_cmd(ProtagonistAction::LightAttack));
        assert!(issue(&mut ctx, hero_cmd(ProtagonistAction::Block)).is_accepted());
        run_events(&mut ctx, 1_000);
        assert!(ctx.hit_volumes.is_empty());
        assert_eq!(
            ctx.combatant(Role::Protagonist).action,
            ActionState::Blocking(BlockPhase::Holding)
        );
    }

    #[test]
    fn test_death_during_windup_spawns_nothing() {
        let mut ctx = ctx();
        issue(&mut ctx, Command::Antagonist(AntagonistAction::Attack));
        assert!(kill(&mut ctx, Role::Antagonist));
        run_events(&mut ctx, 1_000);
        assert!(ctx.hit_volumes.is_empty());
        assert_eq!(ctx.combatant(Role::Antagonist).action, ActionState::Dead);
    }

    #[test]
    fn test_kill_is_one_way() {
        let mut ctx = ctx();
        assert!(kill(&mut ctx, Role::Protagonist));
        assert!(!kill(&mut ctx, Role::Protagonist));
        let deaths = ctx
            .events
            .iter()
            .filter(|e| matches!(e, CombatEvent::Died(_)))
            .count();
        assert_eq!(deaths, 1);
        assert_eq!(ctx.pending_rewards.len(), 2);
    }

    #[test]
    fn test_dead_rejects_everything() {
        let mut ctx = ctx();
        kill(&mut ctx, Role::Protagonist);
        for action in ProtagonistAction::ALL {
            assert!(!issue(&mut ctx, hero_cmd(*action)).is_accepted());
        }
        assert_eq!(ctx.combatant(Role::Protagonist).action, ActionState::Dead);
    }

    #[test]
    fn test_knight_kicks_when_winded() {
        assert_eq!(knight_attack_kind(100.0), AttackKind::Heavy);
        assert_eq!(knight_attack_kind(20.0), AttackKind::Kick);
        assert_eq!(knight_attack_kind(5.0), AttackKind::Heavy);
    }

    #[test]
    fn test_idle_substitution_by_range() {
        let mut ctx = ctx();
        assert_eq!(substitute_idle(&mut ctx), AntagonistAction::Approach);

        ctx.combatant_mut(Role::Antagonist).position = glam::Vec2::new(290.0, 300.0);
        assert_eq!(substitute_idle(&mut ctx), AntagonistAction::Attack);

        ctx.combatant_mut(Role::Antagonist).position = glam::Vec2::new(350.0, 300.0);
        assert!(matches!(
            substitute_idle(&mut ctx),
            AntagonistAction::LungeLeft | AntagonistAction::LungeRight
        ));
    }

    #[test]
    fn test_exhaustion_drops_guard() {
        let mut ctx = ctx();
        issue(&mut ctx, Command::Antagonist(AntagonistAction::Block));
        on_resource_tick(&mut ctx, Role::Antagonist, ResourceTick::ExhaustionStarted);
        assert_eq!(ctx.combatant(Role::Antagonist).action, ActionState::Idle);
    }

    #[test]
    fn test_exhausted_cannot_block_or_move() {
        let mut ctx = ctx();
        ctx.combatant_mut(Role::Protagonist).resources.exhausted = true;
        assert_eq!(
            issue(&mut ctx, hero_cmd(ProtagonistAction::Block)),
            ActionOutcome::Rejected(RejectReason::Exhausted)
        );
        assert_eq!(
            issue(&mut ctx, hero_cmd(ProtagonistAction::Move(Facing::East))),
            ActionOutcome::Rejected(RejectReason::Exhausted)
        );
    }

    #[test]
    fn test_dodge_moves_away() {
        let mut ctx = ctx();
        assert!(issue(&mut ctx, hero_cmd(ProtagonistAction::Dodge)).is_accepted());
        let hero = ctx.combatant(Role::Protagonist);
        assert!(hero.velocity.x < 0.0);
        assert_eq!(hero.resources.stamina, 70.0);
        assert!(hero.is_immune(ctx.now));
    }

    #[test]
    fn test_lunge_veers_off_axis() {
        let mut ctx = ctx();
        issue(&mut ctx, Command::Antagonist(AntagonistAction::LungeLeft));
        let left = ctx.combatant(Role::Antagonist).velocity;
        let mut ctx = self::ctx();
        issue(&mut ctx, Command::Antagonist(AntagonistAction::LungeRight));
        let right = ctx.combatant(Role::Antagonist).velocity;
        assert!(left.x < 0.0 && right.x < 0.0);
        assert!(left.y * right.y < 0.0);
        assert!((left.length() - LUNGE_SPEED).abs() < 1e-3);
    }
}
