//! Hit resolution
//!
//! Each live hit volume is tested against its single target. The first
//! qualifying intersection consumes the volume, so one swing lands at most
//! once. Pipeline per contact:
//!
//! 1. Dead or immune target: ignored, the volume stays live
//! 2. Directional block: zero damage, fixed stamina drain, shield wear
//! 3. Zone selection from the impact point's distance to the body center
//! 4. Zone wear by base damage, then reduction and crit
//! 5. Rewards, then stagger/knockback or death

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combat::armor::ArmorZone;
use crate::combat::attack::AttackKind;
use crate::combat::constants::*;
use crate::combat::hitbox::HitVolume;
use crate::combat::machine;
use crate::combat::state::{ActionState, TimedEvent};
use crate::core::types::{angle_between, angle_of, Role};
use crate::learning::reward::hit_rewards;
use crate::simulation::context::MatchContext;
use crate::simulation::events::CombatEvent;

/// What a single contact did
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StrikeResult {
    Blocked,
    Hit {
        zone: ArmorZone,
        damage: f32,
        critical: bool,
        lethal: bool,
    },
}

/// Armor zone for an impact at `ratio` of the body radius from center
pub fn zone_for_ratio(ratio: f32) -> ArmorZone {
    if ratio < HEAD_ZONE_RATIO {
        ArmorZone::Head
    } else if ratio < TORSO_ZONE_RATIO {
        ArmorZone::Torso
    } else {
        ArmorZone::Limb
    }
}

/// Is a blow from `attacker_position` inside the defender's guard arc?
pub fn within_block_arc(defender_position: Vec2, defender_angle: f32, attacker_position: Vec2) -> bool {
    let to_attacker = attacker_position - defender_position;
    if to_attacker.length_squared() < 1e-6 {
        return true;
    }
    angle_between(angle_of(to_attacker), defender_angle)
        <= BLOCK_HALF_ARC_DEGREES.to_radians() + 1e-4
}

/// Resolve every live hit volume against its target
pub fn resolve_hits(ctx: &mut MatchContext) -> Vec<StrikeResult> {
    let now = ctx.now;
    ctx.hit_volumes.retain(|v| !v.is_expired(now));

    let ids: Vec<u64> = ctx.hit_volumes.iter().map(|v| v.id).collect();
    let mut results = Vec::new();

    for id in ids {
        // Earlier strikes this pass may have removed the volume
        let Some(pos) = ctx.hit_volumes.iter().position(|v| v.id == id) else {
            continue;
        };
        let volume = ctx.hit_volumes[pos].clone();
        let target = ctx.combatant(volume.target);

        if target.is_dead() || target.is_immune(now) {
            continue;
        }
        if !volume.intersects_circle(target.position, BODY_RADIUS) {
            continue;
        }

        ctx.hit_volumes.remove(pos);
        results.push(strike(ctx, &volume));
    }
    results
}

/// Apply one contact between a volume and its target
pub fn strike(ctx: &mut MatchContext, volume: &HitVolume) -> StrikeResult {
    let attacker_role = volume.attacker;
    let victim_role = volume.target;
    let base = volume.kind.base_damage();
    let attacker_position = ctx.combatant(attacker_role).position;

    // Block
    let victim = ctx.combatant_mut(victim_role);
    if victim.action.is_blocking()
        && !victim.resources.exhausted
        && within_block_arc(victim.position, victim.facing.angle(), attacker_position)
    {
        victim.resources.drain(BLOCK_STAMINA_COST);
        victim.armor.shield.wear(base);
        victim.stats.blocks += 1;
        tracing::debug!(
            "{} blocks {} from {}",
            victim_role.id(),
            volume.kind.name(),
            attacker_role.id()
        );
        ctx.events.push(CombatEvent::Blocked {
            defender: victim_role,
            attacker: attacker_role,
        });
        ctx.snapshot(victim_role, "blocked");
        return StrikeResult::Blocked;
    }

    // Zone and armor
    let impact = volume.closest_point(victim.position);
    let zone = zone_for_ratio(impact.distance(victim.position) / BODY_RADIUS);
    let piece = victim.armor.zone_mut(zone);
    if piece.wear(base) {
        tracing::debug!("{} {} armor worn through", victim_role.id(), zone.name());
    }
    let reduction = piece.reduction;

    let critical = ctx.rng.gen_bool(CRIT_CHANCE);
    let multiplier = if critical { CRIT_MULTIPLIER } else { 1.0 };
    let damage = base * (1.0 - reduction) * multiplier;

    let victim = ctx.combatant_mut(victim_role);
    let dealt = victim.apply_damage(damage);
    let lethal = victim.health <= 0.0;

    tracing::debug!(
        "{} hits {} {} for {:.1}{}",
        attacker_role.id(),
        victim_role.id(),
        zone.name(),
        dealt,
        if critical { " (crit)" } else { "" }
    );
    ctx.events.push(CombatEvent::Hit {
        attacker: attacker_role,
        victim: victim_role,
        zone,
        damage: dealt,
        critical,
    });

    if dealt > 0.0 {
        let (attacker_reward, victim_reward) = hit_rewards(ctx.combatant(attacker_role));
        ctx.push_reward(attacker_role, attacker_reward, false);
        ctx.push_reward(victim_role, victim_reward, false);

        let attacker = ctx.combatant_mut(attacker_role);
        attacker.stats.hits_landed += 1;
        if critical {
            attacker.stats.crits += 1;
        }
        if let Some(knight) = attacker.knight_state_mut() {
            knight.calm_after_hit();
        }
    }

    if lethal {
        machine::kill(ctx, victim_role);
    } else if dealt > 0.0 {
        react_to_hit(ctx, victim_role, attacker_position, volume.kind);
        ctx.snapshot(victim_role, "hit");
    }

    StrikeResult::Hit {
        zone,
        damage: dealt,
        critical,
        lethal,
    }
}

/// Stagger, flash, immunity and knockback for a surviving victim
fn react_to_hit(ctx: &mut MatchContext, role: Role, attacker_position: Vec2, kind: AttackKind) {
    let now = ctx.now;
    let (speed, duration) = if kind == AttackKind::Special && role == Role::Antagonist {
        (SPECIAL_KNOCKBACK_SPEED, SPECIAL_KNOCKBACK_MS)
    } else {
        (KNOCKBACK_SPEED, KNOCKBACK_MS)
    };

    // An interrupted swing takes its volumes with it
    ctx.hit_volumes.retain(|v| v.attacker != role);

    let victim = ctx.combatant_mut(role);
    let away = (victim.position - attacker_position)
        .try_normalize()
        .unwrap_or_else(|| -victim.facing.unit_vector());

    victim.bump_generation();
    victim.action = ActionState::TakingDamage;
    victim.hit_immunity_until = now + HIT_IMMUNITY_MS;
    victim.flashing = true;
    victim.flash_until = now + HIT_FLASH_MS;
    victim.knocked_back = true;
    victim.knockback_until = now + duration;
    victim.velocity = away * speed;
    let token = victim.cancel_token();

    ctx.schedule
        .schedule(now + HIT_STAGGER_MS, Some(token), TimedEvent::StaggerEnd(role));
    ctx.schedule
        .schedule(now + duration, None, TimedEvent::KnockbackEnd(role));
    ctx.schedule
        .schedule(now + HIT_FLASH_MS, None, TimedEvent::FlashEnd(role));
}
