//! Tick system - orchestrates one duel step
//!
//! Phase order within a tick:
//! resources -> decisions -> scheduled follow-ups -> hit resolution
//! -> separation + integration -> facing/idle reconciliation -> draw check
//!
//! Single-threaded; every phase mutates the `MatchContext` in place.

use glam::Vec2;

use crate::combat::constants::{
    KNIGHT_APPROACH_SPEED, OMINOUS_APPROACH_BASE_SPEED, OMINOUS_APPROACH_MIN_DISTANCE,
    OMINOUS_APPROACH_SPEED_PER_AGGRESSION,
};
use crate::combat::machine;
use crate::combat::resolution::resolve_hits;
use crate::combat::state::{ActionState, MoveIntent};
use crate::core::types::{Facing, Millis, Role};
use crate::simulation::context::MatchContext;
use crate::spatial::{integrate, Arena, SeparationSolver};

/// Source of per-role decisions (policy agents, scripted controllers)
pub trait DecisionMaker {
    /// Choose and execute one action for `role`
    fn decide(&mut self, ctx: &mut MatchContext, role: Role);
}

/// Never decides anything; combatants only react
pub struct Passive;

impl DecisionMaker for Passive {
    fn decide(&mut self, _ctx: &mut MatchContext, _role: Role) {}
}

/// Advance the duel by `dt`. Returns true once the match is over.
pub fn run_duel_tick(ctx: &mut MatchContext, dt: Millis, decider: &mut dyn DecisionMaker) -> bool {
    if ctx.is_over() {
        return true;
    }
    ctx.now += dt;

    update_resources(ctx, dt);
    run_decisions(ctx, decider);
    poll_schedule(ctx);
    resolve_hits(ctx);
    resolve_bodies(ctx, dt);
    reconcile(ctx);

    if !ctx.is_decided() && ctx.now >= ctx.config.max_match_ms {
        ctx.declare_draw();
    }
    ctx.is_over()
}

fn update_resources(ctx: &mut MatchContext, dt: Millis) {
    for role in Role::BOTH {
        let combatant = ctx.combatant_mut(role);
        if combatant.is_dead() {
            continue;
        }
        let tick = combatant.resources.tick(dt);
        if let Some(knight) = combatant.knight_state_mut() {
            knight.grow_aggression(dt);
        }
        machine::on_resource_tick(ctx, role, tick);
    }
}

fn run_decisions(ctx: &mut MatchContext, decider: &mut dyn DecisionMaker) {
    for role in Role::BOTH {
        if ctx.is_decided() {
            return;
        }
        let combatant = ctx.combatant(role);
        if combatant.is_dead() || ctx.now < combatant.next_decision_at {
            continue;
        }
        decider.decide(ctx, role);
        let next = ctx.now + ctx.config.decision_cooldown(role);
        ctx.combatant_mut(role).next_decision_at = next;
    }
}

/// Fire every follow-up due by now whose originating action is still current
pub fn poll_schedule(ctx: &mut MatchContext) {
    let now = ctx.now;
    loop {
        let combatants = &ctx.combatants;
        let Some(event) = ctx.schedule.pop_due(now, |token| {
            combatants[token.role.index()].generation == token.generation
        }) else {
            break;
        };
        machine::handle_event(ctx, event);
    }
}

fn resolve_bodies(ctx: &mut MatchContext, dt: Millis) {
    let solver = SeparationSolver::default();
    let arena = Arena::new(ctx.config.arena_width, ctx.config.arena_height);

    let (hero, knight) = ctx.pair_mut(Role::Protagonist);
    solver.enforce(hero, knight);
    solver.constrain_velocities(hero, knight);
    integrate(hero, dt, &arena);
    integrate(knight, dt, &arena);
    if solver.resolve_contact(hero, knight) {
        tracing::debug!("Contact reset at {}ms", ctx.now);
    }
}

/// Facing and idle-velocity upkeep
fn reconcile(ctx: &mut MatchContext) {
    for role in Role::BOTH {
        let to_opponent = ctx.to_opponent(role);
        let distance = to_opponent.length();
        let dir = to_opponent.normalize_or_zero();
        let combatant = ctx.combatant_mut(role);
        if combatant.is_dead() {
            continue;
        }

        let aggression = combatant.aggression();
        if aggression.is_some() && !combatant.action.is_uninterruptible() {
            if let Some(facing) = Facing::from_vector(to_opponent) {
                combatant.facing = facing;
            }
        }

        if combatant.knocked_back {
            continue;
        }
        match combatant.action {
            ActionState::Moving(MoveIntent::Approach) => {
                combatant.velocity = dir * KNIGHT_APPROACH_SPEED;
            }
            ActionState::Idle => {
                let exhausted = combatant.resources.exhausted;
                combatant.velocity = match aggression {
                    Some(level) if !exhausted && distance > OMINOUS_APPROACH_MIN_DISTANCE => {
                        dir * (OMINOUS_APPROACH_BASE_SPEED
                            + OMINOUS_APPROACH_SPEED_PER_AGGRESSION * level)
                    }
                    _ => Vec2::ZERO,
                };
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{AntagonistAction, Command, ProtagonistAction};
    use crate::combat::constants::MIN_SEPARATION;
    use crate::core::config::DuelConfig;
    use crate::simulation::events::MatchResult;

    struct Script(Vec<(Role, Command)>);

    impl DecisionMaker for Script {
        fn decide(&mut self, ctx: &mut MatchContext, role: Role) {
            if let Some(pos) = self.0.iter().position(|(r, _)| *r == role) {
                let (_, command) = self.0.remove(pos);
                machine::issue(ctx, command);
            }
        }
    }

    #[test]
    fn test_knight_drifts_toward_idle_hero() {
        let mut ctx = MatchContext::new(DuelConfig::default());
        let start = ctx.distance();
        for _ in 0..60 {
            run_duel_tick(&mut ctx, 16, &mut Passive);
        }
        assert!(ctx.distance() < start);
        assert_eq!(ctx.combatant(Role::Protagonist).position, Vec2::new(200.0, 300.0));
    }

    #[test]
    fn test_exhausted_knight_stops_drifting() {
        let mut ctx = MatchContext::new(DuelConfig::default());
        ctx.combatant_mut(Role::Antagonist).resources.stamina = 0.0;
        run_duel_tick(&mut ctx, 16, &mut Passive);
        let start = ctx.combatant(Role::Antagonist).position;
        assert_eq!(start, Vec2::new(600.0, 300.0));

        for _ in 0..30 {
            run_duel_tick(&mut ctx, 16, &mut Passive);
        }
        let knight = ctx.combatant(Role::Antagonist);
        assert!(knight.resources.exhausted);
        assert_eq!(knight.position, start);
        assert_eq!(knight.velocity, Vec2::ZERO);
    }

    #[test]
    fn test_bodies_never_overlap() {
        let mut ctx = MatchContext::new(DuelConfig::default());
        let mut script = Script(
            (0..40)
                .flat_map(|_| {
                    [
                        (Role::Protagonist, Command::Protagonist(ProtagonistAction::Move(Facing::East))),
                        (Role::Antagonist, Command::Antagonist(AntagonistAction::Approach)),
                    ]
                })
                .collect(),
        );
        for _ in 0..600 {
            run_duel_tick(&mut ctx, 16, &mut script);
            assert!(ctx.distance() >= MIN_SEPARATION - 1e-2 || ctx.is_decided());
        }
    }

    #[test]
    fn test_draw_at_time_limit() {
        let config = DuelConfig {
            max_match_ms: 1_000,
            ..DuelConfig::default()
        };
        let mut ctx = MatchContext::new(config);
        let mut over = false;
        for _ in 0..100 {
            over = run_duel_tick(&mut ctx, 16, &mut Passive);
            if over {
                break;
            }
        }
        assert!(over);
        assert_eq!(ctx.result(), Some(MatchResult::Draw));
    }

    #[test]
    fn test_knight_faces_hero() {
        let mut ctx = MatchContext::new(DuelConfig::default());
        ctx.combatant_mut(Role::Antagonist).position = Vec2::new(200.0, 500.0);
        run_duel_tick(&mut ctx, 16, &mut Passive);
        assert_eq!(ctx.combatant(Role::Antagonist).facing, Facing::North);
    }

    #[test]
    fn test_stale_events_dropped() {
        let mut ctx = MatchContext::new(DuelConfig::default());
        machine::issue(&mut ctx, Command::Protagonist(ProtagonistAction::LightAttack));
        ctx.combatant_mut(Role::Protagonist).bump_generation();
        ctx.combatant_mut(Role::Protagonist).action = ActionState::Idle;
        for _ in 0..20 {
            run_duel_tick(&mut ctx, 16, &mut Passive);
        }
        assert!(ctx.hit_volumes.is_empty());
        assert_eq!(ctx.combatant(Role::Protagonist).action, ActionState::Idle);
    }
}
