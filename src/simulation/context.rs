//! MatchContext - everything one duel mutates
//!
//! Owned by the simulation loop and passed by reference into each phase.
//! Holds both combatants, the clock, the scheduled-event queue, live hit
//! volumes, and the outbound queues (events, snapshots, rewards) that the
//! owner drains after each tick.

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::combat::constants::DEATH_SEQUENCE_MS;
use crate::combat::hitbox::HitVolume;
use crate::combat::state::TimedEvent;
use crate::core::config::DuelConfig;
use crate::core::schedule::Schedule;
use crate::core::types::{Facing, Millis, Role};
use crate::entity::Combatant;
use crate::learning::reward::Reward;
use crate::simulation::events::{CombatEvent, EventSnapshot, MatchOutcome, MatchResult};

/// A reward waiting to be fed into its owner's policy agent
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingReward {
    pub role: Role,
    pub reward: Reward,
    /// Use the terminal marker as the next state
    pub terminal: bool,
}

pub struct MatchContext {
    pub config: DuelConfig,
    /// Simulation clock
    pub now: Millis,
    /// Indexed by `Role::index`
    pub combatants: [Combatant; 2],
    pub schedule: Schedule<TimedEvent>,
    pub hit_volumes: Vec<HitVolume>,
    next_volume_id: u64,
    /// Crits and lunge sides
    pub rng: ChaCha8Rng,
    pub events: Vec<CombatEvent>,
    pub snapshots: Vec<EventSnapshot>,
    pub pending_rewards: Vec<PendingReward>,
    /// Set at the death; the result follows once the sequence completes
    decided: Option<MatchOutcome>,
    result: Option<MatchResult>,
}

impl MatchContext {
    /// Fresh match: both combatants at their spawn points facing each other
    pub fn new(config: DuelConfig) -> Self {
        let hero_spawn = config.spawn(Role::Protagonist);
        let knight_spawn = config.spawn(Role::Antagonist);
        let hero_facing = Facing::from_vector(knight_spawn - hero_spawn).unwrap_or(Facing::East);
        let knight_facing = Facing::from_vector(hero_spawn - knight_spawn).unwrap_or(Facing::West);
        let rng = ChaCha8Rng::seed_from_u64(config.seed);

        Self {
            combatants: [
                Combatant::new(Role::Protagonist, hero_spawn, hero_facing),
                Combatant::new(Role::Antagonist, knight_spawn, knight_facing),
            ],
            config,
            now: 0,
            schedule: Schedule::new(),
            hit_volumes: Vec::new(),
            next_volume_id: 1,
            rng,
            events: Vec::new(),
            snapshots: Vec::new(),
            pending_rewards: Vec::new(),
            decided: None,
            result: None,
        }
    }

    pub fn combatant(&self, role: Role) -> &Combatant {
        &self.combatants[role.index()]
    }

    pub fn combatant_mut(&mut self, role: Role) -> &mut Combatant {
        &mut self.combatants[role.index()]
    }

    /// `(role, opponent)` borrowed together
    pub fn pair_mut(&mut self, role: Role) -> (&mut Combatant, &mut Combatant) {
        let [hero, knight] = &mut self.combatants;
        match role {
            Role::Protagonist => (hero, knight),
            Role::Antagonist => (knight, hero),
        }
    }

    pub fn distance(&self) -> f32 {
        self.combatants[0].position.distance(self.combatants[1].position)
    }

    /// Vector from `role` to its opponent
    pub fn to_opponent(&self, role: Role) -> Vec2 {
        self.combatant(role.opponent()).position - self.combatant(role).position
    }

    pub fn next_volume_id(&mut self) -> u64 {
        let id = self.next_volume_id;
        self.next_volume_id += 1;
        id
    }

    pub fn snapshot(&mut self, role: Role, action: &str) {
        let snap = EventSnapshot::capture(self.now, self.combatant(role), action);
        self.snapshots.push(snap);
    }

    pub fn push_reward(&mut self, role: Role, reward: Reward, terminal: bool) {
        self.pending_rewards.push(PendingReward {
            role,
            reward,
            terminal,
        });
    }

    /// A death has happened; no further decisions are taken
    pub fn is_decided(&self) -> bool {
        self.decided.is_some() || self.result.is_some()
    }

    /// The outcome signal has been emitted
    pub fn is_over(&self) -> bool {
        self.result.is_some()
    }

    pub fn result(&self) -> Option<MatchResult> {
        self.result
    }

    pub fn outcome(&self) -> Option<MatchOutcome> {
        self.decided
    }

    /// Record the winner and start the death sequence and backup timers
    pub(crate) fn begin_outcome(&mut self, loser: Role) {
        if self.is_decided() {
            return;
        }
        self.decided = Some(MatchOutcome {
            winner: loser.opponent(),
            loser,
        });
        self.schedule
            .schedule(self.now + DEATH_SEQUENCE_MS, None, TimedEvent::DeathSequenceEnd(loser));
        self.schedule.schedule(
            self.now + self.config.outcome_backup_ms,
            None,
            TimedEvent::OutcomeBackup,
        );
    }

    /// External signal that the death sequence finished playing
    pub fn notify_death_sequence_complete(&mut self, role: Role) {
        match self.decided {
            Some(outcome) if outcome.loser == role => self.emit_outcome(),
            _ => tracing::debug!("Ignoring death-sequence signal for {}", role.id()),
        }
    }

    /// Emit the victory signal; only the first call has an effect
    pub(crate) fn emit_outcome(&mut self) {
        if self.result.is_some() {
            return;
        }
        let Some(outcome) = self.decided else {
            return;
        };
        let result = MatchResult::Victory(outcome);
        tracing::info!(
            "Match over at {}ms: {} defeats {}",
            self.now,
            outcome.winner_id(),
            outcome.loser_id()
        );
        self.result = Some(result);
        self.events.push(CombatEvent::MatchEnded(result));
    }

    /// End the match without a winner
    pub(crate) fn declare_draw(&mut self) {
        if self.is_decided() {
            return;
        }
        tracing::info!("Match drawn at {}ms", self.now);
        self.result = Some(MatchResult::Draw);
        self.events.push(CombatEvent::MatchEnded(MatchResult::Draw));
    }

    pub fn drain_events(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn drain_snapshots(&mut self) -> Vec<EventSnapshot> {
        std::mem::take(&mut self.snapshots)
    }
}
