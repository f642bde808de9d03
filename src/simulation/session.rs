//! DuelSession - back-to-back matches between two learning agents
//!
//! The session owns both policy agents and the blob store. Agents survive
//! across matches; their tables are saved to the store whenever a match
//! ends. Each match gets a fresh `MatchContext`.

use crate::actions::{AntagonistAction, Command, ProtagonistAction};
use crate::combat::machine;
use crate::core::config::{AgentConfig, DuelConfig};
use crate::core::error::Result;
use crate::core::types::Role;
use crate::learning::agent::PolicyAgent;
use crate::learning::encoder::{encode, StateKey};
use crate::learning::persistence::BlobStore;
use crate::learning::reward::{idle_penalty, shaping_rewards};
use crate::simulation::context::MatchContext;
use crate::simulation::events::{CombatEvent, EventSnapshot};
use crate::simulation::report::MatchReport;
use crate::simulation::tick::{run_duel_tick, DecisionMaker};

/// Both agents plus any externally queued overrides
pub struct Policies {
    pub hero: PolicyAgent<ProtagonistAction>,
    pub knight: PolicyAgent<AntagonistAction>,
    overrides: [Option<Command>; 2],
}

impl Policies {
    pub fn new(hero_config: AgentConfig, knight_config: AgentConfig, seed: u64) -> Self {
        Self {
            hero: PolicyAgent::new(Role::Protagonist.id(), hero_config, seed.wrapping_add(1)),
            knight: PolicyAgent::new(Role::Antagonist.id(), knight_config, seed.wrapping_add(2)),
            overrides: [None, None],
        }
    }

    /// Replace the next policy choice for the command's role
    pub fn queue(&mut self, command: Command) {
        self.overrides[command.role().index()] = Some(command);
    }

    fn select(&mut self, role: Role, state: &StateKey) -> Command {
        if let Some(command) = self.overrides[role.index()].take() {
            return command;
        }
        match role {
            Role::Protagonist => Command::Protagonist(self.hero.select_action(state)),
            Role::Antagonist => Command::Antagonist(self.knight.select_action(state)),
        }
    }

    fn update(&mut self, prev: &StateKey, command: Command, reward: f64, next: &StateKey) {
        match command {
            Command::Protagonist(action) => self.hero.update(prev, action, reward, next),
            Command::Antagonist(action) => self.knight.update(prev, action, reward, next),
        }
    }

    /// Feed queued hit and outcome rewards into the owning agents
    pub fn apply_pending_rewards(&mut self, ctx: &mut MatchContext) {
        for pending in std::mem::take(&mut ctx.pending_rewards) {
            let role = pending.role;
            let combatant = ctx.combatant(role);
            let (Some(prev), Some(action)) = (combatant.last_state.clone(), combatant.last_action)
            else {
                continue;
            };
            let next = if pending.terminal {
                StateKey::terminal()
            } else {
                encode(role, combatant, ctx.combatant(role.opponent())).key()
            };
            self.update(&prev, action, pending.reward.value, &next);
        }
    }

    pub fn learning_summary(&self) -> [(usize, f64); 2] {
        [
            (self.hero.table().len(), self.hero.epsilon()),
            (self.knight.table().len(), self.knight.epsilon()),
        ]
    }
}

impl DecisionMaker for Policies {
    fn decide(&mut self, ctx: &mut MatchContext, role: Role) {
        let opponent_position = ctx.combatant(role.opponent()).position;
        let state = encode(role, ctx.combatant(role), ctx.combatant(role.opponent())).key();

        // Score the previous choice from where it led
        let rewards = shaping_rewards(ctx.combatant_mut(role), opponent_position);
        let combatant = ctx.combatant(role);
        if let (Some(prev), Some(last)) = (combatant.last_state.clone(), combatant.last_action) {
            for reward in rewards {
                self.update(&prev, last, reward.value, &state);
            }
        }

        let command = self.select(role, &state);
        let combatant = ctx.combatant_mut(role);
        combatant.last_state = Some(state.clone());
        combatant.last_action = Some(command);

        let idle_override = combatant
            .knight_state_mut()
            .map(|k| k.idle_override)
            .unwrap_or(false);
        let chose_idle = command == Command::Antagonist(AntagonistAction::Idle);
        if chose_idle {
            self.update(&state, command, idle_penalty().value, &state);
        }
        let executed = if chose_idle && idle_override {
            Command::Antagonist(machine::substitute_idle(ctx))
        } else {
            command
        };

        tracing::trace!("{} decides {} in {}", role.id(), executed.name(), state);
        machine::issue(ctx, executed);
    }
}

pub struct DuelSession {
    config: DuelConfig,
    ctx: MatchContext,
    policies: Policies,
    store: Box<dyn BlobStore>,
    match_index: u32,
    finished: bool,
    events: Vec<CombatEvent>,
    snapshots: Vec<EventSnapshot>,
}

impl DuelSession {
    /// Build a session, restoring both agents from `store` when possible
    pub fn new(
        config: DuelConfig,
        hero_config: AgentConfig,
        knight_config: AgentConfig,
        store: Box<dyn BlobStore>,
    ) -> Self {
        let mut policies = Policies::new(hero_config, knight_config, config.seed);
        policies.hero.load_from(store.as_ref());
        policies.knight.load_from(store.as_ref());

        Self {
            ctx: MatchContext::new(config.clone()),
            config,
            policies,
            store,
            match_index: 0,
            finished: false,
            events: Vec::new(),
            snapshots: Vec::new(),
        }
    }

    pub fn context(&self) -> &MatchContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut MatchContext {
        &mut self.ctx
    }

    pub fn policies(&self) -> &Policies {
        &self.policies
    }

    pub fn match_index(&self) -> u32 {
        self.match_index
    }

    /// Override the next decision of the command's role
    pub fn queue_command(&mut self, command: Command) {
        self.policies.queue(command);
    }

    /// Queue a command by catalog name; unknown names are logged and dropped
    pub fn queue_named(&mut self, role: Role, name: &str) -> bool {
        match Command::parse(role, name) {
            Some(command) => {
                self.queue_command(command);
                true
            }
            None => {
                tracing::warn!("Unknown {} action '{}', ignoring", role.id(), name);
                false
            }
        }
    }

    /// Advance one tick. Returns a report the first time the match ends.
    pub fn tick(&mut self) -> Result<Option<MatchReport>> {
        if self.finished {
            return Ok(None);
        }
        let over = run_duel_tick(&mut self.ctx, self.config.tick_ms, &mut self.policies);
        self.policies.apply_pending_rewards(&mut self.ctx);
        self.events.extend(self.ctx.drain_events());
        self.snapshots.extend(self.ctx.drain_snapshots());

        if !over {
            return Ok(None);
        }
        self.finished = true;
        self.save_agents()?;
        Ok(Some(MatchReport::from_context(
            self.match_index,
            &self.ctx,
            self.policies.learning_summary(),
        )))
    }

    /// Tick until the current match ends
    pub fn run_match(&mut self) -> Result<MatchReport> {
        if self.finished {
            // Already reported; summarize again without re-saving
            return Ok(MatchReport::from_context(
                self.match_index,
                &self.ctx,
                self.policies.learning_summary(),
            ));
        }
        loop {
            if let Some(report) = self.tick()? {
                return Ok(report);
            }
        }
    }

    /// Save both agents and start a fresh match
    pub fn restart_match(&mut self) -> Result<()> {
        if !self.finished {
            self.save_agents()?;
        }
        self.match_index += 1;
        let config = DuelConfig {
            seed: self.config.seed.wrapping_add(self.match_index as u64),
            ..self.config.clone()
        };
        self.ctx = MatchContext::new(config);
        self.finished = false;
        self.events.clear();
        self.snapshots.clear();
        tracing::debug!("Starting match {}", self.match_index);
        Ok(())
    }

    pub fn save_agents(&mut self) -> Result<()> {
        self.policies.hero.save_to(self.store.as_mut())?;
        self.policies.knight.save_to(self.store.as_mut())?;
        Ok(())
    }

    pub fn drain_events(&mut self) -> Vec<CombatEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn drain_snapshots(&mut self) -> Vec<EventSnapshot> {
        std::mem::take(&mut self.snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learning::persistence::MemoryBlobStore;

    fn session() -> DuelSession {
        DuelSession::new(
            DuelConfig::default(),
            AgentConfig::default(),
            AgentConfig::default(),
            Box::new(MemoryBlobStore::new()),
        )
    }

    #[test]
    fn test_first_decision_records_state() {
        let mut session = session();
        session.tick().unwrap();
        for role in Role::BOTH {
            let c = session.context().combatant(role);
            assert!(c.last_state.is_some());
            assert!(c.last_action.is_some());
        }
    }

    #[test]
    fn test_queued_command_overrides_policy() {
        let mut session = session();
        session.queue_command(Command::Protagonist(ProtagonistAction::Dodge));
        session.tick().unwrap();
        assert_eq!(
            session.context().combatant(Role::Protagonist).last_action,
            Some(Command::Protagonist(ProtagonistAction::Dodge))
        );
    }

    #[test]
    fn test_unknown_named_command_dropped() {
        let mut session = session();
        assert!(!session.queue_named(Role::Antagonist, "moonwalk"));
        assert!(session.queue_named(Role::Antagonist, "block"));
    }

    #[test]
    fn test_idle_choice_penalized_and_replaced() {
        let mut session = session();
        session.queue_command(Command::Antagonist(AntagonistAction::Idle));
        session.tick().unwrap();
        let knight = session.context().combatant(Role::Antagonist);
        assert_eq!(
            knight.last_action,
            Some(Command::Antagonist(AntagonistAction::Idle))
        );
        // Far away: replaced by an approach
        assert!(knight.action.is_moving());
        let state = knight.last_state.clone().unwrap();
        let value = session
            .policies()
            .knight
            .table()
            .value(&state, AntagonistAction::Idle)
            .unwrap();
        // -50 + 0.1 * (-10 + 0.9 * 0 + 50)
        assert!((value - -46.0).abs() < 1e-9);
    }

    #[test]
    fn test_idle_penalized_without_override() {
        let mut session = session();
        if let Some(knight) = session
            .context_mut()
            .combatant_mut(Role::Antagonist)
            .knight_state_mut()
        {
            knight.idle_override = false;
        }
        session.queue_command(Command::Antagonist(AntagonistAction::Idle));
        session.tick().unwrap();

        let knight = session.context().combatant(Role::Antagonist);
        assert!(!knight.action.is_moving());
        let state = knight.last_state.clone().unwrap();
        let value = session
            .policies()
            .knight
            .table()
            .value(&state, AntagonistAction::Idle)
            .unwrap();
        assert!((value - -46.0).abs() < 1e-9);
    }
}
