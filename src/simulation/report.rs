//! Per-match summary for the runner and telemetry

use serde::{Deserialize, Serialize};

use crate::core::types::{Millis, Role};
use crate::entity::CombatStats;
use crate::simulation::context::MatchContext;
use crate::simulation::events::MatchResult;

/// Coarse match phase from the lower of the two health fractions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    EarlyGame,
    MidGame,
    LateGame,
    CriticalPhase,
    GameOver,
}

impl GamePhase {
    pub fn from_health(hero_fraction: f32, knight_fraction: f32) -> Self {
        let lowest = hero_fraction.min(knight_fraction);
        if lowest <= 0.0 {
            GamePhase::GameOver
        } else if lowest <= 0.15 {
            GamePhase::CriticalPhase
        } else if lowest <= 0.25 {
            GamePhase::LateGame
        } else if lowest <= 0.5 {
            GamePhase::MidGame
        } else {
            GamePhase::EarlyGame
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GamePhase::EarlyGame => "early_game",
            GamePhase::MidGame => "mid_game",
            GamePhase::LateGame => "late_game",
            GamePhase::CriticalPhase => "critical_phase",
            GamePhase::GameOver => "game_over",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideReport {
    pub id: String,
    pub health_fraction: f32,
    pub stamina_fraction: f32,
    pub aggression: Option<f32>,
    pub stats: CombatStats,
    /// States in the agent's table after the match
    pub states_learned: usize,
    pub epsilon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub match_index: u32,
    pub seed: u64,
    pub outcome: String,
    pub result: MatchResult,
    pub duration_ms: Millis,
    pub game_phase: GamePhase,
    pub hero: SideReport,
    pub knight: SideReport,
}

impl MatchReport {
    /// Summarize a finished (or abandoned) match
    ///
    /// `learning` holds `(states_learned, epsilon)` per role index.
    pub fn from_context(
        match_index: u32,
        ctx: &MatchContext,
        learning: [(usize, f64); 2],
    ) -> Self {
        let side = |role: Role| {
            let c = ctx.combatant(role);
            let (states_learned, epsilon) = learning[role.index()];
            SideReport {
                id: role.id().to_string(),
                health_fraction: c.health_fraction(),
                stamina_fraction: c.resources.fraction(),
                aggression: c.aggression(),
                stats: c.stats.clone(),
                states_learned,
                epsilon,
            }
        };
        let hero = side(Role::Protagonist);
        let knight = side(Role::Antagonist);
        let result = ctx.result().unwrap_or(MatchResult::Draw);

        Self {
            match_index,
            seed: ctx.config.seed,
            outcome: result.label(),
            result,
            duration_ms: ctx.now,
            game_phase: GamePhase::from_health(hero.health_fraction, knight.health_fraction),
            hero,
            knight,
        }
    }

    /// One-line human summary
    pub fn summary(&self) -> String {
        format!(
            "match {:>3}: {:<12} {:>6}ms  hero {:>3.0}% ({} hits)  knight {:>3.0}% ({} hits)  [{}]",
            self.match_index,
            self.outcome,
            self.duration_ms,
            self.hero.health_fraction * 100.0,
            self.hero.stats.hits_landed,
            self.knight.health_fraction * 100.0,
            self.knight.stats.hits_landed,
            self.game_phase.label()
        )
    }
}
