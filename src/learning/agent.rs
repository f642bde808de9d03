//! Policy agent: epsilon-greedy selection over a sparse Q-table
//!
//! Each combatant owns one agent. The table maps an encoded state to one
//! value per catalog action; rows are created lazily with the catalog's
//! initial values the first time a state is seen.
//!
//! Exploitation breaks ties by catalog order: among equal maxima the action
//! listed first in `ActionCatalog::ALL` wins. This keeps selection
//! reproducible for identical tables regardless of hash iteration order.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use ahash::AHashMap;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::actions::ActionCatalog;
use crate::core::config::AgentConfig;
use crate::core::error::Result;
use crate::learning::encoder::StateKey;
use crate::learning::persistence::BlobStore;

const PERSIST_VERSION: u32 = 1;

/// Serialized form: sorted so identical tables produce identical blobs
pub type TableSnapshot = BTreeMap<String, BTreeMap<String, f64>>;

#[derive(Debug, Serialize, Deserialize)]
struct PersistedTable {
    version: u32,
    agent_id: String,
    table: TableSnapshot,
}

/// Sparse state -> per-action value table
#[derive(Debug, Clone)]
pub struct QTable<A: ActionCatalog> {
    rows: AHashMap<StateKey, Vec<f64>>,
    _actions: PhantomData<A>,
}

impl<A: ActionCatalog> Default for QTable<A> {
    fn default() -> Self {
        Self {
            rows: AHashMap::new(),
            _actions: PhantomData,
        }
    }
}

impl<A: ActionCatalog> QTable<A> {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_row() -> Vec<f64> {
        A::ALL.iter().map(|a| a.initial_value()).collect()
    }

    /// Row for `state`, created with initial values when absent
    pub fn row_mut(&mut self, state: &StateKey) -> &mut Vec<f64> {
        self.rows
            .entry(state.clone())
            .or_insert_with(Self::fresh_row)
    }

    pub fn value(&self, state: &StateKey, action: A) -> Option<f64> {
        self.rows
            .get(state)
            .and_then(|row| row.get(action.index()))
            .copied()
    }

    /// Highest-valued action, first in catalog order on ties
    pub fn best_action(&mut self, state: &StateKey) -> A {
        let row = self.row_mut(state);
        best_index(row)
            .and_then(|i| A::ALL.get(i).copied())
            .unwrap_or(A::ALL[0])
    }

    pub fn max_value(&mut self, state: &StateKey) -> f64 {
        let row = self.row_mut(state);
        best_index(row).map(|i| row[i]).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn snapshot(&self) -> TableSnapshot {
        self.rows
            .iter()
            .map(|(state, row)| {
                let actions = A::ALL
                    .iter()
                    .zip(row.iter())
                    .map(|(a, v)| (a.name().to_string(), *v))
                    .collect();
                (state.as_str().to_string(), actions)
            })
            .collect()
    }

    /// Rebuild from a snapshot; None if any value is not finite
    ///
    /// Unknown action names are skipped, missing ones get initial values.
    pub fn from_snapshot(snapshot: &TableSnapshot) -> Option<Self> {
        let mut table = Self::new();
        for (state, actions) in snapshot {
            let mut row = Self::fresh_row();
            for (name, value) in actions {
                if !value.is_finite() {
                    return None;
                }
                match A::from_name(name) {
                    Some(action) => row[action.index()] = *value,
                    None => tracing::debug!("Skipping unknown stored action '{}'", name),
                }
            }
            table.rows.insert(StateKey::from_raw(state.clone()), row);
        }
        Some(table)
    }
}

fn best_index(row: &[f64]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, v) in row.iter().enumerate() {
        match best {
            Some(b) if *v <= row[b] => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Online Q-learning agent for one combatant
#[derive(Debug, Clone)]
pub struct PolicyAgent<A: ActionCatalog> {
    id: String,
    config: AgentConfig,
    table: QTable<A>,
    steps: u64,
    rng: ChaCha8Rng,
}

impl<A: ActionCatalog> PolicyAgent<A> {
    pub fn new(id: impl Into<String>, config: AgentConfig, seed: u64) -> Self {
        Self {
            id: id.into(),
            config: config.sanitized(),
            table: QTable::new(),
            steps: 0,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn table(&self) -> &QTable<A> {
        &self.table
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Exploration probability at the current step
    pub fn epsilon(&self) -> f64 {
        let decayed = self.config.epsilon_start - self.config.decay_rate() * self.steps as f64;
        decayed.max(self.config.epsilon_min)
    }

    /// Epsilon-greedy choice for `state`
    pub fn select_action(&mut self, state: &StateKey) -> A {
        self.steps += 1;
        let epsilon = self.epsilon();

        if self.rng.gen::<f64>() < epsilon {
            let i = self.rng.gen_range(0..A::ALL.len());
            return A::ALL[i];
        }

        self.table.best_action(state)
    }

    /// One-step Bellman update
    pub fn update(&mut self, prev: &StateKey, action: A, reward: f64, next: &StateKey) {
        let next_max = self.table.max_value(next);
        let lr = self.config.learning_rate;
        let gamma = self.config.discount_factor;

        let row = self.table.row_mut(prev);
        let idx = action.index();
        let current = row[idx];
        row[idx] = current + lr * (reward + gamma * next_max - current);
    }

    /// Serialize the full table
    pub fn persist(&self) -> Result<Vec<u8>> {
        let persisted = PersistedTable {
            version: PERSIST_VERSION,
            agent_id: self.id.clone(),
            table: self.table.snapshot(),
        };
        Ok(serde_json::to_vec_pretty(&persisted)?)
    }

    /// Replace the table from a blob; anything malformed yields an empty table
    ///
    /// Returns true when prior learning was restored.
    pub fn restore(&mut self, blob: Option<&[u8]>) -> bool {
        self.table = QTable::new();

        let Some(bytes) = blob else {
            tracing::debug!("No stored table for agent '{}'", self.id);
            return false;
        };

        let persisted: PersistedTable = match serde_json::from_slice(bytes) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("Discarding corrupt table for agent '{}': {}", self.id, e);
                return false;
            }
        };

        if persisted.version != PERSIST_VERSION {
            tracing::warn!(
                "Discarding table for agent '{}' with unsupported version {}",
                self.id,
                persisted.version
            );
            return false;
        }

        match QTable::from_snapshot(&persisted.table) {
            Some(table) => {
                tracing::info!("Restored {} states for agent '{}'", table.len(), self.id);
                self.table = table;
                true
            }
            None => {
                tracing::warn!("Discarding table for agent '{}': non-finite values", self.id);
                false
            }
        }
    }

    pub fn save_to(&self, store: &mut dyn BlobStore) -> Result<()> {
        let blob = self.persist()?;
        store.save(&self.id, &blob)
    }

    pub fn load_from(&mut self, store: &dyn BlobStore) -> bool {
        let blob = store.load(&self.id);
        self.restore(blob.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{AntagonistAction, ProtagonistAction};

    fn key(s: &str) -> StateKey {
        StateKey::from_raw(s)
    }

    fn greedy_config() -> AgentConfig {
        AgentConfig {
            epsilon_start: 0.0,
            epsilon_min: 0.0,
            ..AgentConfig::default()
        }
    }

    #[test]
    fn test_epsilon_decays_linearly_to_floor() {
        let mut agent: PolicyAgent<AntagonistAction> =
            PolicyAgent::new("knight", AgentConfig::default(), 1);
        assert!((agent.epsilon() - 0.5).abs() < 1e-12);

        for _ in 0..1500 {
            agent.select_action(&key("s"));
        }
        let expected = 0.5 - (0.45 / 3000.0) * 1500.0;
        assert!((agent.epsilon() - expected).abs() < 1e-9);

        for _ in 0..5000 {
            agent.select_action(&key("s"));
        }
        assert_eq!(agent.epsilon(), 0.05);
    }

    #[test]
    fn test_greedy_picks_highest_value() {
        let mut agent: PolicyAgent<AntagonistAction> = PolicyAgent::new("knight", greedy_config(), 1);
        let s = key("s");
        agent.update(&s, AntagonistAction::Block, 10.0, &s);
        assert_eq!(agent.select_action(&s), AntagonistAction::Block);
    }

    #[test]
    fn test_ties_break_by_catalog_order() {
        let mut agent: PolicyAgent<ProtagonistAction> =
            PolicyAgent::new("hero", greedy_config(), 1);
        // Fresh row: all zeros, first catalog entry wins
        assert_eq!(agent.select_action(&key("s")), ProtagonistAction::ALL[0]);
    }

    #[test]
    fn test_idle_seeded_away_from_selection() {
        let mut agent: PolicyAgent<AntagonistAction> = PolicyAgent::new("knight", greedy_config(), 1);
        let s = key("s");
        agent.select_action(&s);
        assert_eq!(agent.table().value(&s, AntagonistAction::Idle), Some(-50.0));
        assert_eq!(agent.table().value(&s, AntagonistAction::Attack), Some(0.0));
    }

    #[test]
    fn test_bellman_update_math() {
        let mut agent: PolicyAgent<AntagonistAction> =
            PolicyAgent::new("knight", AgentConfig::default(), 1);
        let (s, n) = (key("s"), key("n"));
        agent.update(&n, AntagonistAction::Approach, 10.0, &n);
        // Q[n][approach] = 0.1 * (10 + 0.9 * 0 - 0) = 1.0
        assert!((agent.table().value(&n, AntagonistAction::Approach).unwrap() - 1.0).abs() < 1e-12);

        agent.update(&s, AntagonistAction::Attack, 2.0, &n);
        // 0.1 * (2 + 0.9 * 1.0) = 0.29
        assert!((agent.table().value(&s, AntagonistAction::Attack).unwrap() - 0.29).abs() < 1e-12);
    }

    #[test]
    fn test_update_initializes_both_rows() {
        let mut agent: PolicyAgent<AntagonistAction> =
            PolicyAgent::new("knight", AgentConfig::default(), 1);
        agent.update(&key("a"), AntagonistAction::Attack, 1.0, &key("b"));
        assert_eq!(agent.table().len(), 2);
    }

    #[test]
    fn test_persist_restore_roundtrip() {
        let mut agent: PolicyAgent<AntagonistAction> =
            PolicyAgent::new("knight", AgentConfig::default(), 1);
        agent.update(&key("a"), AntagonistAction::LungeLeft, 3.0, &key("b"));
        let blob = agent.persist().unwrap();

        let mut other: PolicyAgent<AntagonistAction> =
            PolicyAgent::new("knight", AgentConfig::default(), 2);
        assert!(other.restore(Some(&blob)));
        assert_eq!(other.table().snapshot(), agent.table().snapshot());
    }

    #[test]
    fn test_corrupt_blob_yields_empty_table() {
        let mut agent: PolicyAgent<AntagonistAction> =
            PolicyAgent::new("knight", AgentConfig::default(), 1);
        agent.update(&key("a"), AntagonistAction::Attack, 1.0, &key("b"));

        assert!(!agent.restore(Some(b"{not json")));
        assert!(agent.table().is_empty());

        assert!(!agent.restore(None));
        assert!(agent.table().is_empty());

        let wrong_version = br#"{"version": 9, "agent_id": "knight", "table": {}}"#;
        assert!(!agent.restore(Some(wrong_version)));

        // Still able to act afterwards
        let _ = agent.select_action(&key("a"));
    }

    #[test]
    fn test_unknown_actions_skipped_on_restore() {
        let blob = br#"{"version": 1, "agent_id": "knight", "table": {"s": {"attack": 2.5, "moonwalk": 9.0}}}"#;
        let mut agent: PolicyAgent<AntagonistAction> =
            PolicyAgent::new("knight", AgentConfig::default(), 1);
        assert!(agent.restore(Some(blob)));
        let s = key("s");
        assert_eq!(agent.table().value(&s, AntagonistAction::Attack), Some(2.5));
        assert_eq!(agent.table().value(&s, AntagonistAction::Idle), Some(-50.0));
    }

    #[test]
    fn test_best_index_first_max() {
        assert_eq!(best_index(&[1.0, 3.0, 3.0, 2.0]), Some(1));
        assert_eq!(best_index(&[]), None);
    }
}
