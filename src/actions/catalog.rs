//! Closed action catalogs, one per role

use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::combat::attack::AttackKind;
use crate::core::types::{Facing, Role};

/// Q-value seeded for the knight's idle action so exploitation avoids it
pub const IDLE_SEED_VALUE: f64 = -50.0;

/// A fixed, ordered set of actions a policy can choose from
///
/// Catalog order is significant: it breaks ties during exploitation.
pub trait ActionCatalog: Copy + Eq + Hash + Debug + 'static {
    const ALL: &'static [Self];

    fn name(self) -> &'static str;

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.name() == name)
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|a| *a == self).unwrap_or(0)
    }

    /// Value of a state/action pair the agent has never seen
    fn initial_value(self) -> f64 {
        0.0
    }
}

/// Hero actions: 8 movement directions, 3 attacks, block, dodge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtagonistAction {
    Move(Facing),
    LightAttack,
    HeavyAttack,
    SpecialAttack,
    Block,
    Dodge,
}

impl ProtagonistAction {
    pub fn attack_kind(self) -> Option<AttackKind> {
        match self {
            ProtagonistAction::LightAttack => Some(AttackKind::Light),
            ProtagonistAction::HeavyAttack => Some(AttackKind::Heavy),
            ProtagonistAction::SpecialAttack => Some(AttackKind::Special),
            _ => None,
        }
    }
}

impl ActionCatalog for ProtagonistAction {
    const ALL: &'static [Self] = &[
        ProtagonistAction::Move(Facing::East),
        ProtagonistAction::Move(Facing::SouthEast),
        ProtagonistAction::Move(Facing::South),
        ProtagonistAction::Move(Facing::SouthWest),
        ProtagonistAction::Move(Facing::West),
        ProtagonistAction::Move(Facing::NorthWest),
        ProtagonistAction::Move(Facing::North),
        ProtagonistAction::Move(Facing::NorthEast),
        ProtagonistAction::LightAttack,
        ProtagonistAction::HeavyAttack,
        ProtagonistAction::SpecialAttack,
        ProtagonistAction::Block,
        ProtagonistAction::Dodge,
    ];

    fn name(self) -> &'static str {
        match self {
            ProtagonistAction::Move(Facing::East) => "move_east",
            ProtagonistAction::Move(Facing::SouthEast) => "move_southeast",
            ProtagonistAction::Move(Facing::South) => "move_south",
            ProtagonistAction::Move(Facing::SouthWest) => "move_southwest",
            ProtagonistAction::Move(Facing::West) => "move_west",
            ProtagonistAction::Move(Facing::NorthWest) => "move_northwest",
            ProtagonistAction::Move(Facing::North) => "move_north",
            ProtagonistAction::Move(Facing::NorthEast) => "move_northeast",
            ProtagonistAction::LightAttack => "light_attack",
            ProtagonistAction::HeavyAttack => "heavy_attack",
            ProtagonistAction::SpecialAttack => "special_attack",
            ProtagonistAction::Block => "block",
            ProtagonistAction::Dodge => "dodge",
        }
    }
}

/// Knight actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AntagonistAction {
    Attack,
    Approach,
    LungeLeft,
    LungeRight,
    Block,
    Idle,
}

impl ActionCatalog for AntagonistAction {
    const ALL: &'static [Self] = &[
        AntagonistAction::Attack,
        AntagonistAction::Approach,
        AntagonistAction::LungeLeft,
        AntagonistAction::LungeRight,
        AntagonistAction::Block,
        AntagonistAction::Idle,
    ];

    fn name(self) -> &'static str {
        match self {
            AntagonistAction::Attack => "attack",
            AntagonistAction::Approach => "approach",
            AntagonistAction::LungeLeft => "lunge_left",
            AntagonistAction::LungeRight => "lunge_right",
            AntagonistAction::Block => "block",
            AntagonistAction::Idle => "idle",
        }
    }

    fn initial_value(self) -> f64 {
        match self {
            AntagonistAction::Idle => IDLE_SEED_VALUE,
            _ => 0.0,
        }
    }
}

/// A chosen action tagged with the role that chose it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    Protagonist(ProtagonistAction),
    Antagonist(AntagonistAction),
}

impl Command {
    pub fn role(self) -> Role {
        match self {
            Command::Protagonist(_) => Role::Protagonist,
            Command::Antagonist(_) => Role::Antagonist,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Command::Protagonist(a) => a.name(),
            Command::Antagonist(a) => a.name(),
        }
    }

    pub fn is_attack(self) -> bool {
        match self {
            Command::Protagonist(a) => a.attack_kind().is_some(),
            Command::Antagonist(a) => a == AntagonistAction::Attack,
        }
    }

    /// Parse an action name within a role's catalog
    pub fn parse(role: Role, name: &str) -> Option<Self> {
        match role {
            Role::Protagonist => ProtagonistAction::from_name(name).map(Command::Protagonist),
            Role::Antagonist => AntagonistAction::from_name(name).map(Command::Antagonist),
        }
    }
}
