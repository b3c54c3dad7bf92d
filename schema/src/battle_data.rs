use crate::pokemon_types::PokemonType;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{EnumIter, IntoStaticStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, IntoStaticStr)]
pub enum StatType {
    Hp,
    Atk,
    Def,
    Spe,
    SpAtk,
    SpDef,
    Acc,
    Eva,
}

impl StatType {
    /// Position of this stat in per-combatant stat and stage arrays.
    pub fn index(self) -> usize {
        match self {
            StatType::Hp => 0,
            StatType::Atk => 1,
            StatType::Def => 2,
            StatType::Spe => 3,
            StatType::SpAtk => 4,
            StatType::SpDef => 5,
            StatType::Acc => 6,
            StatType::Eva => 7,
        }
    }

    /// Accuracy and evasion use their own stage table and have no base value.
    pub fn is_battle_only(self) -> bool {
        matches!(self, StatType::Acc | StatType::Eva)
    }
}

impl fmt::Display for StatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatType::Hp => write!(f, "HP"),
            StatType::Atk => write!(f, "Attack"),
            StatType::Def => write!(f, "Defense"),
            StatType::Spe => write!(f, "Speed"),
            StatType::SpAtk => write!(f, "Special Attack"),
            StatType::SpDef => write!(f, "Special Defense"),
            StatType::Acc => write!(f, "Accuracy"),
            StatType::Eva => write!(f, "Evasion"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveCategory {
    Physical,
    Special,
    Other,
}

impl MoveCategory {
    /// The attacking and defending stats used by damaging moves of this class.
    pub fn stats(self) -> Option<(StatType, StatType)> {
        match self {
            MoveCategory::Physical => Some((StatType::Atk, StatType::Def)),
            MoveCategory::Special => Some((StatType::SpAtk, StatType::SpDef)),
            MoveCategory::Other => None,
        }
    }
}

impl fmt::Display for MoveCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveCategory::Physical => write!(f, "Physical"),
            MoveCategory::Special => write!(f, "Special"),
            MoveCategory::Other => write!(f, "Other"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveTarget {
    /// A single opposing combatant
    Selected,
    User,
    /// The shared field (weather, hazards)
    Field,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveFlag {
    Contact,
    Protectable,
    HighCritical,
    Sound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveData {
    pub name: String,
    pub move_type: PokemonType,
    pub category: MoveCategory,
    pub power: u16,
    /// `None` never misses
    pub accuracy: Option<u8>,
    pub priority: i8,
    pub target: MoveTarget,
    #[serde(default)]
    pub flags: Vec<MoveFlag>,
}

impl MoveData {
    pub fn new(name: &str, move_type: PokemonType, category: MoveCategory, power: u16) -> Self {
        Self {
            name: name.to_string(),
            move_type,
            category,
            power,
            accuracy: Some(100),
            priority: 0,
            target: if category == MoveCategory::Other {
                MoveTarget::User
            } else {
                MoveTarget::Selected
            },
            flags: Vec::new(),
        }
    }

    pub fn with_accuracy(mut self, accuracy: Option<u8>) -> Self {
        self.accuracy = accuracy;
        self
    }

    pub fn with_priority(mut self, priority: i8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_target(mut self, target: MoveTarget) -> Self {
        self.target = target;
        self
    }

    pub fn with_flag(mut self, flag: MoveFlag) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn has_flag(&self, flag: MoveFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn is_damaging(&self) -> bool {
        self.category != MoveCategory::Other && self.power > 0
    }
}
