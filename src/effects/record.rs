use std::sync::Arc;

use schema::{MoveCategory, PokemonType, StatType};
use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;

use crate::battle::combatant::CombatantId;
use crate::effects::behavior::EffectBehavior;

/// Handle to a record in the battle's effect arena. Slots are never reused,
/// so a stale handle can only ever resolve to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EffectId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, IntoStaticStr)]
pub enum EffectCategory {
    Status,
    Ability,
    Item,
    Clause,
    Global,
    Controller,
}

impl EffectCategory {
    /// Position among candidates of the same entity during dispatch.
    pub fn rank(self) -> u8 {
        match self {
            EffectCategory::Ability => 0,
            EffectCategory::Item => 1,
            EffectCategory::Status => 2,
            EffectCategory::Global => 3,
            EffectCategory::Controller => 4,
            EffectCategory::Clause => 5,
        }
    }
}

impl std::fmt::Display for EffectCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name: &'static str = self.into();
        write!(f, "{}", name)
    }
}

/// Coexistence group. At most one live record per (owner, lock) unless `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectLock {
    None,
    SpecialStatus,
    Weather,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectState {
    Active,
    Deactivated,
    Removable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectOwner {
    Combatant(CombatantId),
    Field,
}

impl EffectOwner {
    pub fn combatant(self) -> Option<CombatantId> {
        match self {
            EffectOwner::Combatant(id) => Some(id),
            EffectOwner::Field => None,
        }
    }
}

/// One hit remembered by a damage listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageRecord {
    pub attacker: CombatantId,
    pub category: MoveCategory,
    pub move_type: PokemonType,
    pub amount: u32,
}

/// A move whose execution was deferred to a later turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingMove {
    pub move_index: usize,
    pub target: Option<CombatantId>,
}

/// Per-instance mutable data. Each effect uses the handful of fields it needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectData {
    /// Remaining turns (sleep, weather, trick room). `-1` is indefinite.
    pub turns: i32,
    /// Escalating counter (toxic).
    pub counter: i32,
    /// Stat touched by a stat-change delta.
    pub stat: Option<StatType>,
    /// Stage delta actually applied, unwound on removal.
    pub delta: i8,
    /// Hazard layers per party.
    pub layers: [u8; 2],
    pub hits: Vec<DamageRecord>,
    pub pending: Option<PendingMove>,
    /// Moves that still connect while the subject is semi-invulnerable.
    pub vulnerable: Vec<&'static str>,
    pub invulnerable: bool,
    /// Move a choice item has locked its holder into.
    pub locked_move: Option<String>,
    pub flag: bool,
}

impl EffectData {
    pub fn with_turns(turns: i32) -> Self {
        Self {
            turns,
            ..Self::default()
        }
    }

    pub fn stat_change(stat: StatType, delta: i8) -> Self {
        Self {
            stat: Some(stat),
            delta,
            ..Self::default()
        }
    }
}

/// A live instance of an effect attached to a combatant or the field.
#[derive(Debug, Clone)]
pub struct EffectRecord {
    pub id: EffectId,
    pub behavior: Arc<EffectBehavior>,
    pub owner: EffectOwner,
    pub inducer: Option<CombatantId>,
    pub state: EffectState,
    /// Attachment order across the whole battle.
    pub seq: u64,
    pub data: EffectData,
}

impl EffectRecord {
    pub fn name(&self) -> &'static str {
        self.behavior.name
    }

    pub fn category(&self) -> EffectCategory {
        self.behavior.category
    }

    pub fn subject(&self) -> Option<CombatantId> {
        self.owner.combatant()
    }

    pub fn is_removable(&self) -> bool {
        self.state == EffectState::Removable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_category_rank_orders_abilities_first() {
        let mut categories = vec![
            EffectCategory::Clause,
            EffectCategory::Status,
            EffectCategory::Controller,
            EffectCategory::Item,
            EffectCategory::Global,
            EffectCategory::Ability,
        ];
        categories.sort_by_key(|c| c.rank());
        assert_eq!(
            categories,
            vec![
                EffectCategory::Ability,
                EffectCategory::Item,
                EffectCategory::Status,
                EffectCategory::Global,
                EffectCategory::Controller,
                EffectCategory::Clause,
            ]
        );
    }
}
