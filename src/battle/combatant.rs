use schema::{PokemonType, StatType};
use serde::{Deserialize, Serialize};

use crate::content::moves::BattleMove;
use crate::effects::container::EffectContainer;

/// Index of a combatant in the battle's roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CombatantId(pub usize);

/// A monster taking part in a battle. Everything an effect changes about it
/// goes through `Battle`, which owns the effect arena.
#[derive(Debug, Clone)]
pub struct Combatant {
    pub id: CombatantId,
    pub party: usize,
    pub name: String,
    pub level: u8,
    pub types: Vec<PokemonType>,
    /// HP, Attack, Defense, Speed, Special Attack, Special Defense
    pub stats: [u32; 6],
    pub hp: u32,
    pub stat_levels: [i8; 8],
    pub moves: Vec<BattleMove>,
    pub ability: Option<String>,
    pub item: Option<String>,
    pub container: EffectContainer,
}

impl Combatant {
    pub fn new(name: &str, level: u8, types: Vec<PokemonType>, stats: [u32; 6]) -> Self {
        Self {
            id: CombatantId(0),
            party: 0,
            name: name.to_string(),
            level,
            types,
            stats,
            hp: stats[0],
            stat_levels: [0; 8],
            moves: Vec::new(),
            ability: None,
            item: None,
            container: EffectContainer::new(),
        }
    }

    pub fn with_moves(mut self, moves: Vec<BattleMove>) -> Self {
        self.moves = moves;
        self
    }

    pub fn with_ability(mut self, ability: &str) -> Self {
        self.ability = Some(ability.to_string());
        self
    }

    pub fn with_item(mut self, item: &str) -> Self {
        self.item = Some(item.to_string());
        self
    }

    pub fn with_hp(mut self, hp: u32) -> Self {
        self.hp = hp.min(self.max_hp());
        self
    }

    pub fn max_hp(&self) -> u32 {
        self.stats[0]
    }

    pub fn is_fainted(&self) -> bool {
        self.hp == 0
    }

    pub fn is_type(&self, pokemon_type: PokemonType) -> bool {
        self.types.contains(&pokemon_type)
    }

    /// Unmodified stat value. Accuracy and evasion have none.
    pub fn base_stat(&self, stat: StatType) -> u32 {
        if stat.is_battle_only() {
            return 0;
        }
        self.stats[stat.index()]
    }

    pub fn stat_level(&self, stat: StatType) -> i8 {
        self.stat_levels[stat.index()]
    }

    pub fn set_stat_level(&mut self, stat: StatType, level: i8) {
        self.stat_levels[stat.index()] = level.clamp(-6, 6);
    }

    pub fn reset_stat_levels(&mut self) {
        self.stat_levels = [0; 8];
    }
}

/// One side of the battle.
#[derive(Debug, Clone, Default)]
pub struct Party {
    pub members: Vec<CombatantId>,
    pub active: Option<CombatantId>,
}
