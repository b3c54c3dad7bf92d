use std::sync::Arc;

use schema::{MoveCategory, MoveData, MoveFlag, MoveTarget, PokemonType, StatType};

use crate::battle::combatant::{Combatant, CombatantId};
use crate::battle::rng::BattleRng;
use crate::battle::state::Battle;
use crate::config::BattleConfig;
use crate::content::hazards;
use crate::content::moves::{make_charge_move, make_counter_move, make_status_move, BattleMove, MoveEffect, StatusMoveEffect};
use crate::content::weather::Weather;
use crate::effects::behavior::EffectBehavior;
use crate::effects::record::EffectOwner;
use crate::effects::registry::EffectRegistry;
use crate::errors::BattleResult;

pub const P1: CombatantId = CombatantId(0);
pub const P2: CombatantId = CombatantId(1);

/// A builder for test combatants with round default stats.
///
/// # Example
/// ```ignore
/// let pokemon = TestCombatantBuilder::new("Pikachu", PokemonType::Electric)
///     .with_moves(vec![tackle()])
///     .with_ability("Static")
///     .build();
/// ```
pub struct TestCombatantBuilder {
    name: String,
    types: Vec<PokemonType>,
    level: u8,
    stats: [u32; 6],
    hp: Option<u32>,
    ability: Option<String>,
    item: Option<String>,
    moves: Vec<BattleMove>,
}

impl TestCombatantBuilder {
    /// Level 50, 200 HP and 100 in every other stat.
    pub fn new(name: &str, pokemon_type: PokemonType) -> Self {
        Self {
            name: name.to_string(),
            types: vec![pokemon_type],
            level: 50,
            stats: [200, 100, 100, 100, 100, 100],
            hp: None,
            ability: None,
            item: None,
            moves: vec![splash()],
        }
    }

    pub fn with_second_type(mut self, pokemon_type: PokemonType) -> Self {
        self.types.push(pokemon_type);
        self
    }

    pub fn with_speed(mut self, speed: u32) -> Self {
        self.stats[StatType::Spe.index()] = speed;
        self
    }

    /// Sets the current HP. If not set, HP will be max.
    pub fn with_hp(mut self, hp: u32) -> Self {
        self.hp = Some(hp);
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

    pub fn with_moves(mut self, moves: Vec<BattleMove>) -> Self {
        self.moves = moves;
        self
    }

    pub fn build(self) -> Combatant {
        let mut combatant = Combatant::new(&self.name, self.level, self.types, self.stats).with_moves(self.moves);
        if let Some(hp) = self.hp {
            combatant = combatant.with_hp(hp);
        }
        if let Some(ability) = &self.ability {
            combatant = combatant.with_ability(ability);
        }
        if let Some(item) = &self.item {
            combatant = combatant.with_item(item);
        }
        combatant
    }
}

pub fn standard_registry() -> Arc<EffectRegistry> {
    match EffectRegistry::standard() {
        Ok(registry) => registry,
        Err(err) => panic!("Failed to build the standard registry: {}", err),
    }
}

/// The standard registry plus effects defined by a single test.
pub fn registry_with(extra: Vec<EffectBehavior>) -> Arc<EffectRegistry> {
    match EffectRegistry::standard_with(extra) {
        Ok(registry) => registry,
        Err(err) => panic!("Failed to extend the standard registry: {}", err),
    }
}

/// Creates a 1v1 battle with a predictable random source.
pub fn create_test_battle(registry: Arc<EffectRegistry>, p1: Combatant, p2: Combatant) -> Battle {
    create_team_battle(registry, BattleConfig::default(), vec![p1], vec![p2])
}

pub fn create_team_battle(
    registry: Arc<EffectRegistry>,
    config: BattleConfig,
    team1: Vec<Combatant>,
    team2: Vec<Combatant>,
) -> Battle {
    let battle = assert_ok(Battle::new(config, registry, [team1, team2]));
    battle.with_rng(predictable_rng())
}

/// Creates a `BattleRng` with a long list of default values (50).
/// Useful for tests where the specific RNG outcome is not important, preventing panics from exhaustion.
pub fn predictable_rng() -> BattleRng {
    BattleRng::new_for_test(vec![50; 100])
}

/// Asserts that a Result is Ok and returns the value.
pub fn assert_ok<T>(result: BattleResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("Expected Ok but got error: {}", err),
    }
}

pub fn assert_ok_true(result: BattleResult<bool>) -> bool {
    let value = assert_ok(result);
    assert!(value, "Expected true but got false");
    value
}

pub fn has_effect(battle: &Battle, id: CombatantId, name: &str) -> bool {
    battle.find(EffectOwner::Combatant(id), name).is_some()
}

// === Moves ===

pub fn splash() -> BattleMove {
    make_status_move(
        MoveData::new("Splash", PokemonType::Normal, MoveCategory::Other, 0).with_accuracy(None),
        vec![],
        false,
    )
}

pub fn tackle() -> BattleMove {
    BattleMove::damaging(
        MoveData::new("Tackle", PokemonType::Normal, MoveCategory::Physical, 40).with_flag(MoveFlag::Contact),
    )
}

pub fn quick_attack() -> BattleMove {
    BattleMove::damaging(
        MoveData::new("Quick Attack", PokemonType::Normal, MoveCategory::Physical, 40)
            .with_priority(1)
            .with_flag(MoveFlag::Contact),
    )
}

pub fn ember() -> BattleMove {
    BattleMove::damaging(MoveData::new("Ember", PokemonType::Fire, MoveCategory::Special, 40))
}

pub fn earthquake() -> BattleMove {
    BattleMove::damaging(MoveData::new("Earthquake", PokemonType::Ground, MoveCategory::Physical, 100))
}

/// A physical hit that always burns.
pub fn scorching_slash() -> BattleMove {
    make_status_move(
        MoveData::new("Scorching Slash", PokemonType::Normal, MoveCategory::Physical, 40),
        vec![StatusMoveEffect::on_target(MoveEffect::Status("Burn"), 1.0)],
        false,
    )
}

pub fn toxic() -> BattleMove {
    make_status_move(
        MoveData::new("Toxic", PokemonType::Poison, MoveCategory::Other, 0)
            .with_accuracy(Some(90))
            .with_target(MoveTarget::Selected),
        vec![StatusMoveEffect::on_target(MoveEffect::Status("Toxic"), 1.0)],
        true,
    )
}

pub fn thunder_wave() -> BattleMove {
    make_status_move(
        MoveData::new("Thunder Wave", PokemonType::Electric, MoveCategory::Other, 0).with_target(MoveTarget::Selected),
        vec![StatusMoveEffect::on_target(MoveEffect::Status("Paralysis"), 1.0)],
        true,
    )
}

pub fn hypnosis() -> BattleMove {
    make_status_move(
        MoveData::new("Hypnosis", PokemonType::Psychic, MoveCategory::Other, 0).with_target(MoveTarget::Selected),
        vec![StatusMoveEffect::on_target(MoveEffect::Status("Sleep"), 1.0)],
        false,
    )
}

pub fn swords_dance() -> BattleMove {
    make_status_move(
        MoveData::new("Swords Dance", PokemonType::Normal, MoveCategory::Other, 0).with_accuracy(None),
        vec![StatusMoveEffect::on_user(MoveEffect::StatChange(StatType::Atk, 2), 1.0)],
        false,
    )
}

/// A hit with a 30% chance to flinch.
pub fn headbutt() -> BattleMove {
    make_status_move(
        MoveData::new("Headbutt", PokemonType::Normal, MoveCategory::Physical, 70),
        vec![StatusMoveEffect::on_target(MoveEffect::Status("Flinch"), 0.3)],
        false,
    )
}

pub fn fly() -> BattleMove {
    make_charge_move(
        MoveData::new("Fly", PokemonType::Flying, MoveCategory::Physical, 90).with_accuracy(Some(95)),
        Some(vec!["Gust", "Thunder", "Twister", "Sky Uppercut"]),
    )
}

pub fn gust() -> BattleMove {
    BattleMove::damaging(MoveData::new("Gust", PokemonType::Flying, MoveCategory::Special, 40))
}

pub fn counter() -> BattleMove {
    make_counter_move(
        MoveData::new("Counter", PokemonType::Fighting, MoveCategory::Physical, 0).with_priority(-5),
        Some(MoveCategory::Physical),
        2.0,
    )
}

pub fn sandstorm() -> BattleMove {
    BattleMove::weather(
        MoveData::new("Sandstorm", PokemonType::Rock, MoveCategory::Other, 0).with_accuracy(None),
        Weather::Sand,
    )
}

pub fn rain_dance() -> BattleMove {
    BattleMove::weather(
        MoveData::new("Rain Dance", PokemonType::Water, MoveCategory::Other, 0).with_accuracy(None),
        Weather::Rain,
    )
}

pub fn spikes() -> BattleMove {
    BattleMove::hazard(
        MoveData::new("Spikes", PokemonType::Ground, MoveCategory::Other, 0)
            .with_accuracy(None)
            .with_target(MoveTarget::Field),
        hazards::SPIKES,
    )
}

pub fn trick_room() -> BattleMove {
    BattleMove::trick_room(
        MoveData::new("Trick Room", PokemonType::Psychic, MoveCategory::Other, 0)
            .with_accuracy(None)
            .with_priority(-7)
            .with_target(MoveTarget::Field),
    )
}
