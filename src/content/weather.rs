//! Weather and other global field effects.
//!
//! At most one weather is on the field at a time; new weather replaces old
//! weather, and the same weather cannot be started twice. Weather lasts five
//! turns unless the user's effects ask for a different duration, and ticks
//! in tier 3 before residual status damage.

use serde::{Deserialize, Serialize};
use strum::EnumIter;
use tracing::debug;

use schema::{PokemonType, StatType};

use crate::battle::combatant::CombatantId;
use crate::battle::messages::BattleMessage;
use crate::battle::state::Battle;
use crate::effects::behavior::{DamageContext, EffectBehavior, HpChange};
use crate::effects::dispatch::Hook;
use crate::effects::modifiers::{Modifier, SLOT_MOD2};
use crate::effects::record::{EffectData, EffectId, EffectLock, EffectOwner};
use crate::effects::registry::EffectRegistry;
use crate::errors::{BattleResult, EffectResult};

pub const WEATHER_TIER: i32 = 3;
pub const DEFAULT_WEATHER_TURNS: i32 = 5;
pub const TRICK_ROOM_TURNS: i32 = 5;
/// Weather started by an ability never runs out.
pub const INDEFINITE: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum Weather {
    Rain,
    Sand,
    Sun,
    Hail,
}

impl Weather {
    /// Registry name of the field effect for this weather.
    pub fn effect_name(self) -> &'static str {
        match self {
            Weather::Rain => "Rain",
            Weather::Sand => "Sandstorm",
            Weather::Sun => "Sun",
            Weather::Hail => "Hail",
        }
    }

    pub fn from_effect_name(name: &str) -> Option<Weather> {
        match name {
            "Rain" => Some(Weather::Rain),
            "Sandstorm" => Some(Weather::Sand),
            "Sun" => Some(Weather::Sun),
            "Hail" => Some(Weather::Hail),
            _ => None,
        }
    }

    fn index(self) -> i32 {
        match self {
            Weather::Rain => 0,
            Weather::Sand => 1,
            Weather::Sun => 2,
            Weather::Hail => 3,
        }
    }

    pub fn started_text(self) -> &'static str {
        match self {
            Weather::Rain => "It started to rain!",
            Weather::Sand => "A sandstorm brewed!",
            Weather::Sun => "The sunlight turned harsh!",
            Weather::Hail => "It started to hail!",
        }
    }

    pub fn continues_text(self) -> &'static str {
        match self {
            Weather::Rain => "Rain continues to fall.",
            Weather::Sand => "The sandstorm rages.",
            Weather::Sun => "The sunlight is strong.",
            Weather::Hail => "Hail continues to fall.",
        }
    }

    pub fn ended_text(self) -> &'static str {
        match self {
            Weather::Rain => "The rain stopped.",
            Weather::Sand => "The sandstorm subsided.",
            Weather::Sun => "The sunlight faded.",
            Weather::Hail => "The hail stopped.",
        }
    }
}

impl std::fmt::Display for Weather {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Weather::Rain => "rain",
            Weather::Sand => "sandstorm",
            Weather::Sun => "sunlight",
            Weather::Hail => "hail",
        };
        write!(f, "{}", name)
    }
}

/// Weather on the field, whether or not something suppresses it.
pub fn current_weather(battle: &Battle) -> Option<Weather> {
    battle
        .find_lock(EffectOwner::Field, EffectLock::Weather)
        .and_then(|id| battle.effect(id))
        .and_then(|r| Weather::from_effect_name(r.name()))
}

/// Weather whose effects currently apply.
pub fn active_weather(battle: &Battle) -> Option<Weather> {
    if battle.weather_suppressed() {
        return None;
    }
    current_weather(battle)
}

/// Starts `weather`, replacing any other weather. Fails when the same
/// weather is already up. `turns` overrides the duration; otherwise the
/// user's effects may, and the default is five turns.
pub fn start_weather(
    battle: &mut Battle,
    user: Option<CombatantId>,
    weather: Weather,
    turns: Option<i32>,
) -> BattleResult<bool> {
    if current_weather(battle) == Some(weather) {
        return Ok(false);
    }
    end_weather(battle)?;

    let turns = turns
        .or_else(|| user.and_then(|u| battle.apply_weather_turns(u, weather)))
        .unwrap_or(DEFAULT_WEATHER_TURNS);
    let prototype = battle.registry.get(weather.effect_name())?;
    let outcome = battle.attach_with(EffectOwner::Field, prototype, user, EffectData::with_turns(turns))?;
    let Some(id) = outcome.id() else {
        return Ok(false);
    };
    debug!(?weather, turns, "weather started");
    if let Some(inform) = battle.effect(id).and_then(|r| r.behavior.inform_applied) {
        inform(battle, id, user)?;
    }
    Ok(true)
}

/// Ends the current weather, announcing it. Returns whether any was up.
pub fn end_weather(battle: &mut Battle) -> BattleResult<bool> {
    let Some(id) = battle.find_lock(EffectOwner::Field, EffectLock::Weather) else {
        return Ok(false);
    };
    finish(battle, id)?;
    Ok(true)
}

/// Announces that a global effect ran its course and detaches it.
fn finish(battle: &mut Battle, id: EffectId) -> BattleResult<()> {
    if let Some(inform) = battle.effect(id).and_then(|r| r.behavior.inform_finished) {
        inform(battle, id)?;
    }
    battle.detach(id)?;
    Ok(())
}

fn weather_of(battle: &Battle, id: EffectId) -> Option<Weather> {
    battle.effect(id).and_then(|r| Weather::from_effect_name(r.name()))
}

fn announce_start(battle: &mut Battle, id: EffectId, _user: Option<CombatantId>) -> BattleResult<()> {
    if let Some(weather) = weather_of(battle, id) {
        battle.print(BattleMessage::WeatherStarted { weather });
    }
    Ok(())
}

fn announce_end(battle: &mut Battle, id: EffectId) -> BattleResult<()> {
    if let Some(weather) = weather_of(battle, id) {
        battle.print(BattleMessage::WeatherEnded { weather });
    }
    Ok(())
}

fn weather_tick(battle: &mut Battle, id: EffectId) -> BattleResult<()> {
    let Some(weather) = weather_of(battle, id) else {
        return Ok(());
    };
    let record = battle.record_mut(id)?;
    if record.data.turns != INDEFINITE {
        record.data.turns -= 1;
        if record.data.turns <= 0 {
            return finish(battle, id);
        }
    }
    battle.print(BattleMessage::WeatherContinues { weather });
    if battle.weather_suppressed() {
        return Ok(());
    }
    for subject in battle.speed_ranked_actives() {
        weather_effect_on(battle, subject, weather)?;
    }
    Ok(())
}

fn weather_effect_on(battle: &mut Battle, subject: CombatantId, weather: Weather) -> BattleResult<()> {
    if battle.is_fainted(subject) {
        return Ok(());
    }
    if battle.inform_weather_healing(subject, weather)? {
        return Ok(());
    }
    let pokemon = battle.name(subject);
    match weather {
        Weather::Sand => {
            if battle.inform_handled(Hook::InformSandDamage, subject)? {
                return Ok(());
            }
            if [PokemonType::Ground, PokemonType::Rock, PokemonType::Steel]
                .iter()
                .any(|t| battle.is_type(subject, *t))
            {
                return Ok(());
            }
            let amount = battle.fraction_of_max_hp(subject, 16);
            battle.inflict_damage(subject, amount, HpChange::Indirect, |amount| {
                Some(BattleMessage::WeatherDamage { pokemon, weather, amount })
            })?;
        }
        Weather::Hail => {
            if battle.inform_handled(Hook::InformHailDamage, subject)? {
                return Ok(());
            }
            if battle.is_type(subject, PokemonType::Ice) {
                return Ok(());
            }
            let amount = battle.fraction_of_max_hp(subject, 16);
            battle.inflict_damage(subject, amount, HpChange::Indirect, |amount| {
                Some(BattleMessage::WeatherDamage { pokemon, weather, amount })
            })?;
        }
        Weather::Sun => {
            let ability = ["Dry Skin", "Solar Power"].into_iter().find(|a| battle.has_ability(subject, a));
            if let Some(ability) = ability {
                battle.print(BattleMessage::AbilityActivated {
                    pokemon: pokemon.clone(),
                    ability,
                });
                let amount = battle.fraction_of_max_hp(subject, 8);
                battle.inflict_damage(subject, amount, HpChange::Indirect, |amount| {
                    Some(BattleMessage::WeatherDamage { pokemon, weather, amount })
                })?;
            }
        }
        Weather::Rain => {}
    }
    Ok(())
}

fn rain_modifier(battle: &Battle, _id: EffectId, ctx: &DamageContext) -> Option<Modifier> {
    if battle.weather_suppressed() {
        return None;
    }
    match ctx.mv.move_type {
        PokemonType::Fire => Some(Modifier::new(SLOT_MOD2, 0.5, 3)),
        PokemonType::Water => Some(Modifier::new(SLOT_MOD2, 1.5, 3)),
        _ => None,
    }
}

fn sun_modifier(battle: &Battle, _id: EffectId, ctx: &DamageContext) -> Option<Modifier> {
    if battle.weather_suppressed() {
        return None;
    }
    match ctx.mv.move_type {
        PokemonType::Fire => Some(Modifier::new(SLOT_MOD2, 1.5, 4)),
        PokemonType::Water => Some(Modifier::new(SLOT_MOD2, 0.5, 4)),
        _ => None,
    }
}

fn sand_special_defense(battle: &Battle, _id: EffectId, subject: CombatantId, stat: StatType) -> Option<Modifier> {
    if battle.weather_suppressed() || stat != StatType::SpDef || !battle.is_type(subject, PokemonType::Rock) {
        return None;
    }
    Some(Modifier::stat(1.5, 3))
}

fn weather_base(weather: Weather) -> EffectBehavior {
    EffectBehavior {
        lock: EffectLock::Weather,
        tier: Some(WEATHER_TIER),
        subtier: weather.index(),
        tick: Some(weather_tick),
        inform_applied: Some(announce_start),
        inform_finished: Some(announce_end),
        ..EffectBehavior::global(weather.effect_name())
    }
}

/// Starts trick room, or ends it early when it is already up.
pub fn toggle_trick_room(battle: &mut Battle, user: Option<CombatantId>) -> BattleResult<bool> {
    if let Some(id) = battle.find(EffectOwner::Field, "Trick Room") {
        finish(battle, id)?;
        return Ok(true);
    }
    let prototype = battle.registry.get("Trick Room")?;
    let outcome = battle.attach_with(EffectOwner::Field, prototype, user, EffectData::with_turns(TRICK_ROOM_TURNS))?;
    Ok(outcome.is_applied())
}

fn trick_room_apply(battle: &mut Battle, _id: EffectId) -> BattleResult<bool> {
    battle.print(BattleMessage::TrickRoomStarted);
    Ok(true)
}

fn trick_room_end_tick(battle: &mut Battle, id: EffectId) -> BattleResult<()> {
    let record = battle.record_mut(id)?;
    record.data.turns -= 1;
    if record.data.turns <= 0 {
        finish(battle, id)?;
    }
    Ok(())
}

fn trick_room_finished(battle: &mut Battle, _id: EffectId) -> BattleResult<()> {
    battle.print(BattleMessage::TrickRoomEnded);
    Ok(())
}

fn ascending(_: &Battle, _: EffectId) -> bool {
    false
}

pub fn register(registry: &mut EffectRegistry) -> EffectResult<()> {
    registry.define(EffectBehavior {
        damage_modifier: Some(rain_modifier),
        ..weather_base(Weather::Rain)
    })?;
    registry.define(EffectBehavior {
        stat_modifier: Some(sand_special_defense),
        ..weather_base(Weather::Sand)
    })?;
    registry.define(EffectBehavior {
        damage_modifier: Some(sun_modifier),
        ..weather_base(Weather::Sun)
    })?;
    registry.define(weather_base(Weather::Hail))?;
    registry.define(EffectBehavior {
        tier: Some(20),
        apply: Some(trick_room_apply),
        end_tick: Some(trick_room_end_tick),
        inform_finished: Some(trick_room_finished),
        speed_sort: Some(ascending),
        ..EffectBehavior::global("Trick Room")
    })?;
    Ok(())
}
