//! Abilities. Each ability is attached to its holder when the battle is
//! created and stays attached for the whole battle.

use schema::{PokemonType, StatType};

use crate::battle::combatant::CombatantId;
use crate::battle::messages::BattleMessage;
use crate::battle::state::Battle;
use crate::content::statuses::cure_special_status;
use crate::content::weather::{active_weather, start_weather, Weather, INDEFINITE};
use crate::effects::behavior::{DamageContext, EffectBehavior, ExecutionContext, HpChange, StatLevelRequest, StatusRequest};
use crate::effects::modifiers::{Modifier, SLOT_MOD1};
use crate::effects::record::EffectId;
use crate::effects::registry::{EffectPrototype, EffectRegistry};
use crate::errors::{BattleResult, EffectResult};

fn announce(battle: &mut Battle, id: EffectId) -> BattleResult<CombatantId> {
    let subject = battle.require_subject(id)?;
    let ability = battle.record(id)?.name();
    let pokemon = battle.name(subject);
    battle.print(BattleMessage::AbilityActivated { pokemon, ability });
    Ok(subject)
}

fn owns(battle: &Battle, id: EffectId, subject: CombatantId) -> bool {
    battle.subject_of(id) == Some(subject)
}

fn own_stat(battle: &Battle, id: EffectId, subject: CombatantId, stat: StatType, wanted: StatType) -> bool {
    stat == wanted && owns(battle, id, subject)
}

const IMMUNITIES: [(&str, &[&str]); 6] = [
    ("Insomnia", &["Sleep"]),
    ("Vital Spirit", &["Sleep"]),
    ("Immunity", &["Poison", "Toxic"]),
    ("Limber", &["Paralysis"]),
    ("Water Veil", &["Burn"]),
    ("Magma Armor", &["Freeze"]),
];

fn immunities_of(name: &str) -> &'static [&'static str] {
    IMMUNITIES
        .iter()
        .find(|(ability, _)| *ability == name)
        .map(|(_, statuses)| *statuses)
        .unwrap_or(&[])
}

/// An ability that keeps its listed statuses off the holder, and cures them
/// at the end of the turn if one got through anyway (for instance past a
/// mold breaker).
pub fn make_status_immune_ability(name: &'static str) -> EffectBehavior {
    EffectBehavior {
        breakable: true,
        tier: Some(0),
        transform_status: Some(block_immune_status),
        tick: Some(cure_blocked_status),
        ..EffectBehavior::ability(name)
    }
}

fn block_immune_status(
    battle: &Battle,
    id: EffectId,
    request: &StatusRequest,
    incoming: EffectPrototype,
) -> Option<EffectPrototype> {
    let Some(record) = battle.effect(id) else {
        return Some(incoming);
    };
    if owns(battle, id, request.subject) && immunities_of(record.name()).contains(&incoming.name) {
        return None;
    }
    Some(incoming)
}

fn cure_blocked_status(battle: &mut Battle, id: EffectId) -> BattleResult<()> {
    let subject = battle.require_subject(id)?;
    let name = battle.record(id)?.name();
    let Some(status) = battle.special_status(subject) else {
        return Ok(());
    };
    let status_name = battle.record(status)?.name();
    if immunities_of(name).contains(&status_name) {
        announce(battle, id)?;
        cure_special_status(battle, subject)?;
    }
    Ok(())
}

// === Levitate ===

fn levitate_veto(battle: &mut Battle, id: EffectId, ctx: &ExecutionContext) -> BattleResult<bool> {
    let subject = battle.require_subject(id)?;
    if ctx.target != Some(subject) || ctx.mv.move_type != PokemonType::Ground {
        return Ok(false);
    }
    announce(battle, id)?;
    let pokemon = battle.name(subject);
    battle.print(BattleMessage::NoEffect { pokemon });
    Ok(true)
}

fn levitate_effectiveness(battle: &Battle, id: EffectId, move_type: PokemonType, target: CombatantId, value: f64) -> f64 {
    if move_type == PokemonType::Ground && owns(battle, id, target) {
        0.0
    } else {
        value
    }
}

// === Priority and speed ===

fn stall_priority(_: &Battle, _: EffectId, _: CombatantId) -> i32 {
    -1
}

fn always(_: &Battle, _: EffectId, _: CombatantId) -> bool {
    true
}

fn quick_feet_speed(battle: &Battle, id: EffectId, subject: CombatantId, stat: StatType) -> Option<Modifier> {
    if !own_stat(battle, id, subject, stat, StatType::Spe) || !battle.has_special_status(subject) {
        return None;
    }
    Some(Modifier::stat(1.5, 0))
}

fn swift_swim_speed(battle: &Battle, id: EffectId, subject: CombatantId, stat: StatType) -> Option<Modifier> {
    (own_stat(battle, id, subject, stat, StatType::Spe) && active_weather(battle) == Some(Weather::Rain))
        .then(|| Modifier::stat(2.0, 0))
}

fn chlorophyll_speed(battle: &Battle, id: EffectId, subject: CombatantId, stat: StatType) -> Option<Modifier> {
    (own_stat(battle, id, subject, stat, StatType::Spe) && active_weather(battle) == Some(Weather::Sun))
        .then(|| Modifier::stat(2.0, 0))
}

fn unburden_speed(battle: &Battle, id: EffectId, subject: CombatantId, stat: StatType) -> Option<Modifier> {
    let unburdened = battle.effect(id).is_some_and(|r| r.data.flag);
    (own_stat(battle, id, subject, stat, StatType::Spe) && unburdened).then(|| Modifier::stat(2.0, 0))
}

fn unburden_lost_item(battle: &mut Battle, id: EffectId, _item: &'static str) -> BattleResult<()> {
    battle.record_mut(id)?.data.flag = true;
    Ok(())
}

fn unburden_switch_out(battle: &mut Battle, id: EffectId) -> BattleResult<bool> {
    battle.record_mut(id)?.data.flag = false;
    Ok(false)
}

// === Offense and defense ===

fn guts_attack(battle: &Battle, id: EffectId, subject: CombatantId, stat: StatType) -> Option<Modifier> {
    (own_stat(battle, id, subject, stat, StatType::Atk) && battle.has_special_status(subject))
        .then(|| Modifier::stat(1.5, 0))
}

fn solar_power_attack(battle: &Battle, id: EffectId, subject: CombatantId, stat: StatType) -> Option<Modifier> {
    (own_stat(battle, id, subject, stat, StatType::SpAtk) && active_weather(battle) == Some(Weather::Sun))
        .then(|| Modifier::stat(1.5, 0))
}

fn sand_veil_evasion(battle: &Battle, id: EffectId, subject: CombatantId, stat: StatType) -> Option<Modifier> {
    (own_stat(battle, id, subject, stat, StatType::Eva) && active_weather(battle) == Some(Weather::Sand))
        .then(|| Modifier::stat(1.25, 0))
}

fn thick_fat(battle: &Battle, id: EffectId, ctx: &DamageContext) -> Option<Modifier> {
    let resisted = matches!(ctx.mv.move_type, PokemonType::Fire | PokemonType::Ice);
    (resisted && owns(battle, id, ctx.target)).then(|| Modifier::new(SLOT_MOD1, 0.5, 2))
}

fn dry_skin_fire(battle: &Battle, id: EffectId, ctx: &DamageContext) -> Option<Modifier> {
    (ctx.mv.move_type == PokemonType::Fire && owns(battle, id, ctx.target)).then(|| Modifier::new(SLOT_MOD1, 1.25, 2))
}

fn magic_guard(battle: &Battle, id: EffectId, subject: CombatantId, delta: i32, kind: HpChange) -> i32 {
    if kind == HpChange::Indirect && delta < 0 && owns(battle, id, subject) {
        0
    } else {
        delta
    }
}

fn clear_body(battle: &Battle, id: EffectId, request: &StatLevelRequest, delta: i8) -> i8 {
    let from_other = request.inducer.is_some_and(|inducer| inducer != request.subject);
    if delta < 0 && from_other && owns(battle, id, request.subject) {
        0
    } else {
        delta
    }
}

fn simple(battle: &Battle, id: EffectId, request: &StatLevelRequest, delta: i8) -> i8 {
    if owns(battle, id, request.subject) {
        delta.saturating_mul(2)
    } else {
        delta
    }
}

// === Weather interaction ===

fn handled(_: &mut Battle, _: EffectId) -> BattleResult<bool> {
    Ok(true)
}

fn weather_heal(battle: &mut Battle, id: EffectId, denominator: u32) -> BattleResult<bool> {
    let subject = battle.require_subject(id)?;
    if battle.hp(subject) == battle.max_hp(subject) {
        return Ok(true);
    }
    announce(battle, id)?;
    let amount = battle.fraction_of_max_hp(subject, denominator);
    let (pokemon, hp) = (battle.name(subject), battle.hp(subject));
    battle.restore_hp(subject, amount, |amount| {
        Some(BattleMessage::Healed {
            pokemon,
            amount,
            remaining: hp + amount,
        })
    })?;
    Ok(true)
}

fn rain_dish(battle: &mut Battle, id: EffectId, weather: Weather) -> BattleResult<bool> {
    match weather {
        Weather::Rain => weather_heal(battle, id, 16),
        _ => Ok(false),
    }
}

fn ice_body(battle: &mut Battle, id: EffectId, weather: Weather) -> BattleResult<bool> {
    match weather {
        Weather::Hail => weather_heal(battle, id, 16),
        _ => Ok(false),
    }
}

fn dry_skin_rain(battle: &mut Battle, id: EffectId, weather: Weather) -> BattleResult<bool> {
    match weather {
        Weather::Rain => weather_heal(battle, id, 8),
        _ => Ok(false),
    }
}

fn poison_heal(battle: &mut Battle, id: EffectId) -> BattleResult<bool> {
    weather_heal(battle, id, 8)
}

fn weather_suppressor(_: &Battle, _: EffectId) -> bool {
    true
}

fn summon_weather(battle: &mut Battle, id: EffectId, entrant: CombatantId, weather: Weather) -> BattleResult<()> {
    if !owns(battle, id, entrant) {
        return Ok(());
    }
    announce(battle, id)?;
    start_weather(battle, Some(entrant), weather, Some(INDEFINITE))?;
    Ok(())
}

fn drizzle(battle: &mut Battle, id: EffectId, entrant: CombatantId) -> BattleResult<()> {
    summon_weather(battle, id, entrant, Weather::Rain)
}

fn drought(battle: &mut Battle, id: EffectId, entrant: CombatantId) -> BattleResult<()> {
    summon_weather(battle, id, entrant, Weather::Sun)
}

fn sand_stream(battle: &mut Battle, id: EffectId, entrant: CombatantId) -> BattleResult<()> {
    summon_weather(battle, id, entrant, Weather::Sand)
}

fn snow_warning(battle: &mut Battle, id: EffectId, entrant: CombatantId) -> BattleResult<()> {
    summon_weather(battle, id, entrant, Weather::Hail)
}

// === Switching ===

fn announce_on_entry(battle: &mut Battle, id: EffectId, entrant: CombatantId) -> BattleResult<()> {
    if owns(battle, id, entrant) {
        announce(battle, id)?;
    }
    Ok(())
}

fn intimidate(battle: &mut Battle, id: EffectId, entrant: CombatantId) -> BattleResult<()> {
    if !owns(battle, id, entrant) {
        return Ok(());
    }
    let Some(opponent) = battle.opponent_of(entrant).filter(|o| !battle.is_fainted(*o)) else {
        return Ok(());
    };
    announce(battle, id)?;
    battle.apply_stat_change(opponent, Some(entrant), StatType::Atk, -1)?;
    Ok(())
}

fn natural_cure(battle: &mut Battle, id: EffectId) -> BattleResult<bool> {
    let subject = battle.require_subject(id)?;
    cure_special_status(battle, subject)?;
    Ok(false)
}

pub fn register(registry: &mut EffectRegistry) -> EffectResult<()> {
    for (name, _) in IMMUNITIES {
        registry.define(make_status_immune_ability(name))?;
    }
    registry.define(EffectBehavior {
        breakable: true,
        veto_execution: Some(levitate_veto),
        transform_effectiveness: Some(levitate_effectiveness),
        ..EffectBehavior::ability("Levitate")
    })?;
    registry.define(EffectBehavior::ability("Early Bird"))?;
    registry.define(EffectBehavior {
        inherent_priority: Some(stall_priority),
        ..EffectBehavior::ability("Stall")
    })?;
    registry.define(EffectBehavior {
        inform_poison_damage: Some(poison_heal),
        ..EffectBehavior::ability("Poison Heal")
    })?;
    registry.define(EffectBehavior {
        negates_paralysis_speed: Some(always),
        stat_modifier: Some(quick_feet_speed),
        ..EffectBehavior::ability("Quick Feet")
    })?;
    for name in ["Cloud Nine", "Air Lock"] {
        registry.define(EffectBehavior {
            suppresses_weather: Some(weather_suppressor),
            switch_in: Some(announce_on_entry),
            ..EffectBehavior::ability(name)
        })?;
    }
    registry.define(EffectBehavior {
        mold_breaker: true,
        switch_in: Some(announce_on_entry),
        ..EffectBehavior::ability("Mold Breaker")
    })?;
    registry.define(EffectBehavior {
        stat_modifier: Some(swift_swim_speed),
        ..EffectBehavior::ability("Swift Swim")
    })?;
    registry.define(EffectBehavior {
        stat_modifier: Some(chlorophyll_speed),
        ..EffectBehavior::ability("Chlorophyll")
    })?;
    registry.define(EffectBehavior {
        breakable: true,
        damage_modifier: Some(thick_fat),
        ..EffectBehavior::ability("Thick Fat")
    })?;
    registry.define(EffectBehavior {
        inform_weather_healing: Some(rain_dish),
        ..EffectBehavior::ability("Rain Dish")
    })?;
    registry.define(EffectBehavior {
        inform_weather_healing: Some(ice_body),
        inform_hail_damage: Some(handled),
        ..EffectBehavior::ability("Ice Body")
    })?;
    registry.define(EffectBehavior {
        breakable: true,
        inform_weather_healing: Some(dry_skin_rain),
        damage_modifier: Some(dry_skin_fire),
        ..EffectBehavior::ability("Dry Skin")
    })?;
    registry.define(EffectBehavior {
        stat_modifier: Some(solar_power_attack),
        ..EffectBehavior::ability("Solar Power")
    })?;
    registry.define(EffectBehavior {
        transform_health_change: Some(magic_guard),
        ..EffectBehavior::ability("Magic Guard")
    })?;
    registry.define(EffectBehavior {
        breakable: true,
        ..EffectBehavior::ability("Shield Dust")
    })?;
    registry.define(EffectBehavior::ability("Serene Grace"))?;
    registry.define(EffectBehavior {
        switch_in: Some(intimidate),
        ..EffectBehavior::ability("Intimidate")
    })?;
    registry.define(EffectBehavior {
        switch_out: Some(natural_cure),
        ..EffectBehavior::ability("Natural Cure")
    })?;
    registry.define(EffectBehavior {
        breakable: true,
        transform_stat_level: Some(clear_body),
        ..EffectBehavior::ability("Clear Body")
    })?;
    registry.define(EffectBehavior {
        breakable: true,
        transform_stat_level: Some(simple),
        ..EffectBehavior::ability("Simple")
    })?;
    registry.define(EffectBehavior {
        stat_modifier: Some(guts_attack),
        ..EffectBehavior::ability("Guts")
    })?;
    registry.define(EffectBehavior {
        breakable: true,
        inform_sand_damage: Some(handled),
        stat_modifier: Some(sand_veil_evasion),
        ..EffectBehavior::ability("Sand Veil")
    })?;
    registry.define(EffectBehavior::ability("Klutz"))?;
    registry.define(EffectBehavior {
        switch_in: Some(drizzle),
        ..EffectBehavior::ability("Drizzle")
    })?;
    registry.define(EffectBehavior {
        switch_in: Some(drought),
        ..EffectBehavior::ability("Drought")
    })?;
    registry.define(EffectBehavior {
        switch_in: Some(sand_stream),
        ..EffectBehavior::ability("Sand Stream")
    })?;
    registry.define(EffectBehavior {
        switch_in: Some(snow_warning),
        ..EffectBehavior::ability("Snow Warning")
    })?;
    registry.define(EffectBehavior {
        stat_modifier: Some(unburden_speed),
        inform_lost_item: Some(unburden_lost_item),
        switch_out: Some(unburden_switch_out),
        ..EffectBehavior::ability("Unburden")
    })?;
    Ok(())
}
