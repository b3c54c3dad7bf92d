//! Held items. Consumable items (berries, cure items) trigger through the
//! item condition check that follows every HP or status change of the
//! holder; the rest act through ordinary hooks.

use schema::{MoveData, PokemonType, StatType};

use crate::battle::combatant::CombatantId;
use crate::battle::messages::BattleMessage;
use crate::battle::state::Battle;
use crate::content::statuses::RESIDUAL_TIER;
use crate::content::weather::Weather;
use crate::effects::behavior::{DamageContext, EffectBehavior, ExecutionReport, HpChange};
use crate::effects::modifiers::{Modifier, SLOT_MOD2};
use crate::effects::record::EffectId;
use crate::effects::registry::EffectRegistry;
use crate::errors::{BattleResult, EffectResult};

const LIFE_ORB_RECOIL: u32 = 10;
const WEATHER_ROCK_TURNS: i32 = 8;

fn holder(battle: &Battle, id: EffectId) -> BattleResult<(CombatantId, &'static str)> {
    let subject = battle.require_subject(id)?;
    Ok((subject, battle.record(id)?.name()))
}

fn heal_holder(battle: &mut Battle, id: EffectId, amount: u32) -> BattleResult<u32> {
    let (subject, item) = holder(battle, id)?;
    let pokemon = battle.name(subject);
    battle.restore_hp(subject, amount, |amount| {
        Some(BattleMessage::ItemHealed { pokemon, item, amount })
    })
}

fn hurt_holder(battle: &mut Battle, id: EffectId, amount: u32) -> BattleResult<u32> {
    let (subject, item) = holder(battle, id)?;
    let pokemon = battle.name(subject);
    battle.inflict_damage(subject, amount, HpChange::Indirect, |amount| {
        Some(BattleMessage::ItemHurt { pokemon, item, amount })
    })
}

// === Residual items ===

fn leftovers_tick(battle: &mut Battle, id: EffectId) -> BattleResult<()> {
    let subject = battle.require_subject(id)?;
    let amount = battle.fraction_of_max_hp(subject, 16);
    heal_holder(battle, id, amount)?;
    Ok(())
}

fn black_sludge_tick(battle: &mut Battle, id: EffectId) -> BattleResult<()> {
    let subject = battle.require_subject(id)?;
    if battle.is_type(subject, PokemonType::Poison) {
        let amount = battle.fraction_of_max_hp(subject, 16);
        heal_holder(battle, id, amount)?;
    } else {
        let amount = battle.fraction_of_max_hp(subject, 8);
        hurt_holder(battle, id, amount)?;
    }
    Ok(())
}

fn lagging_tail_priority(_: &Battle, _: EffectId, _: CombatantId) -> i32 {
    -2
}

fn scope_lens_stage(_: &Battle, _: EffectId, _: CombatantId) -> i32 {
    1
}

// === Choice Band ===

fn choice_band_attack(battle: &Battle, id: EffectId, subject: CombatantId, stat: StatType) -> Option<Modifier> {
    (stat == StatType::Atk && battle.subject_of(id) == Some(subject)).then(|| Modifier::stat(1.5, 0))
}

fn choice_lock(battle: &Battle, id: EffectId, user: CombatantId, mv: &MoveData) -> bool {
    let Some(record) = battle.effect(id) else {
        return false;
    };
    record.subject() == Some(user) && record.data.locked_move.as_ref().is_some_and(|locked| *locked != mv.name)
}

fn choice_remember(battle: &mut Battle, id: EffectId, report: &ExecutionReport) -> BattleResult<()> {
    let record = battle.record_mut(id)?;
    if record.subject() == Some(report.user) && record.data.locked_move.is_none() {
        record.data.locked_move = Some(report.mv.name.clone());
    }
    Ok(())
}

fn choice_release(battle: &mut Battle, id: EffectId) -> BattleResult<bool> {
    battle.record_mut(id)?.data.locked_move = None;
    Ok(false)
}

// === Life Orb ===

fn life_orb_boost(battle: &Battle, id: EffectId, ctx: &DamageContext) -> Option<Modifier> {
    (battle.subject_of(id) == Some(ctx.user)).then(|| Modifier::new(SLOT_MOD2, 1.3, 5))
}

fn life_orb_recoil(battle: &mut Battle, id: EffectId, report: &ExecutionReport) -> BattleResult<()> {
    let subject = battle.require_subject(id)?;
    if report.user != subject || report.damage_dealt == 0 {
        return Ok(());
    }
    let amount = battle.fraction_of_max_hp(subject, LIFE_ORB_RECOIL);
    hurt_holder(battle, id, amount)?;
    Ok(())
}

// === Weather rocks ===

const ROCKS: [(&str, Weather); 4] = [
    ("Damp Rock", Weather::Rain),
    ("Heat Rock", Weather::Sun),
    ("Smooth Rock", Weather::Sand),
    ("Icy Rock", Weather::Hail),
];

fn rock_extends_weather(battle: &Battle, id: EffectId, weather: Weather) -> Option<i32> {
    let name = battle.effect(id)?.name();
    ROCKS
        .iter()
        .any(|(rock, extended)| *rock == name && *extended == weather)
        .then_some(WEATHER_ROCK_TURNS)
}

// === Berries ===

/// How much a berry restores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BerryHeal {
    Fixed(u32),
    /// `max_hp / n`
    Fraction(u32),
}

const BERRIES: [(&str, BerryHeal); 2] = [("Sitrus Berry", BerryHeal::Fraction(4)), ("Oran Berry", BerryHeal::Fixed(10))];

/// A berry eaten once its holder drops to half HP or below.
pub fn make_berry(name: &'static str) -> EffectBehavior {
    EffectBehavior {
        item_condition: Some(at_half_hp),
        item_use: Some(eat_berry),
        ..EffectBehavior::item(name)
    }
}

fn at_half_hp(battle: &Battle, id: EffectId) -> bool {
    battle
        .subject_of(id)
        .is_some_and(|subject| !battle.is_fainted(subject) && battle.hp(subject) * 2 <= battle.max_hp(subject))
}

fn eat_berry(battle: &mut Battle, id: EffectId) -> BattleResult<bool> {
    let (subject, name) = holder(battle, id)?;
    let Some((_, heal)) = BERRIES.iter().find(|(berry, _)| *berry == name) else {
        return Ok(false);
    };
    let amount = match *heal {
        BerryHeal::Fixed(amount) => amount,
        BerryHeal::Fraction(denominator) => battle.fraction_of_max_hp(subject, denominator),
    };
    heal_holder(battle, id, amount)?;
    Ok(true)
}

// === Status cure items ===

const SPECIAL_STATUSES: &[&str] = &["Burn", "Poison", "Toxic", "Paralysis", "Sleep", "Freeze"];

const CURES: [(&str, &[&str]); 6] = [
    ("Lum Berry", SPECIAL_STATUSES),
    ("Cheri Berry", &["Paralysis"]),
    ("Chesto Berry", &["Sleep"]),
    ("Pecha Berry", &["Poison", "Toxic"]),
    ("Rawst Berry", &["Burn"]),
    ("Aspear Berry", &["Freeze"]),
];

fn cures_of(name: &str) -> &'static [&'static str] {
    CURES
        .iter()
        .find(|(item, _)| *item == name)
        .map(|(_, statuses)| *statuses)
        .unwrap_or(&[])
}

/// An item consumed to cure one of the listed special statuses.
pub fn make_status_cure_item(name: &'static str) -> EffectBehavior {
    EffectBehavior {
        item_condition: Some(has_curable_status),
        item_use: Some(cure_status),
        ..EffectBehavior::item(name)
    }
}

fn curable_status(battle: &Battle, id: EffectId) -> Option<EffectId> {
    let record = battle.effect(id)?;
    let status = battle.special_status(record.subject()?)?;
    let status_name = battle.effect(status)?.name();
    cures_of(record.name()).contains(&status_name).then_some(status)
}

fn has_curable_status(battle: &Battle, id: EffectId) -> bool {
    curable_status(battle, id).is_some()
}

fn cure_status(battle: &mut Battle, id: EffectId) -> BattleResult<bool> {
    let Some(status) = curable_status(battle, id) else {
        return Ok(false);
    };
    let (subject, item) = holder(battle, id)?;
    let status_name = battle.record(status)?.name();
    battle.detach(status)?;
    let pokemon = battle.name(subject);
    battle.print(BattleMessage::ItemCuredStatus {
        pokemon,
        item,
        status: status_name,
    });
    Ok(true)
}

pub fn register(registry: &mut EffectRegistry) -> EffectResult<()> {
    registry.define(EffectBehavior {
        tier: Some(RESIDUAL_TIER),
        subtier: 2,
        tick: Some(leftovers_tick),
        ..EffectBehavior::item("Leftovers")
    })?;
    registry.define(EffectBehavior {
        tier: Some(RESIDUAL_TIER),
        subtier: 2,
        tick: Some(black_sludge_tick),
        ..EffectBehavior::item("Black Sludge")
    })?;
    registry.define(EffectBehavior {
        inherent_priority: Some(lagging_tail_priority),
        ..EffectBehavior::item("Lagging Tail")
    })?;
    registry.define(EffectBehavior {
        critical_modifier: Some(scope_lens_stage),
        ..EffectBehavior::item("Scope Lens")
    })?;
    registry.define(EffectBehavior {
        stat_modifier: Some(choice_band_attack),
        veto_selection: Some(choice_lock),
        inform_finished_execution: Some(choice_remember),
        switch_out: Some(choice_release),
        ..EffectBehavior::item("Choice Band")
    })?;
    registry.define(EffectBehavior {
        damage_modifier: Some(life_orb_boost),
        inform_finished_execution: Some(life_orb_recoil),
        ..EffectBehavior::item("Life Orb")
    })?;
    for (rock, _) in ROCKS {
        registry.define(EffectBehavior {
            inform_apply_weather: Some(rock_extends_weather),
            ..EffectBehavior::item(rock)
        })?;
    }
    for (berry, _) in BERRIES {
        registry.define(make_berry(berry))?;
    }
    for (item, _) in CURES {
        registry.define(make_status_cure_item(item))?;
    }
    Ok(())
}
