//! Status effects: the five special statuses, flinching, stat stages, charge
//! turns and the bookkeeping statuses every combatant carries.

use schema::{MoveCategory, PokemonType, StatType};

use crate::battle::combatant::CombatantId;
use crate::battle::messages::BattleMessage;
use crate::battle::state::Battle;
use crate::effects::behavior::{
    DamageContext, EffectBehavior, ExecutionContext, ExecutionReport, HpChange, StatusRequest,
};
use crate::effects::container::AttachOutcome;
use crate::effects::dispatch::Hook;
use crate::effects::modifiers::{Modifier, SLOT_MOD1};
use crate::effects::record::{DamageRecord, EffectData, EffectId, EffectLock, EffectOwner};
use crate::effects::registry::{EffectPrototype, EffectRegistry};
use crate::errors::{BattleResult, EffectError, EffectResult};

/// End-of-turn tier of residual status damage.
pub const RESIDUAL_TIER: i32 = 6;
const TOXIC_COUNTER_CAP: i32 = 15;

/// The subject of `id` when `ctx` is the overall check for the subject's
/// own move, which is where move-preventing statuses act.
fn own_overall_check(battle: &Battle, id: EffectId, ctx: &ExecutionContext) -> Option<CombatantId> {
    let subject = battle.subject_of(id)?;
    (ctx.target.is_none() && ctx.user == subject).then_some(subject)
}

fn special_status(name: &'static str) -> EffectBehavior {
    EffectBehavior {
        lock: EffectLock::SpecialStatus,
        volatile: false,
        ..EffectBehavior::status(name)
    }
}

fn announce(battle: &mut Battle, id: EffectId) -> BattleResult<CombatantId> {
    let subject = battle.require_subject(id)?;
    let status = battle.record(id)?.name();
    let pokemon = battle.name(subject);
    battle.print(BattleMessage::StatusApplied { pokemon, status });
    Ok(subject)
}

/// Removes whichever special status `subject` has, announcing the cure.
pub fn cure_special_status(battle: &mut Battle, subject: CombatantId) -> BattleResult<Option<&'static str>> {
    let Some(id) = battle.special_status(subject) else {
        return Ok(None);
    };
    let status = battle.record(id)?.name();
    battle.detach(id)?;
    let pokemon = battle.name(subject);
    battle.print(BattleMessage::StatusCured { pokemon, status });
    Ok(Some(status))
}

fn residual_damage(battle: &mut Battle, id: EffectId, amount: u32) -> BattleResult<()> {
    let subject = battle.require_subject(id)?;
    let status = battle.record(id)?.name();
    let pokemon = battle.name(subject);
    battle.inflict_damage(subject, amount, HpChange::Indirect, |amount| {
        Some(BattleMessage::StatusDamage { pokemon, status, amount })
    })?;
    Ok(())
}

// === Burn ===

fn burn_apply(battle: &mut Battle, id: EffectId) -> BattleResult<bool> {
    let subject = battle.require_subject(id)?;
    if battle.is_type(subject, PokemonType::Fire) {
        return Ok(false);
    }
    announce(battle, id)?;
    Ok(true)
}

fn burn_tick(battle: &mut Battle, id: EffectId) -> BattleResult<()> {
    let subject = battle.require_subject(id)?;
    if battle.inform_handled(Hook::InformBurnDamage, subject)? {
        return Ok(());
    }
    let amount = battle.fraction_of_max_hp(subject, 8);
    residual_damage(battle, id, amount)
}

/// Halves physical damage dealt by the burned combatant.
fn burn_attack(battle: &Battle, id: EffectId, ctx: &DamageContext) -> Option<Modifier> {
    let subject = battle.subject_of(id)?;
    if ctx.user != subject || ctx.mv.category != MoveCategory::Physical || battle.has_ability(subject, "Guts") {
        return None;
    }
    Some(Modifier::new(SLOT_MOD1, 0.5, 1))
}

// === Poison ===

fn poison_apply(battle: &mut Battle, id: EffectId) -> BattleResult<bool> {
    let subject = battle.require_subject(id)?;
    if battle.is_type(subject, PokemonType::Poison) || battle.is_type(subject, PokemonType::Steel) {
        return Ok(false);
    }
    announce(battle, id)?;
    Ok(true)
}

fn poison_tick(battle: &mut Battle, id: EffectId) -> BattleResult<()> {
    let subject = battle.require_subject(id)?;
    if battle.inform_handled(Hook::InformPoisonDamage, subject)? {
        return Ok(());
    }
    let amount = battle.fraction_of_max_hp(subject, 8);
    residual_damage(battle, id, amount)
}

fn toxic_tick(battle: &mut Battle, id: EffectId) -> BattleResult<()> {
    let subject = battle.require_subject(id)?;
    let record = battle.record_mut(id)?;
    record.data.counter = (record.data.counter + 1).min(TOXIC_COUNTER_CAP);
    let counter = record.data.counter as u32;
    if battle.inform_handled(Hook::InformPoisonDamage, subject)? {
        return Ok(());
    }
    let amount = (battle.max_hp(subject) * counter / 16).max(1);
    residual_damage(battle, id, amount)
}

/// The toxic counter starts over after a switch; the poison stays.
fn toxic_switch_out(battle: &mut Battle, id: EffectId) -> BattleResult<bool> {
    battle.record_mut(id)?.data.counter = 0;
    Ok(false)
}

// === Paralysis ===

fn paralysis_apply(battle: &mut Battle, id: EffectId) -> BattleResult<bool> {
    announce(battle, id)?;
    Ok(true)
}

fn paralysis_veto(battle: &mut Battle, id: EffectId, ctx: &ExecutionContext) -> BattleResult<bool> {
    let Some(subject) = own_overall_check(battle, id, ctx) else {
        return Ok(false);
    };
    if battle.rng.chance(0.75, "paralysis") {
        return Ok(false);
    }
    let pokemon = battle.name(subject);
    battle.print(BattleMessage::FullyParalyzed { pokemon });
    Ok(true)
}

fn paralysis_speed(battle: &Battle, id: EffectId, subject: CombatantId, stat: StatType) -> Option<Modifier> {
    if stat != StatType::Spe || battle.subject_of(id) != Some(subject) || battle.negates_paralysis_speed(subject) {
        return None;
    }
    Some(Modifier::stat(0.25, 0))
}

// === Sleep ===

fn sleep_apply(battle: &mut Battle, id: EffectId) -> BattleResult<bool> {
    if battle.record(id)?.data.turns <= 0 {
        let turns = battle.rng.range(1, 4, "sleep duration") as i32;
        battle.record_mut(id)?.data.turns = turns;
    }
    announce(battle, id)?;
    Ok(true)
}

fn sleep_veto(battle: &mut Battle, id: EffectId, ctx: &ExecutionContext) -> BattleResult<bool> {
    let Some(subject) = own_overall_check(battle, id, ctx) else {
        return Ok(false);
    };
    let elapsed = if battle.has_ability(subject, "Early Bird") { 2 } else { 1 };
    let record = battle.record_mut(id)?;
    record.data.turns -= elapsed;
    let turns = record.data.turns;
    let pokemon = battle.name(subject);
    if turns <= 0 {
        battle.detach(id)?;
        battle.print(BattleMessage::WokeUp { pokemon });
        return Ok(false);
    }
    if ctx.mv.name == "Sleep Talk" || ctx.mv.name == "Snore" {
        return Ok(false);
    }
    battle.print(BattleMessage::FastAsleep { pokemon });
    Ok(true)
}

// === Freeze ===

fn freeze_apply(battle: &mut Battle, id: EffectId) -> BattleResult<bool> {
    let subject = battle.require_subject(id)?;
    if battle.is_type(subject, PokemonType::Ice) {
        return Ok(false);
    }
    announce(battle, id)?;
    Ok(true)
}

fn thaw(battle: &mut Battle, id: EffectId, subject: CombatantId) -> BattleResult<()> {
    battle.detach(id)?;
    let pokemon = battle.name(subject);
    battle.print(BattleMessage::Thawed { pokemon });
    Ok(())
}

fn freeze_veto(battle: &mut Battle, id: EffectId, ctx: &ExecutionContext) -> BattleResult<bool> {
    let Some(subject) = own_overall_check(battle, id, ctx) else {
        return Ok(false);
    };
    if battle.rng.chance(0.2, "thaw") {
        thaw(battle, id, subject)?;
        return Ok(false);
    }
    let pokemon = battle.name(subject);
    battle.print(BattleMessage::FrozenSolid { pokemon });
    Ok(true)
}

fn freeze_damaged(battle: &mut Battle, id: EffectId, hit: &DamageRecord) -> BattleResult<()> {
    if hit.move_type == PokemonType::Fire {
        let subject = battle.require_subject(id)?;
        thaw(battle, id, subject)?;
    }
    Ok(())
}

// === Flinch ===

fn flinch_veto(battle: &mut Battle, id: EffectId, ctx: &ExecutionContext) -> BattleResult<bool> {
    let Some(subject) = own_overall_check(battle, id, ctx) else {
        return Ok(false);
    };
    let pokemon = battle.name(subject);
    battle.print(BattleMessage::Flinched { pokemon });
    Ok(true)
}

fn expire(battle: &mut Battle, id: EffectId) -> BattleResult<()> {
    battle.detach(id)?;
    Ok(())
}

// === Damage listener ===

fn remember_hit(battle: &mut Battle, id: EffectId, hit: &DamageRecord) -> BattleResult<()> {
    battle.record_mut(id)?.data.hits.push(*hit);
    Ok(())
}

fn forget_hits(battle: &mut Battle, id: EffectId) -> BattleResult<bool> {
    battle.record_mut(id)?.data.hits.clear();
    Ok(false)
}

/// Most recent hit `subject` took from an enemy, optionally restricted to
/// one move category. Hits from allies are skipped over and discarded.
pub fn pop_recent_damage(
    battle: &mut Battle,
    subject: CombatantId,
    category: Option<MoveCategory>,
) -> BattleResult<Option<DamageRecord>> {
    let Some(id) = battle.get_status(subject, "DamageListener") else {
        return Ok(None);
    };
    let party = battle.combatant(subject).party;
    let attacker_parties: Vec<(usize, usize)> = battle
        .record(id)?
        .data
        .hits
        .iter()
        .enumerate()
        .map(|(i, hit)| (i, battle.combatant(hit.attacker).party))
        .collect();
    let hits = &mut battle.record_mut(id)?.data.hits;
    for (index, attacker_party) in attacker_parties.into_iter().rev() {
        let hit = hits.remove(index);
        if category.is_some_and(|c| c != hit.category) {
            continue;
        }
        if attacker_party == party {
            return Ok(None);
        }
        return Ok(Some(hit));
    }
    Ok(None)
}

// === Stat stages ===

fn stat_change_apply(battle: &mut Battle, id: EffectId) -> BattleResult<bool> {
    let subject = battle.require_subject(id)?;
    let record = battle.record(id)?;
    let Some(stat) = record.data.stat else {
        return Err(EffectError::MissingData {
            name: record.name().to_string(),
            field: "stat".to_string(),
        }
        .into());
    };
    let requested = record.data.delta;
    let level = battle.stat_level(subject, stat);
    let actual = (level + requested).clamp(-6, 6) - level;
    let pokemon = battle.name(subject);
    if actual == 0 {
        battle.print(BattleMessage::StatUnchanged {
            pokemon,
            stat,
            rising: requested > 0,
        });
        return Ok(false);
    }
    battle.set_stat_level(subject, stat, level + actual);
    battle.record_mut(id)?.data.delta = actual;
    battle.print(BattleMessage::StatChanged {
        pokemon,
        stat,
        delta: actual,
    });
    Ok(true)
}

fn stat_change_unapply(battle: &mut Battle, id: EffectId) -> BattleResult<()> {
    let subject = battle.require_subject(id)?;
    let record = battle.record(id)?;
    if let Some(stat) = record.data.stat {
        let delta = record.data.delta;
        let level = battle.stat_level(subject, stat);
        battle.set_stat_level(subject, stat, level - delta);
    }
    Ok(())
}

// === Charge turns ===

fn charge_blocks_switch(battle: &Battle, id: EffectId, subject: CombatantId) -> bool {
    battle.subject_of(id) == Some(subject)
}

/// Semi-invulnerability: moves aimed at the charging combatant miss unless
/// they are on its vulnerable list or cannot miss.
fn charge_evades(battle: &mut Battle, id: EffectId, ctx: &ExecutionContext) -> BattleResult<bool> {
    let subject = battle.require_subject(id)?;
    let record = battle.record(id)?;
    if !record.data.invulnerable || ctx.target != Some(subject) || ctx.user == subject {
        return Ok(false);
    }
    if record.data.vulnerable.iter().any(|name| *name == ctx.mv.name) || ctx.mv.accuracy.is_none() {
        return Ok(false);
    }
    let pokemon = battle.name(subject);
    battle.print(BattleMessage::AvoidedAttack { pokemon });
    Ok(true)
}

fn charge_finished(battle: &mut Battle, id: EffectId, report: &ExecutionReport) -> BattleResult<()> {
    let subject = battle.require_subject(id)?;
    if report.user != subject {
        return Ok(());
    }
    let record = battle.record_mut(id)?;
    record.data.turns -= 1;
    if record.data.turns <= 0 {
        battle.detach(id)?;
    }
    Ok(())
}

// === Substitute ===

fn substitute_apply(battle: &mut Battle, id: EffectId) -> BattleResult<bool> {
    let subject = battle.require_subject(id)?;
    let cost = battle.max_hp(subject) / 4;
    if cost == 0 || battle.hp(subject) <= cost {
        return Ok(false);
    }
    battle.record_mut(id)?.data.counter = cost as i32;
    battle.change_hp(subject, -(cost as i32), HpChange::Indirect)?;
    announce(battle, id)?;
    Ok(true)
}

/// Keeps statuses other combatants try to inflict from getting through.
fn substitute_shields(
    battle: &Battle,
    id: EffectId,
    request: &StatusRequest,
    incoming: EffectPrototype,
) -> Option<EffectPrototype> {
    let subject = battle.subject_of(id)?;
    let from_other = request.inducer.is_some_and(|inducer| inducer != subject);
    let shielded = incoming.lock == EffectLock::SpecialStatus || incoming.name == "StatChange" || incoming.name == "Flinch";
    if request.subject == subject && from_other && shielded {
        return None;
    }
    Some(incoming)
}

/// Attaches a charge record to `user` for a move that fires next turn.
pub fn begin_charge(
    battle: &mut Battle,
    user: CombatantId,
    data: EffectData,
) -> BattleResult<AttachOutcome> {
    let prototype = battle.registry.get("ChargeMove")?;
    battle.attach_with(EffectOwner::Combatant(user), prototype, Some(user), data)
}

pub fn register(registry: &mut EffectRegistry) -> EffectResult<()> {
    registry.define(EffectBehavior {
        apply: Some(burn_apply),
        tier: Some(RESIDUAL_TIER),
        subtier: 5,
        tick: Some(burn_tick),
        damage_modifier: Some(burn_attack),
        ..special_status("Burn")
    })?;
    registry.define(EffectBehavior {
        apply: Some(poison_apply),
        tier: Some(RESIDUAL_TIER),
        subtier: 4,
        tick: Some(poison_tick),
        ..special_status("Poison")
    })?;
    registry.define(EffectBehavior {
        apply: Some(poison_apply),
        tier: Some(RESIDUAL_TIER),
        subtier: 4,
        tick: Some(toxic_tick),
        switch_out: Some(toxic_switch_out),
        ..special_status("Toxic")
    })?;
    registry.define(EffectBehavior {
        apply: Some(paralysis_apply),
        veto_execution: Some(paralysis_veto),
        stat_modifier: Some(paralysis_speed),
        ..special_status("Paralysis")
    })?;
    registry.define(EffectBehavior {
        apply: Some(sleep_apply),
        veto_execution: Some(sleep_veto),
        ..special_status("Sleep")
    })?;
    registry.define(EffectBehavior {
        apply: Some(freeze_apply),
        veto_execution: Some(freeze_veto),
        inform_damaged: Some(freeze_damaged),
        ..special_status("Freeze")
    })?;
    registry.define(EffectBehavior {
        tier: Some(0),
        veto_execution: Some(flinch_veto),
        end_tick: Some(expire),
        ..EffectBehavior::status("Flinch")
    })?;
    registry.define(EffectBehavior {
        volatile: false,
        inform_damaged: Some(remember_hit),
        switch_out: Some(forget_hits),
        ..EffectBehavior::status("DamageListener")
    })?;
    registry.define(EffectBehavior {
        singleton: false,
        passable: true,
        apply: Some(stat_change_apply),
        unapply: Some(stat_change_unapply),
        ..EffectBehavior::status("StatChange")
    })?;
    registry.define(EffectBehavior {
        veto_switch: Some(charge_blocks_switch),
        veto_execution: Some(charge_evades),
        inform_finished_execution: Some(charge_finished),
        ..EffectBehavior::status("ChargeMove")
    })?;
    registry.define(EffectBehavior {
        passable: true,
        ..EffectBehavior::status("AbilitySuppression")
    })?;
    registry.define(EffectBehavior {
        passable: true,
        apply: Some(substitute_apply),
        transform_status: Some(substitute_shields),
        ..EffectBehavior::status("Substitute")
    })?;
    Ok(())
}
