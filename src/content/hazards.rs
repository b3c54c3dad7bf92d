//! Entry hazards. Each hazard is a single field record that counts its
//! layers per party and acts on every combatant entering that party's side.

use schema::PokemonType;

use crate::battle::combatant::CombatantId;
use crate::battle::messages::BattleMessage;
use crate::battle::state::Battle;
use crate::effects::behavior::{EffectBehavior, HpChange};
use crate::effects::record::{EffectId, EffectOwner};
use crate::effects::registry::EffectRegistry;
use crate::errors::{BattleResult, EffectResult};

pub const SPIKES: &str = "Spikes";
pub const TOXIC_SPIKES: &str = "Toxic Spikes";
pub const STEALTH_ROCK: &str = "Stealth Rock";

fn max_layers(hazard: &str) -> u8 {
    match hazard {
        SPIKES => 3,
        TOXIC_SPIKES => 2,
        _ => 1,
    }
}

/// Adds a layer of `hazard` to `party`'s side. Fails once the hazard is at
/// its maximum number of layers.
pub fn lay_hazard(battle: &mut Battle, user: Option<CombatantId>, hazard: &'static str, party: usize) -> BattleResult<bool> {
    let id = match battle.find(EffectOwner::Field, hazard) {
        Some(id) => id,
        None => {
            let prototype = battle.registry.get(hazard)?;
            match battle.attach(EffectOwner::Field, prototype, user)?.id() {
                Some(id) => id,
                None => return Ok(false),
            }
        }
    };
    let layers = &mut battle.record_mut(id)?.data.layers[party];
    if *layers >= max_layers(hazard) {
        return Ok(false);
    }
    *layers += 1;
    battle.print(BattleMessage::HazardLaid { party, hazard });
    Ok(true)
}

/// Removes every hazard from `party`'s side.
pub fn clear_hazards(battle: &mut Battle, party: usize) -> BattleResult<()> {
    for hazard in [SPIKES, TOXIC_SPIKES, STEALTH_ROCK] {
        if let Some(id) = battle.find(EffectOwner::Field, hazard) {
            battle.record_mut(id)?.data.layers[party] = 0;
        }
    }
    Ok(())
}

pub fn hazard_layers(battle: &Battle, hazard: &str, party: usize) -> u8 {
    battle
        .find(EffectOwner::Field, hazard)
        .and_then(|id| battle.effect(id))
        .map_or(0, |r| r.data.layers[party])
}

/// Layers on the entrant's side, or `None` if there is nothing to do.
fn layers_for(battle: &Battle, id: EffectId, entrant: CombatantId) -> Option<u8> {
    let party = battle.combatant(entrant).party;
    let layers = battle.effect(id)?.data.layers[party];
    (layers > 0).then_some(layers)
}

fn grounded(battle: &Battle, entrant: CombatantId) -> bool {
    battle.effectiveness(PokemonType::Ground, entrant) != 0.0
}

fn hazard_damage(battle: &mut Battle, entrant: CombatantId, hazard: &'static str, amount: u32) -> BattleResult<()> {
    let pokemon = battle.name(entrant);
    battle.inflict_damage(entrant, amount.max(1), HpChange::Indirect, |amount| {
        Some(BattleMessage::HazardDamage { pokemon, hazard, amount })
    })?;
    Ok(())
}

fn spikes(battle: &mut Battle, id: EffectId, entrant: CombatantId) -> BattleResult<()> {
    let Some(layers) = layers_for(battle, id, entrant) else {
        return Ok(());
    };
    if !grounded(battle, entrant) {
        return Ok(());
    }
    // 1/8, 3/16, 1/4
    let amount = battle.max_hp(entrant) * (u32::from(layers) + 1) / 16;
    hazard_damage(battle, entrant, SPIKES, amount)
}

fn toxic_spikes(battle: &mut Battle, id: EffectId, entrant: CombatantId) -> BattleResult<()> {
    let Some(layers) = layers_for(battle, id, entrant) else {
        return Ok(());
    };
    if !grounded(battle, entrant)
        || battle.is_type(entrant, PokemonType::Steel)
        || battle.get_status(entrant, "Substitute").is_some()
    {
        return Ok(());
    }
    if battle.is_type(entrant, PokemonType::Poison) {
        let party = battle.combatant(entrant).party;
        battle.record_mut(id)?.data.layers[party] = 0;
        let pokemon = battle.name(entrant);
        battle.print(BattleMessage::HazardAbsorbed {
            pokemon,
            hazard: TOXIC_SPIKES,
        });
        return Ok(());
    }
    let status = if layers == 1 { "Poison" } else { "Toxic" };
    battle.apply_status(entrant, None, status)?;
    Ok(())
}

fn stealth_rock(battle: &mut Battle, id: EffectId, entrant: CombatantId) -> BattleResult<()> {
    if layers_for(battle, id, entrant).is_none() {
        return Ok(());
    }
    let factor = battle.effectiveness(PokemonType::Rock, entrant);
    let amount = (f64::from(battle.max_hp(entrant)) * factor / 8.0).floor() as u32;
    hazard_damage(battle, entrant, STEALTH_ROCK, amount)
}

pub fn register(registry: &mut EffectRegistry) -> EffectResult<()> {
    registry.define(EffectBehavior {
        switch_in: Some(spikes),
        ..EffectBehavior::controller(SPIKES)
    })?;
    registry.define(EffectBehavior {
        switch_in: Some(toxic_spikes),
        ..EffectBehavior::controller(TOXIC_SPIKES)
    })?;
    registry.define(EffectBehavior {
        switch_in: Some(stealth_rock),
        ..EffectBehavior::controller(STEALTH_ROCK)
    })?;
    Ok(())
}
