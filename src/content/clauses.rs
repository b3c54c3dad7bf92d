//! Format clauses. Clauses live on the field and are named in the battle
//! configuration.

use crate::battle::state::Battle;
use crate::effects::behavior::{EffectBehavior, StatusRequest};
use crate::effects::record::{EffectId, EffectOwner};
use crate::effects::registry::{EffectPrototype, EffectRegistry};
use crate::errors::EffectResult;

const CLASSIC_CLAUSES: [(&str, &str); 2] = [("Classic Sleep Clause", "Sleep"), ("Classic Freeze Clause", "Freeze")];

/// A clause that stops a party from having more than one member afflicted
/// with a given status by the opposing party at a time. Self-inflicted
/// statuses do not count.
pub fn make_classic_effect_clause(name: &'static str) -> EffectBehavior {
    EffectBehavior {
        transform_status: Some(classic_effect_clause),
        ..EffectBehavior::clause(name)
    }
}

fn clause_status(name: &str) -> Option<&'static str> {
    CLASSIC_CLAUSES
        .iter()
        .find(|(clause, _)| *clause == name)
        .map(|(_, status)| *status)
}

fn classic_effect_clause(
    battle: &Battle,
    id: EffectId,
    request: &StatusRequest,
    incoming: EffectPrototype,
) -> Option<EffectPrototype> {
    let Some(status) = battle.effect(id).and_then(|r| clause_status(r.name())) else {
        return Some(incoming);
    };
    if incoming.name != status {
        return Some(incoming);
    }
    let party = battle.combatant(request.subject).party;
    let already_inflicted = battle.parties[party].members.iter().any(|member| {
        !battle.is_fainted(*member)
            && battle
                .find(EffectOwner::Combatant(*member), status)
                .and_then(|e| battle.effect(e))
                .and_then(|r| r.inducer)
                .is_some_and(|inducer| battle.combatant(inducer).party != party)
    });
    if already_inflicted {
        None
    } else {
        Some(incoming)
    }
}

pub fn register(registry: &mut EffectRegistry) -> EffectResult<()> {
    for (clause, _) in CLASSIC_CLAUSES {
        registry.define(make_classic_effect_clause(clause))?;
    }
    Ok(())
}
