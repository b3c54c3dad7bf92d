use std::sync::Arc;

use schema::PokemonType;
use tracing::{debug, trace};

use crate::battle::combatant::{Combatant, CombatantId, Party};
use crate::battle::messages::{BattleMessage, MessageLog};
use crate::battle::rng::BattleRng;
use crate::config::BattleConfig;
use crate::effects::behavior::HpChange;
use crate::effects::container::{AttachOutcome, EffectContainer};
use crate::effects::record::{EffectCategory, EffectData, EffectId, EffectLock, EffectOwner, EffectRecord};
use crate::effects::registry::EffectRegistry;
use crate::errors::{ActionError, BattleResult, BattleStateError};

/// The shared field: both parties, their combatants, the effect arena and
/// every field-level effect, the message log and the random source.
#[derive(Debug)]
pub struct Battle {
    pub config: BattleConfig,
    pub registry: Arc<EffectRegistry>,
    pub combatants: Vec<Combatant>,
    pub parties: [Party; 2],
    /// Weather, hazards, clauses and other effects owned by no combatant.
    pub field: EffectContainer,
    /// Arena of every record ever attached, indexed by `EffectId`.
    pub effects: Vec<Option<EffectRecord>>,
    pub log: MessageLog,
    pub rng: BattleRng,
    pub turn_number: u32,
    pub(crate) next_seq: u64,
    pub(crate) dispatch_depth: u32,
    silent: u32,
    /// User of the move currently executing, if any.
    pub(crate) executing: Option<CombatantId>,
}

impl Battle {
    /// Builds a battle with the first member of each team in front. Each
    /// combatant's ability and item are attached, along with the clauses
    /// named in `config`. Switch-in effects run in `start`.
    pub fn new(config: BattleConfig, registry: Arc<EffectRegistry>, teams: [Vec<Combatant>; 2]) -> BattleResult<Self> {
        for (party, team) in teams.iter().enumerate() {
            if team.is_empty() || team.len() > config.party_size {
                return Err(BattleStateError::InconsistentState(format!(
                    "party {} has {} members, expected 1..={}",
                    party,
                    team.len(),
                    config.party_size
                ))
                .into());
            }
        }

        let rng = match config.seed {
            Some(seed) => BattleRng::seeded(seed),
            None => BattleRng::from_os_rng(),
        };
        let mut battle = Battle {
            config,
            registry,
            combatants: Vec::new(),
            parties: [Party::default(), Party::default()],
            field: EffectContainer::new(),
            effects: Vec::new(),
            log: MessageLog::new(),
            rng,
            turn_number: 0,
            next_seq: 0,
            dispatch_depth: 0,
            silent: 0,
            executing: None,
        };

        for (party, team) in teams.into_iter().enumerate() {
            for mut combatant in team {
                let id = CombatantId(battle.combatants.len());
                combatant.id = id;
                combatant.party = party;
                battle.parties[party].members.push(id);
                battle.combatants.push(combatant);
            }
            battle.parties[party].active = battle.parties[party].members.first().copied();
        }

        for index in 0..battle.combatants.len() {
            let id = CombatantId(index);
            let owner = EffectOwner::Combatant(id);
            let listener = battle.registry.get("DamageListener")?;
            battle.attach(owner, listener, None)?;
            if let Some(ability) = battle.combatants[index].ability.clone() {
                let prototype = battle.registry.get_in(EffectCategory::Ability, &ability)?;
                battle.attach(owner, prototype, Some(id))?;
            }
            if let Some(item) = battle.combatants[index].item.clone() {
                let prototype = battle.registry.get_in(EffectCategory::Item, &item)?;
                battle.attach(owner, prototype, Some(id))?;
            }
        }

        for clause in battle.config.clauses.clone() {
            let prototype = battle.registry.get_in(EffectCategory::Clause, &clause)?;
            battle.attach(EffectOwner::Field, prototype, None)?;
        }

        debug!(combatants = battle.combatants.len(), "battle created");
        Ok(battle)
    }

    /// Replaces the random source, typically with a scripted one.
    pub fn with_rng(mut self, rng: BattleRng) -> Self {
        self.rng = rng;
        self
    }

    /// Announces the leads and runs their switch-in effects, fastest first.
    pub fn start(&mut self) -> BattleResult<()> {
        let leads = self.speed_ranked_actives();
        for party in 0..2 {
            if let Some(lead) = self.parties[party].active {
                let pokemon = self.name(lead);
                self.print(BattleMessage::SwitchedIn { party, pokemon });
            }
        }
        for clause in self.config.clauses.clone() {
            let clause = self.registry.get_in(EffectCategory::Clause, &clause)?.name;
            self.print(BattleMessage::ClauseActivated { clause });
        }
        for lead in leads {
            self.run_switch_in(lead)?;
        }
        Ok(())
    }

    // === Roster ===

    pub fn combatant(&self, id: CombatantId) -> &Combatant {
        &self.combatants[id.0]
    }

    pub fn combatant_mut(&mut self, id: CombatantId) -> &mut Combatant {
        &mut self.combatants[id.0]
    }

    /// Like `combatant`, for ids that come from outside the battle.
    pub fn get_combatant(&self, id: CombatantId) -> BattleResult<&Combatant> {
        self.combatants
            .get(id.0)
            .ok_or_else(|| BattleStateError::InvalidCombatant(id).into())
    }

    pub fn name(&self, id: CombatantId) -> String {
        self.combatants[id.0].name.clone()
    }

    /// Singles only: `slot` 0 is the lone active position of a party.
    pub fn active_combatant(&self, party: usize, slot: usize) -> Option<CombatantId> {
        if slot != 0 {
            return None;
        }
        self.parties.get(party).and_then(|p| p.active)
    }

    pub fn is_on_field(&self, id: CombatantId) -> bool {
        self.parties[self.combatants[id.0].party].active == Some(id)
    }

    /// Active combatants that have not fainted, in party order.
    pub fn active_combatants(&self) -> Vec<CombatantId> {
        self.parties
            .iter()
            .filter_map(|p| p.active)
            .filter(|id| !self.combatants[id.0].is_fainted())
            .collect()
    }

    pub fn opponent_of(&self, id: CombatantId) -> Option<CombatantId> {
        let party = self.combatants[id.0].party;
        self.parties[1 - party].active
    }

    /// The party left standing once every member of the other has fainted.
    pub fn winner(&self) -> Option<usize> {
        let standing: Vec<bool> = self
            .parties
            .iter()
            .map(|p| p.members.iter().any(|id| !self.combatants[id.0].is_fainted()))
            .collect();
        match (standing[0], standing[1]) {
            (true, false) => Some(0),
            (false, true) => Some(1),
            _ => None,
        }
    }

    pub fn is_over(&self) -> bool {
        self.parties
            .iter()
            .any(|p| p.members.iter().all(|id| self.combatants[id.0].is_fainted()))
    }

    // === Messages ===

    /// Appends to the message log unless a silent calculation is running.
    pub fn print(&mut self, message: BattleMessage) {
        if self.silent > 0 {
            trace!(?message, "suppressed during silent calculation");
            return;
        }
        self.log.push(message);
    }

    /// Runs `f` with printing suppressed.
    pub fn silently<T>(&mut self, f: impl FnOnce(&mut Battle) -> T) -> T {
        self.silent += 1;
        let result = f(self);
        self.silent -= 1;
        result
    }

    // === Entity surface ===

    pub fn hp(&self, id: CombatantId) -> u32 {
        self.combatants[id.0].hp
    }

    pub fn max_hp(&self, id: CombatantId) -> u32 {
        self.combatants[id.0].max_hp()
    }

    pub fn is_fainted(&self, id: CombatantId) -> bool {
        self.combatants[id.0].is_fainted()
    }

    pub fn is_type(&self, id: CombatantId, pokemon_type: PokemonType) -> bool {
        self.combatants[id.0].is_type(pokemon_type)
    }

    /// `max_hp / denominator`, at least 1.
    pub fn fraction_of_max_hp(&self, id: CombatantId, denominator: u32) -> u32 {
        (self.max_hp(id) / denominator).max(1)
    }

    /// Changes HP by `delta` after the health-change pipeline and returns the
    /// change actually made. Reaching 0 HP faints the combatant; any other
    /// change gives held items a chance to trigger.
    pub fn change_hp(&mut self, id: CombatantId, delta: i32, kind: HpChange) -> BattleResult<i32> {
        let applied = self.clamp_hp_delta(id, self.transform_health_change(id, delta, kind));
        self.commit_hp(id, applied)?;
        Ok(applied)
    }

    /// Deals `amount` damage, printing `message(actual)` first when any
    /// damage remains after the health-change pipeline.
    pub fn inflict_damage(
        &mut self,
        id: CombatantId,
        amount: u32,
        kind: HpChange,
        message: impl FnOnce(u32) -> Option<BattleMessage>,
    ) -> BattleResult<u32> {
        let applied = self.clamp_hp_delta(id, self.transform_health_change(id, -(amount as i32), kind));
        if applied == 0 {
            return Ok(0);
        }
        let dealt = applied.unsigned_abs();
        if let Some(message) = message(dealt) {
            self.print(message);
        }
        self.commit_hp(id, applied)?;
        Ok(dealt)
    }

    /// Restores up to `amount` HP, printing `message(actual)` first. Nothing
    /// is printed when the combatant is already at full health.
    pub fn restore_hp(
        &mut self,
        id: CombatantId,
        amount: u32,
        message: impl FnOnce(u32) -> Option<BattleMessage>,
    ) -> BattleResult<u32> {
        let applied = self.clamp_hp_delta(id, self.transform_health_change(id, amount as i32, HpChange::Indirect));
        if applied <= 0 {
            return Ok(0);
        }
        let healed = applied as u32;
        if let Some(message) = message(healed) {
            self.print(message);
        }
        self.commit_hp(id, applied)?;
        Ok(healed)
    }

    fn clamp_hp_delta(&self, id: CombatantId, delta: i32) -> i32 {
        let combatant = &self.combatants[id.0];
        if combatant.is_fainted() {
            return 0;
        }
        let hp = combatant.hp as i32;
        let max = combatant.max_hp() as i32;
        (hp + delta).clamp(0, max) - hp
    }

    fn commit_hp(&mut self, id: CombatantId, applied: i32) -> BattleResult<()> {
        if applied == 0 {
            return Ok(());
        }
        let combatant = &mut self.combatants[id.0];
        combatant.hp = (combatant.hp as i32 + applied) as u32;
        if combatant.hp == 0 {
            return self.faint(id);
        }
        self.check_items(id)
    }

    /// Every record on a fainted combatant is destroyed. Inside a dispatch
    /// pass the records are swept once the outermost pass ends.
    fn faint(&mut self, id: CombatantId) -> BattleResult<()> {
        let pokemon = self.name(id);
        self.print(BattleMessage::Fainted { pokemon });
        let ids = self.container(EffectOwner::Combatant(id)).ids().to_vec();
        debug!(combatant = ?id, effects = ids.len(), "detaching effects of fainted combatant");
        self.in_pass(|battle| {
            for effect in ids {
                battle.detach(effect)?;
            }
            Ok(())
        })
    }

    pub fn get_status(&self, id: CombatantId, name: &str) -> Option<EffectId> {
        self.find(EffectOwner::Combatant(id), name)
    }

    /// The burn/poison/paralysis/sleep/freeze record, if any.
    pub fn special_status(&self, id: CombatantId) -> Option<EffectId> {
        self.find_lock(EffectOwner::Combatant(id), EffectLock::SpecialStatus)
    }

    pub fn has_special_status(&self, id: CombatantId) -> bool {
        self.special_status(id).is_some()
    }

    /// Attaches the registry effect `name` to `subject`. Held items get a
    /// chance to react to a newly applied status.
    pub fn apply_status(&mut self, subject: CombatantId, inducer: Option<CombatantId>, name: &str) -> BattleResult<AttachOutcome> {
        self.apply_status_with(subject, inducer, name, EffectData::default())
    }

    pub fn apply_status_with(
        &mut self,
        subject: CombatantId,
        inducer: Option<CombatantId>,
        name: &str,
        data: EffectData,
    ) -> BattleResult<AttachOutcome> {
        let prototype = self.registry.get(name)?;
        let outcome = self.attach_with(EffectOwner::Combatant(subject), prototype, inducer, data)?;
        if outcome.is_applied() {
            self.check_items(subject)?;
        }
        Ok(outcome)
    }

    pub fn remove_status(&mut self, id: EffectId) -> BattleResult<bool> {
        self.detach(id)
    }

    /// Whether `id` carries an ability named `name` that currently has effect.
    pub fn has_ability(&self, id: CombatantId, name: &str) -> bool {
        self.find(EffectOwner::Combatant(id), name)
            .is_some_and(|e| self.effect(e).is_some_and(|r| r.category() == EffectCategory::Ability) && self.is_effect_active(e))
    }

    pub fn has_item(&self, id: CombatantId, name: &str) -> bool {
        self.find(EffectOwner::Combatant(id), name)
            .is_some_and(|e| self.effect(e).is_some_and(|r| r.category() == EffectCategory::Item))
    }

    // === Switching ===

    /// Removes `id` from the field. Volatile effects are detached unless
    /// their switch-out hook says otherwise, and stat stages reset.
    pub fn switch_out(&mut self, id: CombatantId) -> BattleResult<()> {
        let owner = EffectOwner::Combatant(id);
        self.in_pass(|battle| {
            let ids = battle.container(owner).ids().to_vec();
            for effect in ids {
                let Some(record) = battle.effect(effect) else { continue };
                if record.is_removable() {
                    continue;
                }
                let (hook, volatile) = (record.behavior.switch_out, record.behavior.volatile);
                let remove = match hook {
                    Some(f) => f(battle, effect)?,
                    None => volatile,
                };
                if remove {
                    battle.detach(effect)?;
                }
            }
            Ok(())
        })?;
        self.combatants[id.0].reset_stat_levels();
        let party = self.combatants[id.0].party;
        self.parties[party].active = None;
        let pokemon = self.name(id);
        self.print(BattleMessage::Withdrew { party, pokemon });
        Ok(())
    }

    /// Sends in party member `member` and runs entry effects.
    pub fn switch_in(&mut self, party: usize, member: usize) -> BattleResult<()> {
        let Some(slots) = self.parties.get(party) else {
            return Err(BattleStateError::InvalidPartyIndex(party).into());
        };
        let Some(&id) = slots.members.get(member) else {
            return Err(ActionError::InvalidMemberIndex(member).into());
        };
        let current = slots.active;
        if self.combatants[id.0].is_fainted() || current == Some(id) {
            return Err(ActionError::InvalidMemberIndex(member).into());
        }
        if let Some(current) = current {
            if !self.is_fainted(current) {
                self.switch_out(current)?;
            }
        }
        self.parties[party].active = Some(id);
        let pokemon = self.name(id);
        self.print(BattleMessage::SwitchedIn { party, pokemon });
        self.run_switch_in(id)
    }

    /// Switch-in hooks of the entrant's own effects, then of field effects.
    fn run_switch_in(&mut self, entrant: CombatantId) -> BattleResult<()> {
        self.in_pass(|battle| {
            let mut ids = battle.container(EffectOwner::Combatant(entrant)).ids().to_vec();
            ids.extend_from_slice(battle.field.ids());
            for effect in ids {
                if battle.is_fainted(entrant) {
                    break;
                }
                if !battle.is_effect_active(effect) {
                    continue;
                }
                if let Some(f) = battle.effect(effect).and_then(|r| r.behavior.switch_in) {
                    f(battle, effect, entrant)?;
                }
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::tests::common::{create_test_battle, standard_registry, TestCombatantBuilder};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unknown_combatant_ids_are_reported() {
        let battle = create_test_battle(
            standard_registry(),
            TestCombatantBuilder::new("Alakazam", PokemonType::Psychic).build(),
            TestCombatantBuilder::new("Machamp", PokemonType::Fighting).build(),
        );
        assert_eq!(battle.get_combatant(CombatantId(1)).map(|c| c.name.as_str()), Ok("Machamp"));
        assert_eq!(
            battle.get_combatant(CombatantId(7)).unwrap_err(),
            BattleStateError::InvalidCombatant(CombatantId(7)).into()
        );
    }

    #[test]
    fn test_oversized_party_is_rejected() {
        let config = BattleConfig {
            party_size: 1,
            ..BattleConfig::default()
        };
        let team = |name: &str| TestCombatantBuilder::new(name, PokemonType::Normal).build();
        let result = Battle::new(config, standard_registry(), [vec![team("Eevee"), team("Ditto")], vec![team("Snorlax")]]);
        assert!(matches!(
            result,
            Err(crate::errors::BattleEngineError::BattleState(BattleStateError::InconsistentState(_)))
        ));
    }

    #[test]
    fn test_start_announces_leads_and_clauses() {
        let mut battle = Battle::new(
            BattleConfig::default().with_clause("Classic Sleep Clause"),
            standard_registry(),
            [
                vec![TestCombatantBuilder::new("Eevee", PokemonType::Normal).build()],
                vec![TestCombatantBuilder::new("Snorlax", PokemonType::Normal).build()],
            ],
        )
        .unwrap();

        battle.start().unwrap();

        assert_eq!(
            battle.log.messages(),
            &[
                BattleMessage::SwitchedIn {
                    party: 0,
                    pokemon: "Eevee".to_string(),
                },
                BattleMessage::SwitchedIn {
                    party: 1,
                    pokemon: "Snorlax".to_string(),
                },
                BattleMessage::ClauseActivated {
                    clause: "Classic Sleep Clause",
                },
            ]
        );
    }
}
