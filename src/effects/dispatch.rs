//! Hook dispatch: gathers the records taking part in a hook, orders them,
//! invokes the ones that implement it and combines their answers.
//!
//! Candidate order is total: entity rank, then category rank (abilities,
//! items, statuses, global effects, controllers, clauses), then attachment
//! sequence. Entity rank is unmodified speed, fastest first, ties broken by
//! roster position, with the field last. Damage modifiers instead rank the
//! user, then the target, then the remaining combatants, then the field.

use strum::{EnumIter, IntoStaticStr};
use tracing::{debug, trace};

use crate::battle::combatant::CombatantId;
use crate::battle::state::Battle;
use crate::content::weather::Weather;
use crate::effects::behavior::{
    DamageContext, EffectBehavior, ExecutionContext, ExecutionReport, HpChange, InformHandledFn, StatLevelRequest,
    StatusRequest,
};
use crate::effects::modifiers::{sort_modifiers, Modifier};
use crate::effects::record::{DamageRecord, EffectCategory, EffectId, EffectOwner, EffectState};
use crate::effects::registry::EffectPrototype;
use crate::errors::BattleResult;
use schema::{PokemonType, StatType};

/// Every extension point an effect may implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
pub enum Hook {
    Apply,
    Unapply,
    SwitchIn,
    SwitchOut,
    BeginTick,
    Tick,
    EndTick,
    InformApplied,
    InformFinished,
    VetoExecution,
    VetoSelection,
    VetoSwitch,
    TransformStatus,
    TransformEffectiveness,
    TransformHealthChange,
    TransformStatLevel,
    DamageModifier,
    StatModifier,
    CriticalModifier,
    InherentPriority,
    SpeedSort,
    SuppressesWeather,
    NegatesParalysisSpeed,
    InformDamaged,
    InformFinishedExecution,
    InformLostItem,
    InformPoisonDamage,
    InformBurnDamage,
    InformSandDamage,
    InformHailDamage,
    InformWeatherHealing,
    InformApplyWeather,
    ItemCondition,
    ItemUse,
}

/// How the answers of several implementing records are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combination {
    /// Invoked on one record by the engine itself
    Lifecycle,
    /// First `true` wins and stops the pass
    Veto,
    /// Each record receives the previous record's output
    Transform,
    /// Contributions collected and sorted by (slot, priority)
    ModifierChain,
    Sum,
    LargestMagnitude,
    FirstOpinion,
    BooleanOr,
    /// Every record is told, in order
    Broadcast,
    /// Like `Broadcast`, but `true` stops the pass and the caller's default
    Handled,
}

/// Which containers take part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Itself,
    AllActive,
    DamageParticipants,
    Subject,
}

impl Hook {
    pub fn combination(self) -> Combination {
        use Hook::*;
        match self {
            Apply | Unapply | SwitchIn | SwitchOut | BeginTick | Tick | EndTick | InformApplied | InformFinished => {
                Combination::Lifecycle
            }
            VetoExecution | VetoSelection | VetoSwitch => Combination::Veto,
            TransformStatus | TransformEffectiveness | TransformHealthChange | TransformStatLevel => {
                Combination::Transform
            }
            DamageModifier | StatModifier => Combination::ModifierChain,
            CriticalModifier => Combination::Sum,
            InherentPriority => Combination::LargestMagnitude,
            SpeedSort | InformApplyWeather => Combination::FirstOpinion,
            SuppressesWeather | NegatesParalysisSpeed => Combination::BooleanOr,
            InformDamaged | InformFinishedExecution | InformLostItem | ItemCondition | ItemUse => Combination::Broadcast,
            InformPoisonDamage | InformBurnDamage | InformSandDamage | InformHailDamage | InformWeatherHealing => {
                Combination::Handled
            }
        }
    }

    pub fn scope(self) -> Scope {
        use Hook::*;
        match self.combination() {
            Combination::Lifecycle => Scope::Itself,
            _ => match self {
                DamageModifier => Scope::DamageParticipants,
                TransformHealthChange | CriticalModifier | InherentPriority | NegatesParalysisSpeed | InformDamaged
                | InformLostItem | InformPoisonDamage | InformBurnDamage | InformSandDamage | InformHailDamage
                | InformWeatherHealing | InformApplyWeather | ItemCondition | ItemUse => Scope::Subject,
                _ => Scope::AllActive,
            },
        }
    }

    pub fn implemented_by(self, b: &EffectBehavior) -> bool {
        use Hook::*;
        match self {
            Apply => b.apply.is_some(),
            Unapply => b.unapply.is_some(),
            SwitchIn => b.switch_in.is_some(),
            SwitchOut => b.switch_out.is_some(),
            BeginTick => b.begin_tick.is_some(),
            Tick => b.tick.is_some(),
            EndTick => b.end_tick.is_some(),
            InformApplied => b.inform_applied.is_some(),
            InformFinished => b.inform_finished.is_some(),
            VetoExecution => b.veto_execution.is_some(),
            VetoSelection => b.veto_selection.is_some(),
            VetoSwitch => b.veto_switch.is_some(),
            TransformStatus => b.transform_status.is_some(),
            TransformEffectiveness => b.transform_effectiveness.is_some(),
            TransformHealthChange => b.transform_health_change.is_some(),
            TransformStatLevel => b.transform_stat_level.is_some(),
            DamageModifier => b.damage_modifier.is_some(),
            StatModifier => b.stat_modifier.is_some(),
            CriticalModifier => b.critical_modifier.is_some(),
            InherentPriority => b.inherent_priority.is_some(),
            SpeedSort => b.speed_sort.is_some(),
            SuppressesWeather => b.suppresses_weather.is_some(),
            NegatesParalysisSpeed => b.negates_paralysis_speed.is_some(),
            InformDamaged => b.inform_damaged.is_some(),
            InformFinishedExecution => b.inform_finished_execution.is_some(),
            InformLostItem => b.inform_lost_item.is_some(),
            InformPoisonDamage => b.inform_poison_damage.is_some(),
            InformBurnDamage => b.inform_burn_damage.is_some(),
            InformSandDamage => b.inform_sand_damage.is_some(),
            InformHailDamage => b.inform_hail_damage.is_some(),
            InformWeatherHealing => b.inform_weather_healing.is_some(),
            InformApplyWeather => b.inform_apply_weather.is_some(),
            ItemCondition => b.item_condition.is_some(),
            ItemUse => b.item_use.is_some(),
        }
    }

    fn handled_fn(self, b: &EffectBehavior) -> Option<InformHandledFn> {
        match self {
            Hook::InformPoisonDamage => b.inform_poison_damage,
            Hook::InformBurnDamage => b.inform_burn_damage,
            Hook::InformSandDamage => b.inform_sand_damage,
            Hook::InformHailDamage => b.inform_hail_damage,
            _ => None,
        }
    }
}

impl Battle {
    /// Runs `f` as one dispatch pass. Records detached during the pass stay
    /// in place, marked removable, until the outermost pass ends.
    pub fn in_pass<T>(&mut self, f: impl FnOnce(&mut Battle) -> BattleResult<T>) -> BattleResult<T> {
        self.dispatch_depth += 1;
        let result = f(self);
        self.dispatch_depth -= 1;
        if self.dispatch_depth == 0 {
            self.sweep();
        }
        result
    }

    // === Activation ===

    /// State the record has for dispatch right now.
    pub fn effect_state(&self, id: EffectId) -> EffectState {
        let Some(record) = self.effect(id) else {
            return EffectState::Removable;
        };
        if record.state != EffectState::Active {
            return record.state;
        }
        if let Some(state) = record.behavior.state {
            let state = state(self, id);
            if state != EffectState::Active {
                return state;
            }
        }
        if record.category() == EffectCategory::Ability {
            if let Some(subject) = record.subject() {
                if self.find(EffectOwner::Combatant(subject), "AbilitySuppression").is_some() {
                    return EffectState::Deactivated;
                }
                if record.behavior.breakable && self.mold_breaker_against(subject) {
                    return EffectState::Deactivated;
                }
            }
        }
        EffectState::Active
    }

    pub fn is_effect_active(&self, id: EffectId) -> bool {
        self.effect_state(id) == EffectState::Active
    }

    /// Whether the executing user ignores `subject`'s breakable abilities.
    fn mold_breaker_against(&self, subject: CombatantId) -> bool {
        let Some(user) = self.executing else {
            return false;
        };
        if user == subject {
            return false;
        }
        self.find_category(EffectOwner::Combatant(user), EffectCategory::Ability)
            .iter()
            .filter_map(|id| self.effect(*id))
            .any(|r| r.behavior.mold_breaker && self.is_effect_active(r.id))
    }

    // === Ordering ===

    /// Speed with stat stages but no hook modifiers. Used for dispatch
    /// ranking so that ranking never re-enters the stat-modifier hook.
    pub fn raw_speed(&self, id: CombatantId) -> u32 {
        let combatant = self.combatant(id);
        crate::battle::stats::apply_stat_stage_multiplier(
            combatant.base_stat(StatType::Spe),
            combatant.stat_level(StatType::Spe),
        )
    }

    /// Non-fainted actives, fastest first, ties by roster position.
    pub fn speed_ranked_actives(&self) -> Vec<CombatantId> {
        let mut actives = self.active_combatants();
        actives.sort_by(|a, b| self.raw_speed(*b).cmp(&self.raw_speed(*a)).then(a.cmp(b)));
        actives
    }

    fn scope_owners(&self, scope: Scope, subject: Option<CombatantId>, target: Option<CombatantId>) -> Vec<EffectOwner> {
        match scope {
            Scope::Itself => Vec::new(),
            Scope::Subject => subject.map(EffectOwner::Combatant).into_iter().collect(),
            Scope::AllActive => {
                let mut owners: Vec<EffectOwner> =
                    self.speed_ranked_actives().into_iter().map(EffectOwner::Combatant).collect();
                owners.push(EffectOwner::Field);
                owners
            }
            Scope::DamageParticipants => {
                let mut owners = Vec::new();
                for id in subject.into_iter().chain(target) {
                    let owner = EffectOwner::Combatant(id);
                    if !owners.contains(&owner) {
                        owners.push(owner);
                    }
                }
                for id in self.speed_ranked_actives() {
                    let owner = EffectOwner::Combatant(id);
                    if !owners.contains(&owner) {
                        owners.push(owner);
                    }
                }
                owners.push(EffectOwner::Field);
                owners
            }
        }
    }

    /// Active records implementing `hook` in the containers of `owners`, in
    /// dispatch order.
    pub fn candidates(&self, hook: Hook, owners: &[EffectOwner]) -> Vec<EffectId> {
        let mut candidates = Vec::new();
        for owner in owners {
            let mut ids: Vec<EffectId> = self
                .container(*owner)
                .ids()
                .iter()
                .copied()
                .filter(|id| {
                    self.effect(*id).is_some_and(|r| hook.implemented_by(&r.behavior)) && self.is_effect_active(*id)
                })
                .collect();
            ids.sort_by_key(|id| {
                let record = self.effect(*id);
                (
                    record.map_or(u8::MAX, |r| r.category().rank()),
                    record.map_or(u64::MAX, |r| r.seq),
                )
            });
            candidates.extend(ids);
        }
        trace!(hook = <&'static str>::from(hook), count = candidates.len(), "dispatch candidates");
        candidates
    }

    fn candidates_for(&self, hook: Hook, subject: Option<CombatantId>, target: Option<CombatantId>) -> Vec<EffectId> {
        let owners = self.scope_owners(hook.scope(), subject, target);
        self.candidates(hook, &owners)
    }

    // === Vetoes ===

    /// Pre-execution veto. The first record to veto stops the pass; records
    /// after it are never invoked.
    pub fn veto_execution(&mut self, ctx: &ExecutionContext) -> BattleResult<bool> {
        let ids = self.candidates_for(Hook::VetoExecution, Some(ctx.user), ctx.target);
        self.in_pass(|battle| {
            for id in ids {
                if !battle.is_effect_active(id) {
                    continue;
                }
                let Some(f) = battle.effect(id).and_then(|r| r.behavior.veto_execution) else {
                    continue;
                };
                if f(battle, id, ctx)? {
                    debug!(effect = ?battle.effect(id).map(|r| r.name()), user = ?ctx.user, target = ?ctx.target, "execution vetoed");
                    return Ok(true);
                }
            }
            Ok(false)
        })
    }

    /// Whether `user` may not select the move `mv`.
    pub fn veto_selection(&self, user: CombatantId, mv: &schema::MoveData) -> bool {
        self.candidates_for(Hook::VetoSelection, Some(user), None)
            .into_iter()
            .any(|id| self.effect(id).and_then(|r| r.behavior.veto_selection).is_some_and(|f| f(self, id, user, mv)))
    }

    /// Whether `subject` is prevented from leaving the field.
    pub fn veto_switch(&self, subject: CombatantId) -> bool {
        self.candidates_for(Hook::VetoSwitch, Some(subject), None)
            .into_iter()
            .any(|id| self.effect(id).and_then(|r| r.behavior.veto_switch).is_some_and(|f| f(self, id, subject)))
    }

    // === Transforms ===

    /// Passes an incoming status through every transform. `None` means the
    /// status was dropped.
    pub fn transform_status(
        &self,
        subject: CombatantId,
        inducer: Option<CombatantId>,
        incoming: EffectPrototype,
    ) -> Option<EffectPrototype> {
        let request = StatusRequest { subject, inducer };
        let mut current = incoming;
        for id in self.candidates_for(Hook::TransformStatus, Some(subject), None) {
            let Some(f) = self.effect(id).and_then(|r| r.behavior.transform_status) else {
                continue;
            };
            let name = current.name;
            match f(self, id, &request, current) {
                Some(next) => current = next,
                None => {
                    debug!(effect = ?self.effect(id).map(|r| r.name()), status = name, "status blocked");
                    return None;
                }
            }
        }
        Some(current)
    }

    /// Type chart multiplier for `move_type` against `target`, after transforms.
    pub fn effectiveness(&self, move_type: PokemonType, target: CombatantId) -> f64 {
        let base: f64 = self
            .combatant(target)
            .types
            .iter()
            .map(|t| PokemonType::type_effectiveness(move_type, *t))
            .product();
        self.transform_effectiveness(move_type, target, base)
    }

    pub fn transform_effectiveness(&self, move_type: PokemonType, target: CombatantId, base: f64) -> f64 {
        self.candidates_for(Hook::TransformEffectiveness, Some(target), None)
            .into_iter()
            .fold(base, |value, id| match self.effect(id).and_then(|r| r.behavior.transform_effectiveness) {
                Some(f) => f(self, id, move_type, target, value),
                None => value,
            })
    }

    pub fn transform_health_change(&self, subject: CombatantId, delta: i32, kind: HpChange) -> i32 {
        self.candidates_for(Hook::TransformHealthChange, Some(subject), None)
            .into_iter()
            .fold(delta, |value, id| match self.effect(id).and_then(|r| r.behavior.transform_health_change) {
                Some(f) => f(self, id, subject, value, kind),
                None => value,
            })
    }

    pub fn transform_stat_level(
        &self,
        subject: CombatantId,
        inducer: Option<CombatantId>,
        stat: StatType,
        delta: i8,
    ) -> i8 {
        let request = StatLevelRequest { subject, inducer, stat };
        self.candidates_for(Hook::TransformStatLevel, Some(subject), None)
            .into_iter()
            .fold(delta, |value, id| match self.effect(id).and_then(|r| r.behavior.transform_stat_level) {
                Some(f) => f(self, id, &request, value),
                None => value,
            })
    }

    // === Modifiers and queries ===

    /// Damage modifiers in application order. Pure: no record may print or
    /// mutate while this runs.
    pub fn damage_modifiers(&self, ctx: &DamageContext) -> Vec<Modifier> {
        let mut modifiers: Vec<Modifier> = self
            .candidates_for(Hook::DamageModifier, Some(ctx.user), Some(ctx.target))
            .into_iter()
            .filter_map(|id| self.effect(id).and_then(|r| r.behavior.damage_modifier).and_then(|f| f(self, id, ctx)))
            .collect();
        sort_modifiers(&mut modifiers);
        modifiers
    }

    pub fn stat_modifiers(&self, subject: CombatantId, stat: StatType) -> Vec<Modifier> {
        let mut modifiers: Vec<Modifier> = self
            .candidates_for(Hook::StatModifier, Some(subject), None)
            .into_iter()
            .filter_map(|id| self.effect(id).and_then(|r| r.behavior.stat_modifier).and_then(|f| f(self, id, subject, stat)))
            .collect();
        sort_modifiers(&mut modifiers);
        modifiers
    }

    /// Sum of critical-hit stage bonuses on `subject`.
    pub fn critical_stage(&self, subject: CombatantId) -> i32 {
        self.candidates_for(Hook::CriticalModifier, Some(subject), None)
            .into_iter()
            .filter_map(|id| self.effect(id).and_then(|r| r.behavior.critical_modifier).map(|f| f(self, id, subject)))
            .sum()
    }

    /// The inherent priority of largest magnitude on `subject`; the earliest
    /// candidate wins a tie in magnitude.
    pub fn inherent_priority(&self, subject: CombatantId) -> i32 {
        self.candidates_for(Hook::InherentPriority, Some(subject), None)
            .into_iter()
            .filter_map(|id| self.effect(id).and_then(|r| r.behavior.inherent_priority).map(|f| f(self, id, subject)))
            .fold(0, |best, value| if value.abs() > best.abs() { value } else { best })
    }

    /// Whether turn order sorts speed descending. The first record with an
    /// opinion decides; otherwise the configured direction applies.
    pub fn speed_sort_descending(&self) -> bool {
        self.candidates_for(Hook::SpeedSort, None, None)
            .into_iter()
            .find_map(|id| self.effect(id).and_then(|r| r.behavior.speed_sort).map(|f| f(self, id)))
            .unwrap_or(self.config.descending_speed)
    }

    pub fn weather_suppressed(&self) -> bool {
        self.candidates_for(Hook::SuppressesWeather, None, None)
            .into_iter()
            .any(|id| self.effect(id).and_then(|r| r.behavior.suppresses_weather).is_some_and(|f| f(self, id)))
    }

    pub fn negates_paralysis_speed(&self, subject: CombatantId) -> bool {
        self.candidates_for(Hook::NegatesParalysisSpeed, Some(subject), None)
            .into_iter()
            .any(|id| {
                self.effect(id)
                    .and_then(|r| r.behavior.negates_paralysis_speed)
                    .is_some_and(|f| f(self, id, subject))
            })
    }

    /// Weather duration requested by `user`'s effects, if any.
    pub fn apply_weather_turns(&self, user: CombatantId, weather: Weather) -> Option<i32> {
        self.candidates_for(Hook::InformApplyWeather, Some(user), None)
            .into_iter()
            .find_map(|id| self.effect(id).and_then(|r| r.behavior.inform_apply_weather).and_then(|f| f(self, id, weather)))
    }

    // === Informs ===

    /// Tells the target's effects about a hit it took.
    pub fn inform_damaged(&mut self, target: CombatantId, hit: &DamageRecord) -> BattleResult<()> {
        let ids = self.candidates_for(Hook::InformDamaged, Some(target), None);
        self.in_pass(|battle| {
            for id in ids {
                if !battle.is_effect_active(id) {
                    continue;
                }
                if let Some(f) = battle.effect(id).and_then(|r| r.behavior.inform_damaged) {
                    f(battle, id, hit)?;
                }
            }
            Ok(())
        })
    }

    pub fn inform_finished_execution(&mut self, report: &ExecutionReport) -> BattleResult<()> {
        let ids = self.candidates_for(Hook::InformFinishedExecution, Some(report.user), report.target);
        self.in_pass(|battle| {
            for id in ids {
                if !battle.is_effect_active(id) {
                    continue;
                }
                if let Some(f) = battle.effect(id).and_then(|r| r.behavior.inform_finished_execution) {
                    f(battle, id, report)?;
                }
            }
            Ok(())
        })
    }

    pub fn inform_lost_item(&mut self, subject: CombatantId, item: &'static str) -> BattleResult<()> {
        let ids = self.candidates_for(Hook::InformLostItem, Some(subject), None);
        self.in_pass(|battle| {
            for id in ids {
                if !battle.is_effect_active(id) {
                    continue;
                }
                if let Some(f) = battle.effect(id).and_then(|r| r.behavior.inform_lost_item) {
                    f(battle, id, item)?;
                }
            }
            Ok(())
        })
    }

    /// Offers a residual event (`InformPoisonDamage`, `InformBurnDamage`,
    /// `InformSandDamage`, `InformHailDamage`) to `subject`'s effects.
    /// Returns `true` when one of them handled it, in which case the caller
    /// skips its own default.
    pub fn inform_handled(&mut self, hook: Hook, subject: CombatantId) -> BattleResult<bool> {
        let ids = self.candidates_for(hook, Some(subject), None);
        self.in_pass(|battle| {
            for id in ids {
                if !battle.is_effect_active(id) {
                    continue;
                }
                let Some(f) = battle.effect(id).and_then(|r| hook.handled_fn(&r.behavior)) else {
                    continue;
                };
                if f(battle, id)? {
                    return Ok(true);
                }
            }
            Ok(false)
        })
    }

    pub fn inform_weather_healing(&mut self, subject: CombatantId, weather: Weather) -> BattleResult<bool> {
        let ids = self.candidates_for(Hook::InformWeatherHealing, Some(subject), None);
        self.in_pass(|battle| {
            for id in ids {
                if !battle.is_effect_active(id) {
                    continue;
                }
                let Some(f) = battle.effect(id).and_then(|r| r.behavior.inform_weather_healing) else {
                    continue;
                };
                if f(battle, id, weather)? {
                    return Ok(true);
                }
            }
            Ok(false)
        })
    }

    /// Gives each held item on `subject` whose condition holds a chance to
    /// activate. Consumed items are detached and reported as lost.
    pub fn check_items(&mut self, subject: CombatantId) -> BattleResult<()> {
        if self.is_fainted(subject) {
            return Ok(());
        }
        let ids = self.candidates_for(Hook::ItemCondition, Some(subject), None);
        for id in ids {
            if !self.is_effect_active(id) {
                continue;
            }
            let Some(record) = self.effect(id) else { continue };
            let (condition, item_use, name) = (record.behavior.item_condition, record.behavior.item_use, record.name());
            let (Some(condition), Some(item_use)) = (condition, item_use) else {
                continue;
            };
            if !condition(self, id) {
                continue;
            }
            // Hide the item from nested checks while it is being used.
            if let Some(record) = self.effect_mut(id) {
                record.state = EffectState::Deactivated;
            }
            let consumed = item_use(self, id)?;
            if let Some(record) = self.effect_mut(id) {
                if record.state == EffectState::Deactivated {
                    record.state = EffectState::Active;
                }
            }
            if consumed {
                debug!(item = name, ?subject, "item consumed");
                self.detach(id)?;
                self.combatant_mut(subject).item = None;
                self.inform_lost_item(subject, name)?;
            }
        }
        Ok(())
    }
}
