//! The hook table of an effect.
//!
//! A concrete effect is data: metadata plus one optional function per hook,
//! overlaid onto a per-category base table with struct update syntax:
//!
//! ```ignore
//! EffectBehavior {
//!     tier: Some(6),
//!     tick: Some(burn_tick),
//!     ..EffectBehavior::status("Burn")
//! }
//! ```
//!
//! Hooks that only compute (modifiers, transforms, queries) receive `&Battle`
//! and therefore cannot print or mutate. Hooks that act receive `&mut Battle`
//! and return a `BattleResult`.

use schema::{MoveData, PokemonType, StatType};

use crate::battle::combatant::CombatantId;
use crate::battle::state::Battle;
use crate::content::weather::Weather;
use crate::effects::modifiers::Modifier;
use crate::effects::record::{DamageRecord, EffectCategory, EffectId, EffectLock, EffectState};
use crate::effects::registry::EffectPrototype;
use crate::errors::BattleResult;

/// A move about to be executed. `target` is `None` for the overall check
/// made once per execution, and set for each per-target check.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionContext<'a> {
    pub user: CombatantId,
    pub target: Option<CombatantId>,
    pub mv: &'a MoveData,
}

/// One damaging hit being evaluated by the modifier chain.
#[derive(Debug, Clone, Copy)]
pub struct DamageContext<'a> {
    pub user: CombatantId,
    pub target: CombatantId,
    pub mv: &'a MoveData,
    pub critical: bool,
}

/// Outcome of an execution, broadcast once it has finished.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionReport<'a> {
    pub user: CombatantId,
    pub target: Option<CombatantId>,
    pub mv: &'a MoveData,
    pub damage_dealt: u32,
}

/// An incoming status on its way into a combatant's container.
#[derive(Debug, Clone, Copy)]
pub struct StatusRequest {
    pub subject: CombatantId,
    pub inducer: Option<CombatantId>,
}

#[derive(Debug, Clone, Copy)]
pub struct StatLevelRequest {
    pub subject: CombatantId,
    pub inducer: Option<CombatantId>,
    pub stat: StatType,
}

/// Where an HP change comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HpChange {
    /// Damage or healing dealt by a move hit
    Direct,
    /// Residual damage, recoil, hazards, weather, items
    Indirect,
}

pub type ApplyFn = fn(&mut Battle, EffectId) -> BattleResult<bool>;
pub type LifecycleFn = fn(&mut Battle, EffectId) -> BattleResult<()>;
/// Receives the combatant that just entered the field.
pub type SwitchInFn = fn(&mut Battle, EffectId, CombatantId) -> BattleResult<()>;
/// Returns whether the record should be removed when its subject leaves the field.
pub type SwitchOutFn = fn(&mut Battle, EffectId) -> BattleResult<bool>;
pub type StateFn = fn(&Battle, EffectId) -> EffectState;
pub type InformAppliedFn = fn(&mut Battle, EffectId, Option<CombatantId>) -> BattleResult<()>;
pub type VetoExecutionFn = fn(&mut Battle, EffectId, &ExecutionContext) -> BattleResult<bool>;
pub type VetoSelectionFn = fn(&Battle, EffectId, CombatantId, &MoveData) -> bool;
pub type VetoSwitchFn = fn(&Battle, EffectId, CombatantId) -> bool;
pub type TransformStatusFn = fn(&Battle, EffectId, &StatusRequest, EffectPrototype) -> Option<EffectPrototype>;
pub type TransformEffectivenessFn = fn(&Battle, EffectId, PokemonType, CombatantId, f64) -> f64;
pub type TransformHealthChangeFn = fn(&Battle, EffectId, CombatantId, i32, HpChange) -> i32;
pub type TransformStatLevelFn = fn(&Battle, EffectId, &StatLevelRequest, i8) -> i8;
pub type DamageModifierFn = fn(&Battle, EffectId, &DamageContext) -> Option<Modifier>;
pub type StatModifierFn = fn(&Battle, EffectId, CombatantId, StatType) -> Option<Modifier>;
pub type SubjectValueFn = fn(&Battle, EffectId, CombatantId) -> i32;
pub type FieldFlagFn = fn(&Battle, EffectId) -> bool;
pub type SubjectFlagFn = fn(&Battle, EffectId, CombatantId) -> bool;
pub type InformDamagedFn = fn(&mut Battle, EffectId, &DamageRecord) -> BattleResult<()>;
pub type InformExecutionFn = fn(&mut Battle, EffectId, &ExecutionReport) -> BattleResult<()>;
pub type InformLostItemFn = fn(&mut Battle, EffectId, &'static str) -> BattleResult<()>;
/// Returns `true` when the effect handled the event itself.
pub type InformHandledFn = fn(&mut Battle, EffectId) -> BattleResult<bool>;
pub type InformWeatherFn = fn(&mut Battle, EffectId, Weather) -> BattleResult<bool>;
pub type InformApplyWeatherFn = fn(&Battle, EffectId, Weather) -> Option<i32>;
pub type ItemConditionFn = fn(&Battle, EffectId) -> bool;
/// Returns `true` when the item was consumed.
pub type ItemUseFn = fn(&mut Battle, EffectId) -> BattleResult<bool>;

#[derive(Clone)]
pub struct EffectBehavior {
    pub name: &'static str,
    pub category: EffectCategory,
    pub lock: EffectLock,
    /// End-of-turn tier. `None` never ticks.
    pub tier: Option<i32>,
    pub subtier: i32,
    pub singleton: bool,
    /// Removed when the subject switches out, unless `switch_out` decides otherwise.
    pub volatile: bool,
    pub passable: bool,
    /// Ignored while a mold-breaking user is executing against the subject.
    pub breakable: bool,
    pub mold_breaker: bool,

    // Lifecycle
    pub apply: Option<ApplyFn>,
    pub unapply: Option<LifecycleFn>,
    pub switch_in: Option<SwitchInFn>,
    pub switch_out: Option<SwitchOutFn>,
    pub begin_tick: Option<LifecycleFn>,
    pub tick: Option<LifecycleFn>,
    pub end_tick: Option<LifecycleFn>,
    pub inform_applied: Option<InformAppliedFn>,
    pub inform_finished: Option<LifecycleFn>,
    pub state: Option<StateFn>,

    // Vetoes
    pub veto_execution: Option<VetoExecutionFn>,
    pub veto_selection: Option<VetoSelectionFn>,
    pub veto_switch: Option<VetoSwitchFn>,

    // Transforms
    pub transform_status: Option<TransformStatusFn>,
    pub transform_effectiveness: Option<TransformEffectivenessFn>,
    pub transform_health_change: Option<TransformHealthChangeFn>,
    pub transform_stat_level: Option<TransformStatLevelFn>,

    // Modifiers and queries
    pub damage_modifier: Option<DamageModifierFn>,
    pub stat_modifier: Option<StatModifierFn>,
    pub critical_modifier: Option<SubjectValueFn>,
    pub inherent_priority: Option<SubjectValueFn>,
    /// `true` sorts speed descending, `false` ascending.
    pub speed_sort: Option<FieldFlagFn>,
    pub suppresses_weather: Option<FieldFlagFn>,
    pub negates_paralysis_speed: Option<SubjectFlagFn>,

    // Informs
    pub inform_damaged: Option<InformDamagedFn>,
    pub inform_finished_execution: Option<InformExecutionFn>,
    pub inform_lost_item: Option<InformLostItemFn>,
    pub inform_poison_damage: Option<InformHandledFn>,
    pub inform_burn_damage: Option<InformHandledFn>,
    pub inform_sand_damage: Option<InformHandledFn>,
    pub inform_hail_damage: Option<InformHandledFn>,
    pub inform_weather_healing: Option<InformWeatherFn>,
    pub inform_apply_weather: Option<InformApplyWeatherFn>,

    // Held item triggers
    pub item_condition: Option<ItemConditionFn>,
    pub item_use: Option<ItemUseFn>,
}

impl EffectBehavior {
    /// Base table with no hooks.
    pub fn new(name: &'static str, category: EffectCategory) -> Self {
        Self {
            name,
            category,
            lock: EffectLock::None,
            tier: None,
            subtier: 0,
            singleton: true,
            volatile: false,
            passable: false,
            breakable: false,
            mold_breaker: false,
            apply: None,
            unapply: None,
            switch_in: None,
            switch_out: None,
            begin_tick: None,
            tick: None,
            end_tick: None,
            inform_applied: None,
            inform_finished: None,
            state: None,
            veto_execution: None,
            veto_selection: None,
            veto_switch: None,
            transform_status: None,
            transform_effectiveness: None,
            transform_health_change: None,
            transform_stat_level: None,
            damage_modifier: None,
            stat_modifier: None,
            critical_modifier: None,
            inherent_priority: None,
            speed_sort: None,
            suppresses_weather: None,
            negates_paralysis_speed: None,
            inform_damaged: None,
            inform_finished_execution: None,
            inform_lost_item: None,
            inform_poison_damage: None,
            inform_burn_damage: None,
            inform_sand_damage: None,
            inform_hail_damage: None,
            inform_weather_healing: None,
            inform_apply_weather: None,
            item_condition: None,
            item_use: None,
        }
    }

    /// Statuses are volatile unless they say otherwise.
    pub fn status(name: &'static str) -> Self {
        Self {
            volatile: true,
            ..Self::new(name, EffectCategory::Status)
        }
    }

    pub fn ability(name: &'static str) -> Self {
        Self::new(name, EffectCategory::Ability)
    }

    /// Items go dormant while their holder cannot use held items.
    pub fn item(name: &'static str) -> Self {
        Self {
            state: Some(held_item_state),
            ..Self::new(name, EffectCategory::Item)
        }
    }

    pub fn clause(name: &'static str) -> Self {
        Self::new(name, EffectCategory::Clause)
    }

    pub fn global(name: &'static str) -> Self {
        Self::new(name, EffectCategory::Global)
    }

    pub fn controller(name: &'static str) -> Self {
        Self::new(name, EffectCategory::Controller)
    }
}

impl std::fmt::Debug for EffectBehavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectBehavior")
            .field("name", &self.name)
            .field("category", &self.category)
            .field("lock", &self.lock)
            .field("tier", &self.tier)
            .field("subtier", &self.subtier)
            .field("singleton", &self.singleton)
            .field("volatile", &self.volatile)
            .finish_non_exhaustive()
    }
}

fn held_item_state(battle: &Battle, id: EffectId) -> EffectState {
    match battle.subject_of(id) {
        Some(holder) if battle.has_ability(holder, "Klutz") => EffectState::Deactivated,
        _ => EffectState::Active,
    }
}
