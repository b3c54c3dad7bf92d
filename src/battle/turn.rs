//! Turn resolution. A turn runs through a fixed sequence of phases:
//!
//! 1. `Selecting`: forced actions replace chosen ones, and every action is
//!    checked against the selection and switch vetoes.
//! 2. For each actor in action order: `PreExecutionVeto`,
//!    `ModifierCalculation`, `Executing`, `PostExecutionInform`. Modifier
//!    calculation is a pure preview: it records the expected damage in the
//!    report without consuming randomness, and `Executing` runs the real
//!    modifier chain again with its rolls.
//! 3. `EndOfTurnTick`: every ticking effect, ordered by tier.
//! 4. `SwitchWindow`: parties whose active combatant fainted are reported.

use std::cmp::Ordering;

use schema::{MoveData, StatType};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::battle::combatant::CombatantId;
use crate::battle::messages::BattleMessage;
use crate::battle::state::Battle;
use crate::content::moves::BattleMove;
use crate::content::statuses::RESIDUAL_TIER;
use crate::effects::behavior::{ExecutionContext, ExecutionReport};
use crate::effects::dispatch::Hook;
use crate::effects::record::{EffectId, EffectOwner};
use crate::errors::{ActionError, BattleResult};

/// What a party chose to do this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    UseMove { move_index: usize },
    Switch { member: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TurnPhase {
    Selecting,
    PreExecutionVeto,
    ModifierCalculation,
    Executing,
    PostExecutionInform,
    EndOfTurnTick,
    SwitchWindow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhaseEntry {
    pub phase: TurnPhase,
    pub actor: Option<CombatantId>,
}

/// Damage expected when a move connected, before any randomness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DamagePreview {
    pub user: CombatantId,
    pub target: CombatantId,
    pub damage: u32,
}

/// Everything observable about one resolved turn.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TurnReport {
    pub turn_number: u32,
    pub phases: Vec<PhaseEntry>,
    /// Actors in the order they acted.
    pub order: Vec<CombatantId>,
    pub messages: Vec<BattleMessage>,
    pub previews: Vec<DamagePreview>,
    /// Parties that must send in a replacement before the next turn.
    pub needs_replacement: Vec<usize>,
    pub winner: Option<usize>,
}

/// A selected action, validated and ready to be ordered.
#[derive(Debug, Clone)]
struct Choice {
    party: usize,
    actor: CombatantId,
    action: Action,
    /// Target fixed at selection time by a forced move.
    forced_target: Option<CombatantId>,
}

#[derive(Debug, Clone, Copy)]
struct ActionPriority {
    switching: bool,
    move_priority: i8,
    inherent_priority: i32,
    speed: u32,
}

#[derive(Debug, Default)]
pub struct TurnPhaseController {
    report: TurnReport,
}

impl TurnPhaseController {
    /// Resolves one turn with the actions chosen by each party. Parties whose
    /// active combatant has fainted or is locked into a forced move may pass
    /// `None`.
    pub fn resolve_turn(battle: &mut Battle, actions: [Option<Action>; 2]) -> BattleResult<TurnReport> {
        let mut controller = TurnPhaseController::default();
        let start = battle.log.len();

        controller.enter(TurnPhase::Selecting, None);
        let choices = select_actions(battle, actions)?;

        battle.turn_number += 1;
        controller.report.turn_number = battle.turn_number;
        clear_damage_listeners(battle)?;
        battle.print(BattleMessage::TurnStarted {
            turn_number: battle.turn_number,
        });

        for choice in order_actions(battle, choices) {
            if battle.is_over() {
                break;
            }
            if battle.is_fainted(choice.actor) || !battle.is_on_field(choice.actor) {
                continue;
            }
            controller.report.order.push(choice.actor);
            match choice.action {
                Action::Switch { member } => {
                    controller.enter(TurnPhase::Executing, Some(choice.actor));
                    battle.switch_in(choice.party, member)?;
                }
                Action::UseMove { move_index } => {
                    battle.executing = Some(choice.actor);
                    let result = controller.run_move(battle, choice.actor, move_index, choice.forced_target);
                    battle.executing = None;
                    result?;
                }
            }
        }

        controller.enter(TurnPhase::EndOfTurnTick, None);
        run_end_of_turn(battle)?;

        controller.enter(TurnPhase::SwitchWindow, None);
        controller.report.needs_replacement = parties_needing_replacement(battle);
        controller.report.winner = battle.winner();
        controller.report.messages = battle.log.since(start).to_vec();
        debug!(
            turn = controller.report.turn_number,
            messages = controller.report.messages.len(),
            winner = ?controller.report.winner,
            "turn resolved"
        );
        Ok(controller.report)
    }

    fn enter(&mut self, phase: TurnPhase, actor: Option<CombatantId>) {
        trace!(?phase, ?actor, "entering turn phase");
        self.report.phases.push(PhaseEntry { phase, actor });
    }

    fn run_move(
        &mut self,
        battle: &mut Battle,
        user: CombatantId,
        move_index: usize,
        forced_target: Option<CombatantId>,
    ) -> BattleResult<()> {
        let mv: BattleMove = battle
            .combatant(user)
            .moves
            .get(move_index)
            .cloned()
            .ok_or(ActionError::InvalidMoveIndex(move_index))?;

        self.enter(TurnPhase::PreExecutionVeto, Some(user));
        let overall = ExecutionContext {
            user,
            target: None,
            mv: &mv.data,
        };
        if battle.veto_execution(&overall)? {
            // A forced move that could not be carried out is abandoned.
            if let Some(charge) = battle.get_status(user, "ChargeMove") {
                battle.detach(charge)?;
            }
            return Ok(());
        }
        let pokemon = battle.name(user);
        battle.print(BattleMessage::MoveUsed {
            pokemon,
            move_name: mv.data.name.clone(),
        });

        let target = forced_target
            .filter(|t| battle.is_on_field(*t))
            .or_else(|| mv.target_for(battle, user));
        let connects = self.check_target(battle, user, target, &mv)?;

        let mut damage_dealt = 0;
        if connects {
            self.enter(TurnPhase::ModifierCalculation, Some(user));
            if let Some(target) = target.filter(|_| mv.data.is_damaging()) {
                let damage = battle.preview_damage(&mv.data, user, target, 1);
                trace!(move_name = %mv.data.name, ?target, damage, "modifiers calculated");
                self.report.previews.push(DamagePreview { user, target, damage });
            }

            self.enter(TurnPhase::Executing, Some(user));
            damage_dealt = mv.execute(battle, user, target, move_index)?;
        }

        self.enter(TurnPhase::PostExecutionInform, Some(user));
        let report = ExecutionReport {
            user,
            target,
            mv: &mv.data,
            damage_dealt,
        };
        battle.inform_finished_execution(&report)
    }

    /// Per-target veto and accuracy. Returns whether the move goes ahead.
    fn check_target(
        &mut self,
        battle: &mut Battle,
        user: CombatantId,
        target: Option<CombatantId>,
        mv: &BattleMove,
    ) -> BattleResult<bool> {
        let Some(target) = target else {
            return Ok(true);
        };
        if battle.is_fainted(target) {
            battle.print(BattleMessage::Failed);
            return Ok(false);
        }
        let per_target = ExecutionContext {
            user,
            target: Some(target),
            mv: &mv.data,
        };
        if battle.veto_execution(&per_target)? {
            return Ok(false);
        }
        if mv.checks_accuracy(battle, user) && !battle.move_hits(user, target, &mv.data) {
            let pokemon = battle.name(user);
            battle.print(BattleMessage::MoveMissed { pokemon });
            return Ok(false);
        }
        Ok(true)
    }
}

/// Applies forced moves and validates every chosen action. Nothing in the
/// battle changes if an action is rejected.
fn select_actions(battle: &Battle, actions: [Option<Action>; 2]) -> BattleResult<Vec<Choice>> {
    let mut choices = Vec::new();
    for (party, chosen) in actions.into_iter().enumerate() {
        let Some(actor) = battle.active_combatant(party, 0).filter(|a| !battle.is_fainted(*a)) else {
            continue;
        };
        if let Some(pending) = forced_move(battle, actor) {
            debug!(?actor, move_index = pending.0, "forced move replaces selection");
            choices.push(Choice {
                party,
                actor,
                action: Action::UseMove { move_index: pending.0 },
                forced_target: pending.1,
            });
            continue;
        }
        let action = chosen.ok_or_else(|| ActionError::InvalidAction(format!("party {} chose no action", party)))?;
        validate_action(battle, party, actor, action)?;
        choices.push(Choice {
            party,
            actor,
            action,
            forced_target: None,
        });
    }
    Ok(choices)
}

fn forced_move(battle: &Battle, actor: CombatantId) -> Option<(usize, Option<CombatantId>)> {
    let charge = battle.get_status(actor, "ChargeMove")?;
    let pending = battle.effect(charge)?.data.pending?;
    Some((pending.move_index, pending.target))
}

fn validate_action(battle: &Battle, party: usize, actor: CombatantId, action: Action) -> BattleResult<()> {
    match action {
        Action::UseMove { move_index } => {
            let mv: &MoveData = &battle
                .combatant(actor)
                .moves
                .get(move_index)
                .ok_or(ActionError::InvalidMoveIndex(move_index))?
                .data;
            if battle.veto_selection(actor, mv) {
                return Err(ActionError::InvalidAction(format!("{} cannot select {}", battle.name(actor), mv.name)).into());
            }
        }
        Action::Switch { member } => {
            let target = battle.parties[party]
                .members
                .get(member)
                .copied()
                .ok_or(ActionError::InvalidMemberIndex(member))?;
            if target == actor || battle.is_fainted(target) {
                return Err(ActionError::InvalidMemberIndex(member).into());
            }
            if battle.veto_switch(actor) {
                return Err(ActionError::InvalidAction(format!("{} cannot switch out", battle.name(actor))).into());
            }
        }
    }
    Ok(())
}

fn action_priority(battle: &Battle, choice: &Choice) -> ActionPriority {
    let speed = battle.stat(choice.actor, StatType::Spe);
    match choice.action {
        Action::Switch { .. } => ActionPriority {
            switching: true,
            move_priority: 0,
            inherent_priority: 0,
            speed,
        },
        Action::UseMove { move_index } => ActionPriority {
            switching: false,
            move_priority: battle.combatant(choice.actor).moves.get(move_index).map_or(0, |m| m.data.priority),
            inherent_priority: battle.inherent_priority(choice.actor),
            speed,
        },
    }
}

/// Switches first, in party order; then moves by move priority, inherent
/// priority and speed. Speed sorts descending unless an effect reverses it.
/// Exact ties are broken with the battle's random source.
fn order_actions(battle: &mut Battle, choices: Vec<Choice>) -> Vec<Choice> {
    let descending = battle.speed_sort_descending();
    let mut keyed: Vec<(Choice, ActionPriority)> = choices
        .into_iter()
        .map(|c| {
            let priority = action_priority(battle, &c);
            (c, priority)
        })
        .collect();

    let compare = |a: &(Choice, ActionPriority), b: &(Choice, ActionPriority)| -> Ordering {
        let (pa, pb) = (&a.1, &b.1);
        if pa.switching || pb.switching {
            return pb.switching.cmp(&pa.switching).then(a.0.party.cmp(&b.0.party));
        }
        let speed = if descending {
            pb.speed.cmp(&pa.speed)
        } else {
            pa.speed.cmp(&pb.speed)
        };
        pb.move_priority
            .cmp(&pa.move_priority)
            .then(pb.inherent_priority.cmp(&pa.inherent_priority))
            .then(speed)
    };
    keyed.sort_by(compare);

    // Shuffle each run of exact ties.
    let mut start = 0;
    while start < keyed.len() {
        let mut end = start + 1;
        while end < keyed.len() && compare(&keyed[start], &keyed[end]) == Ordering::Equal {
            end += 1;
        }
        for i in (start + 1..end).rev() {
            let j = start + battle.rng.range(0, (i - start) as u32, "speed tie") as usize;
            keyed.swap(i, j);
        }
        start = end;
    }

    keyed.into_iter().map(|(c, _)| c).collect()
}

fn clear_damage_listeners(battle: &mut Battle) -> BattleResult<()> {
    for index in 0..battle.combatants.len() {
        if let Some(id) = battle.get_status(CombatantId(index), "DamageListener") {
            battle.record_mut(id)?.data.hits.clear();
        }
    }
    Ok(())
}

/// Ticking records on the field and on every active combatant, in
/// (tier, subtier, speed rank, category rank, sequence) order. Speed rank
/// follows the current speed sort, so Trick Room ticks the slowest first.
fn ticking_records(battle: &Battle) -> Vec<EffectId> {
    let mut actives = battle.speed_ranked_actives();
    if !battle.speed_sort_descending() {
        actives.reverse();
    }
    let mut owners: Vec<EffectOwner> = actives.iter().copied().map(EffectOwner::Combatant).collect();
    owners.push(EffectOwner::Field);

    let mut keyed = Vec::new();
    for (rank, owner) in owners.iter().enumerate() {
        for id in battle.container(*owner).ids() {
            let Some(record) = battle.effect(*id) else { continue };
            if let Some(tier) = record.behavior.tier {
                let key = (tier, record.behavior.subtier, rank, record.category().rank(), record.seq);
                keyed.push((key, *id));
            }
        }
    }
    keyed.sort_by_key(|(key, _)| *key);
    keyed.into_iter().map(|(_, id)| id).collect()
}

/// Runs the three tick hooks over every ticking record. Ticking stops once
/// the battle is decided, checked at each tier boundary and after every
/// residual tick.
fn run_end_of_turn(battle: &mut Battle) -> BattleResult<()> {
    let ids = ticking_records(battle);
    for hook in [Hook::BeginTick, Hook::Tick, Hook::EndTick] {
        let decided = battle.in_pass(|battle| {
            let mut current_tier = None;
            for id in &ids {
                let Some(tier) = battle.effect(*id).and_then(|r| r.behavior.tier) else {
                    continue;
                };
                if current_tier != Some(tier) {
                    if battle.is_over() {
                        return Ok(true);
                    }
                    current_tier = Some(tier);
                }
                if !battle.is_effect_active(*id) {
                    continue;
                }
                if battle.subject_of(*id).is_some_and(|s| battle.is_fainted(s)) {
                    continue;
                }
                let Some(behavior) = battle.effect(*id).map(|r| &r.behavior) else {
                    continue;
                };
                let f = match hook {
                    Hook::BeginTick => behavior.begin_tick,
                    Hook::Tick => behavior.tick,
                    _ => behavior.end_tick,
                };
                if let Some(f) = f {
                    f(battle, *id)?;
                    if tier == RESIDUAL_TIER && battle.is_over() {
                        return Ok(true);
                    }
                }
            }
            Ok(battle.is_over())
        })?;
        if decided {
            debug!(?hook, "battle decided during end-of-turn ticks");
            break;
        }
    }
    Ok(())
}

fn parties_needing_replacement(battle: &Battle) -> Vec<usize> {
    (0..battle.parties.len())
        .filter(|party| {
            let slots = &battle.parties[*party];
            let fainted_front = slots.active.map_or(true, |a| battle.is_fainted(a));
            let bench = slots
                .members
                .iter()
                .any(|m| Some(*m) != slots.active && !battle.is_fainted(*m));
            fainted_front && bench
        })
        .collect()
}
