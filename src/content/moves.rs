//! Move behaviors. A move is its plain data plus a behavior built by one of
//! the factories below; the turn controller runs the checks that come
//! before a move and then calls [`BattleMove::execute`].

use schema::{MoveCategory, MoveData, MoveTarget, StatType};
use tracing::debug;

use crate::battle::combatant::CombatantId;
use crate::battle::messages::BattleMessage;
use crate::battle::state::Battle;
use crate::content::hazards::lay_hazard;
use crate::content::statuses::{begin_charge, pop_recent_damage};
use crate::content::weather::{start_weather, toggle_trick_room, Weather};
use crate::effects::behavior::HpChange;
use crate::effects::record::{DamageRecord, EffectData, PendingMove};
use crate::errors::BattleResult;

/// What a status move can leave behind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveEffect {
    /// Attach the named registry effect
    Status(&'static str),
    StatChange(StatType, i8),
}

/// One entry of a status move's effect table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusMoveEffect {
    pub effect: MoveEffect,
    pub chance: f64,
    /// Affects the user instead of the target.
    pub on_user: bool,
}

impl StatusMoveEffect {
    pub fn on_target(effect: MoveEffect, chance: f64) -> Self {
        Self {
            effect,
            chance,
            on_user: false,
        }
    }

    pub fn on_user(effect: MoveEffect, chance: f64) -> Self {
        Self {
            effect,
            chance,
            on_user: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MoveBehavior {
    Damage,
    Status {
        effects: Vec<StatusMoveEffect>,
        /// Non-damaging move that respects type immunity
        immunities: bool,
    },
    Charge {
        /// Moves that still hit the user while it charges. `None` leaves
        /// the user hittable by everything.
        vulnerable: Option<Vec<&'static str>>,
    },
    Counter {
        category: Option<MoveCategory>,
        ratio: f64,
    },
    Weather(Weather),
    Hazard(&'static str),
    TrickRoom,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BattleMove {
    pub data: MoveData,
    pub behavior: MoveBehavior,
}

/// A move with a table of `(effect, chance, on_user)` entries. Damaging
/// moves deal their damage first and only then roll for their effects.
pub fn make_status_move(data: MoveData, effects: Vec<StatusMoveEffect>, immunities: bool) -> BattleMove {
    BattleMove {
        data,
        behavior: MoveBehavior::Status { effects, immunities },
    }
}

/// A move selected once and executed over two turns, the second forced.
/// With a vulnerable list the user is semi-invulnerable while charging.
pub fn make_charge_move(data: MoveData, vulnerable: Option<Vec<&'static str>>) -> BattleMove {
    BattleMove {
        data,
        behavior: MoveBehavior::Charge { vulnerable },
    }
}

/// A move returning `ratio` times the last damage of `category` the user
/// took from an enemy this turn.
pub fn make_counter_move(data: MoveData, category: Option<MoveCategory>, ratio: f64) -> BattleMove {
    BattleMove {
        data,
        behavior: MoveBehavior::Counter { category, ratio },
    }
}

impl BattleMove {
    pub fn damaging(data: MoveData) -> Self {
        Self {
            data,
            behavior: MoveBehavior::Damage,
        }
    }

    pub fn weather(data: MoveData, weather: Weather) -> Self {
        Self {
            data,
            behavior: MoveBehavior::Weather(weather),
        }
    }

    pub fn hazard(data: MoveData, hazard: &'static str) -> Self {
        Self {
            data,
            behavior: MoveBehavior::Hazard(hazard),
        }
    }

    pub fn trick_room(data: MoveData) -> Self {
        Self {
            data,
            behavior: MoveBehavior::TrickRoom,
        }
    }

    pub fn name(&self) -> &str {
        &self.data.name
    }

    /// The combatant this move is aimed at when used by `user`.
    pub fn target_for(&self, battle: &Battle, user: CombatantId) -> Option<CombatantId> {
        match self.data.target {
            MoveTarget::Selected => battle.opponent_of(user),
            MoveTarget::User | MoveTarget::Field => None,
        }
    }

    /// Whether this use rolls for accuracy. A charge move never misses on
    /// its charging turn.
    pub fn checks_accuracy(&self, battle: &Battle, user: CombatantId) -> bool {
        match self.behavior {
            MoveBehavior::Charge { .. } => battle.get_status(user, "ChargeMove").is_some(),
            _ => self.data.accuracy.is_some(),
        }
    }

    /// Runs the move's effect and returns the damage it dealt.
    pub fn execute(
        &self,
        battle: &mut Battle,
        user: CombatantId,
        target: Option<CombatantId>,
        move_index: usize,
    ) -> BattleResult<u32> {
        debug!(move_name = %self.data.name, ?user, ?target, "executing move");
        match &self.behavior {
            MoveBehavior::Damage => match target {
                Some(target) => deal_damage(battle, &self.data, user, target),
                None => Ok(0),
            },
            MoveBehavior::Status { effects, immunities } => {
                self.execute_status(battle, user, target, effects, *immunities)
            }
            MoveBehavior::Charge { vulnerable } => self.execute_charge(battle, user, target, move_index, vulnerable),
            MoveBehavior::Counter { category, ratio } => self.execute_counter(battle, user, *category, *ratio),
            MoveBehavior::Weather(weather) => {
                if !start_weather(battle, Some(user), *weather, None)? {
                    battle.print(BattleMessage::Failed);
                }
                Ok(0)
            }
            MoveBehavior::Hazard(hazard) => {
                let party = 1 - battle.combatant(user).party;
                if !lay_hazard(battle, Some(user), *hazard, party)? {
                    battle.print(BattleMessage::Failed);
                }
                Ok(0)
            }
            MoveBehavior::TrickRoom => {
                toggle_trick_room(battle, Some(user))?;
                Ok(0)
            }
        }
    }

    fn execute_status(
        &self,
        battle: &mut Battle,
        user: CombatantId,
        target: Option<CombatantId>,
        effects: &[StatusMoveEffect],
        immunities: bool,
    ) -> BattleResult<u32> {
        let mut dealt = 0;
        if self.data.power != 0 {
            let Some(target) = target else {
                return Ok(0);
            };
            dealt = deal_damage(battle, &self.data, user, target)?;
            if dealt == 0 {
                return Ok(0);
            }
        } else if immunities {
            if let Some(target) = target.filter(|t| battle.effectiveness(self.data.move_type, *t) == 0.0) {
                let pokemon = battle.name(target);
                battle.print(BattleMessage::NoEffect { pokemon });
                return Ok(0);
            }
        }

        let serene = battle.has_ability(user, "Serene Grace");
        let shielded = self.data.power != 0 && target.is_some_and(|t| battle.has_ability(t, "Shield Dust"));
        for entry in effects {
            if !entry.on_user && shielded {
                continue;
            }
            let chance = if serene { entry.chance * 2.0 } else { entry.chance };
            if !battle.rng.chance(chance, "move effect") {
                continue;
            }
            let affected = if entry.on_user { Some(user) } else { target };
            let Some(affected) = affected.filter(|a| !battle.is_fainted(*a)) else {
                continue;
            };
            match entry.effect {
                MoveEffect::Status(name) => {
                    let outcome = battle.apply_status(affected, Some(user), name)?;
                    if !outcome.is_applied() && self.data.power == 0 {
                        battle.print(BattleMessage::Failed);
                    }
                }
                MoveEffect::StatChange(stat, delta) => {
                    battle.apply_stat_change(affected, Some(user), stat, delta)?;
                }
            }
        }
        Ok(dealt)
    }

    fn execute_charge(
        &self,
        battle: &mut Battle,
        user: CombatantId,
        target: Option<CombatantId>,
        move_index: usize,
        vulnerable: &Option<Vec<&'static str>>,
    ) -> BattleResult<u32> {
        if let Some(charge) = battle.get_status(user, "ChargeMove") {
            if battle.record(charge)?.data.turns >= 2 {
                return Ok(0);
            }
            return match target {
                Some(target) => deal_damage(battle, &self.data, user, target),
                None => Ok(0),
            };
        }

        let pokemon = battle.name(user);
        battle.print(BattleMessage::ChargingUp {
            pokemon,
            move_name: self.data.name.clone(),
        });
        let data = EffectData {
            turns: 2,
            pending: Some(PendingMove { move_index, target }),
            vulnerable: vulnerable.clone().unwrap_or_default(),
            invulnerable: vulnerable.is_some(),
            ..EffectData::default()
        };
        begin_charge(battle, user, data)?;
        Ok(0)
    }

    fn execute_counter(
        &self,
        battle: &mut Battle,
        user: CombatantId,
        category: Option<MoveCategory>,
        ratio: f64,
    ) -> BattleResult<u32> {
        let Some(hit) = pop_recent_damage(battle, user, category)? else {
            battle.print(BattleMessage::Failed);
            return Ok(0);
        };
        let attacker = hit.attacker;
        if battle.is_fainted(attacker) || battle.effectiveness(self.data.move_type, attacker) == 0.0 {
            let pokemon = battle.name(attacker);
            battle.print(BattleMessage::NoEffect { pokemon });
            return Ok(0);
        }
        let amount = (f64::from(hit.amount) * ratio).floor() as u32;
        strike(battle, &self.data, user, attacker, amount.max(1))
    }
}

/// Runs the damage formula for one hit and applies the result.
pub fn deal_damage(battle: &mut Battle, mv: &MoveData, user: CombatantId, target: CombatantId) -> BattleResult<u32> {
    let outcome = battle.calculate_damage(mv, user, target, 1);
    if outcome.effectiveness == 0.0 {
        let pokemon = battle.name(target);
        battle.print(BattleMessage::NoEffect { pokemon });
        return Ok(0);
    }
    if outcome.critical {
        battle.print(BattleMessage::CriticalHit);
    }
    if outcome.effectiveness != 1.0 {
        battle.print(BattleMessage::Effectiveness {
            multiplier: outcome.effectiveness.into(),
        });
    }
    strike(battle, mv, user, target, outcome.damage)
}

/// Takes `amount` HP from `target` as a direct hit and tells the target's
/// effects about it.
fn strike(battle: &mut Battle, mv: &MoveData, user: CombatantId, target: CombatantId, amount: u32) -> BattleResult<u32> {
    let (pokemon, hp) = (battle.name(target), battle.hp(target));
    let dealt = battle.inflict_damage(target, amount, HpChange::Direct, |amount| {
        Some(BattleMessage::Damaged {
            pokemon,
            amount,
            remaining: hp.saturating_sub(amount),
        })
    })?;
    if dealt > 0 {
        let hit = DamageRecord {
            attacker: user,
            category: mv.category,
            move_type: mv.move_type,
            amount: dealt,
        };
        battle.inform_damaged(target, &hit)?;
    }
    Ok(dealt)
}
