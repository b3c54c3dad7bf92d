use schema::{MoveData, MoveFlag};
use serde::Serialize;
use tracing::trace;

use crate::battle::combatant::CombatantId;
use crate::battle::state::Battle;
use crate::effects::behavior::DamageContext;
use crate::effects::modifiers::{apply_slot, apply_slots_after, Modifier, SLOT_MOD1, SLOT_MOD2, SLOT_MOD3};

/// Chance of a critical hit by critical stage, capped at the last entry.
const CRITICAL_TABLE: [f64; 5] = [1.0 / 16.0, 1.0 / 8.0, 1.0 / 4.0, 1.0 / 3.0, 1.0 / 2.0];

const STAB_MULTIPLIER: f64 = 1.5;

/// Result of one damage calculation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DamageOutcome {
    pub damage: u32,
    pub critical: bool,
    pub effectiveness: f64,
}

/// Inputs to the formula that the battle RNG decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageRolls {
    pub critical: bool,
    /// 217..=255
    pub random: u32,
}

impl DamageRolls {
    /// No critical hit, maximum random factor.
    pub const PREVIEW: DamageRolls = DamageRolls {
        critical: false,
        random: 255,
    };
}

impl Battle {
    /// Damage `user` deals to `target` with `mv`, consuming the critical-hit
    /// and random-factor rolls.
    pub fn calculate_damage(
        &mut self,
        mv: &MoveData,
        user: CombatantId,
        target: CombatantId,
        target_count: usize,
    ) -> DamageOutcome {
        let stage = (self.critical_stage(user) + i32::from(mv.has_flag(MoveFlag::HighCritical))).clamp(0, 4);
        let critical = self.rng.chance(CRITICAL_TABLE[stage as usize], "critical hit");
        let random = self.rng.range(217, 255, "damage roll");
        self.damage_with_rolls(mv, user, target, target_count, DamageRolls { critical, random })
    }

    /// Runs the full calculation, rolls included, then restores the random
    /// source so the real calculation later sees the same rolls. Nothing is
    /// printed while it runs.
    pub fn speculate_damage(
        &mut self,
        mv: &MoveData,
        user: CombatantId,
        target: CombatantId,
        target_count: usize,
    ) -> DamageOutcome {
        let saved = self.rng.clone();
        let outcome = self.silently(|battle| battle.calculate_damage(mv, user, target, target_count));
        self.rng = saved;
        outcome
    }

    /// Expected damage without consuming randomness or printing.
    pub fn preview_damage(&self, mv: &MoveData, user: CombatantId, target: CombatantId, target_count: usize) -> u32 {
        self.damage_with_rolls(mv, user, target, target_count, DamageRolls::PREVIEW).damage
    }

    /// The damage formula. Modifier slot 0 applies before the +2 step, slot 1
    /// after the critical doubling, slot 2 after type effectiveness, and any
    /// higher slots after that in ascending order.
    pub fn damage_with_rolls(
        &self,
        mv: &MoveData,
        user: CombatantId,
        target: CombatantId,
        _target_count: usize,
        rolls: DamageRolls,
    ) -> DamageOutcome {
        let effectiveness = self.effectiveness(mv.move_type, target);
        let Some((attack_stat, defense_stat)) = mv.category.stats() else {
            return DamageOutcome {
                damage: 0,
                critical: false,
                effectiveness,
            };
        };
        if effectiveness == 0.0 || mv.power == 0 {
            return DamageOutcome {
                damage: 0,
                critical: false,
                effectiveness,
            };
        }

        let attack = self.stat(user, attack_stat);
        let defense = self.stat(target, defense_stat).max(1);
        let ctx = DamageContext {
            user,
            target,
            mv,
            critical: rolls.critical,
        };
        let modifiers: Vec<Modifier> = self.damage_modifiers(&ctx);

        let level = self.combatant(user).level as u32;
        let mut damage = level * 2 / 5 + 2;
        damage *= mv.power as u32;
        damage *= attack;
        damage /= 50;
        damage /= defense;
        damage = apply_slot(damage, &modifiers, SLOT_MOD1);
        damage += 2;
        if rolls.critical {
            damage *= 2;
        }
        damage = apply_slot(damage, &modifiers, SLOT_MOD2);
        damage = damage * rolls.random * 100 / 255 / 100;
        if self.is_type(user, mv.move_type) {
            damage = (damage as f64 * STAB_MULTIPLIER).floor() as u32;
        }
        damage = (damage as f64 * effectiveness).floor() as u32;
        damage = apply_slot(damage, &modifiers, SLOT_MOD3);
        damage = apply_slots_after(damage, &modifiers, SLOT_MOD3);
        let damage = damage.max(1);

        trace!(move_name = %mv.name, ?user, ?target, damage, critical = rolls.critical, "damage calculated");
        DamageOutcome {
            damage,
            critical: rolls.critical,
            effectiveness,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::rng::BattleRng;
    use crate::battle::tests::common::{create_test_battle, splash, standard_registry, tackle, TestCombatantBuilder, P1, P2};
    use pretty_assertions::assert_eq;
    use schema::PokemonType;

    fn battle(rolls: Vec<u8>) -> Battle {
        create_test_battle(
            standard_registry(),
            TestCombatantBuilder::new("Vaporeon", PokemonType::Water).build(),
            TestCombatantBuilder::new("Snorlax", PokemonType::Normal).build(),
        )
        .with_rng(BattleRng::new_for_test(rolls))
    }

    #[test]
    fn test_speculation_leaves_rolls_for_the_real_calculation() {
        // Arrange
        let mut battle = battle(vec![90, 50]);
        let mv = tackle().data;
        let printed = battle.log.len();

        // Act
        let speculated = battle.speculate_damage(&mv, P1, P2, 1);
        let actual = battle.calculate_damage(&mv, P1, P2, 1);

        // Assert
        assert_eq!(speculated, actual);
        assert_eq!(actual.damage, 16);
        assert!(!actual.critical);
        assert_eq!(battle.rng.consumed(), 2);
        assert_eq!(battle.log.len(), printed);
    }

    #[test]
    fn test_preview_uses_the_maximum_roll_without_consuming_any() {
        let battle = battle(vec![]);
        assert_eq!(battle.preview_damage(&tackle().data, P1, P2, 1), 19);
        assert_eq!(battle.rng.consumed(), 0);
    }

    #[test]
    fn test_critical_hit_doubles_before_the_random_factor() {
        let battle = battle(vec![]);
        let rolls = DamageRolls {
            critical: true,
            random: 255,
        };
        let outcome = battle.damage_with_rolls(&tackle().data, P1, P2, 1, rolls);
        assert_eq!(outcome.damage, 38);
        assert!(outcome.critical);
    }

    #[test]
    fn test_status_moves_deal_no_damage() {
        let battle = battle(vec![]);
        assert_eq!(battle.preview_damage(&splash().data, P1, P2, 1), 0);
    }
}
