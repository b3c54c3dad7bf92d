use schema::{MoveData, StatType};

use crate::battle::combatant::CombatantId;
use crate::battle::messages::BattleMessage;
use crate::battle::state::Battle;
use crate::effects::container::AttachOutcome;
use crate::effects::record::EffectData;
use crate::errors::BattleResult;

impl Battle {
    pub fn stat_level(&self, id: CombatantId, stat: StatType) -> i8 {
        self.combatant(id).stat_level(stat)
    }

    pub fn set_stat_level(&mut self, id: CombatantId, stat: StatType, level: i8) {
        self.combatant_mut(id).set_stat_level(stat, level);
    }

    /// Effective value of `stat`: base value, stat stage, then every stat
    /// modifier in priority order, flooring after each step.
    pub fn stat(&self, id: CombatantId, stat: StatType) -> u32 {
        let combatant = self.combatant(id);
        if stat == StatType::Hp {
            return combatant.max_hp();
        }
        let staged = apply_stat_stage_multiplier(combatant.base_stat(stat), combatant.stat_level(stat));
        self.stat_modifiers(id, stat)
            .iter()
            .fold(staged, |value, m| ((value as f64) * m.value.into_inner()).floor() as u32)
            .max(1)
    }

    /// Raises or lowers a stat stage by attaching a stat-change record that
    /// unwinds its own delta when removed. The delta first passes through
    /// the stat-level transforms of every active effect. Returns the stage
    /// change actually made.
    pub fn apply_stat_change(
        &mut self,
        subject: CombatantId,
        inducer: Option<CombatantId>,
        stat: StatType,
        delta: i8,
    ) -> BattleResult<i8> {
        let delta = self.transform_stat_level(subject, inducer, stat, delta);
        if delta == 0 {
            let pokemon = self.name(subject);
            self.print(BattleMessage::StatChangeBlocked { pokemon });
            return Ok(0);
        }
        let outcome = self.apply_status_with(subject, inducer, "StatChange", EffectData::stat_change(stat, delta))?;
        match outcome {
            AttachOutcome::Applied(id) => Ok(self.effect(id).map_or(0, |r| r.data.delta)),
            _ => Ok(0),
        }
    }

    /// Whether `mv` connects, from accuracy against the user's accuracy and
    /// the target's evasion stages.
    pub fn move_hits(&mut self, user: CombatantId, target: CombatantId, mv: &MoveData) -> bool {
        // If move has no accuracy value, it never misses (like Swift)
        let Some(base_accuracy) = mv.accuracy else {
            return true;
        };

        let accuracy_stage = self.stat_level(user, StatType::Acc);
        let evasion_stage = self.stat_level(target, StatType::Eva);
        let adjusted_stage = (accuracy_stage - evasion_stage).clamp(-6, 6);

        let modified_accuracy = (base_accuracy as f64 * apply_accuracy_stage_multiplier(adjusted_stage)).round() as u8;
        let evasion = self
            .stat_modifiers(target, StatType::Eva)
            .iter()
            .fold(1.0, |acc, m| acc * m.value.into_inner());
        let clamped_accuracy = ((modified_accuracy as f64 / evasion).round() as u8).clamp(1, 100);

        let roll = self.rng.roll("accuracy check");
        roll <= clamped_accuracy
    }
}

/// Apply accuracy/evasion stage multipliers according to Pokemon formula
/// Uses different multipliers than regular stats
/// Stages range from -6 to +6
pub fn apply_accuracy_stage_multiplier(stage: i8) -> f64 {
    match stage {
        -6 => 3.0 / 9.0,  // 33%
        -5 => 3.0 / 8.0,  // 37.5%
        -4 => 3.0 / 7.0,  // 43%
        -3 => 3.0 / 6.0,  // 50%
        -2 => 3.0 / 5.0,  // 60%
        -1 => 3.0 / 4.0,  // 75%
         0 => 3.0 / 3.0,  // 100%
         1 => 4.0 / 3.0,  // 133%
         2 => 5.0 / 3.0,  // 167%
         3 => 6.0 / 3.0,  // 200%
         4 => 7.0 / 3.0,  // 233%
         5 => 8.0 / 3.0,  // 267%
         6 => 9.0 / 3.0,  // 300%
        _ => 1.0,
    }
}

/// Apply stat stage multipliers according to Pokemon formula
/// Stages range from -6 to +6
/// Negative stages: (2 / (2 + |stage|))
/// Positive stages: ((2 + stage) / 2)
pub fn apply_stat_stage_multiplier(base_stat: u32, stage: i8) -> u32 {
    let clamped_stage = stage.clamp(-6, 6);

    if clamped_stage == 0 {
        return base_stat;
    }

    let multiplier = if clamped_stage < 0 {
        2.0 / (2.0 + (-clamped_stage) as f64)
    } else {
        (2.0 + clamped_stage as f64) / 2.0
    };

    ((base_stat as f64) * multiplier).round() as u32
}
