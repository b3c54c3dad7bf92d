#[cfg(test)]
mod tests {
    use crate::battle::messages::BattleMessage;
    use crate::battle::rng::BattleRng;
    use crate::battle::tests::common::{
        assert_ok, create_team_battle, create_test_battle, ember, has_effect, headbutt, splash, standard_registry,
        swords_dance, thunder_wave, TestCombatantBuilder, P1, P2,
    };
    use crate::battle::turn::{Action, TurnPhaseController};
    use crate::battle::combatant::CombatantId;
    use crate::config::BattleConfig;
    use crate::effects::container::AttachOutcome;
    use crate::effects::record::{EffectData, EffectOwner};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use schema::{PokemonType, StatType};

    fn moves(p1: usize, p2: usize) -> [Option<Action>; 2] {
        [
            Some(Action::UseMove { move_index: p1 }),
            Some(Action::UseMove { move_index: p2 }),
        ]
    }

    #[rstest]
    #[case::fire_cannot_burn("Burn", PokemonType::Fire)]
    #[case::poison_cannot_be_poisoned("Poison", PokemonType::Poison)]
    #[case::steel_cannot_be_poisoned("Toxic", PokemonType::Steel)]
    #[case::ice_cannot_freeze("Freeze", PokemonType::Ice)]
    fn test_type_immunities_reject_status(#[case] status: &str, #[case] pokemon_type: PokemonType) {
        // Arrange
        let mut battle = create_test_battle(
            standard_registry(),
            TestCombatantBuilder::new("Target", pokemon_type).build(),
            TestCombatantBuilder::new("Gengar", PokemonType::Ghost).build(),
        );

        // Act
        let outcome = assert_ok(battle.apply_status(P1, Some(P2), status));

        // Assert
        assert_eq!(outcome, AttachOutcome::Rejected);
        assert!(!has_effect(&battle, P1, status));
        assert!(!battle.has_special_status(P1));
    }

    #[test]
    fn test_toxic_damage_escalates() {
        let mut battle = create_test_battle(
            standard_registry(),
            TestCombatantBuilder::new("Snorlax", PokemonType::Normal).build(),
            TestCombatantBuilder::new("Gengar", PokemonType::Ghost).build(),
        );
        assert!(assert_ok(battle.apply_status(P1, Some(P2), "Toxic")).is_applied());

        let mut amounts = Vec::new();
        for _ in 0..3 {
            let report = assert_ok(TurnPhaseController::resolve_turn(&mut battle, moves(0, 0)));
            amounts.extend(report.messages.iter().filter_map(|m| match m {
                BattleMessage::StatusDamage { amount, .. } => Some(*amount),
                _ => None,
            }));
        }

        assert_eq!(amounts, vec![12, 25, 37]);
    }

    #[test]
    fn test_paralysis_quarters_speed() {
        let mut battle = create_test_battle(
            standard_registry(),
            TestCombatantBuilder::new("Snorlax", PokemonType::Normal).build(),
            TestCombatantBuilder::new("Raichu", PokemonType::Electric).build(),
        );

        assert!(assert_ok(battle.apply_status(P1, Some(P2), "Paralysis")).is_applied());

        assert_eq!(battle.stat(P1, StatType::Spe), 25);
        assert_eq!(battle.stat(P2, StatType::Spe), 100);
    }

    #[test]
    fn test_full_paralysis_stops_the_move() {
        // Arrange
        let battle = create_test_battle(
            standard_registry(),
            TestCombatantBuilder::new("Snorlax", PokemonType::Normal).build(),
            TestCombatantBuilder::new("Raichu", PokemonType::Electric).build(),
        );
        let mut battle = battle.with_rng(BattleRng::new_for_test(vec![90, 50, 50, 50]));
        assert!(assert_ok(battle.apply_status(P1, Some(P2), "Paralysis")).is_applied());

        // Act
        let report = assert_ok(TurnPhaseController::resolve_turn(&mut battle, moves(0, 0)));

        // Assert
        assert_eq!(report.order, vec![P2, P1]);
        assert!(report.messages.contains(&BattleMessage::FullyParalyzed {
            pokemon: "Snorlax".to_string(),
        }));
        assert!(!report.messages.contains(&BattleMessage::MoveUsed {
            pokemon: "Snorlax".to_string(),
            move_name: "Splash".to_string(),
        }));
    }

    #[test]
    fn test_status_move_paralyzes() {
        let mut battle = create_test_battle(
            standard_registry(),
            TestCombatantBuilder::new("Raichu", PokemonType::Electric)
                .with_moves(vec![thunder_wave()])
                .build(),
            TestCombatantBuilder::new("Snorlax", PokemonType::Normal).build(),
        );

        let report = assert_ok(TurnPhaseController::resolve_turn(&mut battle, moves(0, 0)));

        assert!(has_effect(&battle, P2, "Paralysis"));
        assert!(report.messages.contains(&BattleMessage::StatusApplied {
            pokemon: "Snorlax".to_string(),
            status: "Paralysis",
        }));
    }

    #[rstest]
    #[case::wakes_on_second_turn(None, vec![false, true])]
    #[case::early_bird_wakes_at_once(Some("Early Bird"), vec![true, true])]
    fn test_sleep_counts_down(#[case] ability: Option<&str>, #[case] acted: Vec<bool>) {
        // Arrange
        let mut sleeper = TestCombatantBuilder::new("Snorlax", PokemonType::Normal);
        if let Some(ability) = ability {
            sleeper = sleeper.with_ability(ability);
        }
        let mut battle = create_test_battle(
            standard_registry(),
            sleeper.build(),
            TestCombatantBuilder::new("Gengar", PokemonType::Ghost).build(),
        );
        let outcome = assert_ok(battle.apply_status_with(P1, Some(P2), "Sleep", EffectData::with_turns(2)));
        assert!(outcome.is_applied());

        // Act
        let mut moved = Vec::new();
        for _ in 0..2 {
            let report = assert_ok(TurnPhaseController::resolve_turn(&mut battle, moves(0, 0)));
            moved.push(report.messages.contains(&BattleMessage::MoveUsed {
                pokemon: "Snorlax".to_string(),
                move_name: "Splash".to_string(),
            }));
        }

        // Assert
        assert_eq!(moved, acted);
        assert!(!has_effect(&battle, P1, "Sleep"));
        assert!(battle.log.contains(&BattleMessage::WokeUp {
            pokemon: "Snorlax".to_string(),
        }));
    }

    #[test]
    fn test_sleep_duration_comes_from_the_random_source() {
        let mut battle = create_test_battle(
            standard_registry(),
            TestCombatantBuilder::new("Snorlax", PokemonType::Normal).build(),
            TestCombatantBuilder::new("Gengar", PokemonType::Ghost).build(),
        );

        let Some(sleep) = assert_ok(battle.apply_status(P1, Some(P2), "Sleep")).id() else {
            panic!("Sleep should attach");
        };

        // A roll of 50 lands on the second of four possible durations.
        assert_eq!(battle.effect(sleep).map(|r| r.data.turns), Some(2));
    }

    #[test]
    fn test_fire_hit_thaws_frozen_target() {
        // Arrange
        let mut battle = create_test_battle(
            standard_registry(),
            TestCombatantBuilder::new("Magmar", PokemonType::Fire)
                .with_speed(150)
                .with_moves(vec![ember()])
                .build(),
            TestCombatantBuilder::new("Snorlax", PokemonType::Normal).build(),
        );
        assert!(assert_ok(battle.apply_status(P2, Some(P1), "Freeze")).is_applied());

        // Act
        let report = assert_ok(TurnPhaseController::resolve_turn(&mut battle, moves(0, 0)));

        // Assert
        assert!(report.messages.contains(&BattleMessage::Thawed {
            pokemon: "Snorlax".to_string(),
        }));
        assert!(!has_effect(&battle, P2, "Freeze"));
        assert!(report.messages.contains(&BattleMessage::MoveUsed {
            pokemon: "Snorlax".to_string(),
            move_name: "Splash".to_string(),
        }));
    }

    #[test]
    fn test_frozen_combatant_stays_frozen_on_a_high_roll() {
        let mut battle = create_test_battle(
            standard_registry(),
            TestCombatantBuilder::new("Snorlax", PokemonType::Normal).build(),
            TestCombatantBuilder::new("Gengar", PokemonType::Ghost).with_speed(150).build(),
        );
        assert!(assert_ok(battle.apply_status(P1, Some(P2), "Freeze")).is_applied());

        let report = assert_ok(TurnPhaseController::resolve_turn(&mut battle, moves(0, 0)));

        assert!(report.messages.contains(&BattleMessage::FrozenSolid {
            pokemon: "Snorlax".to_string(),
        }));
        assert!(has_effect(&battle, P1, "Freeze"));
    }

    #[test]
    fn test_flinch_stops_slower_target_and_expires() {
        // Arrange
        let battle = create_test_battle(
            standard_registry(),
            TestCombatantBuilder::new("Tauros", PokemonType::Water)
                .with_speed(150)
                .with_moves(vec![headbutt()])
                .build(),
            TestCombatantBuilder::new("Snorlax", PokemonType::Normal).build(),
        );
        // accuracy, critical hit, damage roll, flinch chance
        let mut battle = battle.with_rng(BattleRng::new_for_test(vec![50, 50, 50, 10, 50, 50]));

        // Act
        let report = assert_ok(TurnPhaseController::resolve_turn(&mut battle, moves(0, 0)));

        // Assert
        assert!(report.messages.contains(&BattleMessage::Flinched {
            pokemon: "Snorlax".to_string(),
        }));
        assert!(!has_effect(&battle, P2, "Flinch"));
    }

    #[test]
    fn test_substitute_blocks_statuses_from_others() {
        // Arrange
        let mut battle = create_test_battle(
            standard_registry(),
            TestCombatantBuilder::new("Raichu", PokemonType::Electric)
                .with_moves(vec![thunder_wave()])
                .build(),
            TestCombatantBuilder::new("Snorlax", PokemonType::Normal).build(),
        );
        assert!(assert_ok(battle.apply_status(P2, Some(P2), "Substitute")).is_applied());

        // Act
        let report = assert_ok(TurnPhaseController::resolve_turn(&mut battle, moves(0, 0)));

        // Assert
        assert_eq!(battle.hp(P2), 150);
        assert!(report.messages.contains(&BattleMessage::Failed));
        assert!(!has_effect(&battle, P2, "Paralysis"));
    }

    #[test]
    fn test_substitute_needs_enough_hp() {
        let mut battle = create_test_battle(
            standard_registry(),
            TestCombatantBuilder::new("Snorlax", PokemonType::Normal).with_hp(50).build(),
            TestCombatantBuilder::new("Gengar", PokemonType::Ghost).build(),
        );

        let outcome = assert_ok(battle.apply_status(P1, Some(P1), "Substitute"));

        assert_eq!(outcome, AttachOutcome::Rejected);
        assert_eq!(battle.hp(P1), 50);
    }

    #[test]
    fn test_stat_stages_cap_at_six() {
        let mut battle = create_test_battle(
            standard_registry(),
            TestCombatantBuilder::new("Scyther", PokemonType::Bug)
                .with_moves(vec![swords_dance()])
                .build(),
            TestCombatantBuilder::new("Snorlax", PokemonType::Normal).build(),
        );

        for _ in 0..4 {
            assert_ok(TurnPhaseController::resolve_turn(&mut battle, moves(0, 0)));
        }

        assert_eq!(battle.stat_level(P1, StatType::Atk), 6);
        assert!(battle.log.contains(&BattleMessage::StatUnchanged {
            pokemon: "Scyther".to_string(),
            stat: StatType::Atk,
            rising: true,
        }));
        assert_eq!(battle.stat(P1, StatType::Atk), 400);
    }

    #[test]
    fn test_switching_out_unwinds_volatile_effects() {
        // Arrange
        let mut battle = create_team_battle(
            standard_registry(),
            BattleConfig::default(),
            vec![
                TestCombatantBuilder::new("Scyther", PokemonType::Bug).build(),
                TestCombatantBuilder::new("Snorlax", PokemonType::Normal).build(),
            ],
            vec![TestCombatantBuilder::new("Gengar", PokemonType::Ghost).build()],
        );
        assert_ok(battle.apply_stat_change(P1, Some(P1), StatType::Atk, 2));
        assert!(assert_ok(battle.apply_status(P1, Some(CombatantId(2)), "Toxic")).is_applied());
        assert!(assert_ok(battle.apply_status(P1, Some(CombatantId(2)), "Flinch")).is_applied());

        // Act
        assert_ok(TurnPhaseController::resolve_turn(
            &mut battle,
            [Some(Action::Switch { member: 1 }), Some(Action::UseMove { move_index: 0 })],
        ));

        // Assert
        assert_eq!(battle.stat_level(P1, StatType::Atk), 0);
        assert!(!has_effect(&battle, P1, "StatChange"));
        assert!(!has_effect(&battle, P1, "Flinch"));
        assert!(has_effect(&battle, P1, "Toxic"));
        assert!(has_effect(&battle, P1, "DamageListener"));
    }

    #[test]
    fn test_damage_listener_remembers_hits_until_next_turn() {
        let mut battle = create_test_battle(
            standard_registry(),
            TestCombatantBuilder::new("Magmar", PokemonType::Fire)
                .with_moves(vec![ember()])
                .build(),
            TestCombatantBuilder::new("Snorlax", PokemonType::Normal)
                .with_moves(vec![splash()])
                .build(),
        );

        assert_ok(TurnPhaseController::resolve_turn(&mut battle, moves(0, 0)));
        let hit = assert_ok(crate::content::statuses::pop_recent_damage(&mut battle, P2, None));

        assert_eq!(hit.map(|h| h.attacker), Some(P1));
        assert_eq!(hit.map(|h| h.move_type), Some(PokemonType::Fire));
        assert_eq!(assert_ok(crate::content::statuses::pop_recent_damage(&mut battle, P2, None)), None);
    }

    #[test]
    fn test_fainting_destroys_every_record_on_the_combatant() {
        // Arrange
        let mut battle = create_test_battle(
            standard_registry(),
            TestCombatantBuilder::new("Gengar", PokemonType::Ghost)
                .with_hp(10)
                .build(),
            TestCombatantBuilder::new("Snorlax", PokemonType::Normal).build(),
        );
        assert!(assert_ok(battle.apply_status(P1, Some(P2), "Burn")).is_applied());
        assert_eq!(assert_ok(battle.apply_stat_change(P1, None, StatType::Atk, 2)), 2);

        // Act
        assert_ok(TurnPhaseController::resolve_turn(&mut battle, moves(0, 0)));

        // Assert
        assert!(battle.is_fainted(P1));
        assert!(!has_effect(&battle, P1, "Burn"));
        assert!(!has_effect(&battle, P1, "StatChange"));
        assert_eq!(battle.stat_level(P1, StatType::Atk), 0);
        assert!(battle.container(EffectOwner::Combatant(P1)).is_empty());
    }
}
