#[cfg(test)]
mod tests {
    use crate::battle::combatant::CombatantId;
    use crate::battle::messages::BattleMessage;
    use crate::battle::state::Battle;
    use crate::battle::tests::common::{
        assert_ok, assert_ok_true, create_team_battle, create_test_battle, has_effect, hypnosis, rain_dance, sandstorm, spikes, splash,
        standard_registry, trick_room, TestCombatantBuilder, P1, P2,
    };
    use crate::battle::turn::{Action, TurnPhaseController};
    use crate::config::BattleConfig;
    use crate::content::hazards::{clear_hazards, hazard_layers, lay_hazard, SPIKES, STEALTH_ROCK, TOXIC_SPIKES};
    use crate::content::weather::{active_weather, current_weather, start_weather, Weather, INDEFINITE};
    use crate::effects::behavior::DamageContext;
    use crate::effects::container::AttachOutcome;
    use crate::effects::modifiers::{Modifier, SLOT_MOD2};
    use crate::effects::record::EffectOwner;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use schema::{MoveCategory, MoveData, PokemonType, StatType};

    fn moves(p1: usize, p2: usize) -> [Option<Action>; 2] {
        [
            Some(Action::UseMove { move_index: p1 }),
            Some(Action::UseMove { move_index: p2 }),
        ]
    }

    fn weather_turns(battle: &Battle, weather: Weather) -> Option<i32> {
        battle
            .find(EffectOwner::Field, weather.effect_name())
            .and_then(|id| battle.effect(id))
            .map(|r| r.data.turns)
    }

    // === Weather ===

    #[test]
    fn test_weather_move_starts_weather() {
        let mut battle = create_test_battle(
            standard_registry(),
            TestCombatantBuilder::new("Tyranitar", PokemonType::Rock)
                .with_moves(vec![sandstorm()])
                .build(),
            TestCombatantBuilder::new("Snorlax", PokemonType::Normal).build(),
        );

        let report = assert_ok(TurnPhaseController::resolve_turn(&mut battle, moves(0, 0)));

        assert!(report.messages.contains(&BattleMessage::WeatherStarted { weather: Weather::Sand }));
        assert_eq!(current_weather(&battle), Some(Weather::Sand));
        // Rock types take no sand damage.
        assert_eq!(battle.hp(P1), 200);
        assert_eq!(battle.hp(P2), 188);
    }

    #[test]
    fn test_same_weather_twice_fails() {
        let mut battle = create_test_battle(
            standard_registry(),
            TestCombatantBuilder::new("Kingdra", PokemonType::Water)
                .with_moves(vec![rain_dance()])
                .build(),
            TestCombatantBuilder::new("Snorlax", PokemonType::Normal).build(),
        );
        assert_ok_true(start_weather(&mut battle, None, Weather::Rain, None));

        let report = assert_ok(TurnPhaseController::resolve_turn(&mut battle, moves(0, 0)));

        assert!(report.messages.contains(&BattleMessage::Failed));
    }

    #[test]
    fn test_new_weather_replaces_old() {
        let mut battle = create_test_battle(
            standard_registry(),
            TestCombatantBuilder::new("Kingdra", PokemonType::Water).build(),
            TestCombatantBuilder::new("Snorlax", PokemonType::Normal).build(),
        );
        assert_ok_true(start_weather(&mut battle, None, Weather::Rain, None));

        assert_ok_true(start_weather(&mut battle, None, Weather::Sun, None));

        assert_eq!(current_weather(&battle), Some(Weather::Sun));
        assert!(battle.log.contains(&BattleMessage::WeatherEnded { weather: Weather::Rain }));
        assert!(battle.find(EffectOwner::Field, "Rain").is_none());
    }

    #[test]
    fn test_weather_ends_after_five_turns() {
        // Arrange
        let mut battle = create_test_battle(
            standard_registry(),
            TestCombatantBuilder::new("Kingdra", PokemonType::Water).build(),
            TestCombatantBuilder::new("Snorlax", PokemonType::Normal).build(),
        );
        assert_ok_true(start_weather(&mut battle, None, Weather::Rain, None));

        // Act
        for _ in 0..4 {
            assert_ok(TurnPhaseController::resolve_turn(&mut battle, moves(0, 0)));
        }
        let still_raining = current_weather(&battle);
        let last = assert_ok(TurnPhaseController::resolve_turn(&mut battle, moves(0, 0)));

        // Assert
        assert_eq!(still_raining, Some(Weather::Rain));
        assert!(last.messages.contains(&BattleMessage::WeatherEnded { weather: Weather::Rain }));
        assert_eq!(current_weather(&battle), None);
    }

    #[test]
    fn test_weather_rock_extends_duration() {
        let mut battle = create_test_battle(
            standard_registry(),
            TestCombatantBuilder::new("Kingdra", PokemonType::Water)
                .with_item("Damp Rock")
                .build(),
            TestCombatantBuilder::new("Snorlax", PokemonType::Normal).build(),
        );

        assert_ok_true(start_weather(&mut battle, Some(P1), Weather::Rain, None));

        assert_eq!(weather_turns(&battle, Weather::Rain), Some(8));
    }

    #[test]
    fn test_drizzle_summons_endless_rain_on_entry() {
        // Arrange
        let mut battle = create_test_battle(
            standard_registry(),
            TestCombatantBuilder::new("Politoed", PokemonType::Water)
                .with_ability("Drizzle")
                .build(),
            TestCombatantBuilder::new("Snorlax", PokemonType::Normal).build(),
        );

        // Act
        assert_ok(battle.start());
        for _ in 0..6 {
            assert_ok(TurnPhaseController::resolve_turn(&mut battle, moves(0, 0)));
        }

        // Assert
        assert!(battle.log.contains(&BattleMessage::AbilityActivated {
            pokemon: "Politoed".to_string(),
            ability: "Drizzle",
        }));
        assert_eq!(weather_turns(&battle, Weather::Rain), Some(INDEFINITE));
    }

    #[test]
    fn test_rain_modifies_fire_and_water_moves() {
        let mut battle = create_test_battle(
            standard_registry(),
            TestCombatantBuilder::new("Kingdra", PokemonType::Water).build(),
            TestCombatantBuilder::new("Snorlax", PokemonType::Normal).build(),
        );
        assert_ok_true(start_weather(&mut battle, None, Weather::Rain, None));
        let surf = MoveData::new("Surf", PokemonType::Water, MoveCategory::Special, 95);
        let flamethrower = MoveData::new("Flamethrower", PokemonType::Fire, MoveCategory::Special, 95);

        let boosted = battle.damage_modifiers(&DamageContext {
            user: P1,
            target: P2,
            mv: &surf,
            critical: false,
        });
        let weakened = battle.damage_modifiers(&DamageContext {
            user: P1,
            target: P2,
            mv: &flamethrower,
            critical: false,
        });

        assert_eq!(boosted, vec![Modifier::new(SLOT_MOD2, 1.5, 3)]);
        assert_eq!(weakened, vec![Modifier::new(SLOT_MOD2, 0.5, 3)]);
    }

    #[test]
    fn test_cloud_nine_suppresses_weather() {
        // Arrange
        let mut battle = create_test_battle(
            standard_registry(),
            TestCombatantBuilder::new("Golduck", PokemonType::Water)
                .with_ability("Cloud Nine")
                .build(),
            TestCombatantBuilder::new("Snorlax", PokemonType::Normal).build(),
        );
        assert_ok_true(start_weather(&mut battle, None, Weather::Sand, None));

        // Act
        assert_ok(TurnPhaseController::resolve_turn(&mut battle, moves(0, 0)));

        // Assert
        assert_eq!(current_weather(&battle), Some(Weather::Sand));
        assert_eq!(active_weather(&battle), None);
        assert_eq!(battle.hp(P1), 200);
        assert_eq!(battle.hp(P2), 200);
    }

    #[rstest]
    #[case::sand_veil("Sand Veil")]
    #[case::magic_guard("Magic Guard")]
    fn test_abilities_avoid_sand_damage(#[case] ability: &str) {
        let mut battle = create_test_battle(
            standard_registry(),
            TestCombatantBuilder::new("Sandslash", PokemonType::Normal)
                .with_ability(ability)
                .build(),
            TestCombatantBuilder::new("Snorlax", PokemonType::Normal).build(),
        );
        assert_ok_true(start_weather(&mut battle, None, Weather::Sand, None));

        assert_ok(TurnPhaseController::resolve_turn(&mut battle, moves(0, 0)));

        assert_eq!(battle.hp(P1), 200);
        assert_eq!(battle.hp(P2), 188);
    }

    #[test]
    fn test_rain_dish_heals_in_rain() {
        let mut battle = create_test_battle(
            standard_registry(),
            TestCombatantBuilder::new("Ludicolo", PokemonType::Water)
                .with_hp(100)
                .with_ability("Rain Dish")
                .build(),
            TestCombatantBuilder::new("Snorlax", PokemonType::Normal).build(),
        );
        assert_ok_true(start_weather(&mut battle, None, Weather::Rain, None));

        let report = assert_ok(TurnPhaseController::resolve_turn(&mut battle, moves(0, 0)));

        assert_eq!(battle.hp(P1), 112);
        assert!(report.messages.contains(&BattleMessage::Healed {
            pokemon: "Ludicolo".to_string(),
            amount: 12,
            remaining: 112,
        }));
    }

    #[test]
    fn test_swift_swim_doubles_speed_in_rain() {
        let mut battle = create_test_battle(
            standard_registry(),
            TestCombatantBuilder::new("Kingdra", PokemonType::Water)
                .with_ability("Swift Swim")
                .build(),
            TestCombatantBuilder::new("Snorlax", PokemonType::Normal).build(),
        );
        let dry = battle.stat(P1, StatType::Spe);

        assert_ok_true(start_weather(&mut battle, None, Weather::Rain, None));

        assert_eq!(dry, 100);
        assert_eq!(battle.stat(P1, StatType::Spe), 200);
    }

    // === Trick Room ===

    #[test]
    fn test_trick_room_toggles_off_when_used_again() {
        let mut battle = create_test_battle(
            standard_registry(),
            TestCombatantBuilder::new("Bronzong", PokemonType::Steel)
                .with_moves(vec![trick_room()])
                .build(),
            TestCombatantBuilder::new("Snorlax", PokemonType::Normal).build(),
        );
        assert_ok(TurnPhaseController::resolve_turn(&mut battle, moves(0, 0)));
        assert!(!battle.speed_sort_descending());

        let report = assert_ok(TurnPhaseController::resolve_turn(&mut battle, moves(0, 0)));

        assert!(report.messages.contains(&BattleMessage::TrickRoomEnded));
        assert!(battle.speed_sort_descending());
    }

    #[test]
    fn test_trick_room_wears_off() {
        let mut battle = create_test_battle(
            standard_registry(),
            TestCombatantBuilder::new("Bronzong", PokemonType::Steel)
                .with_moves(vec![trick_room(), splash()])
                .build(),
            TestCombatantBuilder::new("Snorlax", PokemonType::Normal).build(),
        );
        assert_ok(TurnPhaseController::resolve_turn(&mut battle, moves(0, 0)));

        for _ in 0..4 {
            assert_ok(TurnPhaseController::resolve_turn(&mut battle, moves(1, 0)));
        }

        assert!(battle.log.contains(&BattleMessage::TrickRoomEnded));
        assert!(battle.find(EffectOwner::Field, "Trick Room").is_none());
    }

    // === Hazards ===

    const FORRETRESS: CombatantId = CombatantId(2);

    fn hazard_battle(entering: TestCombatantBuilder) -> Battle {
        create_team_battle(
            standard_registry(),
            BattleConfig::default(),
            vec![
                TestCombatantBuilder::new("Jolteon", PokemonType::Electric).build(),
                entering.build(),
            ],
            vec![TestCombatantBuilder::new("Forretress", PokemonType::Bug)
                .with_moves(vec![spikes()])
                .build()],
        )
    }

    fn switch_to_bench(battle: &mut Battle) {
        assert_ok(TurnPhaseController::resolve_turn(
            battle,
            [Some(Action::Switch { member: 1 }), Some(Action::UseMove { move_index: 0 })],
        ));
    }

    #[test]
    fn test_spikes_stack_to_three_layers() {
        let mut battle = hazard_battle(TestCombatantBuilder::new("Snorlax", PokemonType::Normal));

        for _ in 0..4 {
            assert_ok(TurnPhaseController::resolve_turn(&mut battle, moves(0, 0)));
        }

        assert_eq!(hazard_layers(&battle, SPIKES, 0), 3);
        assert_eq!(hazard_layers(&battle, SPIKES, 1), 0);
        assert!(battle.log.contains(&BattleMessage::Failed));
    }

    #[rstest]
    #[case::one_layer(1, 25)]
    #[case::two_layers(2, 37)]
    #[case::three_layers(3, 50)]
    fn test_spikes_hurt_grounded_entrants(#[case] layers: usize, #[case] damage: u32) {
        // Arrange
        let mut battle = hazard_battle(TestCombatantBuilder::new("Snorlax", PokemonType::Normal));
        for _ in 0..layers {
            assert_ok_true(lay_hazard(&mut battle, Some(FORRETRESS), SPIKES, 0));
        }

        // Act
        switch_to_bench(&mut battle);

        // Assert
        let snorlax = CombatantId(1);
        assert!(battle.log.contains(&BattleMessage::HazardDamage {
            pokemon: "Snorlax".to_string(),
            hazard: SPIKES,
            amount: damage,
        }));
        assert_eq!(battle.hp(snorlax), 200 - damage);
    }

    #[rstest]
    #[case::flying(TestCombatantBuilder::new("Pidgeot", PokemonType::Flying))]
    #[case::levitate(TestCombatantBuilder::new("Gengar", PokemonType::Ghost).with_ability("Levitate"))]
    fn test_spikes_miss_airborne_entrants(#[case] entering: TestCombatantBuilder) {
        let mut battle = hazard_battle(entering);
        assert_ok_true(lay_hazard(&mut battle, Some(FORRETRESS), SPIKES, 0));

        switch_to_bench(&mut battle);

        assert_eq!(battle.hp(CombatantId(1)), 200);
    }

    #[rstest]
    #[case::one_layer(1, "Poison")]
    #[case::two_layers(2, "Toxic")]
    fn test_toxic_spikes_poison_entrants(#[case] layers: usize, #[case] status: &str) {
        let mut battle = hazard_battle(TestCombatantBuilder::new("Snorlax", PokemonType::Normal));
        for _ in 0..layers {
            assert_ok_true(lay_hazard(&mut battle, Some(FORRETRESS), TOXIC_SPIKES, 0));
        }

        switch_to_bench(&mut battle);

        assert!(has_effect(&battle, CombatantId(1), status));
    }

    #[test]
    fn test_poison_entrant_absorbs_toxic_spikes() {
        let mut battle = hazard_battle(TestCombatantBuilder::new("Muk", PokemonType::Poison));
        assert_ok_true(lay_hazard(&mut battle, Some(FORRETRESS), TOXIC_SPIKES, 0));

        switch_to_bench(&mut battle);

        assert_eq!(hazard_layers(&battle, TOXIC_SPIKES, 0), 0);
        assert!(battle.log.contains(&BattleMessage::HazardAbsorbed {
            pokemon: "Muk".to_string(),
            hazard: TOXIC_SPIKES,
        }));
        assert!(!battle.has_special_status(CombatantId(1)));
    }

    #[test]
    fn test_stealth_rock_scales_with_rock_effectiveness() {
        let mut battle = hazard_battle(
            TestCombatantBuilder::new("Charizard", PokemonType::Fire).with_second_type(PokemonType::Flying),
        );
        assert_ok_true(lay_hazard(&mut battle, Some(FORRETRESS), STEALTH_ROCK, 0));
        assert!(!assert_ok(lay_hazard(&mut battle, Some(FORRETRESS), STEALTH_ROCK, 0)));

        switch_to_bench(&mut battle);

        assert_eq!(battle.hp(CombatantId(1)), 100);
    }

    #[test]
    fn test_cleared_side_is_safe_to_enter() {
        // Arrange
        let mut battle = hazard_battle(TestCombatantBuilder::new("Snorlax", PokemonType::Normal));
        assert_ok_true(lay_hazard(&mut battle, Some(FORRETRESS), SPIKES, 0));
        assert_ok_true(lay_hazard(&mut battle, Some(FORRETRESS), STEALTH_ROCK, 0));
        assert_ok_true(lay_hazard(&mut battle, Some(FORRETRESS), SPIKES, 1));

        // Act
        assert_ok(clear_hazards(&mut battle, 0));

        // Assert
        assert_eq!(hazard_layers(&battle, SPIKES, 0), 0);
        assert_eq!(hazard_layers(&battle, STEALTH_ROCK, 0), 0);
        assert_eq!(hazard_layers(&battle, SPIKES, 1), 1);
        switch_to_bench(&mut battle);
        assert_eq!(battle.hp(CombatantId(1)), 200);
    }

    // === Clauses ===

    fn clause_battle() -> Battle {
        create_team_battle(
            standard_registry(),
            BattleConfig::default().with_clause("Classic Sleep Clause"),
            vec![
                TestCombatantBuilder::new("Snorlax", PokemonType::Normal).build(),
                TestCombatantBuilder::new("Blissey", PokemonType::Normal).build(),
            ],
            vec![TestCombatantBuilder::new("Breloom", PokemonType::Grass).build()],
        )
    }

    #[test]
    fn test_sleep_clause_blocks_a_second_sleeper() {
        // Arrange
        let mut battle = clause_battle();
        let (snorlax, blissey, breloom) = (CombatantId(0), CombatantId(1), CombatantId(2));
        assert!(assert_ok(battle.apply_status(snorlax, Some(breloom), "Sleep")).is_applied());

        // Act
        let outcome = assert_ok(battle.apply_status(blissey, Some(breloom), "Sleep"));

        // Assert
        assert_eq!(outcome, AttachOutcome::Blocked);
        assert!(!has_effect(&battle, blissey, "Sleep"));
    }

    #[test]
    fn test_self_inflicted_sleep_does_not_count() {
        let mut battle = clause_battle();
        let (snorlax, blissey, breloom) = (CombatantId(0), CombatantId(1), CombatantId(2));
        assert!(assert_ok(battle.apply_status(snorlax, Some(snorlax), "Sleep")).is_applied());

        let outcome = assert_ok(battle.apply_status(blissey, Some(breloom), "Sleep"));

        assert!(outcome.is_applied());
    }

    #[test]
    fn test_sleep_clause_only_watches_sleep() {
        let mut battle = clause_battle();
        let (snorlax, blissey, breloom) = (CombatantId(0), CombatantId(1), CombatantId(2));
        assert!(assert_ok(battle.apply_status(snorlax, Some(breloom), "Sleep")).is_applied());

        let outcome = assert_ok(battle.apply_status(blissey, Some(breloom), "Paralysis"));

        assert!(outcome.is_applied());
    }

    #[test]
    fn test_sleep_move_fails_under_the_clause() {
        // Arrange
        let mut battle = create_team_battle(
            standard_registry(),
            BattleConfig::default().with_clause("Classic Sleep Clause"),
            vec![
                TestCombatantBuilder::new("Snorlax", PokemonType::Normal).build(),
                TestCombatantBuilder::new("Blissey", PokemonType::Normal).build(),
            ],
            vec![TestCombatantBuilder::new("Gengar", PokemonType::Ghost)
                .with_moves(vec![hypnosis()])
                .build()],
        );
        let (snorlax, blissey) = (CombatantId(0), CombatantId(1));
        assert_ok(TurnPhaseController::resolve_turn(&mut battle, moves(0, 0)));
        assert!(has_effect(&battle, snorlax, "Sleep"));

        // Act
        let report = assert_ok(TurnPhaseController::resolve_turn(
            &mut battle,
            [Some(Action::Switch { member: 1 }), Some(Action::UseMove { move_index: 0 })],
        ));

        // Assert
        assert!(report.messages.contains(&BattleMessage::Failed));
        assert!(!has_effect(&battle, blissey, "Sleep"));
    }
}
