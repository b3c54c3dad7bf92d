use std::path::Path;

use pokemon_effects::content::moves::{make_charge_move, make_status_move, MoveEffect, StatusMoveEffect};
use pokemon_effects::content::weather::Weather;
use pokemon_effects::{
    Action, Battle, BattleConfig, BattleMove, Combatant, EffectRegistry, MoveCategory, MoveData, MoveFlag, MoveTarget,
    PokemonType, StatType, TurnPhaseController,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const MAX_TURNS: u32 = 20;
const DEMO_SEED: u64 = 151;

fn main() {
    let config = match std::env::args().nth(1) {
        Some(path) => match BattleConfig::load(Path::new(&path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error loading config {}: {}", path, e);
                return;
            }
        },
        None => BattleConfig::default()
            .with_seed(DEMO_SEED)
            .with_clause("Classic Sleep Clause"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter)))
        .with_writer(std::io::stderr)
        .init();

    println!("=== Effect Engine Battle Demo ===");
    if let Err(e) = run_demo(config) {
        error!(error = %e, "demo battle aborted");
    }
}

fn demo_moves() -> Vec<BattleMove> {
    vec![
        BattleMove::damaging(
            MoveData::new("Body Slam", PokemonType::Normal, MoveCategory::Physical, 85).with_flag(MoveFlag::Contact),
        ),
        make_status_move(
            MoveData::new("Will-O-Wisp", PokemonType::Fire, MoveCategory::Other, 0)
                .with_accuracy(Some(75))
                .with_target(MoveTarget::Selected),
            vec![StatusMoveEffect::on_target(MoveEffect::Status("Burn"), 1.0)],
            true,
        ),
        make_status_move(
            MoveData::new("Swords Dance", PokemonType::Normal, MoveCategory::Other, 0).with_accuracy(None),
            vec![StatusMoveEffect::on_user(MoveEffect::StatChange(StatType::Atk, 2), 1.0)],
            false,
        ),
        BattleMove::weather(
            MoveData::new("Sandstorm", PokemonType::Rock, MoveCategory::Other, 0).with_accuracy(None),
            Weather::Sand,
        ),
    ]
}

fn demo_teams() -> [Vec<Combatant>; 2] {
    let flyer = make_charge_move(
        MoveData::new("Fly", PokemonType::Flying, MoveCategory::Physical, 90).with_accuracy(Some(95)),
        Some(vec!["Gust", "Thunder", "Twister", "Sky Uppercut"]),
    );
    [
        vec![
            Combatant::new("Snorlax", 50, vec![PokemonType::Normal], [260, 130, 85, 85, 130, 50])
                .with_ability("Thick Fat")
                .with_item("Leftovers")
                .with_moves(demo_moves()),
            Combatant::new("Pidgeot", 50, vec![PokemonType::Normal, PokemonType::Flying], [163, 100, 95, 90, 90, 121])
                .with_item("Sitrus Berry")
                .with_moves(vec![flyer]),
        ],
        vec![
            Combatant::new("Tyranitar", 50, vec![PokemonType::Rock, PokemonType::Dark], [175, 154, 130, 115, 120, 81])
                .with_ability("Sand Stream")
                .with_item("Life Orb")
                .with_moves(demo_moves()),
        ],
    ]
}

fn run_demo(config: BattleConfig) -> Result<(), Box<dyn std::error::Error>> {
    let registry = EffectRegistry::standard()?;
    info!(effects = registry.len(), "effect registry ready");

    let mut battle = Battle::new(config, registry, demo_teams())?;
    battle.start()?;
    battle.log.print_formatted();

    while !battle.is_over() && battle.turn_number < MAX_TURNS {
        let actions = choose_actions(&battle);
        let report = TurnPhaseController::resolve_turn(&mut battle, actions)?;
        for message in &report.messages {
            if let Some(text) = message.format() {
                println!("  {}", text);
            }
        }
        for party in report.needs_replacement.clone() {
            if let Some(member) = first_healthy_bench(&battle, party) {
                battle.switch_in(party, member)?;
            }
        }
        if report.winner.is_some() {
            println!();
            println!("Final turn report:");
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    match battle.winner() {
        Some(party) => println!("Player {} wins!", party + 1),
        None => println!("No winner after {} turns.", battle.turn_number),
    }
    Ok(())
}

/// Cycles through each active combatant's moves by turn number.
fn choose_actions(battle: &Battle) -> [Option<Action>; 2] {
    let mut actions = [None, None];
    for (party, action) in actions.iter_mut().enumerate() {
        if let Some(active) = battle.active_combatant(party, 0) {
            let count = battle.combatant(active).moves.len().max(1);
            let move_index = battle.turn_number as usize % count;
            *action = Some(Action::UseMove { move_index });
        }
    }
    actions
}

fn first_healthy_bench(battle: &Battle, party: usize) -> Option<usize> {
    let slots = &battle.parties[party];
    slots
        .members
        .iter()
        .position(|id| Some(*id) != slots.active && !battle.is_fainted(*id))
}
