use ordered_float::OrderedFloat;
use schema::StatType;
use serde::Serialize;
use std::fmt;

use crate::content::weather::Weather;

/// Game-visible outcome text. The order in which messages are printed is part
/// of the observable battle state.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub enum BattleMessage {
    // Turn Management
    TurnStarted {
        turn_number: u32,
    },

    // Combatant Actions
    SwitchedIn {
        party: usize,
        pokemon: String,
    },
    Withdrew {
        party: usize,
        pokemon: String,
    },
    MoveUsed {
        pokemon: String,
        move_name: String,
    },
    MoveMissed {
        pokemon: String,
    },
    /// "But it failed!"
    Failed,
    NoEffect {
        pokemon: String,
    },
    CriticalHit,
    Effectiveness {
        multiplier: OrderedFloat<f64>,
    },
    Damaged {
        pokemon: String,
        amount: u32,
        remaining: u32,
    },
    Healed {
        pokemon: String,
        amount: u32,
        remaining: u32,
    },
    Fainted {
        pokemon: String,
    },

    // Status Effects
    StatusApplied {
        pokemon: String,
        status: &'static str,
    },
    StatusCured {
        pokemon: String,
        status: &'static str,
    },
    StatusDamage {
        pokemon: String,
        status: &'static str,
        amount: u32,
    },
    FastAsleep {
        pokemon: String,
    },
    WokeUp {
        pokemon: String,
    },
    FullyParalyzed {
        pokemon: String,
    },
    FrozenSolid {
        pokemon: String,
    },
    Thawed {
        pokemon: String,
    },
    Flinched {
        pokemon: String,
    },
    Vetoed {
        pokemon: String,
        by: &'static str,
    },
    StatChanged {
        pokemon: String,
        stat: StatType,
        delta: i8,
    },
    StatUnchanged {
        pokemon: String,
        stat: StatType,
        rising: bool,
    },
    StatChangeBlocked {
        pokemon: String,
    },

    // Abilities and Items
    AbilityActivated {
        pokemon: String,
        ability: &'static str,
    },
    ItemHealed {
        pokemon: String,
        item: &'static str,
        amount: u32,
    },
    ItemHurt {
        pokemon: String,
        item: &'static str,
        amount: u32,
    },
    ItemCuredStatus {
        pokemon: String,
        item: &'static str,
        status: &'static str,
    },

    // Field Effects
    WeatherStarted {
        weather: Weather,
    },
    WeatherContinues {
        weather: Weather,
    },
    WeatherEnded {
        weather: Weather,
    },
    WeatherDamage {
        pokemon: String,
        weather: Weather,
        amount: u32,
    },
    TrickRoomStarted,
    TrickRoomEnded,
    HazardLaid {
        party: usize,
        hazard: &'static str,
    },
    HazardDamage {
        pokemon: String,
        hazard: &'static str,
        amount: u32,
    },
    HazardAbsorbed {
        pokemon: String,
        hazard: &'static str,
    },
    ClauseActivated {
        clause: &'static str,
    },

    // Move Mechanics
    ChargingUp {
        pokemon: String,
        move_name: String,
    },
    AvoidedAttack {
        pokemon: String,
    },
}

impl BattleMessage {
    /// Human readable text for the message, or `None` for messages that are
    /// recorded but not shown.
    pub fn format(&self) -> Option<String> {
        match self {
            BattleMessage::TurnStarted { turn_number } => Some(format!("=== Turn {} ===", turn_number)),

            BattleMessage::SwitchedIn { party, pokemon } => {
                Some(format!("Player {} sent out {}!", party + 1, pokemon))
            }
            BattleMessage::Withdrew { party, pokemon } => {
                Some(format!("Player {} withdrew {}!", party + 1, pokemon))
            }
            BattleMessage::MoveUsed { pokemon, move_name } => Some(format!("{} used {}!", pokemon, move_name)),
            BattleMessage::MoveMissed { pokemon } => Some(format!("{}'s attack missed!", pokemon)),
            BattleMessage::Failed => Some("But it failed!".to_string()),
            BattleMessage::NoEffect { pokemon } => Some(format!("It doesn't affect {}...", pokemon)),
            BattleMessage::CriticalHit => Some("A critical hit!".to_string()),
            BattleMessage::Effectiveness { multiplier } => match multiplier.into_inner() {
                m if m > 1.0 => Some("It's super effective!".to_string()),
                m if m > 0.0 && m < 1.0 => Some("It's not very effective...".to_string()),
                _ => None,
            },
            BattleMessage::Damaged { pokemon, amount, remaining } => Some(format!(
                "{} took {} damage! ({} HP remaining)",
                pokemon, amount, remaining
            )),
            BattleMessage::Healed { pokemon, amount, remaining } => Some(format!(
                "{} recovered {} HP! ({} HP remaining)",
                pokemon, amount, remaining
            )),
            BattleMessage::Fainted { pokemon } => Some(format!("{} fainted!", pokemon)),

            BattleMessage::StatusApplied { pokemon, status } => Some(match *status {
                "Burn" => format!("{} was burned!", pokemon),
                "Poison" => format!("{} was poisoned!", pokemon),
                "Toxic" => format!("{} was badly poisoned!", pokemon),
                "Paralysis" => format!("{} is paralyzed! It may be unable to move!", pokemon),
                "Sleep" => format!("{} fell asleep!", pokemon),
                "Freeze" => format!("{} was frozen solid!", pokemon),
                "Substitute" => format!("{} made a substitute!", pokemon),
                other => format!("{} is now affected by {}!", pokemon, other),
            }),
            BattleMessage::StatusCured { pokemon, status } => Some(format!("{} was cured of its {}!", pokemon, status)),
            BattleMessage::StatusDamage { pokemon, status, .. } => Some(match *status {
                "Burn" => format!("{} was hurt by its burn!", pokemon),
                "Poison" | "Toxic" => format!("{} was hurt by poison!", pokemon),
                other => format!("{} was hurt by {}!", pokemon, other),
            }),
            BattleMessage::FastAsleep { pokemon } => Some(format!("{} is fast asleep.", pokemon)),
            BattleMessage::WokeUp { pokemon } => Some(format!("{} woke up!", pokemon)),
            BattleMessage::FullyParalyzed { pokemon } => Some(format!("{} is paralyzed! It can't move!", pokemon)),
            BattleMessage::FrozenSolid { pokemon } => Some(format!("{} is frozen solid!", pokemon)),
            BattleMessage::Thawed { pokemon } => Some(format!("{} was defrosted!", pokemon)),
            BattleMessage::Flinched { pokemon } => Some(format!("{} flinched!", pokemon)),
            BattleMessage::Vetoed { pokemon, by } => Some(format!("{} was stopped by {}!", pokemon, by)),
            BattleMessage::StatChanged { pokemon, stat, delta } => {
                let magnitude = match delta.abs() {
                    1 => "",
                    2 => " sharply",
                    _ => " drastically",
                };
                let direction = if *delta > 0 { "rose" } else { "fell" };
                Some(format!("{}'s {}{} {}!", pokemon, stat, magnitude, direction))
            }
            BattleMessage::StatUnchanged { pokemon, stat, rising } => {
                let direction = if *rising { "higher" } else { "lower" };
                Some(format!("{}'s {} won't go any {}!", pokemon, stat, direction))
            }
            BattleMessage::StatChangeBlocked { pokemon } => Some(format!("{}'s stats were not lowered!", pokemon)),

            BattleMessage::AbilityActivated { pokemon, ability } => Some(format!("[{}'s {}]", pokemon, ability)),
            BattleMessage::ItemHealed { pokemon, item, .. } => {
                Some(format!("{} restored HP using its {}!", pokemon, item))
            }
            BattleMessage::ItemHurt { pokemon, item, .. } => Some(format!("{} was hurt by its {}!", pokemon, item)),
            BattleMessage::ItemCuredStatus { pokemon, item, status } => {
                Some(format!("{}'s {} cured its {}!", pokemon, item, status))
            }

            BattleMessage::WeatherStarted { weather } => Some(weather.started_text().to_string()),
            BattleMessage::WeatherContinues { weather } => Some(weather.continues_text().to_string()),
            BattleMessage::WeatherEnded { weather } => Some(weather.ended_text().to_string()),
            BattleMessage::WeatherDamage { pokemon, weather, .. } => {
                Some(format!("{} is buffeted by the {}!", pokemon, weather))
            }
            BattleMessage::TrickRoomStarted => Some("The dimensions were twisted!".to_string()),
            BattleMessage::TrickRoomEnded => Some("The twisted dimensions returned to normal!".to_string()),
            BattleMessage::HazardLaid { party, hazard } => {
                Some(format!("{} surrounds Player {}'s side!", hazard, party + 1))
            }
            BattleMessage::HazardDamage { pokemon, hazard, .. } => {
                Some(format!("{} was hurt by {}!", pokemon, hazard))
            }
            BattleMessage::HazardAbsorbed { pokemon, hazard } => {
                Some(format!("{} absorbed the {}!", pokemon, hazard))
            }
            BattleMessage::ClauseActivated { clause } => Some(format!("{} activated.", clause)),

            BattleMessage::ChargingUp { pokemon, move_name } => {
                Some(format!("{} is charging up {}!", pokemon, move_name))
            }
            BattleMessage::AvoidedAttack { pokemon } => Some(format!("{} avoided the attack!", pokemon)),
        }
    }
}

impl fmt::Display for BattleMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.format() {
            Some(text) => write!(f, "{}", text),
            None => write!(f, "{:?}", self),
        }
    }
}

/// Ordered record of every message printed during a battle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MessageLog {
    messages: Vec<BattleMessage>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self { messages: Vec::new() }
    }

    pub fn push(&mut self, message: BattleMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[BattleMessage] {
        &self.messages
    }

    /// Messages printed after the first `start` entries.
    pub fn since(&self, start: usize) -> &[BattleMessage] {
        &self.messages[start.min(self.messages.len())..]
    }

    pub fn contains(&self, message: &BattleMessage) -> bool {
        self.messages.contains(message)
    }

    /// Print all messages using their formatted text. Falls back to debug
    /// format for silent messages.
    pub fn print_formatted(&self) {
        for message in &self.messages {
            match message.format() {
                Some(formatted) => println!("  {}", formatted),
                None => println!("  {:?} (silent)", message),
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }
}

impl fmt::Display for MessageLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for message in &self.messages {
            writeln!(f, "  {}", message)?;
        }
        Ok(())
    }
}
