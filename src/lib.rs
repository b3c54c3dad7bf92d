//! Effect and hook dispatch engine for a turn-based monster battler.
//!
//! Every status, ability, held item, weather, hazard and clause is an effect
//! record attached to a combatant or to the field. The turn controller asks
//! the dispatcher for vetoes, transforms and modifiers at fixed points of each
//! turn, and ticks the records at the end of it.

pub mod battle;
pub mod config;
pub mod content;
pub mod effects;
pub mod errors;

// --- From the `schema` crate ---
pub use schema::{MoveCategory, MoveData, MoveFlag, MoveTarget, PokemonType, StatType};

// --- From this crate's modules ---
pub use battle::combatant::{Combatant, CombatantId};
pub use battle::messages::{BattleMessage, MessageLog};
pub use battle::rng::BattleRng;
pub use battle::state::Battle;
pub use battle::turn::{Action, DamagePreview, TurnPhase, TurnPhaseController, TurnReport};
pub use config::BattleConfig;
pub use content::moves::BattleMove;
pub use effects::behavior::EffectBehavior;
pub use effects::container::AttachOutcome;
pub use effects::record::{EffectCategory, EffectId, EffectOwner, EffectRecord};
pub use effects::registry::EffectRegistry;

pub use errors::{ActionError, BattleEngineError, BattleResult, BattleStateError, ConfigError, EffectError, EffectResult};
