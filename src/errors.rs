use crate::battle::combatant::CombatantId;
use crate::effects::record::EffectId;
use thiserror::Error;

/// Main error type for the battle effect engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleEngineError {
    /// Error raised by the effect catalogue or an effect's hook
    #[error("Effect error: {0}")]
    Effect(#[from] EffectError),
    /// Error related to invalid battle state
    #[error("Battle state error: {0}")]
    BattleState(#[from] BattleStateError),
    /// Error related to invalid player actions
    #[error("Action error: {0}")]
    Action(#[from] ActionError),
}

/// Content and catalogue defects. Never a normal game outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EffectError {
    #[error("Effect '{name}' is already defined in category {category}")]
    DuplicateEffect { category: String, name: String },
    #[error("Unknown effect: {0}")]
    UnknownEffect(String),
    /// A handle outlived its record
    #[error("Effect handle {0:?} does not refer to a live record")]
    StaleHandle(EffectId),
    /// A hook was asked for data its record does not carry
    #[error("Effect '{name}' is missing required data: {field}")]
    MissingData { name: String, field: String },
    #[error("Effect '{0}' is owned by the field but requires a combatant subject")]
    RequiresCombatant(String),
}

/// Errors related to battle state validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleStateError {
    #[error("No active combatant for party {0}")]
    NoActiveCombatant(usize),
    #[error("Invalid party index: {0}")]
    InvalidPartyIndex(usize),
    #[error("Invalid combatant: {0:?}")]
    InvalidCombatant(CombatantId),
    #[error("Inconsistent battle state: {0}")]
    InconsistentState(String),
}

/// Errors related to submitted actions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("Invalid move index: {0}")]
    InvalidMoveIndex(usize),
    #[error("Invalid party member index: {0}")]
    InvalidMemberIndex(usize),
    #[error("Invalid action: {0}")]
    InvalidAction(String),
}

/// Errors raised while loading a battle configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Type alias for Results using BattleEngineError
pub type BattleResult<T> = Result<T, BattleEngineError>;

/// Type alias for Results using EffectError
pub type EffectResult<T> = Result<T, EffectError>;
