//! Battle configuration loaded from RON.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::ConfigError;

/// Tunable parameters for a single battle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Seed for the battle RNG. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Maximum party size per side.
    pub party_size: usize,
    /// Clause effects attached to the field when the battle starts.
    pub clauses: Vec<String>,
    /// Faster combatants act first unless a speed-sort hook says otherwise.
    pub descending_speed: bool,
    /// Default `tracing` filter used by the demo binary when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl BattleConfig {
    pub const DEFAULT_PARTY_SIZE: usize = 6;
    pub const DEFAULT_LOG_FILTER: &'static str = "info";

    pub fn new() -> Self {
        Self {
            seed: None,
            party_size: Self::DEFAULT_PARTY_SIZE,
            clauses: Vec::new(),
            descending_speed: true,
            log_filter: Self::DEFAULT_LOG_FILTER.to_string(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_clause(mut self, clause: &str) -> Self {
        self.clauses.push(clause.to_string());
        self
    }

    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        let config: BattleConfig = ron::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config data from a RON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_ron_str(&content)?;
        debug!(path = %path.display(), ?config, "loaded battle config");
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.party_size == 0 {
            return Err(ConfigError::Invalid("party_size must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = BattleConfig::from_ron_str("(seed: Some(7), clauses: [\"Classic Sleep Clause\"])").unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.party_size, BattleConfig::DEFAULT_PARTY_SIZE);
        assert_eq!(config.clauses, vec!["Classic Sleep Clause".to_string()]);
        assert!(config.descending_speed);
    }

    #[test]
    fn test_zero_party_size_is_rejected() {
        let err = BattleConfig::from_ron_str("(party_size: 0)").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_config_is_a_parse_error() {
        let err = BattleConfig::from_ron_str("(seed: \"seven\")").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
