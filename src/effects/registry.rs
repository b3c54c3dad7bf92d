use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::effects::behavior::EffectBehavior;
use crate::effects::record::EffectCategory;
use crate::errors::{EffectError, EffectResult};

/// A constructible effect. Attaching a prototype creates a fresh record.
pub type EffectPrototype = Arc<EffectBehavior>;

/// Catalogue of every effect a battle can instantiate, keyed by name.
///
/// Names are unique across categories so that runtime lookups by name are
/// never ambiguous. Built once, read-only afterwards.
#[derive(Debug, Default)]
pub struct EffectRegistry {
    entries: HashMap<&'static str, EffectPrototype>,
}

static STANDARD: OnceLock<EffectResult<Arc<EffectRegistry>>> = OnceLock::new();

impl EffectRegistry {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// The full content catalogue, built on first use and shared afterwards.
    pub fn standard() -> EffectResult<Arc<EffectRegistry>> {
        STANDARD
            .get_or_init(|| {
                let mut registry = EffectRegistry::new();
                crate::content::register_all(&mut registry)?;
                debug!(effects = registry.len(), "standard effect registry built");
                Ok(Arc::new(registry))
            })
            .clone()
    }

    /// The standard catalogue extended with extra definitions, e.g. effects
    /// defined by a single test or format.
    pub fn standard_with(extra: Vec<EffectBehavior>) -> EffectResult<Arc<EffectRegistry>> {
        let mut registry = EffectRegistry::new();
        crate::content::register_all(&mut registry)?;
        for behavior in extra {
            registry.define(behavior)?;
        }
        Ok(Arc::new(registry))
    }

    pub fn define(&mut self, behavior: EffectBehavior) -> EffectResult<EffectPrototype> {
        if let Some(existing) = self.entries.get(behavior.name) {
            return Err(EffectError::DuplicateEffect {
                category: existing.category.to_string(),
                name: behavior.name.to_string(),
            });
        }
        let prototype = Arc::new(behavior);
        self.entries.insert(prototype.name, Arc::clone(&prototype));
        Ok(prototype)
    }

    pub fn get(&self, name: &str) -> EffectResult<EffectPrototype> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| EffectError::UnknownEffect(name.to_string()))
    }

    /// Like `get`, but also requires the effect to belong to `category`.
    pub fn get_in(&self, category: EffectCategory, name: &str) -> EffectResult<EffectPrototype> {
        match self.entries.get(name) {
            Some(prototype) if prototype.category == category => Ok(Arc::clone(prototype)),
            _ => Err(EffectError::UnknownEffect(format!("{} {}", category, name))),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Names in `category`, sorted.
    pub fn names_in(&self, category: EffectCategory) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self
            .entries
            .values()
            .filter(|p| p.category == category)
            .map(|p| p.name)
            .collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
