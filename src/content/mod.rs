//! The content catalogue: every concrete status, ability, item, weather,
//! hazard and clause, and the move behavior factories.

pub mod abilities;
pub mod clauses;
pub mod hazards;
pub mod items;
pub mod moves;
pub mod statuses;
pub mod weather;

use crate::effects::registry::EffectRegistry;
use crate::errors::EffectResult;

/// Defines the whole catalogue in `registry`. Fails on the first name that
/// is defined twice.
pub fn register_all(registry: &mut EffectRegistry) -> EffectResult<()> {
    statuses::register(registry)?;
    abilities::register(registry)?;
    items::register(registry)?;
    weather::register(registry)?;
    hazards::register(registry)?;
    clauses::register(registry)?;
    Ok(())
}
