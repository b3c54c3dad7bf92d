//! The effect engine: records, their hook tables, the registry they are
//! built from, the containers that hold them and the dispatcher that runs
//! their hooks.

pub mod behavior;
pub mod container;
pub mod dispatch;
pub mod modifiers;
pub mod record;
pub mod registry;
