// Battle effect schema - shared type definitions
// This crate contains the plain, serializable vocabulary consumed by the
// effect engine: elemental types and their chart, stats, and move data.

// Re-export the main types
pub use battle_data::*;
pub use pokemon_types::*;

pub mod battle_data;
pub mod pokemon_types;
