pub mod calculators;
pub mod combatant;
pub mod messages;
pub mod rng;
pub mod state;
pub mod stats;
pub mod turn;

#[cfg(test)]
pub(crate) mod tests;
