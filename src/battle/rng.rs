use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

/// The single random source of a battle.
///
/// Every roll is a percentage outcome in `1..=100` so that scripted tests can
/// describe randomness the same way regardless of which mechanic consumes it.
#[derive(Debug, Clone)]
pub struct BattleRng {
    source: RngSource,
}

#[derive(Debug, Clone)]
enum RngSource {
    Seeded(StdRng),
    Scripted { outcomes: Vec<u8>, index: usize },
}

impl BattleRng {
    pub fn seeded(seed: u64) -> Self {
        Self {
            source: RngSource::Seeded(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_os_rng() -> Self {
        Self {
            source: RngSource::Seeded(StdRng::from_os_rng()),
        }
    }

    /// Replays `outcomes` in order. Running out is a test bug and panics.
    pub fn new_for_test(outcomes: Vec<u8>) -> Self {
        Self {
            source: RngSource::Scripted { outcomes, index: 0 },
        }
    }

    /// Number of scripted outcomes consumed so far (always 0 for seeded sources).
    pub fn consumed(&self) -> usize {
        match &self.source {
            RngSource::Seeded(_) => 0,
            RngSource::Scripted { index, .. } => *index,
        }
    }

    pub fn roll(&mut self, reason: &str) -> u8 {
        let outcome = match &mut self.source {
            RngSource::Seeded(rng) => rng.random_range(1..=100),
            RngSource::Scripted { outcomes, index } => {
                if *index >= outcomes.len() {
                    panic!(
                        "BattleRng exhausted! Tried to get a value for: '{}'. Need more random values.",
                        reason
                    );
                }
                let outcome = outcomes[*index];
                *index += 1;
                outcome
            }
        };
        trace!(outcome, reason, "rng consumed");
        outcome
    }

    /// Succeeds with probability `p`. Certain and impossible events consume nothing.
    /// Scripted sources compare a percentage roll against `p` rounded to a
    /// whole percent; seeded sources use `p` exactly.
    pub fn chance(&mut self, p: f64, reason: &str) -> bool {
        if p >= 1.0 {
            return true;
        }
        if p <= 0.0 {
            return false;
        }
        if let RngSource::Seeded(rng) = &mut self.source {
            let success = rng.random_bool(p);
            trace!(p, success, reason, "rng consumed");
            return success;
        }
        let threshold = (p * 100.0).round() as u8;
        self.roll(reason) <= threshold
    }

    /// Uniform value in `lo..=hi`.
    pub fn range(&mut self, lo: u32, hi: u32, reason: &str) -> u32 {
        if hi <= lo {
            return lo;
        }
        let span = hi - lo + 1;
        if let RngSource::Seeded(rng) = &mut self.source {
            let value = rng.random_range(lo..=hi);
            trace!(value, reason, "rng consumed");
            return value;
        }
        let roll = self.roll(reason) as u32;
        lo + roll.saturating_sub(1) % span
    }
}
