use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Source of uniform draws in `[0, 1)`.
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;
}

/// ChaCha-backed source. Seed it for reproducible obstacle layouts.
pub struct ChaChaSource(ChaCha8Rng);

impl ChaChaSource {
    pub fn seeded(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self(ChaCha8Rng::from_entropy())
    }
}

impl RandomSource for ChaChaSource {
    fn next_unit(&mut self) -> f64 {
        self.0.gen_range(0.0..1.0)
    }
}

/// Replays a fixed list of draws, cycling when it runs out.
///
/// Values are clamped into `[0, 1)` so a test cannot feed the simulation
/// something a real source never would. An empty list draws `0.0`.
pub struct SequenceSource {
    values: Vec<f64>,
    next: usize,
}

impl SequenceSource {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        let mut values = values.into();
        if values.is_empty() {
            values.push(0.0);
        }
        Self { values, next: 0 }
    }
}

impl RandomSource for SequenceSource {
    fn next_unit(&mut self) -> f64 {
        let value = self.values[self.next % self.values.len()];
        self.next += 1;
        value.clamp(0.0, 1.0 - f64::EPSILON)
    }
}
