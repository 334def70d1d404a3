//! Session Generator
//!
//! Deterministic pseudo-random session stream. Event `i` depends only on the
//! seed and `i`, so any prefix can be regenerated independently.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::domain::SessionEvent;

const SCENES: [&str; 6] = [
    "training_ground",
    "urban_lab",
    "zero_day",
    "coastal_ridge",
    "forest_reclaim",
    "industrial_loop",
];

const CONTENT_VERSIONS: [u32; 3] = [100, 101, 110];
const RULES_VERSIONS: [u32; 3] = [1, 2, 3];

#[derive(Debug, Clone, Copy)]
pub struct SessionGenerator {
    seed: i64,
}

impl SessionGenerator {
    pub fn new(seed: i64) -> Self {
        Self { seed }
    }

    /// Generate the event for zero-based session `index` (`seq = index + 1`)
    pub fn generate(&self, index: u64) -> SessionEvent {
        let index_i = index as i64;
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(index_i.wrapping_mul(17)) as u64);
        let slot = index as usize;

        let result_z: f64 = rng.gen();
        let time_t = rng.gen::<f64>() * 90.0;
        let attempts = rng.gen_range(1..=5);

        SessionEvent::new(index_i + 1, SCENES[slot % SCENES.len()])
            .with_outcome(result_z, time_t, attempts)
            .with_seed(self.seed.wrapping_add(index_i))
            .with_versions(
                format!("cv-{}", slot % 4 + 1),
                format!("c{}", CONTENT_VERSIONS[slot % CONTENT_VERSIONS.len()]),
                format!("r{}", RULES_VERSIONS[slot % RULES_VERSIONS.len()]),
            )
    }

    /// Events for sessions `0..count`
    pub fn sessions(&self, count: u64) -> impl Iterator<Item = SessionEvent> + '_ {
        (0..count).map(move |index| self.generate(index))
    }
}
