//! Explicit random seeding
//!
//! Every randomized operation receives a [`Seed`] and derives its own
//! ChaCha stream from it, so results never depend on global RNG state or on
//! the order in which independent operations run.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Root seed for a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Seed(u64);

impl Seed {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// RNG for a numbered stream of this seed
    pub fn rng(&self, stream: u64) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.0);
        rng.set_stream(stream);
        rng
    }

    /// Child seed for a nested randomized operation
    ///
    /// Uses a SplitMix64 step so neighbouring labels give unrelated seeds.
    pub fn derive(&self, label: u64) -> Seed {
        let mut z = self
            .0
            .wrapping_add(label.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        Seed(z ^ (z >> 31))
    }
}

impl Default for Seed {
    fn default() -> Self {
        Self(42)
    }
}
