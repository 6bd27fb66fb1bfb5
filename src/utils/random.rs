// src/utils/random.rs

use rand::rngs::StdRng;
use rand::SeedableRng;

/// A generator seeded from `seed`, or from the OS when no seed is given.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
