//! Deterministic seed derivation.
//!
//! Every random draw in the crate comes from a [`ChaCha8Rng`] built from an
//! explicit 64-bit seed. New seeds are derived by mixing a parent seed with a
//! salt (an exposure counter, a row index, a map identifier) through
//! SplitMix64, so the same inputs always reproduce the same stream.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

const HASH_INIT: u64 = 0xA5A5_A5A5_A5A5_A5A5;

/// One round of the SplitMix64 finalizer.
pub fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Combine a seed with a salt into a new, well-mixed seed.
pub fn hash_u64(seed: u64, salt: u64) -> u64 {
    hash_many(&[seed, salt])
}

/// Fold any number of values into one seed.
pub fn hash_many(values: &[u64]) -> u64 {
    values
        .iter()
        .fold(HASH_INIT, |acc, &v| splitmix64(acc ^ v))
}

/// Build the crate's RNG from a 64-bit seed.
pub fn rng_from_seed(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}
