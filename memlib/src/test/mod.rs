use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

mod address_tests;
mod tests;

/// Addresses drawn from `span` bytes starting at zero, with a fixed seed
fn random_addresses(seed: u64, len: usize, span: u64) -> Vec<u64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.random_range(0..span)).collect()
}
