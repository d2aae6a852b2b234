use rand::Rng;
use rand::rngs::StdRng;
use rand::SeedableRng;
use crate::cache::CacheLine;

/// A generic trait for implementing cache replacement policies. Can be used to parameterise a Cache.
///
/// Policies never see empty capacity: the cache fills invalid lines itself and only asks for a
/// victim once every line of the set is valid. The timestamps a policy needs live on the lines
pub trait ReplacementPolicy {
    /// Chooses the line to overwrite
    ///
    /// # Arguments
    ///
    /// * `set`: The lines of the set the address maps to, all valid
    ///
    /// returns: usize, the position of the victim within `set`
    fn select_victim(&mut self, set: &[CacheLine]) -> usize;
}

#[derive(Default)]
/// NoPolicy is used for direct mapped caches, where every set holds one line and that line is
/// always the victim
///
/// As the generic cache implementation is monomorphised, the compiler can completely optimise this
/// away, removing the need for a separate implementation
pub struct NoPolicy;

impl ReplacementPolicy for NoPolicy {
    fn select_victim(&mut self, _set: &[CacheLine]) -> usize {
        0
    }
}

/// Least Recently Used replacement policy, evicts the line with the oldest access timestamp.
/// Ties go to the lowest position
#[derive(Default)]
pub struct LeastRecentlyUsed;

impl ReplacementPolicy for LeastRecentlyUsed {
    fn select_victim(&mut self, set: &[CacheLine]) -> usize {
        oldest_by(set, |line| line.accessed_at)
    }
}

/// First In First Out replacement policy, evicts the line that was loaded earliest regardless of
/// how recently it was read
#[derive(Default)]
pub struct FirstInFirstOut;

impl ReplacementPolicy for FirstInFirstOut {
    fn select_victim(&mut self, set: &[CacheLine]) -> usize {
        oldest_by(set, |line| line.loaded_at)
    }
}

/// Random replacement policy
///
/// The source of randomness is owned by the policy, so a seeded generator makes every run
/// reproducible
pub struct RandomReplacement<G: Rng = StdRng> {
    rng: G,
}

impl<G: Rng> RandomReplacement<G> {
    pub fn new(rng: G) -> Self {
        Self { rng }
    }
}

impl RandomReplacement<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<G: Rng> ReplacementPolicy for RandomReplacement<G> {
    fn select_victim(&mut self, set: &[CacheLine]) -> usize {
        self.rng.random_range(0..set.len())
    }
}

fn oldest_by(set: &[CacheLine], timestamp: impl Fn(&CacheLine) -> u64) -> usize {
    let mut min_value = u64::MAX;
    let mut min_index = 0;
    let mut index = 0;
    while index < set.len() {
        let value = timestamp(&set[index]);
        if value < min_value {
            min_value = value;
            min_index = index;
        }
        index += 1;
    }
    min_index
}
