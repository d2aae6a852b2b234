use std::fmt::{Display, Formatter};
use log::{debug, trace};
use rand::rngs::StdRng;
use crate::address::{AddressLayout, AddressParts};
use crate::config::{CacheConfig, CacheReplacementConfig, MappingConfig};
use crate::error::ConfigError;
use crate::replacement_policies::{FirstInFirstOut, LeastRecentlyUsed, NoPolicy, RandomReplacement, ReplacementPolicy};
use crate::report::CacheStats;

/// A single cache line
///
/// Lines are never removed from the cache, a line becomes valid on its first fill and is
/// overwritten in place on every eviction after that
#[derive(Debug, Clone)]
pub struct CacheLine {
    pub valid: bool,
    pub tag: u64,
    /// Only the size of the block matters to the simulation, the bytes are never read
    pub data: Box<[u8]>,
    /// Logical time of the last hit or fill
    pub accessed_at: u64,
    /// Logical time of the fill
    pub loaded_at: u64,
}

impl CacheLine {
    fn empty(block_size: u64) -> Self {
        Self {
            valid: false,
            tag: 0,
            data: vec![0; block_size as usize].into_boxed_slice(),
            accessed_at: 0,
            loaded_at: 0,
        }
    }
}

/// The shape of a cache, derived from its configuration
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CacheGeometry {
    pub size: u64,
    pub block_size: u64,
    pub lines: u64,
    pub sets: u64,
    pub associativity: u64,
    pub layout: AddressLayout,
}

impl CacheGeometry {
    /// Validates the sizes in a configuration and derives the number of sets and the address
    /// layout
    pub fn from_config(config: &CacheConfig) -> Result<Self, ConfigError> {
        if !config.block_size.is_power_of_two() {
            return Err(ConfigError::BlockSizeNotPowerOfTwo(config.block_size));
        }
        if config.size == 0 || config.size % config.block_size != 0 {
            return Err(ConfigError::CacheSizeNotMultipleOfBlock { size: config.size, block_size: config.block_size });
        }
        let lines = config.size / config.block_size;
        let associativity = match config.mapping {
            MappingConfig::Direct => 1,
            MappingConfig::FullyAssociative => lines,
            MappingConfig::SetAssociative => {
                if config.associativity == 0 || lines % config.associativity != 0 {
                    return Err(ConfigError::InvalidAssociativity { associativity: config.associativity, lines });
                }
                config.associativity
            }
        };
        let sets = lines / associativity;
        let layout = AddressLayout::new(config.block_size, sets)?;
        Ok(Self {
            size: config.size,
            block_size: config.block_size,
            lines,
            sets,
            associativity,
            layout,
        })
    }
}

/// What happened on a single cache access
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheAccess {
    pub address: u64,
    pub parts: AddressParts,
    /// The line that was hit or filled
    pub line: usize,
    pub outcome: CacheOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    /// `evicted` holds the tag of the valid line that was overwritten, if any
    Miss { evicted: Option<u64> },
}

impl CacheAccess {
    pub fn hit(&self) -> bool {
        self.outcome == CacheOutcome::Hit
    }
}

impl Display for CacheAccess {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let AddressParts { tag, index, offset } = self.parts;
        match self.outcome {
            CacheOutcome::Hit => write!(
                f,
                "hit  - address: {:#06X}, tag: {tag}, index: {index}, offset: {offset}",
                self.address
            ),
            CacheOutcome::Miss { evicted } => {
                write!(
                    f,
                    "miss - address: {:#06X}, tag: {tag}, index: {index}, offset: {offset}, line: {}",
                    self.address, self.line
                )?;
                if let Some(old_tag) = evicted {
                    write!(f, " (evicted tag {old_tag})")?;
                }
                Ok(())
            }
        }
    }
}

/// A generic trait for caches
///
/// Technically not required as we're using static dispatch instead of dyn Cache, but this gives
/// flexibility for the future with no overhead
pub trait CacheTrait {
    /// Splits an address into tag, index and offset. No side effects
    fn parse_address(&self, address: u64) -> AddressParts;

    /// Reads the line holding `address`, filling it on a miss
    ///
    /// On both hits and misses the implementation must update the counters, the logical clock and
    /// the timestamps used by the replacement policy
    ///
    /// # Arguments
    ///
    /// * `address`: The address of the read. Note this is for the line at that address, hence no size
    /// argument
    ///
    /// returns: CacheAccess
    fn access(&mut self, address: u64) -> CacheAccess;

    fn stats(&self) -> &CacheStats;

    fn geometry(&self) -> &CacheGeometry;

    fn mapping(&self) -> MappingConfig;

    /// The configured policy, echoed even when the mapping leaves it nothing to decide
    fn policy(&self) -> CacheReplacementConfig;

    fn lines(&self) -> &[CacheLine];

    /// Gets the number of invalid cache lines. Useful for analysing cache performance or
    /// debugging
    fn get_invalid_line_count(&self) -> usize {
        self.lines().iter().filter(|line| !line.valid).count()
    }
}

/// A generic cache implementation, parameterised by a replacement policy
///
/// The set an address maps to is the contiguous run of `associativity` lines starting at
/// `index * associativity`, so direct mapped and fully associative caches are the two extremes of
/// the same lookup
pub struct Cache<R: ReplacementPolicy> {
    geometry: CacheGeometry,
    mapping: MappingConfig,
    policy_config: CacheReplacementConfig,
    lines: Vec<CacheLine>,
    replacement_policy: R,
    // Logical clock, advanced once per access
    time: u64,
    stats: CacheStats,
}

impl<R: ReplacementPolicy> Cache<R> {
    pub fn new(config: &CacheConfig, policy: R) -> Result<Self, ConfigError> {
        let geometry = CacheGeometry::from_config(config)?;
        debug!(
            "{} cache: {} lines, {} sets of {}, tag/index/offset bits {}/{}/{}",
            config.mapping,
            geometry.lines,
            geometry.sets,
            geometry.associativity,
            geometry.layout.tag_bits,
            geometry.layout.index_bits,
            geometry.layout.offset_bits
        );
        Ok(Self {
            lines: (0..geometry.lines).map(|_| CacheLine::empty(geometry.block_size)).collect(),
            geometry,
            mapping: config.mapping,
            policy_config: config.replacement_policy,
            replacement_policy: policy,
            time: 0,
            stats: CacheStats::default(),
        })
    }

    // Fill empty capacity before asking the policy
    fn select_victim(&mut self, lower_bound: usize, upper_bound: usize) -> usize {
        let set = &self.lines[lower_bound..upper_bound];
        match set.iter().position(|line| !line.valid) {
            Some(free) => lower_bound + free,
            None => lower_bound + self.replacement_policy.select_victim(set),
        }
    }
}

impl<R: ReplacementPolicy> CacheTrait for Cache<R> {
    fn parse_address(&self, address: u64) -> AddressParts {
        self.geometry.layout.decompose(address)
    }

    fn access(&mut self, address: u64) -> CacheAccess {
        self.stats.accesses += 1;
        self.time += 1;
        let parts = self.parse_address(address);
        let set_inclusive_lower_bound = (parts.index * self.geometry.associativity) as usize;
        let set_exclusive_upper_bound = set_inclusive_lower_bound + self.geometry.associativity as usize;
        // Only search the relevant set
        let mut x = set_inclusive_lower_bound;
        while x < set_exclusive_upper_bound {
            let line = &mut self.lines[x];
            if line.valid && line.tag == parts.tag {
                line.accessed_at = self.time;
                self.stats.hits += 1;
                let access = CacheAccess { address, parts, line: x, outcome: CacheOutcome::Hit };
                trace!("{access}");
                return access;
            }
            x += 1;
        }
        // Cache miss, replace
        self.stats.misses += 1;
        let victim = self.select_victim(set_inclusive_lower_bound, set_exclusive_upper_bound);
        let line = &mut self.lines[victim];
        let evicted = line.valid.then_some(line.tag);
        if let Some(old_tag) = evicted {
            debug!("evicting tag {old_tag} from line {victim} for tag {}", parts.tag);
        }
        line.valid = true;
        line.tag = parts.tag;
        line.accessed_at = self.time;
        line.loaded_at = self.time;
        let access = CacheAccess { address, parts, line: victim, outcome: CacheOutcome::Miss { evicted } };
        trace!("{access}");
        access
    }

    fn stats(&self) -> &CacheStats {
        &self.stats
    }

    fn geometry(&self) -> &CacheGeometry {
        &self.geometry
    }

    fn mapping(&self) -> MappingConfig {
        self.mapping
    }

    fn policy(&self) -> CacheReplacementConfig {
        self.policy_config
    }

    fn lines(&self) -> &[CacheLine] {
        &self.lines
    }
}

/// Enum for every cache the library can build from a configuration
///
/// Using trait objects reduces boilerplate, but it is opaque to the compiler. Explicitly branching
/// on all implementations lets it reason about the concrete types and inline the policies
pub enum GenericCache {
    NoPolicy(Cache<NoPolicy>),
    LeastRecentlyUsed(Cache<LeastRecentlyUsed>),
    FirstInFirstOut(Cache<FirstInFirstOut>),
    Random(Cache<RandomReplacement<StdRng>>),
}

impl GenericCache {
    /// Creates a new cache from a cache configuration
    ///
    /// Direct mapped caches have a single candidate line per set, so they skip the policy
    pub fn from_config(config: &CacheConfig) -> Result<Self, ConfigError> {
        if config.mapping == MappingConfig::Direct {
            return Ok(Cache::new(config, NoPolicy)?.into());
        }
        Ok(match config.replacement_policy {
            CacheReplacementConfig::LeastRecentlyUsed => Cache::new(config, LeastRecentlyUsed)?.into(),
            CacheReplacementConfig::FirstInFirstOut => Cache::new(config, FirstInFirstOut)?.into(),
            CacheReplacementConfig::Random => Cache::new(config, RandomReplacement::seeded(config.seed))?.into(),
        })
    }
}

impl From<Cache<NoPolicy>> for GenericCache {
    fn from(value: Cache<NoPolicy>) -> Self {
        Self::NoPolicy(value)
    }
}

impl From<Cache<LeastRecentlyUsed>> for GenericCache {
    fn from(value: Cache<LeastRecentlyUsed>) -> Self {
        Self::LeastRecentlyUsed(value)
    }
}

impl From<Cache<FirstInFirstOut>> for GenericCache {
    fn from(value: Cache<FirstInFirstOut>) -> Self {
        Self::FirstInFirstOut(value)
    }
}

impl From<Cache<RandomReplacement<StdRng>>> for GenericCache {
    fn from(value: Cache<RandomReplacement<StdRng>>) -> Self {
        Self::Random(value)
    }
}

macro_rules! dispatch {
    ($self:ident, $c:ident => $body:expr) => {
        match $self {
            GenericCache::NoPolicy($c) => $body,
            GenericCache::LeastRecentlyUsed($c) => $body,
            GenericCache::FirstInFirstOut($c) => $body,
            GenericCache::Random($c) => $body,
        }
    };
}

impl CacheTrait for GenericCache {
    fn parse_address(&self, address: u64) -> AddressParts {
        dispatch!(self, c => c.parse_address(address))
    }

    fn access(&mut self, address: u64) -> CacheAccess {
        dispatch!(self, c => c.access(address))
    }

    fn stats(&self) -> &CacheStats {
        dispatch!(self, c => c.stats())
    }

    fn geometry(&self) -> &CacheGeometry {
        dispatch!(self, c => c.geometry())
    }

    fn mapping(&self) -> MappingConfig {
        dispatch!(self, c => c.mapping())
    }

    fn policy(&self) -> CacheReplacementConfig {
        dispatch!(self, c => c.policy())
    }

    fn lines(&self) -> &[CacheLine] {
        dispatch!(self, c => c.lines())
    }
}
