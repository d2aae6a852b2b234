use std::fmt::{Display, Formatter};
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::error::ConfigError;

/// Page size used when a configuration doesn't give one
pub const DEFAULT_PAGE_SIZE: u64 = 4096;

/// A full simulation configuration. Either section may be left out, but not both
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub cache: Option<CacheConfig>,
    #[serde(default)]
    pub virtual_memory: Option<VirtualMemoryConfig>,
}

/// A configuration for a single cache
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub size: u64,
    pub block_size: u64,
    pub mapping: MappingConfig,
    /// Only read for set associative caches, the other mappings derive it
    #[serde(default)]
    pub associativity: u64,
    #[serde(default = "CacheReplacementConfig::default")]
    pub replacement_policy: CacheReplacementConfig,
    /// Seed for the random replacement policy
    #[serde(default)]
    pub seed: u64,
}

/// How memory blocks are placed in the cache - direct, full, or set
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum MappingConfig {
    Direct,
    FullyAssociative,
    SetAssociative,
}

/// The replacement policy for a cache - lru, fifo, or random. Defaults to lru
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum CacheReplacementConfig {
    #[default]
    LeastRecentlyUsed,
    FirstInFirstOut,
    Random,
}

/// A configuration for a paged virtual memory with a TLB
#[derive(Debug, Clone, Deserialize)]
pub struct VirtualMemoryConfig {
    pub num_pages: usize,
    pub num_frames: usize,
    pub tlb_size: usize,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    #[serde(default = "PageReplacementConfig::default")]
    pub replacement_policy: PageReplacementConfig,
}

/// The page replacement policy - fifo, lru, clock, or optimal. Defaults to fifo
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum PageReplacementConfig {
    #[default]
    FirstInFirstOut,
    LeastRecentlyUsed,
    Clock,
    Optimal,
}

impl PageReplacementConfig {
    pub const ALL: [PageReplacementConfig; 4] = [
        PageReplacementConfig::FirstInFirstOut,
        PageReplacementConfig::LeastRecentlyUsed,
        PageReplacementConfig::Clock,
        PageReplacementConfig::Optimal,
    ];
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl FromStr for MappingConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "direct" | "direct-mapped" => Ok(MappingConfig::Direct),
            "full" | "fully-associative" | "fullyassociative" => Ok(MappingConfig::FullyAssociative),
            "set" | "set-associative" | "setassociative" => Ok(MappingConfig::SetAssociative),
            _ => Err(ConfigError::UnsupportedMapping(s.to_string())),
        }
    }
}

impl FromStr for CacheReplacementConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lru" | "leastrecentlyused" => Ok(CacheReplacementConfig::LeastRecentlyUsed),
            "fifo" | "firstinfirstout" => Ok(CacheReplacementConfig::FirstInFirstOut),
            "random" => Ok(CacheReplacementConfig::Random),
            _ => Err(ConfigError::UnsupportedPolicy(s.to_string())),
        }
    }
}

impl FromStr for PageReplacementConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fifo" | "firstinfirstout" => Ok(PageReplacementConfig::FirstInFirstOut),
            "lru" | "leastrecentlyused" => Ok(PageReplacementConfig::LeastRecentlyUsed),
            "clock" | "nru" => Ok(PageReplacementConfig::Clock),
            "optimal" | "opt" => Ok(PageReplacementConfig::Optimal),
            _ => Err(ConfigError::UnsupportedPolicy(s.to_string())),
        }
    }
}

// JSON names go through the same table as command line names

impl TryFrom<String> for MappingConfig {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<String> for CacheReplacementConfig {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<String> for PageReplacementConfig {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl Display for MappingConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            MappingConfig::Direct => "direct mapped",
            MappingConfig::FullyAssociative => "fully associative",
            MappingConfig::SetAssociative => "set associative",
        })
    }
}

impl Display for CacheReplacementConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            CacheReplacementConfig::LeastRecentlyUsed => "LRU",
            CacheReplacementConfig::FirstInFirstOut => "FIFO",
            CacheReplacementConfig::Random => "random",
        })
    }
}

impl Display for PageReplacementConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            PageReplacementConfig::FirstInFirstOut => "FIFO",
            PageReplacementConfig::LeastRecentlyUsed => "LRU",
            PageReplacementConfig::Clock => "clock (NRU)",
            PageReplacementConfig::Optimal => "optimal (OPT)",
        })
    }
}
