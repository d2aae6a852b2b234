use std::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};
use crate::address::AddressLayout;
use crate::cache::CacheTrait;
use crate::config::{CacheReplacementConfig, MappingConfig, PageReplacementConfig};
use crate::virtual_memory::VirtualMemoryTrait;

/// Cache counters. Only ever grow, `hits + misses == accesses`
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub accesses: u64,
    pub hits: u64,
    pub misses: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        ratio(self.hits, self.accesses)
    }

    pub fn miss_rate(&self) -> f64 {
        ratio(self.misses, self.accesses)
    }
}

/// Virtual memory counters. Only ever grow, `tlb_hits + tlb_misses == accesses`
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualMemoryStats {
    pub accesses: u64,
    pub tlb_hits: u64,
    pub tlb_misses: u64,
    pub page_faults: u64,
    pub write_backs: u64,
}

impl VirtualMemoryStats {
    pub fn fault_rate(&self) -> f64 {
        ratio(self.page_faults, self.accesses)
    }

    pub fn tlb_hit_rate(&self) -> f64 {
        ratio(self.tlb_hits, self.accesses)
    }
}

fn ratio(part: u64, whole: u64) -> f64 {
    if whole == 0 { 0.0 } else { part as f64 / whole as f64 }
}

/// The result of a cache simulation, with the configuration echoed back. Can be serialised to JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheResult {
    pub mapping: MappingConfig,
    pub replacement_policy: CacheReplacementConfig,
    pub size: u64,
    pub block_size: u64,
    pub lines: u64,
    pub sets: u64,
    pub associativity: u64,
    pub address_layout: AddressLayout,
    pub stats: CacheStats,
    pub hit_rate: f64,
}

impl CacheResult {
    pub fn from_cache(cache: &impl CacheTrait) -> Self {
        let geometry = cache.geometry();
        Self {
            mapping: cache.mapping(),
            replacement_policy: cache.policy(),
            size: geometry.size,
            block_size: geometry.block_size,
            lines: geometry.lines,
            sets: geometry.sets,
            associativity: geometry.associativity,
            address_layout: geometry.layout,
            stats: *cache.stats(),
            hit_rate: cache.stats().hit_rate(),
        }
    }
}

impl Display for CacheResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Cache statistics:")?;
        writeln!(f, "  accesses:      {}", self.stats.accesses)?;
        writeln!(f, "  hits:          {}", self.stats.hits)?;
        writeln!(f, "  misses:        {}", self.stats.misses)?;
        writeln!(f, "  hit rate:      {:.2}%", self.hit_rate * 100.0)?;
        writeln!(f, "Cache configuration:")?;
        writeln!(f, "  mapping:       {}", self.mapping)?;
        writeln!(f, "  replacement:   {}", self.replacement_policy)?;
        writeln!(f, "  size:          {} bytes", self.size)?;
        writeln!(f, "  block size:    {} bytes", self.block_size)?;
        writeln!(f, "  lines:         {}", self.lines)?;
        writeln!(f, "  sets:          {}", self.sets)?;
        writeln!(f, "  associativity: {}", self.associativity)?;
        writeln!(f, "Address layout:")?;
        writeln!(f, "  tag bits:      {}", self.address_layout.tag_bits)?;
        writeln!(f, "  index bits:    {}", self.address_layout.index_bits)?;
        writeln!(f, "  offset bits:   {}", self.address_layout.offset_bits)
    }
}

/// The result of a virtual memory simulation, with the configuration echoed back
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualMemoryResult {
    pub replacement_policy: PageReplacementConfig,
    pub num_pages: usize,
    pub num_frames: usize,
    pub tlb_size: usize,
    pub page_size: u64,
    pub stats: VirtualMemoryStats,
    pub fault_rate: f64,
    pub tlb_hit_rate: f64,
}

impl VirtualMemoryResult {
    pub fn from_virtual_memory(vm: &impl VirtualMemoryTrait) -> Self {
        let config = vm.config();
        Self {
            replacement_policy: config.replacement_policy,
            num_pages: config.num_pages,
            num_frames: config.num_frames,
            tlb_size: config.tlb_size,
            page_size: config.page_size,
            stats: *vm.stats(),
            fault_rate: vm.stats().fault_rate(),
            tlb_hit_rate: vm.stats().tlb_hit_rate(),
        }
    }
}

impl Display for VirtualMemoryResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Virtual memory statistics:")?;
        writeln!(f, "  accesses:      {}", self.stats.accesses)?;
        writeln!(f, "  page faults:   {}", self.stats.page_faults)?;
        writeln!(f, "  fault rate:    {:.2}%", self.fault_rate * 100.0)?;
        writeln!(f, "  TLB hits:      {}", self.stats.tlb_hits)?;
        writeln!(f, "  TLB misses:    {}", self.stats.tlb_misses)?;
        writeln!(f, "  TLB hit rate:  {:.2}%", self.tlb_hit_rate * 100.0)?;
        writeln!(f, "  write backs:   {}", self.stats.write_backs)?;
        writeln!(f, "Virtual memory configuration:")?;
        writeln!(f, "  pages:         {}", self.num_pages)?;
        writeln!(f, "  frames:        {}", self.num_frames)?;
        writeln!(f, "  TLB entries:   {}", self.tlb_size)?;
        writeln!(f, "  page size:     {} bytes", self.page_size)?;
        writeln!(f, "  replacement:   {}", self.replacement_policy)
    }
}
