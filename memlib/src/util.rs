use crate::config::{CacheConfig, CacheReplacementConfig, MappingConfig, PageReplacementConfig, VirtualMemoryConfig, DEFAULT_PAGE_SIZE};
use crate::trace::{reads, TraceEntry};

/// Memory blocks 0, 1, 2, 3, 0, 1, 4, 0 with 64 byte blocks
pub const TEXTBOOK_BLOCK_ADDRESSES: [u64; 8] = [0x0000, 0x0040, 0x0080, 0x00C0, 0x0000, 0x0040, 0x0100, 0x0000];

/// Pages 1, 2, 3, 4, 1, 2, 5, 1, 2, 3, 4, 5 with 4KB pages. The classic string for Belady's
/// anomaly
pub const TEXTBOOK_PAGE_ADDRESSES: [u64; 12] = [
    0x1000, 0x2000, 0x3000, 0x4000, 0x1000, 0x2000, 0x5000, 0x1000, 0x2000, 0x3000, 0x4000, 0x5000,
];

pub fn textbook_block_trace() -> Vec<TraceEntry> {
    reads(&TEXTBOOK_BLOCK_ADDRESSES)
}

pub fn textbook_page_trace() -> Vec<TraceEntry> {
    reads(&TEXTBOOK_PAGE_ADDRESSES)
}

/// A 256 byte cache with 64 byte blocks, the size the block trace is written for
pub fn textbook_cache(mapping: MappingConfig, policy: CacheReplacementConfig) -> CacheConfig {
    CacheConfig {
        size: 256,
        block_size: 64,
        mapping,
        associativity: if mapping == MappingConfig::SetAssociative { 2 } else { 0 },
        replacement_policy: policy,
        seed: 0,
    }
}

/// 8 pages, 3 frames and a 2 entry TLB
pub fn textbook_virtual_memory(policy: PageReplacementConfig) -> VirtualMemoryConfig {
    VirtualMemoryConfig {
        num_pages: 8,
        num_frames: 3,
        tlb_size: 2,
        page_size: DEFAULT_PAGE_SIZE,
        replacement_policy: policy,
    }
}
