use std::fmt::{Display, Formatter};
use log::{debug, trace};
use crate::address::PageLayout;
use crate::config::{PageReplacementConfig, VirtualMemoryConfig};
use crate::error::{AccessError, ConfigError};
use crate::page_replacement::{Clock, Optimal, PageFifo, PageLru, PageReplacementPolicy};
use crate::report::VirtualMemoryStats;
use crate::trace::AccessKind;

/// One entry per virtual page, for the lifetime of the simulator
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct PageTableEntry {
    /// The frame holding the page, None while the page isn't resident
    pub frame: Option<usize>,
    pub modified: bool,
    pub referenced: bool,
    pub loaded_at: u64,
    pub accessed_at: u64,
}

impl PageTableEntry {
    pub fn valid(&self) -> bool {
        self.frame.is_some()
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct TlbEntry {
    pub valid: bool,
    pub page: usize,
    pub frame: usize,
    pub accessed_at: u64,
}

/// A page that lost its frame to a fault
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub page: usize,
    /// The page was modified, so it would have been written back. No data actually moves
    pub written_back: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TranslationOutcome {
    TlbHit,
    /// TLB miss, but the page was resident
    PageTableHit,
    PageFault { replaced: Option<Replacement> },
}

/// What happened on a single virtual memory access
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Translation {
    pub address: u64,
    pub kind: AccessKind,
    pub page: usize,
    pub offset: u64,
    pub frame: usize,
    pub physical_address: u64,
    pub outcome: TranslationOutcome,
}

impl Translation {
    pub fn tlb_hit(&self) -> bool {
        self.outcome == TranslationOutcome::TlbHit
    }

    pub fn page_fault(&self) -> bool {
        matches!(self.outcome, TranslationOutcome::PageFault { .. })
    }
}

impl Display for Translation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let verb = match self.kind {
            AccessKind::Read => "read",
            AccessKind::Write => "write",
        };
        writeln!(f, "{verb} virtual address {:#06X} (page: {}, offset: {:#05X})", self.address, self.page, self.offset)?;
        match self.outcome {
            TranslationOutcome::TlbHit => {
                writeln!(f, "  TLB hit, frame: {}, physical address: {:#06X}", self.frame, self.physical_address)
            }
            TranslationOutcome::PageTableHit => {
                writeln!(f, "  TLB miss, page table hit, frame: {}, physical address: {:#06X}", self.frame, self.physical_address)?;
                writeln!(f, "  -> TLB updated")
            }
            TranslationOutcome::PageFault { replaced } => {
                writeln!(f, "  TLB miss, page fault")?;
                if let Some(Replacement { page, written_back }) = replaced {
                    if written_back {
                        writeln!(f, "  -> page {page} was modified, writing it back")?;
                    }
                    writeln!(f, "  -> page {page} evicted from frame {}", self.frame)?;
                }
                writeln!(f, "  -> page {} loaded into frame {}, physical address: {:#06X}", self.page, self.frame, self.physical_address)?;
                writeln!(f, "  -> TLB updated")
            }
        }
    }
}

/// A generic trait for virtual memory simulators, mirroring the one for caches
pub trait VirtualMemoryTrait {
    /// Translates a virtual address, going TLB, then page table, then page fault handling
    ///
    /// # Arguments
    ///
    /// * `address`: The virtual address
    /// * `kind`: Writes set the modified bit of the page
    ///
    /// returns: Result<Translation, AccessError>
    fn access_as(&mut self, address: u64, kind: AccessKind) -> Result<Translation, AccessError>;

    fn access(&mut self, address: u64) -> Result<Translation, AccessError> {
        self.access_as(address, AccessKind::Read)
    }

    fn stats(&self) -> &VirtualMemoryStats;

    /// The configuration the simulator was built from
    fn config(&self) -> &VirtualMemoryConfig;

    /// Checks that an address falls inside the page table, without touching any state
    ///
    /// returns: Result<u64, AccessError>, the page number of the address
    fn check_address(&self, address: u64) -> Result<u64, AccessError> {
        let config = self.config();
        let page = address / config.page_size;
        if page >= config.num_pages as u64 {
            return Err(AccessError::PageOutOfRange { page, pages: config.num_pages });
        }
        Ok(page)
    }

    fn page_table(&self) -> &[PageTableEntry];

    fn tlb(&self) -> &[TlbEntry];

    /// The resident page of every physical frame
    fn frames(&self) -> &[Option<usize>];
}

/// A paged virtual memory with a fully associative, LRU managed TLB, parameterised by the page
/// replacement policy used on faults
pub struct VirtualMemory<P: PageReplacementPolicy> {
    config: VirtualMemoryConfig,
    layout: PageLayout,
    page_table: Vec<PageTableEntry>,
    tlb: Vec<TlbEntry>,
    frames: Vec<Option<usize>>,
    policy: P,
    // Logical clock, advanced once per access
    time: u64,
    stats: VirtualMemoryStats,
}

impl<P: PageReplacementPolicy> VirtualMemory<P> {
    pub fn new(config: &VirtualMemoryConfig, policy: P) -> Result<Self, ConfigError> {
        let layout = PageLayout::new(config.page_size)?;
        if config.num_pages == 0 {
            return Err(ConfigError::EmptyPageTable);
        }
        if config.num_frames == 0 {
            return Err(ConfigError::NoFrames);
        }
        if config.tlb_size == 0 {
            return Err(ConfigError::EmptyTlb);
        }
        debug!(
            "virtual memory: {} pages of {} bytes, {} frames, {} TLB entries, {} replacement",
            config.num_pages, config.page_size, config.num_frames, config.tlb_size, config.replacement_policy
        );
        Ok(Self {
            config: config.clone(),
            layout,
            page_table: vec![PageTableEntry::default(); config.num_pages],
            tlb: vec![TlbEntry::default(); config.tlb_size],
            frames: vec![None; config.num_frames],
            policy,
            time: 0,
            stats: VirtualMemoryStats::default(),
        })
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    fn search_tlb(&mut self, page: usize) -> Option<usize> {
        let entry = self.tlb.iter_mut().find(|entry| entry.valid && entry.page == page)?;
        entry.accessed_at = self.time;
        Some(entry.frame)
    }

    // Invalid slots first, then the least recently used one
    fn update_tlb(&mut self, page: usize, frame: usize) {
        let victim = match self.tlb.iter().position(|entry| !entry.valid) {
            Some(free) => free,
            None => {
                let mut min_value = u64::MAX;
                let mut min_index = 0;
                for (index, entry) in self.tlb.iter().enumerate() {
                    if entry.accessed_at < min_value {
                        min_value = entry.accessed_at;
                        min_index = index;
                    }
                }
                min_index
            }
        };
        self.tlb[victim] = TlbEntry { valid: true, page, frame, accessed_at: self.time };
    }

    fn touch(&mut self, page: usize, kind: AccessKind) {
        let entry = &mut self.page_table[page];
        entry.referenced = true;
        entry.accessed_at = self.time;
        if kind == AccessKind::Write {
            entry.modified = true;
        }
    }

    fn select_victim_frame(&mut self) -> Result<usize, AccessError> {
        if let Some(free) = self.frames.iter().position(Option::is_none) {
            return Ok(free);
        }
        self.policy.select_victim(&self.frames, &mut self.page_table)
    }

    // Unmaps a page and drops any TLB entry that still points at its frame
    fn evict(&mut self, page: usize) -> Replacement {
        let entry = &mut self.page_table[page];
        let written_back = entry.modified;
        *entry = PageTableEntry { frame: None, modified: false, referenced: false, ..*entry };
        for tlb_entry in self.tlb.iter_mut().filter(|e| e.valid && e.page == page) {
            tlb_entry.valid = false;
            debug!("TLB shootdown for page {page}");
        }
        if written_back {
            self.stats.write_backs += 1;
            debug!("page {page} is modified, writing back");
        }
        Replacement { page, written_back }
    }
}

impl VirtualMemory<Optimal> {
    /// Supplies the accesses the optimal policy looks ahead into, normally the same trace that is
    /// about to be replayed. Rewinds the policy's cursor
    pub fn set_future_accesses(&mut self, addresses: &[u64]) {
        let pages = addresses.iter().map(|address| self.layout.split(*address).0).collect();
        self.policy.set_future_pages(pages);
    }
}

impl<P: PageReplacementPolicy> VirtualMemoryTrait for VirtualMemory<P> {
    fn access_as(&mut self, address: u64, kind: AccessKind) -> Result<Translation, AccessError> {
        self.check_address(address)?;
        let (page, offset) = self.layout.split(address);
        let page = page as usize;
        self.stats.accesses += 1;
        self.time += 1;
        self.policy.on_access();

        let layout = self.layout;
        let translate = |frame: usize, outcome: TranslationOutcome| Translation {
            address,
            kind,
            page,
            offset,
            frame,
            physical_address: layout.physical_address(frame, offset),
            outcome,
        };

        // 1. TLB
        if let Some(frame) = self.search_tlb(page) {
            self.stats.tlb_hits += 1;
            self.touch(page, kind);
            let translation = translate(frame, TranslationOutcome::TlbHit);
            trace!("{translation}");
            return Ok(translation);
        }
        self.stats.tlb_misses += 1;

        // 2. Page table
        if let Some(frame) = self.page_table[page].frame {
            self.touch(page, kind);
            self.update_tlb(page, frame);
            let translation = translate(frame, TranslationOutcome::PageTableHit);
            trace!("{translation}");
            return Ok(translation);
        }

        // 3. Page fault
        let frame = self.select_victim_frame()?;
        self.stats.page_faults += 1;
        let resident = self.frames[frame];
        let replaced = resident.map(|old_page| self.evict(old_page));
        if let Some(Replacement { page: old_page, .. }) = replaced {
            debug!("page {old_page} evicted from frame {frame} for page {page}");
        }
        self.frames[frame] = Some(page);
        self.page_table[page] = PageTableEntry {
            frame: Some(frame),
            modified: kind == AccessKind::Write,
            referenced: true,
            loaded_at: self.time,
            accessed_at: self.time,
        };
        self.update_tlb(page, frame);
        let translation = translate(frame, TranslationOutcome::PageFault { replaced });
        trace!("{translation}");
        Ok(translation)
    }

    fn stats(&self) -> &VirtualMemoryStats {
        &self.stats
    }

    fn config(&self) -> &VirtualMemoryConfig {
        &self.config
    }

    fn page_table(&self) -> &[PageTableEntry] {
        &self.page_table
    }

    fn tlb(&self) -> &[TlbEntry] {
        &self.tlb
    }

    fn frames(&self) -> &[Option<usize>] {
        &self.frames
    }
}

/// Enum for every virtual memory the library can build from a configuration, see GenericCache
pub enum GenericVirtualMemory {
    FirstInFirstOut(VirtualMemory<PageFifo>),
    LeastRecentlyUsed(VirtualMemory<PageLru>),
    Clock(VirtualMemory<Clock>),
    Optimal(VirtualMemory<Optimal>),
}

impl GenericVirtualMemory {
    pub fn from_config(config: &VirtualMemoryConfig) -> Result<Self, ConfigError> {
        Ok(match config.replacement_policy {
            PageReplacementConfig::FirstInFirstOut => Self::FirstInFirstOut(VirtualMemory::new(config, PageFifo)?),
            PageReplacementConfig::LeastRecentlyUsed => Self::LeastRecentlyUsed(VirtualMemory::new(config, PageLru)?),
            PageReplacementConfig::Clock => Self::Clock(VirtualMemory::new(config, Clock::default())?),
            PageReplacementConfig::Optimal => Self::Optimal(VirtualMemory::new(config, Optimal::default())?),
        })
    }

    /// The optimal simulator, which is the only one that takes a future trace
    pub fn as_optimal_mut(&mut self) -> Option<&mut VirtualMemory<Optimal>> {
        match self {
            Self::Optimal(vm) => Some(vm),
            _ => None,
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $vm:ident => $body:expr) => {
        match $self {
            GenericVirtualMemory::FirstInFirstOut($vm) => $body,
            GenericVirtualMemory::LeastRecentlyUsed($vm) => $body,
            GenericVirtualMemory::Clock($vm) => $body,
            GenericVirtualMemory::Optimal($vm) => $body,
        }
    };
}

impl VirtualMemoryTrait for GenericVirtualMemory {
    fn access_as(&mut self, address: u64, kind: AccessKind) -> Result<Translation, AccessError> {
        dispatch!(self, vm => vm.access_as(address, kind))
    }

    fn stats(&self) -> &VirtualMemoryStats {
        dispatch!(self, vm => vm.stats())
    }

    fn config(&self) -> &VirtualMemoryConfig {
        dispatch!(self, vm => vm.config())
    }

    fn page_table(&self) -> &[PageTableEntry] {
        dispatch!(self, vm => vm.page_table())
    }

    fn tlb(&self) -> &[TlbEntry] {
        dispatch!(self, vm => vm.tlb())
    }

    fn frames(&self) -> &[Option<usize>] {
        dispatch!(self, vm => vm.frames())
    }
}
