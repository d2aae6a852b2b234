use log::trace;
use crate::error::AccessError;
use crate::virtual_memory::PageTableEntry;

/// A trait for page replacement policies. Can be used to parameterise a VirtualMemory.
///
/// The simulator hands out free frames itself, a policy is only asked for a victim when every
/// frame holds a page
pub trait PageReplacementPolicy {
    /// Called once at the start of every access, before the TLB is probed
    ///
    /// Not applicable for most policies, a default which does nothing is provided
    fn on_access(&mut self) {}

    /// Chooses the frame to reclaim
    ///
    /// # Arguments
    ///
    /// * `frames`: The resident page of each physical frame
    /// * `page_table`: The page table, policies may update reference bits while searching
    ///
    /// returns: Result<usize, AccessError>, the victim frame
    fn select_victim(&mut self, frames: &[Option<usize>], page_table: &mut [PageTableEntry]) -> Result<usize, AccessError>;
}

/// Evicts the page that was loaded earliest
#[derive(Default)]
pub struct PageFifo;

impl PageReplacementPolicy for PageFifo {
    fn select_victim(&mut self, frames: &[Option<usize>], page_table: &mut [PageTableEntry]) -> Result<usize, AccessError> {
        Ok(oldest_frame(frames, page_table, |entry| entry.loaded_at))
    }
}

/// Evicts the page that was accessed least recently
#[derive(Default)]
pub struct PageLru;

impl PageReplacementPolicy for PageLru {
    fn select_victim(&mut self, frames: &[Option<usize>], page_table: &mut [PageTableEntry]) -> Result<usize, AccessError> {
        Ok(oldest_frame(frames, page_table, |entry| entry.accessed_at))
    }
}

/// Clock (not recently used) replacement
///
/// The hand persists across faults. Each step either finds a page with a clear reference bit,
/// which becomes the victim, or clears the bit and moves on. After one full turn every bit is
/// clear, so a victim is found within two turns
#[derive(Default)]
pub struct Clock {
    hand: usize,
    last_sweep: usize,
}

impl Clock {
    /// The frame the next search starts from
    pub fn hand(&self) -> usize {
        self.hand
    }

    /// How many frames the last search looked at, including the victim
    pub fn last_sweep(&self) -> usize {
        self.last_sweep
    }
}

impl PageReplacementPolicy for Clock {
    fn select_victim(&mut self, frames: &[Option<usize>], page_table: &mut [PageTableEntry]) -> Result<usize, AccessError> {
        let mut visited = 0;
        loop {
            let frame = self.hand;
            self.hand = (self.hand + 1) % frames.len();
            visited += 1;
            debug_assert!(visited <= 2 * frames.len());
            match frames[frame] {
                Some(page) if page_table[page].referenced => page_table[page].referenced = false,
                _ => {
                    self.last_sweep = visited;
                    return Ok(frame);
                }
            }
        }
    }
}

/// Belady's optimal replacement: evicts the page whose next use lies furthest in the future
///
/// This needs the whole trace up front and can't be built in hardware, it exists as a lower bound
/// to compare the other policies against. The cursor follows the replay, one step per access
#[derive(Default)]
pub struct Optimal {
    future: Option<Vec<u64>>,
    cursor: usize,
}

impl Optimal {
    /// Replaces the future trace with a list of page numbers and rewinds the cursor
    pub fn set_future_pages(&mut self, pages: Vec<u64>) {
        self.future = Some(pages);
        self.cursor = 0;
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Trace positions from the cursor to the next use of `page`, None if it is never used again
    pub fn next_use(&self, page: usize) -> Option<usize> {
        let future = self.future.as_deref()?;
        future.get(self.cursor..)?.iter().position(|p| *p == page as u64)
    }
}

impl PageReplacementPolicy for Optimal {
    fn on_access(&mut self) {
        self.cursor += 1;
    }

    fn select_victim(&mut self, frames: &[Option<usize>], _page_table: &mut [PageTableEntry]) -> Result<usize, AccessError> {
        if self.future.is_none() {
            return Err(AccessError::MissingFutureTrace);
        }
        let mut victim = 0;
        let mut furthest: Option<usize> = None;
        for (frame, page) in frames.iter().enumerate() {
            let Some(page) = *page else {
                return Ok(frame);
            };
            // Never used again counts as infinitely far away
            let distance = self.next_use(page).unwrap_or(usize::MAX);
            trace!("page {page} in frame {frame}: next use in {distance}");
            if furthest.map_or(true, |max| distance > max) {
                furthest = Some(distance);
                victim = frame;
            }
        }
        Ok(victim)
    }
}

fn oldest_frame(frames: &[Option<usize>], page_table: &[PageTableEntry], timestamp: impl Fn(&PageTableEntry) -> u64) -> usize {
    let mut min_value = u64::MAX;
    let mut min_index = 0;
    for (frame, page) in frames.iter().enumerate() {
        let Some(page) = *page else {
            return frame;
        };
        let value = timestamp(&page_table[page]);
        if value < min_value {
            min_value = value;
            min_index = frame;
        }
    }
    min_index
}
