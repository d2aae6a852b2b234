use serde::{Deserialize, Serialize};
use crate::error::ConfigError;

/// Width of the simulated address space
pub const ADDRESS_BITS: u32 = 32;

/// The three fields of a cache address, from least to most significant: offset, index, tag
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressParts {
    pub tag: u64,
    pub index: u64,
    pub offset: u64,
}

/// Bit field widths used to split an address for a cache
///
/// Widths are derived once at construction and never change. The tag takes everything above the
/// index, so addresses wider than [`ADDRESS_BITS`] still decompose and reconstruct losslessly
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressLayout {
    pub offset_bits: u32,
    pub index_bits: u32,
    pub tag_bits: u32,
}

impl AddressLayout {
    /// Derives the layout for a cache with `sets` sets of `block_size` byte lines
    ///
    /// # Arguments
    ///
    /// * `block_size`: Bytes per line, must be a power of two
    /// * `sets`: Number of sets, must be a power of two. One set needs no index bits
    ///
    /// returns: Result<AddressLayout, ConfigError>
    pub fn new(block_size: u64, sets: u64) -> Result<Self, ConfigError> {
        if !block_size.is_power_of_two() {
            return Err(ConfigError::BlockSizeNotPowerOfTwo(block_size));
        }
        if !sets.is_power_of_two() {
            return Err(ConfigError::SetCountNotPowerOfTwo(sets));
        }
        let offset_bits = block_size.trailing_zeros();
        let index_bits = sets.trailing_zeros();
        let tag_bits = ADDRESS_BITS
            .checked_sub(offset_bits + index_bits)
            .ok_or(ConfigError::AddressTooNarrow { offset_bits, index_bits, address_bits: ADDRESS_BITS })?;
        Ok(Self { offset_bits, index_bits, tag_bits })
    }

    pub fn decompose(&self, address: u64) -> AddressParts {
        let offset = address & mask(self.offset_bits);
        let remaining = address >> self.offset_bits;
        let index = if self.index_bits > 0 { remaining & mask(self.index_bits) } else { 0 };
        AddressParts {
            tag: remaining >> self.index_bits,
            index,
            offset,
        }
    }

    /// Inverse of [`AddressLayout::decompose`]
    pub fn compose(&self, parts: AddressParts) -> u64 {
        (((parts.tag << self.index_bits) | parts.index) << self.offset_bits) | parts.offset
    }
}

/// Splits virtual addresses into a page number and an offset within the page
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PageLayout {
    page_size: u64,
}

impl PageLayout {
    pub fn new(page_size: u64) -> Result<Self, ConfigError> {
        if !page_size.is_power_of_two() {
            return Err(ConfigError::PageSizeNotPowerOfTwo(page_size));
        }
        Ok(Self { page_size })
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Returns (page number, offset)
    pub fn split(&self, address: u64) -> (u64, u64) {
        (address / self.page_size, address % self.page_size)
    }

    pub fn physical_address(&self, frame: usize, offset: u64) -> u64 {
        frame as u64 * self.page_size + offset
    }
}

#[inline]
fn mask(bits: u32) -> u64 {
    if bits >= u64::BITS { u64::MAX } else { (1 << bits) - 1 }
}
