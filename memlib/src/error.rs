use std::fmt::{Display, Formatter};

/// Raised when a configuration can't be turned into a simulator. Always detected at construction,
/// a simulator that exists has a consistent geometry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    BlockSizeNotPowerOfTwo(u64),
    CacheSizeNotMultipleOfBlock { size: u64, block_size: u64 },
    SetCountNotPowerOfTwo(u64),
    InvalidAssociativity { associativity: u64, lines: u64 },
    /// The offset and index fields don't leave room for a tag in the address
    AddressTooNarrow { offset_bits: u32, index_bits: u32, address_bits: u32 },
    PageSizeNotPowerOfTwo(u64),
    EmptyPageTable,
    NoFrames,
    EmptyTlb,
    UnsupportedMapping(String),
    UnsupportedPolicy(String),
    NothingToSimulate,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::BlockSizeNotPowerOfTwo(size) => write!(f, "block size {size} is not a power of two"),
            ConfigError::CacheSizeNotMultipleOfBlock { size, block_size } => {
                write!(f, "cache size {size} is not a non-zero multiple of the block size {block_size}")
            }
            ConfigError::SetCountNotPowerOfTwo(sets) => write!(f, "{sets} sets can't be indexed by a bit field, the set count must be a power of two"),
            ConfigError::InvalidAssociativity { associativity, lines } => {
                write!(f, "associativity {associativity} does not evenly divide {lines} cache lines")
            }
            ConfigError::AddressTooNarrow { offset_bits, index_bits, address_bits } => write!(
                f,
                "{offset_bits} offset bits and {index_bits} index bits don't fit in a {address_bits}-bit address"
            ),
            ConfigError::PageSizeNotPowerOfTwo(size) => write!(f, "page size {size} is not a power of two"),
            ConfigError::EmptyPageTable => write!(f, "the page table needs at least one page"),
            ConfigError::NoFrames => write!(f, "physical memory needs at least one frame"),
            ConfigError::EmptyTlb => write!(f, "the TLB needs at least one entry"),
            ConfigError::UnsupportedMapping(name) => write!(f, "unsupported mapping type '{name}'"),
            ConfigError::UnsupportedPolicy(name) => write!(f, "unsupported replacement policy '{name}'"),
            ConfigError::NothingToSimulate => write!(f, "the configuration has neither a cache nor a virtual memory section"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Raised by a single virtual memory access. The simulator stays usable afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    PageOutOfRange { page: u64, pages: usize },
    /// The optimal policy had to choose a victim but was never given the future accesses
    MissingFutureTrace,
}

impl Display for AccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessError::PageOutOfRange { page, pages } => {
                write!(f, "virtual page {page} is outside the page table ({pages} pages)")
            }
            AccessError::MissingFutureTrace => {
                write!(f, "the optimal policy needs the future accesses before it can replace a page")
            }
        }
    }
}

impl std::error::Error for AccessError {}

/// Raised while reading a trace file
#[derive(Debug)]
pub enum TraceError {
    Io(std::io::Error),
    Syntax { line: usize, content: String },
}

impl Display for TraceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TraceError::Io(e) => write!(f, "couldn't read the trace: {e}"),
            TraceError::Syntax { line, content } => write!(f, "line {line}: can't parse '{content}' as an access"),
        }
    }
}

impl std::error::Error for TraceError {}

impl From<std::io::Error> for TraceError {
    fn from(value: std::io::Error) -> Self {
        TraceError::Io(value)
    }
}

/// Anything that can stop a simulation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimulationError {
    Config(ConfigError),
    Access(AccessError),
}

impl Display for SimulationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SimulationError::Config(e) => write!(f, "invalid configuration: {e}"),
            SimulationError::Access(e) => write!(f, "access failed: {e}"),
        }
    }
}

impl std::error::Error for SimulationError {}

impl From<ConfigError> for SimulationError {
    fn from(value: ConfigError) -> Self {
        SimulationError::Config(value)
    }
}

impl From<AccessError> for SimulationError {
    fn from(value: AccessError) -> Self {
        SimulationError::Access(value)
    }
}
