//! # MemLib
//!
//! Memlib is a library for simulating a memory hierarchy: a configurable cache, and a paged
//! virtual memory with a TLB
//!
//! Both simulators are generic over their replacement policy, and a simulator drives them over an
//! address trace. Time inside a simulation is a logical clock advanced once per access, so every
//! replay of a trace gives the same result

/// Splits addresses into tag, index and offset, or page number and offset
pub mod address;

/// Contains the implementation of the cache, and a utility enum for the existing cache types
pub mod cache;

/// Contains definitions for the JSON configuration format
pub mod config;

/// Configuration, access and trace errors
pub mod error;

/// Reading trace files
pub mod io;

/// Contains the page replacement policies, with a trait for implementing custom ones
pub mod page_replacement;

/// Contains the provided cache replacement policies, with a trait for implementing custom
/// replacement policies
pub mod replacement_policies;

/// Counters and the serialisable results built from them
pub mod report;

/// Contains the simulator used to replay a trace through a given configuration
pub mod simulator;

/// The trace format
pub mod trace;

/// Contains the paged virtual memory and its TLB
pub mod virtual_memory;

#[cfg(test)]
mod test;

/// Textbook traces and configurations, used by tests, benchmarks and the demo.
pub mod util;
