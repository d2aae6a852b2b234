use std::time::{Duration, Instant};
use log::info;
use serde::{Deserialize, Serialize};
use crate::cache::{CacheAccess, CacheTrait, GenericCache};
use crate::config::{PageReplacementConfig, SimulationConfig, VirtualMemoryConfig};
use crate::error::{AccessError, ConfigError, SimulationError};
use crate::report::{CacheResult, VirtualMemoryResult};
use crate::trace::TraceEntry;
use crate::virtual_memory::{GenericVirtualMemory, Translation, VirtualMemoryTrait};

/// The simulator replays a trace through the configured cache and virtual memory, and collects
/// results.
///
/// It supports calling simulate multiple times. Counters accumulate across calls, and the time
/// taken to simulate is updated accordingly
pub struct Simulator {
    cache: Option<GenericCache>,
    virtual_memory: Option<GenericVirtualMemory>,
    simulation_time: Duration,
}

/// The result of a simulation. Can be serialised to JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_memory: Option<VirtualMemoryResult>,
}

/// Everything that happened for one trace entry, handed to the observer of
/// [`Simulator::simulate_with`]
#[derive(Debug, Clone)]
pub struct Step {
    /// Zero based position in the trace passed to this call
    pub position: usize,
    pub entry: TraceEntry,
    pub cache: Option<CacheAccess>,
    pub translation: Option<Translation>,
}

impl Simulator {
    /// Creates a new simulator for a given configuration
    ///
    /// # Arguments
    ///
    /// * `config`: A simulation configuration, usually resulting from parsing JSON
    ///
    /// returns: Result<Simulator, ConfigError>
    pub fn new(config: &SimulationConfig) -> Result<Self, ConfigError> {
        if config.cache.is_none() && config.virtual_memory.is_none() {
            return Err(ConfigError::NothingToSimulate);
        }
        Ok(Self {
            cache: config.cache.as_ref().map(GenericCache::from_config).transpose()?,
            virtual_memory: config.virtual_memory.as_ref().map(GenericVirtualMemory::from_config).transpose()?,
            simulation_time: Duration::new(0, 0),
        })
    }

    /// Replays a trace
    ///
    /// Every entry goes to the cache as a physical address and to the virtual memory as a virtual
    /// address, the two are independent. An optimal virtual memory is given this trace as its
    /// future before the replay starts
    ///
    /// # Arguments
    ///
    /// * `trace`: The accesses to replay, in order
    ///
    /// returns: Result<SimulationResult, AccessError>
    pub fn simulate(&mut self, trace: &[TraceEntry]) -> Result<SimulationResult, AccessError> {
        self.simulate_with(trace, |_| {})
    }

    /// Same as [`Simulator::simulate`], but calls `on_step` after every entry
    ///
    /// A trace with a page outside the virtual memory is rejected before anything is replayed, so
    /// the cache and the virtual memory always count the same accesses
    pub fn simulate_with(&mut self, trace: &[TraceEntry], mut on_step: impl FnMut(&Step)) -> Result<SimulationResult, AccessError> {
        let start = Instant::now();
        let replayed = self.replay(trace, &mut on_step);
        self.simulation_time += start.elapsed();
        replayed?;
        info!("replayed {} accesses", trace.len());
        Ok(self.result())
    }

    fn replay(&mut self, trace: &[TraceEntry], on_step: &mut impl FnMut(&Step)) -> Result<(), AccessError> {
        if let Some(vm) = self.virtual_memory.as_ref() {
            for entry in trace {
                vm.check_address(entry.address)?;
            }
        }
        if let Some(vm) = self.virtual_memory.as_mut().and_then(GenericVirtualMemory::as_optimal_mut) {
            let addresses: Vec<u64> = trace.iter().map(|entry| entry.address).collect();
            vm.set_future_accesses(&addresses);
        }
        for (position, entry) in trace.iter().enumerate() {
            // The virtual memory goes first, the cache only sees accesses it accepted
            let translation = match self.virtual_memory.as_mut() {
                Some(vm) => Some(vm.access_as(entry.address, entry.kind)?),
                None => None,
            };
            let cache = self.cache.as_mut().map(|cache| cache.access(entry.address));
            on_step(&Step { position, entry: *entry, cache, translation });
        }
        Ok(())
    }

    /// The counters so far, without resetting them
    pub fn result(&self) -> SimulationResult {
        SimulationResult {
            cache: self.cache.as_ref().map(CacheResult::from_cache),
            virtual_memory: self.virtual_memory.as_ref().map(VirtualMemoryResult::from_virtual_memory),
        }
    }

    /// Gets the wall-clock execution time for processing
    pub fn get_execution_time(&self) -> &Duration {
        &self.simulation_time
    }

    /// Gets the number of invalid cache lines, if there is a cache
    pub fn get_invalid_line_count(&self) -> Option<usize> {
        self.cache.as_ref().map(|cache| cache.get_invalid_line_count())
    }

    pub fn cache(&self) -> Option<&GenericCache> {
        self.cache.as_ref()
    }

    pub fn virtual_memory(&self) -> Option<&GenericVirtualMemory> {
        self.virtual_memory.as_ref()
    }
}

/// Replays one trace under every page replacement policy, keeping the rest of the configuration
///
/// returns: Result<Vec<VirtualMemoryResult>, SimulationError>, in the order of
/// [`PageReplacementConfig::ALL`]
pub fn compare_page_policies(config: &VirtualMemoryConfig, trace: &[TraceEntry]) -> Result<Vec<VirtualMemoryResult>, SimulationError> {
    PageReplacementConfig::ALL
        .iter()
        .map(|policy| {
            let config = SimulationConfig {
                cache: None,
                virtual_memory: Some(VirtualMemoryConfig { replacement_policy: *policy, ..config.clone() }),
            };
            let result = Simulator::new(&config)?.simulate(trace)?;
            // Always present, the configuration has a virtual memory section
            result.virtual_memory.ok_or(SimulationError::Config(ConfigError::NothingToSimulate))
        })
        .collect()
}
