use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use memlib::config::{CacheReplacementConfig, MappingConfig, PageReplacementConfig, SimulationConfig};
use memlib::simulator::Simulator;
use memlib::trace::{reads, TraceEntry};
use memlib::util::{textbook_cache, textbook_virtual_memory};

/// A trace with some locality: mostly steps through a small window, sometimes jumps
fn synthetic_trace(len: usize, span: u64) -> Vec<TraceEntry> {
    let mut rng = StdRng::seed_from_u64(0);
    let mut address = 0u64;
    let addresses: Vec<u64> = (0..len)
        .map(|_| {
            address = if rng.random_bool(0.1) { rng.random_range(0..span) } else { (address + 64) % span };
            address
        })
        .collect();
    reads(&addresses)
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("Examples");
    let cache_trace = synthetic_trace(100_000, 1 << 16);
    for mapping in [MappingConfig::Direct, MappingConfig::FullyAssociative, MappingConfig::SetAssociative] {
        for policy in [CacheReplacementConfig::LeastRecentlyUsed, CacheReplacementConfig::FirstInFirstOut, CacheReplacementConfig::Random] {
            let mut cache = textbook_cache(mapping, policy);
            cache.size = 16 * 1024;
            let config = SimulationConfig { cache: Some(cache), virtual_memory: None };
            group.bench_with_input(BenchmarkId::new(format!("cache {mapping}"), policy), &config, |bench, conf| {
                bench.iter(|| Simulator::new(conf).unwrap().simulate(&cache_trace).unwrap());
            });
        }
    }
    // 8 pages of 4KB
    let page_trace = synthetic_trace(10_000, 8 * 4096);
    for policy in PageReplacementConfig::ALL {
        let config = SimulationConfig { cache: None, virtual_memory: Some(textbook_virtual_memory(policy)) };
        group.bench_with_input(BenchmarkId::new("virtual memory", policy), &config, |bench, conf| {
            bench.iter(|| Simulator::new(conf).unwrap().simulate(&page_trace).unwrap());
        });
    }
}

criterion_group!(
    name = benches;
    config = Criterion::default().significance_level(0.1).sample_size(10);
    targets = criterion_benchmark
);
criterion_main!(benches);
