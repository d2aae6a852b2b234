use std::error::Error;
use std::io::Write;
use crate::cache::CacheTrait;
use crate::config::{CacheReplacementConfig, MappingConfig, PageReplacementConfig, SimulationConfig};
use crate::error::{AccessError, ConfigError, TraceError};
use crate::io::open_trace;
use crate::simulator::{compare_page_policies, Simulator};
use crate::trace::{read_trace, reads, AccessKind, TraceEntry};
use crate::util::{textbook_cache, textbook_page_trace, textbook_virtual_memory};
use crate::virtual_memory::VirtualMemoryTrait;

const CONFIG: &str = r#"{
    "cache": { "size": 256, "block_size": 64, "mapping": "set-associative", "associativity": 2 },
    "virtual_memory": { "num_pages": 8, "num_frames": 3, "tlb_size": 2, "replacement_policy": "optimal" }
}"#;

#[test]
fn runs_both_simulators_from_json() -> Result<(), Box<dyn Error>> {
    let config: SimulationConfig = serde_json::from_str(CONFIG)?;
    let cache_config = config.cache.as_ref().ok_or("missing cache")?;
    assert_eq!(cache_config.mapping, MappingConfig::SetAssociative);
    let mut simulator = Simulator::new(&config)?;
    let result = simulator.simulate(&textbook_page_trace())?;

    // Every page starts on a 4KB boundary, so all of them share set 0 of the cache
    let cache = result.cache.as_ref().ok_or("missing cache result")?;
    assert_eq!((cache.stats.accesses, cache.stats.hits), (12, 0));
    assert_eq!(cache.sets, 2);

    // The future trace is supplied by the simulator
    let vm = result.virtual_memory.as_ref().ok_or("missing virtual memory result")?;
    assert_eq!(vm.replacement_policy, PageReplacementConfig::Optimal);
    assert_eq!(vm.page_size, 4096);
    assert_eq!(vm.stats.page_faults, 7);
    assert_eq!(simulator.get_invalid_line_count(), Some(2));
    Ok(())
}

#[test]
fn results_accumulate_and_serialise() -> Result<(), Box<dyn Error>> {
    let config: SimulationConfig = serde_json::from_str(CONFIG)?;
    let mut simulator = Simulator::new(&config)?;
    simulator.simulate(&textbook_page_trace())?;
    let result = simulator.simulate(&textbook_page_trace())?;
    let vm = result.virtual_memory.as_ref().ok_or("missing virtual memory result")?;
    assert_eq!(vm.stats.accesses, 24);
    assert_eq!(result, simulator.result());

    let json: serde_json::Value = serde_json::from_str(&serde_json::to_string_pretty(&result)?)?;
    assert_eq!(json["virtual_memory"]["stats"]["accesses"], 24);
    assert_eq!(json["virtual_memory"]["replacement_policy"], "Optimal");
    assert_eq!(json["cache"]["address_layout"]["index_bits"], 1);
    Ok(())
}

#[test]
fn observer_sees_every_step() -> Result<(), Box<dyn Error>> {
    let config = SimulationConfig { cache: None, virtual_memory: Some(textbook_virtual_memory(PageReplacementConfig::FirstInFirstOut)) };
    let mut simulator = Simulator::new(&config)?;
    let mut faults = Vec::new();
    simulator.simulate_with(&textbook_page_trace(), |step| {
        assert!(step.cache.is_none());
        if step.translation.map_or(false, |t| t.page_fault()) {
            faults.push(step.position);
        }
    })?;
    assert_eq!(faults, vec![0, 1, 2, 3, 4, 5, 6, 9, 10]);
    Ok(())
}

#[test]
fn compares_every_page_policy() -> Result<(), Box<dyn Error>> {
    let results = compare_page_policies(&textbook_virtual_memory(PageReplacementConfig::Clock), &textbook_page_trace())?;
    let counts: Vec<(PageReplacementConfig, u64)> = results.iter().map(|r| (r.replacement_policy, r.stats.page_faults)).collect();
    assert_eq!(
        counts,
        vec![
            (PageReplacementConfig::FirstInFirstOut, 9),
            (PageReplacementConfig::LeastRecentlyUsed, 10),
            (PageReplacementConfig::Clock, 9),
            (PageReplacementConfig::Optimal, 7),
        ]
    );
    Ok(())
}

#[test]
fn rejects_empty_and_unknown_configurations() {
    let empty: SimulationConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(Simulator::new(&empty).err(), Some(ConfigError::NothingToSimulate));

    let unknown = r#"{ "cache": { "size": 256, "block_size": 64, "mapping": "ring" } }"#;
    let message = serde_json::from_str::<SimulationConfig>(unknown).unwrap_err().to_string();
    assert!(message.contains(&ConfigError::UnsupportedMapping("ring".to_string()).to_string()), "{message}");

    let mut config = SimulationConfig { cache: None, virtual_memory: Some(textbook_virtual_memory(PageReplacementConfig::Clock)) };
    if let Some(vm) = config.virtual_memory.as_mut() {
        vm.tlb_size = 0;
    }
    assert_eq!(Simulator::new(&config).err(), Some(ConfigError::EmptyTlb));
}

#[test]
fn json_and_command_line_share_names() -> Result<(), Box<dyn Error>> {
    let json = r#"{
        "cache": { "size": 256, "block_size": 64, "mapping": "direct-mapped", "replacement_policy": "FirstInFirstOut" },
        "virtual_memory": { "num_pages": 8, "num_frames": 3, "tlb_size": 2, "replacement_policy": "NRU" }
    }"#;
    let config: SimulationConfig = serde_json::from_str(json)?;
    let cache = config.cache.as_ref().ok_or("missing cache")?;
    assert_eq!((cache.mapping, cache.replacement_policy), (MappingConfig::Direct, CacheReplacementConfig::FirstInFirstOut));
    assert_eq!(config.virtual_memory.as_ref().ok_or("missing virtual memory")?.replacement_policy, PageReplacementConfig::Clock);
    assert_eq!("FullyAssociative".parse::<MappingConfig>(), Ok(MappingConfig::FullyAssociative));

    let bad_policy = r#"{ "virtual_memory": { "num_pages": 8, "num_frames": 3, "tlb_size": 2, "replacement_policy": "mru" } }"#;
    let message = serde_json::from_str::<SimulationConfig>(bad_policy).unwrap_err().to_string();
    assert!(message.contains(&ConfigError::UnsupportedPolicy("mru".to_string()).to_string()), "{message}");
    Ok(())
}

#[test]
fn out_of_range_trace_leaves_both_simulators_in_step() -> Result<(), Box<dyn Error>> {
    let config = SimulationConfig {
        cache: Some(textbook_cache(MappingConfig::Direct, CacheReplacementConfig::LeastRecentlyUsed)),
        virtual_memory: Some(textbook_virtual_memory(PageReplacementConfig::FirstInFirstOut)),
    };
    let mut simulator = Simulator::new(&config)?;
    let mut steps = 0;
    let rejected = simulator.simulate_with(&reads(&[0x1000, 0x9000, 0x2000]), |_| steps += 1);
    assert_eq!(rejected, Err(AccessError::PageOutOfRange { page: 9, pages: 8 }));
    assert_eq!(steps, 0);
    let cache = simulator.cache().ok_or("missing cache")?;
    let vm = simulator.virtual_memory().ok_or("missing virtual memory")?;
    assert_eq!((cache.stats().accesses, vm.stats().accesses), (0, 0));

    // The simulator is still usable afterwards
    let result = simulator.simulate(&textbook_page_trace())?;
    let cache = result.cache.as_ref().ok_or("missing cache result")?;
    let vm = result.virtual_memory.as_ref().ok_or("missing virtual memory result")?;
    assert_eq!((cache.stats.accesses, vm.stats.accesses), (12, 12));
    assert_eq!(vm.stats.page_faults, 9);
    Ok(())
}

#[test]
fn parses_traces() {
    let text = "# textbook\n0x1000\n8192 W\n\n0X3000 r # trailing comment\n";
    let trace = read_trace(text.as_bytes()).unwrap();
    assert_eq!(trace, vec![TraceEntry::read(0x1000), TraceEntry::write(8192), TraceEntry::read(0x3000)]);
    assert_eq!(trace[1].kind, AccessKind::Write);

    match read_trace("0x10\nzz\n".as_bytes()) {
        Err(TraceError::Syntax { line, content }) => assert_eq!((line, content.as_str()), (2, "zz")),
        other => panic!("expected a syntax error, got {other:?}"),
    }
}

#[test]
fn reads_trace_files() -> Result<(), Box<dyn Error>> {
    let path = std::env::temp_dir().join(format!("memlib-trace-{}.txt", std::process::id()));
    let mut file = std::fs::File::create(&path)?;
    writeln!(file, "0x1000\n0x2000 W\n0x1000")?;
    drop(file);
    let trace = open_trace(&path);
    std::fs::remove_file(&path)?;
    assert_eq!(trace?, vec![TraceEntry::read(0x1000), TraceEntry::write(0x2000), TraceEntry::read(0x1000)]);
    Ok(())
}
