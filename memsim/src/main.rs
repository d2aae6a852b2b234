use std::fs::File;
use std::io::BufReader;
use std::time::Instant;
use clap::Parser;
use log::info;
use memlib::config::{CacheReplacementConfig, MappingConfig, PageReplacementConfig, SimulationConfig};
use memlib::io::open_trace;
use memlib::simulator::{compare_page_policies, Simulator};

#[cfg(debug_assertions)]
const DEBUG_DEFAULT: bool = true;

#[cfg(not(debug_assertions))]
const DEBUG_DEFAULT: bool = false;

#[derive(Parser, Debug)]
#[command(about = String::from("Cache and virtual memory simulator"))]
struct Args {
    /// JSON configuration with a cache section, a virtual_memory section, or both
    config: String,
    /// Trace file, one address per line, optionally followed by R or W
    trace: String,

    /// Print what happened on every access
    #[arg(short, long)]
    verbose: bool,

    /// Print a human readable report instead of JSON
    #[arg(short, long)]
    report: bool,

    /// Replay the trace under every page replacement policy
    #[arg(short, long)]
    compare: bool,

    #[arg(long)]
    mapping: Option<MappingConfig>,

    #[arg(long)]
    cache_policy: Option<CacheReplacementConfig>,

    #[arg(long)]
    page_policy: Option<PageReplacementConfig>,

    #[arg(short, long)]
    performance: bool,

    #[arg(short, long, default_value_t = DEBUG_DEFAULT)]
    debug: bool,
}

fn main() -> Result<(), String> {
    pretty_env_logger::init();
    let start = Instant::now();
    let args = Args::parse();
    let config_file = File::open(&args.config).map_err(|e| format!("Couldn't open the config file at path {}: {e}", args.config))?;
    let mut config: SimulationConfig = serde_json::from_reader(BufReader::new(config_file)).map_err(|e| format!("Couldn't parse the config file: {e}"))?;
    apply_overrides(&mut config, &args);
    let trace = open_trace(&args.trace).map_err(|e| format!("Couldn't read the trace file at path {}: {e}", args.trace))?;
    info!("{} accesses in {}", trace.len(), args.trace);

    if args.compare {
        let vm_config = config.virtual_memory.as_ref().ok_or("--compare needs a virtual_memory section in the config")?;
        let results = compare_page_policies(vm_config, &trace).map_err(|e| e.to_string())?;
        if args.report {
            for result in &results {
                println!("{result}");
            }
        } else {
            println!("{}", serde_json::to_string_pretty(&results).map_err(|e| format!("Couldn't serialise the output {e}"))?);
        }
        return Ok(());
    }

    let mut simulator = Simulator::new(&config).map_err(|e| format!("Invalid configuration: {e}"))?;
    let result = simulator
        .simulate_with(&trace, |step| {
            if !args.verbose {
                return;
            }
            println!("access {}:", step.position + 1);
            if let Some(access) = &step.cache {
                println!("  cache: {access}");
            }
            if let Some(translation) = &step.translation {
                print!("{translation}");
            }
        })
        .map_err(|e| format!("Simulation stopped: {e}"))?;
    if args.report {
        if let Some(cache) = &result.cache {
            println!("{cache}");
        }
        if let Some(vm) = &result.virtual_memory {
            println!("{vm}");
        }
    } else {
        println!("{}", serde_json::to_string_pretty(&result).map_err(|e| format!("Couldn't serialise the output {e}"))?);
    }
    if args.performance {
        let end = Instant::now();
        let simulation_time = simulator.get_execution_time();
        let total_time = end - start;
        println!("Simulation time: {}s", simulation_time.as_nanos() as f64 / 1e9);
        println!("Total execution time (includes initial parsing, configuration, and output): {}s", total_time.as_nanos() as f64 / 1e9)
    }
    if args.debug {
        #[cfg(debug_assertions)]
        println!("Running the debug binary, debug mode is enabled by default. If benchmarking, do not use this binary, re-compile with the --release argument when using cargo run");
        println!("Parsed input configuration: {config:?}");
        if let Some(invalid) = simulator.get_invalid_line_count() {
            println!("Invalid cache lines: {invalid}");
        }
    }
    Ok(())
}

/// Command line choices win over the configuration file
fn apply_overrides(config: &mut SimulationConfig, args: &Args) {
    if let Some(cache) = config.cache.as_mut() {
        if let Some(mapping) = args.mapping {
            cache.mapping = mapping;
        }
        if let Some(policy) = args.cache_policy {
            cache.replacement_policy = policy;
        }
    }
    if let (Some(vm), Some(policy)) = (config.virtual_memory.as_mut(), args.page_policy) {
        vm.replacement_policy = policy;
    }
}
