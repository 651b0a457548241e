//! Vector Unit Conformance CLI.
//!
//! Runs seeded random sweeps against the behavioural divider, FP adder and
//! FMA models, prints a statistics summary and optionally writes a JSON
//! report with the accumulated coverage.
//!
//! # Usage
//!
//! ```text
//! vpu-conformance --suite all --iterations 5000 --seed 7 --report out.json
//! ```
//!
//! `RUST_LOG` overrides the log filter; `--trace` raises it to `trace` and
//! enables per-step tracing in the driver.

use std::{fs, process};

use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vpu_conformance::common::types::Unit;
use vpu_conformance::config::HarnessConfig;
use vpu_conformance::core::facade::OperationFacade;
use vpu_conformance::coverage::CoverageContext;
use vpu_conformance::sim::sweep::{self, SweepConfig};
use vpu_conformance::stats::HarnessStats;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Suite {
    Div,
    Fadd,
    Fma,
    All,
}

/// Command-line arguments for the conformance sweep.
#[derive(Parser, Debug)]
#[command(author, version, about = "Vector Arithmetic Conformance Harness")]
struct Args {
    /// TOML configuration; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<String>,

    #[arg(short, long, value_enum, default_value = "all")]
    suite: Suite,

    #[arg(short, long, default_value_t = 1000)]
    iterations: u64,

    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Flush after every N operations (0 = never).
    #[arg(long, default_value_t = 0)]
    flush_every: u64,

    /// Write stats and coverage as JSON to this path.
    #[arg(long)]
    report: Option<String>,

    #[arg(long)]
    trace: bool,
}

#[derive(Serialize)]
struct Report<'a> {
    seed: u64,
    stats: &'a HarnessStats,
    coverage: &'a CoverageContext,
}

fn main() {
    let args = Args::parse();

    let default_level = if args.trace { "trace" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = match &args.config {
        Some(path) => HarnessConfig::load(path).unwrap_or_else(|e| {
            eprintln!("\n[!] FATAL: {}", e);
            process::exit(1);
        }),
        None => HarnessConfig::default(),
    };
    config.general.trace |= args.trace;

    println!("Harness Configuration");
    println!("---------------------");
    println!("Handshake:");
    println!("  Input Timeout:      {} steps", config.handshake.input_timeout);
    println!("  Output Timeout:     {} steps", config.handshake.output_timeout);
    println!("  Reset Cycles:       {}", config.handshake.reset_cycles);
    println!("Divider:");
    println!("  Latency:            {}", config.divider.latency);
    println!("  Capacity:           {}", config.divider.capacity);
    println!("  Backpressure:       {:?}", config.divider.backpressure);
    println!("FP Units:");
    println!("  Latency:            {}", config.fpu.latency);
    println!("---------------------");

    let sweep_config = SweepConfig {
        iterations: args.iterations,
        flush_interval: args.flush_every,
    };
    let mut rng = StdRng::seed_from_u64(args.seed);
    let mut stats = HarnessStats::default();
    let mut coverage = CoverageContext::new();
    info!(seed = args.seed, suite = ?args.suite, "starting sweep");

    if matches!(args.suite, Suite::Div | Suite::All) {
        let mut facade = OperationFacade::divider(&config);
        facade.reset(&mut coverage);
        sweep::run(&mut facade, &sweep_config, &mut rng, &mut stats, &mut coverage);
    }

    let fp_units = [(Suite::Fadd, Unit::FpAdder), (Suite::Fma, Unit::FpFma)];
    for (suite, unit) in fp_units {
        if args.suite != suite && args.suite != Suite::All {
            continue;
        }
        let mut facade = match OperationFacade::floating(unit, &config) {
            Ok(facade) => facade,
            Err(e) => {
                error!(error = %e, "cannot build FP facade");
                process::exit(1);
            }
        };
        facade.reset(&mut coverage);
        sweep::run(&mut facade, &sweep_config, &mut rng, &mut stats, &mut coverage);
    }

    stats.print();

    if let Some(path) = &args.report {
        let report = Report {
            seed: args.seed,
            stats: &stats,
            coverage: &coverage,
        };
        let written = serde_json::to_string_pretty(&report)
            .map_err(|e| e.to_string())
            .and_then(|json| fs::write(path, json).map_err(|e| e.to_string()));
        if let Err(e) = written {
            eprintln!("\n[!] Could not write report '{}': {}", path, e);
            process::exit(1);
        }
        println!("[*] Report written to {}", path);
    }

    if stats.failures() > 0 {
        println!("\n[!] {} operations failed", stats.failures());
        process::exit(1);
    }
}
