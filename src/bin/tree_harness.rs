//! Runs the verification workload and the timing benchmark against every tree.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use balanced_maps::harness::{BenchSample, Clock, HarnessConfig, HarnessError, KeyOrder, ScatterPlot, TgaEncoder, TreeHarness};
use balanced_maps::{BasicRedBlackTree, LeftLeaningRedBlackTree, OrderedMap, TwoThreeExternalTree};
use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

const PLOT_WIDTH: u16 = 640;
const PLOT_HEIGHT: u16 = 480;

#[derive(Parser, Debug)]
#[command(name = "tree-harness", about = "Verify and time the balanced search trees")]
struct Args {
    /// Keys inserted by the verification pass
    #[arg(long, default_value_t = 1000)]
    keys: u32,

    /// Riffle passes over the key sequence
    #[arg(long, default_value_t = 4)]
    repeats: usize,

    /// First key deleted by the verification pass
    #[arg(long, default_value_t = 374)]
    delete_from: u32,

    /// Last key deleted by the verification pass
    #[arg(long, default_value_t = 872)]
    delete_to: u32,

    /// Shuffle seed
    #[arg(long)]
    seed: Option<u64>,

    /// Comma-separated table sizes for the benchmark
    #[arg(long, value_delimiter = ',', default_values_t = [1_000, 2_000, 4_000, 8_000, 16_000])]
    sizes: Vec<u32>,

    /// Insertion order
    #[arg(long, value_enum, default_value_t = Order::Shuffled)]
    order: Order,

    /// Write a scatter plot of the benchmark as a TGA image
    #[arg(long)]
    plot: Option<PathBuf>,

    /// Only run the verification pass
    #[arg(long)]
    skip_bench: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Order {
    Shuffled,
    Ascending,
    Descending,
}

impl From<Order> for KeyOrder {
    fn from(order: Order) -> Self {
        match order {
            Order::Shuffled => Self::Shuffled,
            Order::Ascending => Self::Ascending,
            Order::Descending => Self::Descending,
        }
    }
}

impl Args {
    fn config(&self) -> HarnessConfig {
        let defaults = HarnessConfig::default();
        HarnessConfig {
            key_count: self.keys,
            repeat_count: self.repeats,
            delete_range: self.delete_from..=self.delete_to,
            seed: self.seed.unwrap_or(defaults.seed),
            bench_sizes: self.sizes.clone(),
            order: self.order.into(),
        }
    }
}

/// Nanosecond ticks since the clock was created.
struct InstantClock(Instant);

impl Clock for InstantClock {
    fn now(&self) -> u64 {
        u64::try_from(self.0.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }

    fn frequency(&self) -> u64 {
        1_000_000_000
    }
}

fn install_tracing_subscriber() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

fn verify_all(harness: &TreeHarness) -> Result<(), HarnessError> {
    for report in [
        harness.verify::<LeftLeaningRedBlackTree<u32>>()?,
        harness.verify::<BasicRedBlackTree<u32>>()?,
        harness.verify::<TwoThreeExternalTree<u32>>()?,
    ] {
        println!(
            "{:<10} ok  keys={} height={} black_height={}",
            report.tree, report.stats.keys, report.stats.height, report.stats.black_height
        );
    }
    Ok(())
}

fn bench<T: OrderedMap<u32> + Default>(
    harness: &TreeHarness,
    clock: &InstantClock,
    samples: &mut Vec<BenchSample>,
) -> Result<(), HarnessError> {
    for sample in harness.benchmark::<T, _>(clock)? {
        println!(
            "{:<10} {:>7}  insert {:>9.3} ms  lookup {:>9.3} ms  delete {:>9.3} ms",
            sample.tree, sample.size, sample.insert_ms, sample.lookup_ms, sample.delete_ms
        );
        samples.push(sample);
    }
    Ok(())
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let harness = TreeHarness::new(args.config());
    info!(config = ?harness.config(), "starting");

    verify_all(&harness)?;
    if args.skip_bench {
        return Ok(());
    }

    let clock = InstantClock(Instant::now());
    let mut samples = Vec::new();
    bench::<LeftLeaningRedBlackTree<u32>>(&harness, &clock, &mut samples)?;
    bench::<BasicRedBlackTree<u32>>(&harness, &clock, &mut samples)?;
    bench::<TwoThreeExternalTree<u32>>(&harness, &clock, &mut samples)?;

    if let Some(path) = &args.plot {
        let mut encoder = TgaEncoder::new();
        ScatterPlot::render(&samples, PLOT_WIDTH, PLOT_HEIGHT).write_to(&mut encoder)?;
        fs::write(path, encoder.bytes())?;
        info!(path = %path.display(), "plot written");
    }
    Ok(())
}

fn main() -> ExitCode {
    install_tracing_subscriber();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
