use anyhow::{bail, Context, Result};
use canopy_cover_core::inventory::select_active_plots;
use canopy_cover_core::{
    prepare_inventory, select_plots, BatchProcessor, BatchReport, CoverConfig, DiskResolution,
    PlotRecord, TreeRecord,
};
use clap::Parser;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Canopy cover batch runner
#[derive(Parser, Debug)]
#[command(name = "cover-headless")]
#[command(about = "Per-plot canopy cover from stem-mapped inventory trees", long_about = None)]
struct Args {
    /// Inventory JSON with `plots` and `trees` arrays
    #[arg(short, long)]
    input: PathBuf,

    /// Where to write the results (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON cover config; missing fields take defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Disk resolution (coarse, standard, fine, or a segment count)
    #[arg(short, long)]
    resolution: Option<String>,

    /// Worker threads (defaults to one per core)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Earliest inventory year to include
    #[arg(long)]
    from_year: Option<u16>,

    /// Latest inventory year to include
    #[arg(long)]
    to_year: Option<u16>,

    /// Only run this many randomly chosen plots
    #[arg(long)]
    sample: Option<usize>,

    /// Seed for --sample
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Write the full report (table, density, diagnostics) instead of the table
    #[arg(long)]
    full_report: bool,

    /// Log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Input file layout
#[derive(Debug, Deserialize)]
struct Inventory {
    /// Plot visits; when empty, every plot with trees is used
    #[serde(default)]
    plots: Vec<PlotRecord>,
    trees: Vec<TreeRecord>,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<CoverConfig> {
    let mut config = match &args.config {
        Some(path) => CoverConfig::from_json_file(path)?,
        None => CoverConfig::default(),
    };

    if let Some(name) = &args.resolution {
        let Some(resolution) = DiskResolution::parse(name) else {
            bail!("unknown disk resolution '{name}'");
        };
        config.disk_resolution = resolution;
    }
    if args.threads.is_some() {
        config.threads = args.threads;
    }

    config.validate()?;
    Ok(config)
}

fn load_inventory(path: &Path) -> Result<Inventory> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing inventory {}", path.display()))
}

fn write_output<T: serde::Serialize>(path: Option<&Path>, value: &T) -> Result<()> {
    match path {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("creating {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.flush()?;
        }
        None => {
            let stdout = std::io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, value)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

fn print_summary(report: &BatchReport) {
    let s = &report.summary;
    eprintln!("=== Canopy Cover Batch ===");
    eprintln!(
        "Plots: {} submitted, {} computed, {} failed, {} cancelled",
        s.plots_total, s.plots_computed, s.plots_failed, s.plots_cancelled
    );
    eprintln!(
        "Trees: {} used, {} excluded at placement",
        s.trees_used, s.trees_rejected
    );
    if let Some(mean) = report.table.mean_cover() {
        eprintln!("Mean cover (overlap corrected): {:.1}%", mean * 100.0);
    }
    for diag in &report.plot_diagnostics {
        eprintln!("  excluded plot {}: {}", diag.plot, diag.error);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = load_config(&args)?;
    let inventory = load_inventory(&args.input)?;
    info!(
        plots = inventory.plots.len(),
        trees = inventory.trees.len(),
        "Loaded inventory"
    );

    let mut prepared = prepare_inventory(inventory.trees, None, &config);

    if !inventory.plots.is_empty() {
        let years = args.from_year.unwrap_or(u16::MIN)..=args.to_year.unwrap_or(u16::MAX);
        let active = select_active_plots(&inventory.plots, &years);
        prepared.ensure_plots(&active);
        prepared.retain_plots(&active);
    }

    if let Some(n) = args.sample {
        let picked: BTreeSet<_> = select_plots(prepared.plots.keys(), n, args.seed)
            .into_iter()
            .collect();
        info!(sampled = picked.len(), seed = args.seed, "Selected plot subset");
        prepared.retain_plots(&picked);
    }

    let processor = BatchProcessor::new(&config)?;
    let mut report = processor.run(&prepared.plots);
    // Inventory rejections come first, placement rejections after
    let mut diagnostics = prepared.rejected;
    diagnostics.append(&mut report.tree_diagnostics);
    report.tree_diagnostics = diagnostics;

    print_summary(&report);
    eprintln!(
        "Inventory: {} trees excluded before the engine ({} crown widths imputed)",
        report.tree_diagnostics.len() - report.summary.trees_rejected,
        prepared.imputed
    );

    if args.full_report {
        write_output(args.output.as_deref(), &report)
    } else {
        write_output(args.output.as_deref(), &report.table)
    }
}
