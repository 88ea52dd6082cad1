/// Offline aggregation runner: reads backend sample rows from a JSON file and
/// writes the grid aggregation result (sample points, feature collection,
/// legend maxes) as JSON.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use biomap_core::{GridConfig, PopulateStrategy, RawRow, SampleAggregator};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "gridder", about = "Aggregate georeferenced OTU sample rows into a weighted grid")]
struct Args {
    /// JSON file holding an array of [lat, lon, siteId, richness, abundance] rows
    input: PathBuf,

    /// Cell edge length in degrees
    #[arg(short, long, default_value_t = 1.0)]
    detail_level: f64,

    /// Round the detail level to the UI slider (0.25–10, step 0.25)
    #[arg(long)]
    snap: bool,

    /// Site-to-cell assignment strategy
    #[arg(long, value_enum, default_value_t = Strategy::Hashed)]
    strategy: Strategy,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,

    /// Log filter: a level (`debug`) or directives (`biomap_core=trace,info`)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Strategy {
    Hashed,
    Scan,
}

impl From<Strategy> for PopulateStrategy {
    fn from(s: Strategy) -> Self {
        match s {
            Strategy::Hashed => PopulateStrategy::Hashed,
            Strategy::Scan => PopulateStrategy::Scan,
        }
    }
}

fn log_filter(directives: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directives).with_context(|| format!("invalid --log-level {directives:?}"))
}

// ── Entry point ──────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout stays clean JSON.
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter(&args.log_level)?)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let rows: Vec<RawRow> = serde_json::from_str(&text)
        .with_context(|| format!("decoding rows from {}", args.input.display()))?;
    info!("Loaded {} rows from {}", rows.len(), args.input.display());

    let mut config = GridConfig::new(args.detail_level).with_strategy(args.strategy.into());
    if args.snap {
        config = config.snap_to_slider();
    }

    let mut engine = SampleAggregator::new(config)?;
    let result = engine.load_rows(&rows)?;

    let stats = &result.stats;
    info!(
        "{} of {} rows kept ({} without abundance), {} sites",
        stats.points.kept, stats.points.rows, stats.points.missing_abundance, stats.sites
    );
    if result.feature_collection.is_empty() {
        info!("No matching samples");
    } else {
        info!(
            "{} active cells of {} candidates at {}°; maxes: abundance {:.2}, richness {:.2}, sites {}",
            stats.active_cells,
            stats.candidate_cells,
            stats.cell_size,
            result.maxes.abundance,
            result.maxes.richness,
            result.maxes.sites
        );
    }

    let json = if args.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };

    match &args.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => {
            let mut out = io::stdout().lock();
            out.write_all(json.as_bytes())?;
            out.write_all(b"\n")?;
        }
    }

    Ok(())
}
