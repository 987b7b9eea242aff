use anyhow::{bail, Context, Result};
use clap::Parser;
use rail_sim_transit::{AlignmentConfig, CoverageConfig, DEFAULT_BULGE, DEFAULT_CELL_SIZE_DEG};
use std::path::PathBuf;

mod input;
mod output;
mod pipeline;
mod policy;
mod routes;
mod stats;

use input::{read_network, read_schedule_records};
use output::{build_dataset, write_dataset, InputSummary};
use pipeline::PipelineConfig;
use policy::KeywordPolicy;
use routes::group_routes;
use stats::RunStats;

#[derive(Parser, Debug)]
#[command(
    name = "rail-coverage",
    author,
    version,
    about = "Snap train routes onto rail track and schedule round-the-clock runs",
    long_about = "Reads a rail network (GeoJSON lines) and a list of train schedules, keeps \
                  the highest-priority routes, snaps their coordinates onto the nearest \
                  track and repeats each trip over the day by frequency tier.\n\n\
                  Hours with fewer active trains than --min-coverage are backfilled with \
                  extra runs of the best remaining routes."
)]
struct Args {
    /// Rail network GeoJSON (LineString / MultiLineString features)
    #[arg(short, long)]
    network: PathBuf,

    /// Train schedule JSON (array of trains or {"trains": [...]})
    #[arg(short, long)]
    schedules: PathBuf,

    /// Output dataset JSON
    #[arg(short, long)]
    output: PathBuf,

    /// Minimum active trains wanted in every hour
    #[arg(long, default_value_t = 15)]
    min_coverage: u32,

    /// Points farther than this from track are left unaligned
    #[arg(long, default_value_t = 5.0)]
    snap_threshold_km: f64,

    /// Radius of the nearest-track search
    #[arg(long, default_value_t = 20.0)]
    max_search_km: f64,

    /// Routes with fewer points are densified up to this count
    #[arg(long, default_value_t = 8)]
    min_route_points: usize,

    /// Cell size of the network grid, in degrees
    #[arg(long, default_value_t = DEFAULT_CELL_SIZE_DEG)]
    cell_size_deg: f64,

    /// Maximum number of routes to keep
    #[arg(long, default_value_t = 50)]
    max_routes: usize,

    /// Routes scoring below this are dropped
    #[arg(long, default_value_t = 100.0)]
    min_score: f64,

    /// Longer routes are thinned to about this many points before alignment
    #[arg(long, default_value_t = 15)]
    max_route_points: usize,

    /// Stations kept per output entry
    #[arg(long, default_value_t = 5)]
    max_stations: usize,

    /// Worker threads (defaults to one per core)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Verbose output (show debug messages)
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            alignment: AlignmentConfig {
                snap_threshold_km: self.snap_threshold_km,
                max_search_km: self.max_search_km,
                min_points: self.min_route_points,
                bulge: DEFAULT_BULGE,
            },
            coverage: CoverageConfig {
                min_active: self.min_coverage,
            },
            max_routes: self.max_routes,
            min_score: self.min_score,
            max_route_points: self.max_route_points,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if args.verbose { "debug" } else { "info" }),
    )
    .format_timestamp(None)
    .init();

    log::info!("=== Rail Coverage Builder ===");
    log::info!("Network: {}", args.network.display());
    log::info!("Schedules: {}", args.schedules.display());
    log::info!("Output: {}", args.output.display());

    if !args.network.exists() {
        bail!("Network file does not exist: {}", args.network.display());
    }
    if !args.schedules.exists() {
        bail!("Schedule file does not exist: {}", args.schedules.display());
    }
    if args.cell_size_deg.is_nan() || args.cell_size_deg <= 0.0 {
        bail!("--cell-size-deg must be positive, got {}", args.cell_size_deg);
    }

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure worker threads")?;
        log::info!("Worker threads: {}", threads);
    }

    let config = args.pipeline_config();
    let mut stats = RunStats::default();

    // Phase 1: Build the network index
    log::info!("");
    log::info!("Phase 1: Indexing rail network...");
    let (network, network_stats) =
        read_network(&args.network, args.cell_size_deg).context("Failed to load rail network")?;
    network_stats.log_summary();
    if network.is_empty() {
        log::warn!("  Network has no segments; no point will be aligned");
    }
    stats.network = network_stats;

    // Phase 2: Load and group schedules
    log::info!("");
    log::info!("Phase 2: Reading schedules...");
    let schedule_input =
        read_schedule_records(&args.schedules).context("Failed to load schedules")?;
    log::info!(
        "  Read {} records ({} malformed)",
        schedule_input.records.len(),
        schedule_input.malformed_records
    );
    stats.malformed_records = schedule_input.malformed_records;

    let (routes, grouping) = group_routes(schedule_input.records);
    log::info!("  Grouped into {} routes", routes.len());
    stats.grouping = grouping;

    // Phase 3: Select, align and expand
    log::info!("");
    log::info!("Phase 3: Aligning routes and expanding schedules...");
    let result = pipeline::run(routes, &network, &KeywordPolicy, &config);
    stats.selection = result.selection;
    stats.alignment = result.alignment;
    stats.points_outside_network = result.outside_bounds;
    stats.backfilled_runs = result.coverage.backfill.added.len();

    // Phase 4: Coverage report
    log::info!("");
    log::info!("Phase 4: Checking hourly coverage...");
    result.coverage.log_summary(args.min_coverage);

    // Phase 5: Write output
    log::info!("");
    log::info!("Phase 5: Writing output...");
    let input_summary = InputSummary::new(
        &stats.grouping,
        stats.malformed_records,
        stats.network.features_skipped,
    );
    let dataset = build_dataset(&result, args.max_stations, args.min_coverage, input_summary);
    stats.total_runs = dataset.metadata.total_trains;
    write_dataset(&dataset, &args.output).context("Failed to write dataset")?;

    // Summary
    log::info!("");
    stats.log_summary();
    log::info!("");
    log::info!("Output written to: {}", args.output.display());
    log::info!("Done!");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from([
            "rail-coverage",
            "--network",
            "rail.geojson",
            "--schedules",
            "trains.json",
            "--output",
            "out.json",
        ]);
        let config = args.pipeline_config();

        assert_eq!(config.coverage.min_active, 15);
        assert_eq!(config.alignment, AlignmentConfig::default());
        assert_eq!(config.max_routes, 50);
        assert_eq!(config.max_route_points, 15);
        assert_eq!(args.max_stations, 5);
        assert_eq!(args.cell_size_deg, DEFAULT_CELL_SIZE_DEG);
        assert!(args.threads.is_none());
    }

    #[test]
    fn test_overrides() {
        let args = Args::parse_from([
            "rail-coverage",
            "-n",
            "rail.geojson",
            "-s",
            "trains.json",
            "-o",
            "out.json",
            "--min-coverage",
            "3",
            "--snap-threshold-km",
            "2.5",
            "--threads",
            "4",
        ]);
        let config = args.pipeline_config();

        assert_eq!(config.coverage.min_active, 3);
        assert_eq!(config.alignment.snap_threshold_km, 2.5);
        assert_eq!(args.threads, Some(4));
    }
}
