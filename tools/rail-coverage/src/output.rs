use anyhow::{Context, Result};
use rail_sim_transit::{AlignmentStats, CoverageReport, InstanceIdentifier, HOURS_PER_DAY};
use serde::Serialize;
use std::path::Path;

use crate::pipeline::PipelineOutput;
use crate::routes::GroupingStats;

#[derive(Debug, Serialize)]
pub struct Dataset {
    pub metadata: Metadata,
    pub trains: Vec<TrainEntry>,
}

#[derive(Debug, Serialize)]
pub struct Metadata {
    pub total_trains: usize,
    pub unique_routes: usize,
    pub alignment_stats: AlignmentSummary,
    pub coverage_stats: CoverageSummary,
    pub input_stats: InputSummary,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct AlignmentSummary {
    pub total_points: usize,
    pub aligned_points: usize,
    pub unaligned_points: usize,
    pub synthesized_points: usize,
    pub points_outside_network: usize,
    pub mean_snap_km: f64,
    pub max_snap_km: f64,
}

impl AlignmentSummary {
    fn new(stats: &AlignmentStats, outside_bounds: usize) -> Self {
        Self {
            total_points: stats.total_points,
            aligned_points: stats.aligned_points,
            unaligned_points: stats.unaligned_points(),
            synthesized_points: stats.synthesized_points,
            points_outside_network: outside_bounds,
            mean_snap_km: stats.mean_snap_km(),
            max_snap_km: stats.max_snap_km,
        }
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct CoverageSummary {
    pub target_active: u32,
    pub min_active: u32,
    pub max_active: u32,
    pub average_active: f64,
    pub hourly_active: [u32; HOURS_PER_DAY],
    pub gap_hours_before_backfill: Vec<usize>,
    pub backfilled_runs: usize,
    pub unresolved_hours: Vec<usize>,
}

impl CoverageSummary {
    fn new(report: &CoverageReport, target_active: u32) -> Self {
        Self {
            target_active,
            min_active: report.after.min(),
            max_active: report.after.max(),
            average_active: report.after.mean(),
            hourly_active: *report.after.buckets(),
            gap_hours_before_backfill: report.gaps_before.clone(),
            backfilled_runs: report.backfill.added.len(),
            unresolved_hours: report.backfill.unresolved.clone(),
        }
    }
}

#[derive(Debug, Default, Serialize, PartialEq)]
pub struct InputSummary {
    pub records_read: usize,
    pub malformed_records: usize,
    pub missing_train_number: usize,
    pub defaulted_times: usize,
    pub unparsable_times: usize,
    pub malformed_coordinates: usize,
    pub network_features_skipped: usize,
}

impl InputSummary {
    pub fn new(
        grouping: &GroupingStats,
        malformed_records: usize,
        features_skipped: usize,
    ) -> Self {
        Self {
            records_read: grouping.records_read + malformed_records,
            malformed_records,
            missing_train_number: grouping.missing_train_number,
            defaulted_times: grouping.missing_times,
            unparsable_times: grouping.bad_times,
            malformed_coordinates: grouping.bad_coordinates,
            network_features_skipped: features_skipped,
        }
    }
}

/// One run of one train, as consumed by the simulator.
#[derive(Debug, Serialize)]
pub struct TrainEntry {
    pub id: String,
    pub train_number: String,
    pub train_name: String,
    pub from: String,
    pub to: String,
    pub departure: String,
    pub arrival: String,
    /// `[lon, lat]` pairs.
    pub route_coordinates: Vec<[f64; 2]>,
    pub stations: Vec<serde_json::Value>,
    pub train_type: String,
    pub zone: String,
    pub distance: f64,
}

/// Label for the `index`-th (0-based) selected route.
fn route_label(index: usize) -> String {
    format!("R{:02}", index + 1)
}

/// Flatten the pipeline result into one entry per run.
pub fn build_dataset(
    output: &PipelineOutput,
    max_stations: usize,
    target_active: u32,
    input: InputSummary,
) -> Dataset {
    let mut trains = Vec::new();

    for (i, (processed, schedule)) in output.routes.iter().zip(&output.schedules).enumerate() {
        let label = route_label(i);
        let route = &processed.route;
        let coordinates: Vec<[f64; 2]> = processed
            .aligned
            .coordinates()
            .iter()
            .map(|p| [p.x(), p.y()])
            .collect();
        let stations: Vec<serde_json::Value> =
            route.stations.iter().take(max_stations).cloned().collect();

        for run in &schedule.instances {
            trains.push(TrainEntry {
                id: InstanceIdentifier::for_run(&label, run.ordinal).to_string(),
                train_number: route.train.to_string(),
                train_name: route.train_name.clone(),
                from: route.from.clone(),
                to: route.to.clone(),
                departure: run.departure.to_string(),
                arrival: run.arrival.to_string(),
                route_coordinates: coordinates.clone(),
                stations: stations.clone(),
                train_type: route.train_type.clone(),
                zone: route.zone.clone(),
                distance: route.distance,
            });
        }
    }

    Dataset {
        metadata: Metadata {
            total_trains: trains.len(),
            unique_routes: output.routes.len(),
            alignment_stats: AlignmentSummary::new(&output.alignment, output.outside_bounds),
            coverage_stats: CoverageSummary::new(&output.coverage, target_active),
            input_stats: input,
        },
        trains,
    }
}

pub fn write_dataset(dataset: &Dataset, output_path: &Path) -> Result<()> {
    log::info!(
        "Writing {} trains ({} routes) to {}",
        dataset.metadata.total_trains,
        dataset.metadata.unique_routes,
        output_path.display()
    );

    let json_string =
        serde_json::to_string_pretty(dataset).context("Failed to serialize dataset")?;

    std::fs::write(output_path, json_string)
        .with_context(|| format!("Failed to write dataset to {}", output_path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{run, PipelineConfig};
    use crate::routes::TrainRoute;
    use geo::{LineString, Point};
    use rail_sim_transit::{
        FnPolicy, FrequencyTier, RailNetworkIndex, ScheduleBase, TimeOfDay, TrainIdentifier,
        DEFAULT_CELL_SIZE_DEG,
    };

    fn pipeline_output() -> PipelineOutput {
        let network = RailNetworkIndex::from_lines(
            vec![LineString::from(vec![(77.0, 28.0), (78.0, 28.0)])],
            DEFAULT_CELL_SIZE_DEG,
        );
        let route = TrainRoute {
            train: TrainIdentifier::new("12951"),
            train_name: "MUMBAI RAJDHANI".into(),
            train_type: "RAJ".into(),
            zone: "WR".into(),
            distance: 1384.0,
            from: "MUMBAI CENTRAL".into(),
            to: "NEW DELHI".into(),
            base: ScheduleBase::new(
                TimeOfDay::parse("06:00:00").unwrap(),
                TimeOfDay::parse("18:00:00").unwrap(),
            ),
            coordinates: (0..10).map(|i| Point::new(77.0 + i as f64 * 0.1, 28.0)).collect(),
            stations: (0..8).map(|i| serde_json::json!({"code": format!("S{i}")})).collect(),
        };
        let policy = FnPolicy::new(|_: &TrainRoute| 300.0, |_: &TrainRoute| FrequencyTier::Medium);
        let config = PipelineConfig {
            coverage: rail_sim_transit::CoverageConfig { min_active: 1 },
            ..Default::default()
        };
        run(vec![route], &network, &policy, &config)
    }

    #[test]
    fn test_one_entry_per_run() {
        let output = pipeline_output();
        let dataset = build_dataset(&output, 5, 1, InputSummary::default());

        let ids: Vec<&str> = dataset.trains.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["R01", "R01_2", "R01_3"]);
        assert_eq!(dataset.metadata.total_trains, 3);
        assert_eq!(dataset.metadata.unique_routes, 1);

        let second = &dataset.trains[1];
        assert_eq!(second.departure, "14:00:00");
        assert_eq!(second.arrival, "02:00:00");
        assert_eq!(second.stations.len(), 5);
        assert_eq!(second.route_coordinates.len(), 10);
        assert_eq!(second.route_coordinates[0], [77.0, 28.0]);
        assert_eq!(dataset.metadata.coverage_stats.min_active, 1);
        assert!(dataset.metadata.coverage_stats.unresolved_hours.is_empty());
    }

    #[test]
    fn test_write_dataset() {
        let output = pipeline_output();
        let dataset = build_dataset(&output, 5, 1, InputSummary::default());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trains.json");

        write_dataset(&dataset, &path).unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["metadata"]["total_trains"], 3);
        assert_eq!(written["trains"][0]["id"], "R01");
        assert_eq!(written["trains"][0]["train_number"], "12951");
        assert_eq!(written["trains"][2]["departure"], "22:00:00");
        assert_eq!(written["metadata"]["alignment_stats"]["aligned_points"], 10);
        assert_eq!(
            written["metadata"]["coverage_stats"]["hourly_active"]
                .as_array()
                .unwrap()
                .len(),
            24
        );
    }

    #[test]
    fn test_unwritable_output_is_an_error() {
        let output = pipeline_output();
        let dataset = build_dataset(&output, 5, 1, InputSummary::default());
        assert!(write_dataset(&dataset, Path::new("/nonexistent/dir/trains.json")).is_err());
    }
}
