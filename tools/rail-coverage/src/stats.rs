use rail_sim_transit::{AlignmentStats, NetworkBuildStats};

use crate::pipeline::SelectionStats;
use crate::routes::GroupingStats;

#[derive(Debug, Default, Clone)]
pub struct RunStats {
    pub network: NetworkBuildStats,
    pub malformed_records: usize,
    pub grouping: GroupingStats,
    pub selection: SelectionStats,
    pub alignment: AlignmentStats,
    pub points_outside_network: usize,
    pub total_runs: usize,
    pub backfilled_runs: usize,
}

impl RunStats {
    pub fn log_summary(&self) {
        log::info!("=== Run Statistics ===");
        log::info!("Network segments: {}", self.network.segments_indexed);
        log::info!("Schedule records: {}", self.grouping.records_read);
        log::info!("Routes grouped: {}", self.grouping.routes);
        log::info!(
            "Routes selected: {} of {}",
            self.selection.selected,
            self.selection.candidates
        );
        if self.selection.thinned_routes > 0 {
            log::info!("Routes thinned: {}", self.selection.thinned_routes);
        }
        log::info!(
            "Points aligned: {}/{} ({:.1}%)",
            self.alignment.aligned_points,
            self.alignment.total_points,
            self.alignment.aligned_ratio() * 100.0
        );
        log::info!(
            "Snap distance: mean {:.3} km, max {:.3} km",
            self.alignment.mean_snap_km(),
            self.alignment.max_snap_km
        );
        log::info!("Synthesized points: {}", self.alignment.synthesized_points);
        log::info!(
            "Runs written: {} ({} backfilled)",
            self.total_runs,
            self.backfilled_runs
        );

        if self.points_outside_network > 0 {
            log::warn!(
                "Route points outside network bounds: {}",
                self.points_outside_network
            );
        }
        if self.malformed_records > 0 {
            log::warn!("Malformed records skipped: {}", self.malformed_records);
        }
        if self.grouping.missing_train_number > 0 {
            log::warn!(
                "Records without train number: {}",
                self.grouping.missing_train_number
            );
        }
        if self.grouping.bad_times > 0 {
            log::warn!(
                "Unparsable times replaced by default: {}",
                self.grouping.bad_times
            );
        }
        if self.grouping.bad_coordinates > 0 {
            log::warn!(
                "Malformed coordinates dropped: {}",
                self.grouping.bad_coordinates
            );
        }
    }
}
