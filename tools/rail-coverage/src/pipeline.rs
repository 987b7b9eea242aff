use std::collections::HashMap;

use geo::Point;
use rail_sim_transit::{
    AlignedRoute, AlignmentConfig, AlignmentStats, CoverageConfig, CoverageHistogram,
    CoverageReport, CoverageScheduler, RailNetworkIndex, RouteAligner, RoutePolicy, RouteSchedule,
    TrainIdentifier,
};
use rayon::prelude::*;

use crate::routes::TrainRoute;

#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    pub alignment: AlignmentConfig,
    pub coverage: CoverageConfig,
    pub max_routes: usize,
    pub min_score: f64,
    pub max_route_points: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            alignment: AlignmentConfig::default(),
            coverage: CoverageConfig::default(),
            max_routes: 50,
            min_score: 100.0,
            max_route_points: 15,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScoredRoute {
    pub route: TrainRoute,
    pub score: f64,
}

/// A selected route after alignment; its runs live in the matching [`RouteSchedule`].
#[derive(Debug, Clone)]
pub struct ProcessedRoute {
    pub route: TrainRoute,
    pub score: f64,
    pub aligned: AlignedRoute,
    /// Input points outside the network bounding box.
    pub outside_bounds: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SelectionStats {
    pub candidates: usize,
    pub below_min_score: usize,
    pub over_limit: usize,
    pub selected: usize,
    pub thinned_routes: usize,
}

pub struct PipelineOutput {
    pub routes: Vec<ProcessedRoute>,
    /// Parallel to `routes`.
    pub schedules: Vec<RouteSchedule>,
    pub alignment: AlignmentStats,
    pub outside_bounds: usize,
    pub selection: SelectionStats,
    pub coverage: CoverageReport,
}

/// Keep routes scoring at least `min_score`, best first, at most `max_routes`.
///
/// Equal scores keep their input order.
pub fn select_routes<P>(
    routes: Vec<TrainRoute>,
    policy: &P,
    min_score: f64,
    max_routes: usize,
    stats: &mut SelectionStats,
) -> Vec<ScoredRoute>
where
    P: RoutePolicy<TrainRoute>,
{
    stats.candidates = routes.len();

    let mut scored: Vec<ScoredRoute> = routes
        .into_iter()
        .filter_map(|route| {
            let score = policy.priority_score(&route);
            (score >= min_score).then_some(ScoredRoute { route, score })
        })
        .collect();
    stats.below_min_score = stats.candidates - scored.len();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    if scored.len() > max_routes {
        stats.over_limit = scored.len() - max_routes;
        scored.truncate(max_routes);
    }
    stats.selected = scored.len();

    scored
}

/// Stride a long route down to roughly `max_points`, always keeping both ends.
pub fn thin_coordinates(points: &[Point], max_points: usize) -> Vec<Point> {
    if points.len() <= max_points {
        return points.to_vec();
    }

    let step = (points.len() / max_points.saturating_sub(3).max(1)).max(1);
    let mut thinned: Vec<Point> = points.iter().step_by(step).copied().collect();
    if let Some(&last) = points.last() {
        if thinned.last() != Some(&last) {
            thinned.push(last);
        }
    }
    thinned
}

fn process_route(
    scored: ScoredRoute,
    aligner: &RouteAligner<'_>,
    scheduler: &CoverageScheduler,
    network: &RailNetworkIndex,
    policy: &impl RoutePolicy<TrainRoute>,
    max_route_points: usize,
) -> (ProcessedRoute, RouteSchedule) {
    let ScoredRoute { route, score } = scored;

    let points = thin_coordinates(&route.coordinates, max_route_points);
    let outside_bounds = points.iter().filter(|&&p| !network.covers(p)).count();

    let aligned = aligner.align_route(&points);
    let tier = policy.frequency_tier(&route);
    let schedule = scheduler.expand_route(route.train.clone(), route.base, tier);

    log::debug!(
        "Train {} ({}): {}/{} points aligned, {} runs at {}",
        route.train,
        route.train_name,
        aligned.stats.aligned_points,
        aligned.stats.total_points,
        schedule.instances.len(),
        tier
    );

    (
        ProcessedRoute {
            route,
            score,
            aligned,
            outside_bounds,
        },
        schedule,
    )
}

/// Select, align and expand routes on the rayon pool, then backfill coverage.
pub fn run<P>(
    routes: Vec<TrainRoute>,
    network: &RailNetworkIndex,
    policy: &P,
    config: &PipelineConfig,
) -> PipelineOutput
where
    P: RoutePolicy<TrainRoute>,
{
    let mut selection = SelectionStats::default();
    let selected = select_routes(
        routes,
        policy,
        config.min_score,
        config.max_routes,
        &mut selection,
    );
    selection.thinned_routes = selected
        .iter()
        .filter(|s| s.route.coordinates.len() > config.max_route_points)
        .count();
    log::info!(
        "  Selected {} of {} routes ({} below score {}, {} over limit)",
        selection.selected,
        selection.candidates,
        selection.below_min_score,
        config.min_score,
        selection.over_limit
    );

    let aligner = RouteAligner::new(network, config.alignment);
    let scheduler = CoverageScheduler::new(config.coverage);

    let (processed, mut schedules): (Vec<ProcessedRoute>, Vec<RouteSchedule>) = selected
        .into_par_iter()
        .map(|scored| {
            process_route(
                scored,
                &aligner,
                &scheduler,
                network,
                policy,
                config.max_route_points,
            )
        })
        .unzip();

    let alignment: AlignmentStats = processed.iter().map(|p| p.aligned.stats).sum();
    let outside_bounds: usize = processed.iter().map(|p| p.outside_bounds).sum();

    let baseline: CoverageHistogram = schedules
        .par_iter()
        .map(|s| CoverageHistogram::compute(&s.instances))
        .sum();

    let priorities: HashMap<TrainIdentifier, f64> = processed
        .iter()
        .map(|p| (p.route.train.clone(), p.score))
        .collect();
    let coverage = scheduler.close_gaps(&mut schedules, baseline, &priorities);

    PipelineOutput {
        routes: processed,
        schedules,
        alignment,
        outside_bounds,
        selection,
        coverage,
    }
}
