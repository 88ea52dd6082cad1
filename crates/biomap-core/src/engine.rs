//! Pipeline orchestrator: runs every aggregation stage in order.
//!
//! Two entry points match the two recompute triggers: a new result set runs
//! the whole pipeline, a grid-size change reruns only the grid stages against
//! the cached site points.

use serde::Serialize;
use tracing::debug;

use crate::aggregate::aggregate_cells;
use crate::bounds::Bounds;
use crate::config::GridConfig;
use crate::error::Result;
use crate::features::{build_feature_collection, FeatureCollection};
use crate::grid::{populate, Grid};
use crate::heatmap::{group_sample_points, SamplePoint};
use crate::normalize::{Maxes, NormalizedMetrics};
use crate::records::{collect_sites, dedup_points_with_stats, PointStats, RawRow, SitePoint};

// ── Public structs ────────────────────────────────────────────────────────────

/// Diagnostics for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PassStats {
    pub points: PointStats,
    pub sites: usize,
    pub candidate_cells: usize,
    pub active_cells: usize,
    /// Cell edge actually used, in degrees. 0 when there was nothing to grid.
    pub cell_size: f64,
}

/// Everything the rendering layer needs from one pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    pub sample_points: Vec<SamplePoint>,
    pub feature_collection: FeatureCollection,
    pub maxes: Maxes,
    pub stats: PassStats,
}

// ── Single pass ───────────────────────────────────────────────────────────────

/// One complete pass over already-parsed points: heatmap layer plus the
/// grid, populate, aggregate and normalize stages for one cell size.
pub fn aggregate(points: &[SitePoint], config: &GridConfig) -> Result<AggregationResult> {
    let point_stats = PointStats { rows: points.len(), kept: points.len(), ..PointStats::default() };
    grid_pass(points, config, group_sample_points(points), point_stats)
}

/// The grid stages. The point-level outputs are passed in so a cached result
/// set does not regroup its sample points on every grid-size change.
fn grid_pass(
    points: &[SitePoint],
    config: &GridConfig,
    sample_points: Vec<SamplePoint>,
    point_stats: PointStats,
) -> Result<AggregationResult> {
    config.validate()?;

    let sites = collect_sites(points);

    // Empty input short-circuits before bounds.
    let Some(bounds) = Bounds::from_sites(&sites) else {
        debug!("no site points; empty aggregation");
        return Ok(AggregationResult {
            sample_points,
            stats: PassStats { points: point_stats, ..PassStats::default() },
            ..AggregationResult::default()
        });
    };

    // ── 1. Partition ────────────────────────────────────────────────────────
    let grid = Grid::partition(&bounds, config.detail_level)?;

    // ── 2. Populate ─────────────────────────────────────────────────────────
    let population = populate(&grid, &sites, config.strategy);

    // ── 3. Aggregate ────────────────────────────────────────────────────────
    let cells = aggregate_cells(&grid, &population, &sites);

    // ── 4. Normalize + build features ───────────────────────────────────────
    let metrics = NormalizedMetrics::from_cells(&cells);
    let feature_collection = build_feature_collection(&cells, &metrics);

    let stats = PassStats {
        points: point_stats,
        sites: sites.len(),
        candidate_cells: grid.candidate_count(),
        active_cells: cells.len(),
        cell_size: grid.cell_size(),
    };
    debug!(
        detail_level = config.detail_level,
        cell_size = stats.cell_size,
        sites = stats.sites,
        active_cells = stats.active_cells,
        "aggregation pass complete"
    );

    Ok(AggregationResult {
        sample_points,
        feature_collection,
        maxes: metrics.into(),
        stats,
    })
}

// ── Orchestrator ──────────────────────────────────────────────────────────────

/// Holds the parsed site points of the current result set between passes.
#[derive(Debug, Clone, Default)]
pub struct SampleAggregator {
    config: GridConfig,
    points: Vec<SitePoint>,
    point_stats: PointStats,
    sample_points: Vec<SamplePoint>,
}

impl SampleAggregator {
    pub fn new(config: GridConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, ..Self::default() })
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn points(&self) -> &[SitePoint] {
        &self.points
    }

    /// New result set: parse rows, cache the points, run the full pipeline.
    ///
    /// On error the previous cache is kept.
    pub fn load_rows(&mut self, rows: &[RawRow]) -> Result<AggregationResult> {
        let (points, point_stats) = dedup_points_with_stats(rows)?;
        self.sample_points = group_sample_points(&points);
        self.points = points;
        self.point_stats = point_stats;
        self.recompute()
    }

    /// Same as [`Self::load_rows`] for already-parsed points.
    pub fn load_points(&mut self, points: Vec<SitePoint>) -> Result<AggregationResult> {
        self.point_stats = PointStats { rows: points.len(), kept: points.len(), ..PointStats::default() };
        self.sample_points = group_sample_points(&points);
        self.points = points;
        self.recompute()
    }

    /// Grid-size change: rerun the grid stages on the cached points.
    pub fn set_detail_level(&mut self, detail_level: f64) -> Result<AggregationResult> {
        let config = GridConfig { detail_level, ..self.config };
        config.validate()?;
        self.config = config;
        self.recompute()
    }

    pub fn recompute(&self) -> Result<AggregationResult> {
        grid_pass(&self.points, &self.config, self.sample_points.clone(), self.point_stats)
    }
}

// ── Unit tests ────────────────────────────────────────────────────────────────
