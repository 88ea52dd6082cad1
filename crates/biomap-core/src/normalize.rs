//! Cross-cell maxima and [0, 1] weighted metrics for the choropleth layers.

use serde::{Deserialize, Serialize};

use crate::aggregate::CellStats;

/// Maxima over all populated cells of one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedMetrics {
    pub max_std_abundance: f64,
    pub max_std_richness: f64,
    pub max_site_count: usize,
}

impl NormalizedMetrics {
    /// Single pass over `cells`. All maxima are 0 for an empty slice.
    pub fn from_cells(cells: &[CellStats]) -> Self {
        let mut max_std_abundance = f64::NEG_INFINITY;
        let mut max_std_richness = f64::NEG_INFINITY;
        let mut max_site_count = 0;
        for cell in cells {
            max_std_abundance = max_std_abundance.max(cell.std_abundance());
            max_std_richness = max_std_richness.max(cell.std_richness());
            max_site_count = max_site_count.max(cell.site_count());
        }
        Self {
            max_std_abundance: finite_or_zero(max_std_abundance),
            max_std_richness: finite_or_zero(max_std_richness),
            max_site_count,
        }
    }

    pub fn weighted_abundance(&self, cell: &CellStats) -> f64 {
        weight(cell.std_abundance(), self.max_std_abundance)
    }

    pub fn weighted_richness(&self, cell: &CellStats) -> f64 {
        weight(cell.std_richness(), self.max_std_richness)
    }

    pub fn weighted_sites(&self, cell: &CellStats) -> f64 {
        weight(cell.site_count() as f64, self.max_site_count as f64)
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

/// `value / max` clamped to [0, 1]; 0 when `max` is not strictly positive.
pub fn weight(value: f64, max: f64) -> f64 {
    if max > 0.0 && value.is_finite() {
        (value / max).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Legend scaling values handed to the rendering layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Maxes {
    pub abundance: f64,
    pub richness: f64,
    pub sites: usize,
}

impl From<NormalizedMetrics> for Maxes {
    fn from(m: NormalizedMetrics) -> Self {
        Self {
            abundance: m.max_std_abundance,
            richness: m.max_std_richness,
            sites: m.max_site_count,
        }
    }
}
