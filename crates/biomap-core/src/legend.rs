//! Quantized color-ramp buckets, legend stops and popup text for the
//! choropleth layers.

use serde::{Deserialize, Serialize};

use crate::features::FeatureProperties;
use crate::normalize::Maxes;

/// Lower edge of each color-ramp bucket, in weighted-metric units.
pub const RAMP_THRESHOLDS: [f64; 9] = [0.0, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9];

/// The weighted metric a choropleth layer is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Abundance,
    Richness,
    Sites,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Abundance, Metric::Richness, Metric::Sites];

    pub fn weighted(self, props: &FeatureProperties) -> f64 {
        match self {
            Metric::Abundance => props.weighted_abundance,
            Metric::Richness => props.weighted_richness,
            Metric::Sites => props.weighted_sites,
        }
    }

    pub fn max(self, maxes: &Maxes) -> f64 {
        match self {
            Metric::Abundance => maxes.abundance,
            Metric::Richness => maxes.richness,
            Metric::Sites => maxes.sites as f64,
        }
    }
}

/// Index of the greatest threshold not above `weighted`.
pub fn ramp_bucket(weighted: f64) -> usize {
    if weighted.is_nan() {
        return 0;
    }
    RAMP_THRESHOLDS
        .iter()
        .rposition(|&t| weighted >= t)
        .unwrap_or(0)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegendStop {
    pub threshold: f64,
    /// Threshold expressed in the metric's own units.
    pub value: f64,
}

/// Legend entries for one layer, scaled by that layer's maximum.
pub fn legend_stops(max: f64) -> Vec<LegendStop> {
    RAMP_THRESHOLDS
        .iter()
        .map(|&threshold| LegendStop { threshold, value: threshold * max })
        .collect()
}

/// Multi-line popup summary of one cell.
pub fn popup_text(props: &FeatureProperties) -> String {
    let n = props.sites.len();
    format!(
        "Cell {id}\n\
         Sites: {n}\n\
         Abundance: {abundance} ({std_abundance:.1} per site)\n\
         Richness: {richness} ({std_richness:.1} per site)",
        id = props.id,
        abundance = props.abundance,
        std_abundance = props.std_cell_abundance,
        richness = props.richness,
        std_richness = props.std_cell_richness,
    )
}
