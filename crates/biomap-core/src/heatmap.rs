//! Point-heatmap overlay: one weighted point per distinct coordinate pair.
//! Independent of the grid-cell path.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::records::SitePoint;

/// `[lat, lon, meanAbundance]` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f64; 3]", from = "[f64; 3]")]
pub struct SamplePoint {
    pub lat: f64,
    pub lon: f64,
    pub mean_abundance: f64,
}

impl From<SamplePoint> for [f64; 3] {
    fn from(p: SamplePoint) -> Self {
        [p.lat, p.lon, p.mean_abundance]
    }
}

impl From<[f64; 3]> for SamplePoint {
    fn from([lat, lon, mean_abundance]: [f64; 3]) -> Self {
        Self { lat, lon, mean_abundance }
    }
}

/// Exact coordinate key. Adding `0.0` folds `-0.0` into `0.0`.
fn coord_key(lat: f64, lon: f64) -> (u64, u64) {
    ((lat + 0.0).to_bits(), (lon + 0.0).to_bits())
}

/// Group points by exact `(lat, lon)` and average their abundance.
///
/// Output is in first-occurrence order of each coordinate pair.
pub fn group_sample_points(points: &[SitePoint]) -> Vec<SamplePoint> {
    let mut index: HashMap<(u64, u64), usize> = HashMap::new();
    // (lat, lon, abundance sum, count)
    let mut groups: Vec<(f64, f64, f64, usize)> = Vec::new();

    for p in points {
        let key = coord_key(p.latitude, p.longitude);
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((p.latitude, p.longitude, 0.0, 0));
            groups.len() - 1
        });
        let g = &mut groups[slot];
        g.2 += p.abundance as f64;
        g.3 += 1;
    }

    groups
        .into_iter()
        .map(|(lat, lon, sum, n)| SamplePoint {
            lat,
            lon,
            mean_abundance: sum / n as f64,
        })
        .collect()
}
