//! Per-cell sums and per-site standardized metrics.

use serde::Serialize;

use crate::grid::{CellKey, Grid, Population, Ring};
use crate::records::Site;

/// Summed measurements of one populated cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellStats {
    pub key: CellKey,
    pub coordinates: Ring,
    /// Member site ids in site order; never empty.
    pub sites: Vec<String>,
    pub abundance: i64,
    pub richness: i64,
}

impl CellStats {
    pub fn site_count(&self) -> usize {
        self.sites.len()
    }

    /// Abundance per member site.
    pub fn std_abundance(&self) -> f64 {
        per_site(self.abundance, self.sites.len())
    }

    /// Richness per member site.
    pub fn std_richness(&self) -> f64 {
        per_site(self.richness, self.sites.len())
    }
}

fn per_site(total: i64, sites: usize) -> f64 {
    if sites == 0 {
        0.0
    } else {
        total as f64 / sites as f64
    }
}

/// Sum abundance and richness of every populated cell, in row-major order.
pub fn aggregate_cells(grid: &Grid, population: &Population, sites: &[Site]) -> Vec<CellStats> {
    population
        .cells
        .iter()
        .map(|(&key, members)| {
            let mut cell = CellStats {
                key,
                coordinates: grid.cell_rect(key).ring(),
                sites: Vec::with_capacity(members.len()),
                abundance: 0,
                richness: 0,
            };
            for &i in members {
                let site = &sites[i];
                cell.abundance = cell.abundance.saturating_add(site.abundance);
                cell.richness = cell.richness.saturating_add(site.richness);
                cell.sites.push(site.site_id.clone());
            }
            cell
        })
        .collect()
}
