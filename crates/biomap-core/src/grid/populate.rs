//! Site → cell assignment (hard partition).
//!
//! Each site goes to the first candidate cell, in row-major order, whose
//! rectangle contains it. Only cells that receive at least one site are kept.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use super::{CellKey, Grid};
use crate::config::PopulateStrategy;
use crate::records::Site;

/// Populated cells in row-major order, each holding indices into the site slice
/// in ascending order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Population {
    pub cells: BTreeMap<CellKey, Vec<usize>>,
    /// Sites no candidate cell contained. Empty for any site inside the bounds
    /// the grid was built from.
    pub unplaced: Vec<usize>,
}

impl Population {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

pub fn populate(grid: &Grid, sites: &[Site], strategy: PopulateStrategy) -> Population {
    let population = match strategy {
        PopulateStrategy::Hashed => populate_hashed(grid, sites),
        PopulateStrategy::Scan => populate_scan(grid, sites),
    };
    if !population.unplaced.is_empty() {
        warn!(count = population.unplaced.len(), "sites fell outside every candidate cell");
    }
    debug!(
        ?strategy,
        sites = sites.len(),
        active_cells = population.len(),
        candidates = grid.candidate_count(),
        "populated grid"
    );
    population
}

/// O(sites): hash each site straight to its cell.
fn populate_hashed(grid: &Grid, sites: &[Site]) -> Population {
    let mut population = Population::default();
    for (i, site) in sites.iter().enumerate() {
        match grid.locate(site.longitude, site.latitude) {
            Some(key) => population.cells.entry(key).or_default().push(i),
            None => population.unplaced.push(i),
        }
    }
    population
}

/// O(cells × sites): test every candidate against the sites still unassigned.
fn populate_scan(grid: &Grid, sites: &[Site]) -> Population {
    let mut unassigned: BTreeSet<usize> = (0..sites.len()).collect();
    let mut population = Population::default();

    for (key, rect) in grid.cells() {
        if unassigned.is_empty() {
            break;
        }
        let members: Vec<usize> = unassigned
            .iter()
            .copied()
            .filter(|&i| rect.contains(sites[i].longitude, sites[i].latitude))
            .collect();
        if members.is_empty() {
            continue;
        }
        for i in &members {
            unassigned.remove(i);
        }
        population.cells.insert(key, members);
    }

    population.unplaced = unassigned.into_iter().collect();
    population
}
