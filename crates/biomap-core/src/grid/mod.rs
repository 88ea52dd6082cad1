//! Uniform lon/lat grid over a buffered bounding box.
//!
//! Pipeline:
//!   bounds → buffer by one cell → clamp cell size → candidate cells (row-major)
//!   → [`populate`] assigns each site to its first containing cell.
//!
//! Cell `(x, y)` spans `[edge_lon(x), edge_lon(x + 1)]` × `[edge_lat(y), edge_lat(y + 1)]`,
//! boundary-inclusive, with `edge(i) = origin + i·size`. Neighbours share the
//! same float on their common edge, so the cells tile the grid without gaps,
//! and the hashed and scanning populators agree on edge sites.

pub mod populate;

use std::fmt;

use serde::{Serialize, Serializer};

use crate::bounds::Bounds;
use crate::error::{Error, Result};

pub use populate::{populate, Population};

/// Floor for the effective cell edge, in degrees.
pub const MIN_CELL_SIZE: f64 = 1e-9;

/// A closed polygon ring of `[lon, lat]` pairs.
pub type Ring = Vec<[f64; 2]>;

// ── Keys and rectangles ───────────────────────────────────────────────────────

/// Grid cell address. Orders row-major: x first, then y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellKey {
    pub x: usize,
    pub y: usize,
}

impl CellKey {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.x, self.y)
    }
}

impl Serialize for CellKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellRect {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl CellRect {
    /// Boundary-inclusive point-in-rectangle test.
    #[inline]
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.min_lon <= lon && lon <= self.max_lon && self.min_lat <= lat && lat <= self.max_lat
    }

    /// Closed counter-clockwise ring starting at the south-west corner.
    pub fn ring(&self) -> Ring {
        vec![
            [self.min_lon, self.min_lat],
            [self.max_lon, self.min_lat],
            [self.max_lon, self.max_lat],
            [self.min_lon, self.max_lat],
            [self.min_lon, self.min_lat],
        ]
    }
}

// ── Grid ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    origin_lon: f64,
    origin_lat: f64,
    cell_size: f64,
    x_count: usize,
    y_count: usize,
}

impl Grid {
    /// Lay a grid of `detail_level`-degree cells over `bounds`.
    ///
    /// The bounds are buffered by one `detail_level` on every side, the
    /// effective edge is clamped to the buffered extent (never below
    /// [`MIN_CELL_SIZE`]), and both cell counts are at least 1.
    pub fn partition(bounds: &Bounds, detail_level: f64) -> Result<Self> {
        if !detail_level.is_finite() || detail_level <= 0.0 {
            return Err(Error::InvalidDetailLevel(detail_level));
        }

        let buffered = bounds.expand(detail_level);
        let width = buffered.width();
        let height = buffered.height();

        let cell_size = detail_level.min(width).min(height).max(MIN_CELL_SIZE);

        let x_count = axis_count(buffered.min_lon, bounds.max_lon, width, cell_size);
        let y_count = axis_count(buffered.min_lat, bounds.max_lat, height, cell_size);

        Ok(Self {
            origin_lon: buffered.min_lon,
            origin_lat: buffered.min_lat,
            cell_size,
            x_count,
            y_count,
        })
    }

    /// Effective cell edge in degrees.
    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn x_count(&self) -> usize {
        self.x_count
    }

    pub fn y_count(&self) -> usize {
        self.y_count
    }

    /// Number of candidate cells, saturating.
    pub fn candidate_count(&self) -> usize {
        self.x_count.saturating_mul(self.y_count)
    }

    pub fn cell_rect(&self, key: CellKey) -> CellRect {
        CellRect {
            min_lon: edge(self.origin_lon, self.cell_size, key.x),
            min_lat: edge(self.origin_lat, self.cell_size, key.y),
            max_lon: edge(self.origin_lon, self.cell_size, key.x + 1),
            max_lat: edge(self.origin_lat, self.cell_size, key.y + 1),
        }
    }

    /// Every candidate cell, x outer and y inner.
    pub fn cells(&self) -> impl Iterator<Item = (CellKey, CellRect)> + '_ {
        (0..self.x_count).flat_map(move |x| {
            (0..self.y_count).map(move |y| {
                let key = CellKey::new(x, y);
                (key, self.cell_rect(key))
            })
        })
    }

    /// First cell in row-major order whose rectangle contains `(lon, lat)`.
    pub fn locate(&self, lon: f64, lat: f64) -> Option<CellKey> {
        let x = axis_index(lon, self.origin_lon, self.cell_size, self.x_count)?;
        let y = axis_index(lat, self.origin_lat, self.cell_size, self.y_count)?;
        Some(CellKey::new(x, y))
    }
}

/// Lower edge of cell `i` along one axis. Monotone in `i`.
#[inline]
fn edge(origin: f64, size: f64, i: usize) -> f64 {
    origin + i as f64 * size
}

/// `floor(span / size)` cells, at least 1, plus however many the rounded edges
/// need to reach `data_max`.
fn axis_count(origin: f64, data_max: f64, span: f64, size: f64) -> usize {
    // `as usize` saturates, so an absurd extent cannot wrap.
    let mut count = ((span / size).floor() as usize).max(1);
    while count < usize::MAX && edge(origin, size, count) < data_max {
        count += 1;
    }
    count
}

/// Lowest index `i < count` with `edge(i) <= v <= edge(i + 1)`.
///
/// Starts from the hashed guess and walks to the exact answer, which only
/// moves when `v` sits on a shared edge or the division rounded.
fn axis_index(v: f64, origin: f64, size: f64, count: usize) -> Option<usize> {
    let guess = ((v - origin) / size).floor();
    if guess.is_nan() || count == 0 {
        return None;
    }
    let last = count - 1;
    let contains = |i: usize| edge(origin, size, i) <= v && v <= edge(origin, size, i + 1);

    let mut i = if guess <= 0.0 { 0 } else { (guess as usize).min(last) };
    while i > 0 && (edge(origin, size, i) > v || contains(i - 1)) {
        i -= 1;
    }
    while !contains(i) {
        if i < last && edge(origin, size, i + 1) < v {
            i += 1;
        } else {
            return None;
        }
    }
    Some(i)
}
