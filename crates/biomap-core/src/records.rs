//! Raw backend rows → per-record site points → distinct sites.
//!
//! The backend emits `[latitude, longitude, siteId, richness, abundance]`
//! tuples whose elements may be JSON numbers or strings. Rows without a
//! parseable abundance ("no abundance for this OTU") are skipped, never merged.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

// ── Raw input ─────────────────────────────────────────────────────────────────

/// One element of a raw row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Null,
}

impl RawValue {
    /// Finite float, or `None`.
    fn as_float(&self) -> Option<f64> {
        let v = match self {
            RawValue::Number(n) => *n,
            RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
            RawValue::Null => return None,
        };
        v.is_finite().then_some(v)
    }

    /// Leading-integer parse: `"12abc"` → 12, `"7.9"` → 7, `"abc"` → None.
    fn as_int(&self) -> Option<i64> {
        match self {
            RawValue::Number(n) if n.is_finite() => Some(n.trunc() as i64),
            RawValue::Number(_) | RawValue::Null => None,
            RawValue::Text(s) => parse_leading_int(s),
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Integral ids print without a fractional part.
            RawValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            RawValue::Number(n) => write!(f, "{n}"),
            RawValue::Text(s) => f.write_str(s),
            RawValue::Null => f.write_str("null"),
        }
    }
}

fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // Saturate on overflow rather than reject: the value is still a count.
    let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

/// `[latitude, longitude, siteId, richness, abundance]` as delivered by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow(
    pub RawValue,
    pub RawValue,
    pub RawValue,
    pub RawValue,
    pub RawValue,
);

impl RawRow {
    /// Convenience constructor with string-typed counts, as the backend sends them.
    pub fn new(lat: f64, lon: f64, site_id: &str, richness: &str, abundance: &str) -> Self {
        Self(
            RawValue::Number(lat),
            RawValue::Number(lon),
            RawValue::Text(site_id.to_string()),
            RawValue::Text(richness.to_string()),
            RawValue::Text(abundance.to_string()),
        )
    }
}

// ── Parsed records ────────────────────────────────────────────────────────────

/// A parsed row. `None` counts stand for values the backend could not supply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleOtuRecord {
    pub latitude: f64,
    pub longitude: f64,
    pub site_id: String,
    pub richness: Option<i64>,
    pub abundance: Option<i64>,
}

impl SampleOtuRecord {
    /// Parse a raw row. `index` is only used for error reporting.
    pub fn from_raw(index: usize, row: &RawRow) -> Result<Self> {
        let latitude = row.0.as_float().ok_or_else(|| Error::MalformedRow {
            index,
            reason: format!("latitude {:?} is not a finite number", row.0),
        })?;
        let longitude = row.1.as_float().ok_or_else(|| Error::MalformedRow {
            index,
            reason: format!("longitude {:?} is not a finite number", row.1),
        })?;
        Ok(Self {
            latitude,
            longitude,
            site_id: row.2.to_string(),
            richness: row.3.as_int(),
            abundance: row.4.as_int(),
        })
    }

    /// `None` when either count is missing.
    pub fn to_site_point(&self) -> Option<SitePoint> {
        Some(SitePoint {
            latitude: self.latitude,
            longitude: self.longitude,
            site_id: self.site_id.clone(),
            richness: self.richness?,
            abundance: self.abundance?,
        })
    }
}

/// One surviving input row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SitePoint {
    pub latitude: f64,
    pub longitude: f64,
    pub site_id: String,
    pub richness: i64,
    pub abundance: i64,
}

impl SitePoint {
    pub fn new(latitude: f64, longitude: f64, site_id: &str, richness: i64, abundance: i64) -> Self {
        Self {
            latitude,
            longitude,
            site_id: site_id.to_string(),
            richness,
            abundance,
        }
    }
}

/// Row accounting for one deduplication pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointStats {
    pub rows: usize,
    pub kept: usize,
    pub missing_abundance: usize,
    pub missing_richness: usize,
}

/// Parse rows into site points, dropping rows without a usable abundance or richness.
pub fn dedup_points(rows: &[RawRow]) -> Result<Vec<SitePoint>> {
    dedup_points_with_stats(rows).map(|(points, _)| points)
}

pub fn dedup_points_with_stats(rows: &[RawRow]) -> Result<(Vec<SitePoint>, PointStats)> {
    let mut stats = PointStats { rows: rows.len(), ..PointStats::default() };
    let mut points = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let record = SampleOtuRecord::from_raw(i, row)?;
        if record.abundance.is_none() {
            stats.missing_abundance += 1;
            continue;
        }
        match record.to_site_point() {
            Some(p) => points.push(p),
            None => {
                debug!(row = i, site = %record.site_id, "dropping row with unparseable richness");
                stats.missing_richness += 1;
            }
        }
    }

    stats.kept = points.len();
    debug!(
        rows = stats.rows,
        kept = stats.kept,
        missing_abundance = stats.missing_abundance,
        missing_richness = stats.missing_richness,
        "parsed site points"
    );
    Ok((points, stats))
}

// ── Sites ─────────────────────────────────────────────────────────────────────

/// A distinct `siteId`: the unit the grid partitions.
///
/// Located at the coordinates of its first point; counts are summed over all of
/// its points. Replicates therefore add up: a cell's per-site metrics divide
/// these totals by the number of distinct sites, not by the number of points.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub site_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub richness: i64,
    pub abundance: i64,
    pub points: usize,
}

/// Collapse points into sites, in first-occurrence order.
pub fn collect_sites(points: &[SitePoint]) -> Vec<Site> {
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(points.len());
    let mut sites: Vec<Site> = Vec::new();

    for p in points {
        match index.get(p.site_id.as_str()) {
            Some(&i) => {
                let site = &mut sites[i];
                if site.latitude != p.latitude || site.longitude != p.longitude {
                    warn!(
                        site = %p.site_id,
                        "site reported at ({}, {}) and ({}, {}); keeping the first location",
                        site.latitude, site.longitude, p.latitude, p.longitude
                    );
                }
                site.richness = site.richness.saturating_add(p.richness);
                site.abundance = site.abundance.saturating_add(p.abundance);
                site.points += 1;
            }
            None => {
                index.insert(p.site_id.as_str(), sites.len());
                sites.push(Site {
                    site_id: p.site_id.clone(),
                    latitude: p.latitude,
                    longitude: p.longitude,
                    richness: p.richness,
                    abundance: p.abundance,
                    points: 1,
                });
            }
        }
    }
    sites
}
