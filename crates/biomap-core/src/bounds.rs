use serde::{Deserialize, Serialize};

use crate::records::{Site, SitePoint};

/// Axis-aligned lon/lat bounding box.
/// Serializes as `[[minLon, minLat], [maxLon, maxLat]]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[[f64; 2]; 2]", from = "[[f64; 2]; 2]")]
pub struct Bounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl From<Bounds> for [[f64; 2]; 2] {
    fn from(b: Bounds) -> Self {
        [[b.min_lon, b.min_lat], [b.max_lon, b.max_lat]]
    }
}

impl From<[[f64; 2]; 2]> for Bounds {
    fn from([[min_lon, min_lat], [max_lon, max_lat]]: [[f64; 2]; 2]) -> Self {
        Self { min_lon, min_lat, max_lon, max_lat }
    }
}

impl Bounds {
    /// Bounding box of `(lon, lat)` pairs. `None` for an empty iterator.
    pub fn from_lon_lat(coords: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut it = coords.into_iter();
        let (lon, lat) = it.next()?;
        let mut b = Self { min_lon: lon, min_lat: lat, max_lon: lon, max_lat: lat };
        for (lon, lat) in it {
            b.min_lon = b.min_lon.min(lon);
            b.min_lat = b.min_lat.min(lat);
            b.max_lon = b.max_lon.max(lon);
            b.max_lat = b.max_lat.max(lat);
        }
        Some(b)
    }

    pub fn from_points(points: &[SitePoint]) -> Option<Self> {
        Self::from_lon_lat(points.iter().map(|p| (p.longitude, p.latitude)))
    }

    pub fn from_sites(sites: &[Site]) -> Option<Self> {
        Self::from_lon_lat(sites.iter().map(|s| (s.longitude, s.latitude)))
    }

    /// Grow the box by `by` degrees on every side.
    pub fn expand(&self, by: f64) -> Self {
        Self {
            min_lon: self.min_lon - by,
            min_lat: self.min_lat - by,
            max_lon: self.max_lon + by,
            max_lat: self.max_lat + by,
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_has_no_bounds() {
        assert!(Bounds::from_points(&[]).is_none());
    }

    #[test]
    fn bounds_cover_all_points() {
        let points = vec![
            SitePoint::new(-33.0, 151.0, "S1", 0, 0),
            SitePoint::new(-34.0, 152.0, "S2", 0, 0),
            SitePoint::new(-33.5, 150.5, "S3", 0, 0),
        ];
        let b = Bounds::from_points(&points).unwrap();
        assert_eq!(b, Bounds { min_lon: 150.5, min_lat: -34.0, max_lon: 152.0, max_lat: -33.0 });
        assert_eq!(serde_json::to_string(&b).unwrap(), "[[150.5,-34.0],[152.0,-33.0]]");
    }

    #[test]
    fn single_point_is_degenerate_but_finite() {
        let b = Bounds::from_points(&[SitePoint::new(10.0, 20.0, "S", 0, 0)]).unwrap();
        assert_eq!(b.width(), 0.0);
        assert_eq!(b.height(), 0.0);
        let e = b.expand(0.5);
        assert_eq!(e.width(), 1.0);
        assert_eq!((e.min_lon, e.min_lat), (19.5, 9.5));
    }
}
