//! GeoJSON output consumed by the choropleth layers and popup formatter.
//!
//! Property names and meanings are a contract with the renderer's color ramp;
//! keep them stable.

use serde::{Deserialize, Serialize};

use crate::aggregate::CellStats;
use crate::grid::Ring;
use crate::normalize::NormalizedMetrics;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    /// Cell key, `"x_y"`.
    pub id: String,
    pub geometry: Polygon,
    pub properties: FeatureProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Polygon")]
pub struct Polygon {
    pub coordinates: Vec<Ring>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureProperties {
    pub id: String,
    pub weighted_abundance: f64,
    pub weighted_richness: f64,
    pub weighted_sites: f64,
    pub std_cell_richness: f64,
    pub std_cell_abundance: f64,
    /// Cross-cell maximum of `stdCellRichness`.
    pub max_richness: f64,
    /// Cross-cell maximum of `stdCellAbundance`.
    pub max_abundance: f64,
    pub max_sites: usize,
    pub richness: i64,
    pub abundance: i64,
    pub sites: Vec<String>,
    pub coordinates: Ring,
}

/// One feature per populated cell, in cell order.
pub fn build_feature_collection(cells: &[CellStats], metrics: &NormalizedMetrics) -> FeatureCollection {
    let features = cells
        .iter()
        .map(|cell| {
            let id = cell.key.to_string();
            Feature {
                id: id.clone(),
                geometry: Polygon { coordinates: vec![cell.coordinates.clone()] },
                properties: FeatureProperties {
                    id,
                    weighted_abundance: metrics.weighted_abundance(cell),
                    weighted_richness: metrics.weighted_richness(cell),
                    weighted_sites: metrics.weighted_sites(cell),
                    std_cell_richness: cell.std_richness(),
                    std_cell_abundance: cell.std_abundance(),
                    max_richness: metrics.max_std_richness,
                    max_abundance: metrics.max_std_abundance,
                    max_sites: metrics.max_site_count,
                    richness: cell.richness,
                    abundance: cell.abundance,
                    sites: cell.sites.clone(),
                    coordinates: cell.coordinates.clone(),
                },
            }
        })
        .collect();
    FeatureCollection { features }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{CellKey, CellRect};

    fn sample_cell() -> CellStats {
        let rect = CellRect { min_lon: 0.0, min_lat: 0.0, max_lon: 1.0, max_lat: 1.0 };
        CellStats {
            key: CellKey::new(4, 7),
            coordinates: rect.ring(),
            sites: vec!["S1".into(), "S2".into()],
            abundance: 300,
            richness: 30,
        }
    }

    #[test]
    fn geojson_shape_and_property_names() {
        let cells = vec![sample_cell()];
        let metrics = NormalizedMetrics::from_cells(&cells);
        let fc = build_feature_collection(&cells, &metrics);
        let json = serde_json::to_value(&fc).unwrap();

        assert_eq!(json["type"], "FeatureCollection");
        let feature = &json["features"][0];
        assert_eq!(feature["type"], "Feature");
        assert_eq!(feature["id"], "4_7");
        assert_eq!(feature["geometry"]["type"], "Polygon");
        assert_eq!(feature["geometry"]["coordinates"][0][2], serde_json::json!([1.0, 1.0]));

        let props = feature["properties"].as_object().unwrap();
        for name in [
            "id",
            "weightedAbundance",
            "weightedRichness",
            "weightedSites",
            "stdCellRichness",
            "stdCellAbundance",
            "maxRichness",
            "maxAbundance",
            "maxSites",
            "richness",
            "abundance",
            "sites",
            "coordinates",
        ] {
            assert!(props.contains_key(name), "missing property {name}");
        }
        assert_eq!(props.len(), 13);
        assert_eq!(props["stdCellAbundance"], 150.0);
        assert_eq!(props["weightedSites"], 1.0);
        assert_eq!(props["sites"], serde_json::json!(["S1", "S2"]));
    }

    #[test]
    fn round_trips_through_json() {
        let cells = vec![sample_cell()];
        let fc = build_feature_collection(&cells, &NormalizedMetrics::from_cells(&cells));
        let text = serde_json::to_string(&fc).unwrap();
        let back: FeatureCollection = serde_json::from_str(&text).unwrap();
        assert_eq!(back, fc);
    }

    #[test]
    fn empty_cells_empty_collection() {
        let fc = build_feature_collection(&[], &NormalizedMetrics::default());
        assert!(fc.is_empty());
        assert_eq!(
            serde_json::to_string(&fc).unwrap(),
            r#"{"type":"FeatureCollection","features":[]}"#
        );
    }
}
