use biomap_core::legend::{self, Metric};
use biomap_core::{FeatureProperties, GridConfig, Maxes, RawRow, SampleAggregator};
use serde::Serialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization failed: {e}")))
}

fn core_err(e: biomap_core::Error) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// One-shot aggregation of a JSON array of `[lat, lon, siteId, richness, abundance]` rows.
#[wasm_bindgen]
pub fn aggregate(rows_json: &str, detail_level: f64) -> Result<JsValue, JsValue> {
    let rows: Vec<RawRow> = serde_json::from_str(rows_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid rows: {e}")))?;
    let mut engine = SampleAggregator::new(GridConfig::new(detail_level)).map_err(core_err)?;
    let result = engine.load_rows(&rows).map_err(core_err)?;
    to_js(&result)
}

/// Popup text for one feature's `properties` object, as JSON.
#[wasm_bindgen(js_name = popupText)]
pub fn popup_text(props_json: &str) -> Result<String, JsValue> {
    let props: FeatureProperties = serde_json::from_str(props_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid feature properties: {e}")))?;
    Ok(legend::popup_text(&props))
}

/// Legend stops for one layer (`"abundance"`, `"richness"` or `"sites"`),
/// scaled by that layer's entry in a result's `maxes`.
#[wasm_bindgen(js_name = legendStops)]
pub fn legend_stops(metric: JsValue, maxes: JsValue) -> Result<JsValue, JsValue> {
    let metric: Metric = serde_wasm_bindgen::from_value(metric)
        .map_err(|e| JsValue::from_str(&format!("Invalid metric: {e}")))?;
    let maxes: Maxes = serde_wasm_bindgen::from_value(maxes)
        .map_err(|e| JsValue::from_str(&format!("Invalid maxes: {e}")))?;
    to_js(&legend::legend_stops(metric.max(&maxes)))
}

/// Color-ramp bucket of one feature's `properties` for the given layer.
#[wasm_bindgen(js_name = rampBucket)]
pub fn ramp_bucket(metric: JsValue, props: JsValue) -> Result<usize, JsValue> {
    let metric: Metric = serde_wasm_bindgen::from_value(metric)
        .map_err(|e| JsValue::from_str(&format!("Invalid metric: {e}")))?;
    let props: FeatureProperties = serde_wasm_bindgen::from_value(props)
        .map_err(|e| JsValue::from_str(&format!("Invalid feature properties: {e}")))?;
    Ok(legend::ramp_bucket(metric.weighted(&props)))
}

/// Stateful aggregator: keeps the current result set so slider moves only
/// rerun the grid stages.
#[wasm_bindgen]
pub struct Aggregator {
    inner: SampleAggregator,
}

#[wasm_bindgen]
impl Aggregator {
    #[wasm_bindgen(constructor)]
    pub fn new(detail_level: f64) -> Result<Aggregator, JsValue> {
        let inner = SampleAggregator::new(GridConfig::new(detail_level)).map_err(core_err)?;
        Ok(Self { inner })
    }

    /// Load a new result set (array of row arrays) and aggregate it.
    pub fn load(&mut self, rows: JsValue) -> Result<JsValue, JsValue> {
        let rows: Vec<RawRow> = serde_wasm_bindgen::from_value(rows)
            .map_err(|e| JsValue::from_str(&format!("Invalid rows: {e}")))?;
        let started = js_sys::Date::now();
        let result = self.inner.load_rows(&rows).map_err(core_err)?;
        tracing::debug!(ms = js_sys::Date::now() - started, "load_rows");
        to_js(&result)
    }

    #[wasm_bindgen(js_name = setDetailLevel)]
    pub fn set_detail_level(&mut self, detail_level: f64) -> Result<JsValue, JsValue> {
        let started = js_sys::Date::now();
        let result = self.inner.set_detail_level(detail_level).map_err(core_err)?;
        tracing::debug!(ms = js_sys::Date::now() - started, "set_detail_level");
        to_js(&result)
    }

    #[wasm_bindgen(js_name = detailLevel)]
    pub fn detail_level(&self) -> f64 {
        self.inner.config().detail_level
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    const ROWS: &str = r#"[
        [-33.0, 151.0, "S1", "10", "100"],
        [-33.0, 151.0, "S2", "20", "200"],
        [-34.0, 152.0, "S3", "5", "50"]
    ]"#;

    #[wasm_bindgen_test]
    fn aggregate_accepts_backend_rows() {
        assert!(aggregate(ROWS, 0.5).is_ok());
    }

    #[wasm_bindgen_test]
    fn aggregate_rejects_bad_detail_level() {
        assert!(aggregate(ROWS, 0.0).is_err());
    }

    #[wasm_bindgen_test]
    fn aggregator_tracks_detail_level() {
        let mut agg = Aggregator::new(0.5).unwrap();
        agg.set_detail_level(2.0).unwrap();
        assert_eq!(agg.detail_level(), 2.0);
        assert!(agg.set_detail_level(-1.0).is_err());
        assert_eq!(agg.detail_level(), 2.0);
    }

    const PROPS: &str = r#"{
            "id": "0_2", "weightedAbundance": 1.0, "weightedRichness": 1.0,
            "weightedSites": 1.0, "stdCellRichness": 15.0, "stdCellAbundance": 150.0,
            "maxRichness": 15.0, "maxAbundance": 150.0, "maxSites": 2,
            "richness": 30, "abundance": 300, "sites": ["S1", "S2"], "coordinates": []
        }"#;

    #[wasm_bindgen_test]
    fn popup_from_properties_json() {
        let text = popup_text(PROPS).unwrap();
        assert!(text.starts_with("Cell 0_2\nSites: 2"));
    }

    #[wasm_bindgen_test]
    fn legend_helpers_take_result_objects() {
        let maxes = to_js(&Maxes { abundance: 150.0, richness: 15.0, sites: 2 }).unwrap();
        let stops: Vec<legend::LegendStop> =
            serde_wasm_bindgen::from_value(legend_stops(JsValue::from_str("abundance"), maxes).unwrap()).unwrap();
        assert_eq!(stops[4].value, 75.0);

        let props: FeatureProperties = serde_json::from_str(PROPS).unwrap();
        let bucket = ramp_bucket(JsValue::from_str("sites"), to_js(&props).unwrap()).unwrap();
        assert_eq!(bucket, 8);
        assert!(ramp_bucket(JsValue::from_str("depth"), to_js(&props).unwrap()).is_err());
    }
}
