//! Geospatial aggregation of georeferenced microbiome samples into a uniform
//! lon/lat grid, with normalized per-cell metrics for choropleth rendering.
//!
//! Pipeline:
//!   raw rows → [`records`] → site points →
//!     [`bounds`] → [`grid`] (partition + populate) → [`aggregate`] →
//!     [`normalize`] → [`features`]
//!   and, independently, site points → [`heatmap`] sample points.
//!
//! [`engine::SampleAggregator`] runs the whole thing and caches site points
//! so a grid-size change only reruns the grid stages.

pub mod aggregate;
pub mod bounds;
pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod grid;
pub mod heatmap;
pub mod legend;
pub mod normalize;
pub mod records;

pub use config::{GridConfig, PopulateStrategy};
pub use engine::{aggregate, AggregationResult, PassStats, SampleAggregator};
pub use error::{Error, Result};
pub use features::{Feature, FeatureCollection, FeatureProperties};
pub use normalize::Maxes;
pub use records::{RawRow, SitePoint};
