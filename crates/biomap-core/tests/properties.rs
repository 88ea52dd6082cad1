//! End-to-end properties of an aggregation pass over the public API.

use std::collections::HashSet;

use biomap_core::{aggregate, GridConfig, PopulateStrategy, RawRow, SampleAggregator, SitePoint};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SLIDER_LEVELS: [f64; 6] = [0.25, 0.5, 1.0, 2.5, 5.0, 10.0];
const OFF_SLIDER_LEVELS: [f64; 4] = [0.1, 0.3, 0.7, 1.1];

/// Scattered sites off the south-east Australian coast, one point each.
fn scattered_points(seed: u64, n: usize) -> Vec<SitePoint> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            SitePoint::new(
                rng.gen_range(-44.0..-10.0),
                rng.gen_range(112.0..154.0),
                &format!("site-{i}"),
                rng.gen_range(1..400),
                rng.gen_range(1..50_000),
            )
        })
        .collect()
}

#[test]
fn identical_input_gives_byte_identical_output() {
    let points = scattered_points(7, 250);
    for level in SLIDER_LEVELS {
        let cfg = GridConfig::new(level);
        let a = serde_json::to_string(&aggregate(&points, &cfg).unwrap().feature_collection).unwrap();
        let b = serde_json::to_string(&aggregate(&points, &cfg).unwrap().feature_collection).unwrap();
        assert_eq!(a, b, "level {level}");
    }
}

#[test]
fn cells_partition_the_site_set() {
    let points = scattered_points(11, 400);
    let expected: HashSet<&str> = points.iter().map(|p| p.site_id.as_str()).collect();

    for level in SLIDER_LEVELS.into_iter().chain(OFF_SLIDER_LEVELS) {
        let result = aggregate(&points, &GridConfig::new(level)).unwrap();
        assert_eq!(result.stats.points.kept, points.len());
        assert!(!result.sample_points.is_empty());
        let mut seen: HashSet<String> = HashSet::new();
        for f in &result.feature_collection.features {
            assert!(!f.properties.sites.is_empty(), "empty cell {} materialized", f.id);
            for id in &f.properties.sites {
                assert!(seen.insert(id.clone()), "{id} in more than one cell at level {level}");
            }
        }
        let seen: HashSet<&str> = seen.iter().map(String::as_str).collect();
        assert_eq!(seen, expected, "level {level}");
    }
}

#[test]
fn rounded_cell_edges_leave_no_site_behind() {
    let points = vec![
        SitePoint::new(0.0, -0.31583836011307653, "west", 1, 1),
        SitePoint::new(0.0, -0.11583836011307648, "edge", 1, 1),
        SitePoint::new(0.0, 45.0, "east", 1, 1),
    ];
    for strategy in [PopulateStrategy::Hashed, PopulateStrategy::Scan] {
        let result = aggregate(&points, &GridConfig::new(0.1).with_strategy(strategy)).unwrap();
        let placed: usize = result.feature_collection.features.iter().map(|f| f.properties.sites.len()).sum();
        assert_eq!(placed, 3, "{strategy:?}");
    }
}

#[test]
fn weighted_metrics_stay_in_unit_range_and_reach_one() {
    let points = scattered_points(23, 300);
    for level in SLIDER_LEVELS {
        let result = aggregate(&points, &GridConfig::new(level)).unwrap();
        let props: Vec<_> = result.feature_collection.features.iter().map(|f| &f.properties).collect();
        for p in &props {
            for w in [p.weighted_abundance, p.weighted_richness, p.weighted_sites] {
                assert!((0.0..=1.0).contains(&w), "weight {w} out of range in {}", p.id);
            }
        }
        assert!(props.iter().any(|p| p.weighted_abundance == 1.0));
        assert!(props.iter().any(|p| p.weighted_richness == 1.0));
        assert!(props.iter().any(|p| p.weighted_sites == 1.0));
    }
}

#[test]
fn all_zero_measurements_weight_to_zero() {
    let points: Vec<SitePoint> = scattered_points(5, 60)
        .into_iter()
        .map(|p| SitePoint { richness: 0, abundance: 0, ..p })
        .collect();
    let result = aggregate(&points, &GridConfig::new(2.5)).unwrap();
    assert!(!result.feature_collection.is_empty());
    for f in &result.feature_collection.features {
        assert_eq!(f.properties.weighted_abundance, 0.0);
        assert_eq!(f.properties.weighted_richness, 0.0);
        assert!(f.properties.weighted_sites > 0.0);
    }
    assert_eq!(result.maxes.abundance, 0.0);
}

#[test]
fn finer_grid_never_has_fewer_cells() {
    // Nine sites one degree apart along the equator.
    let points: Vec<SitePoint> = (0..9)
        .map(|i| SitePoint::new(0.0, i as f64, &format!("eq-{i}"), 1, 1))
        .collect();

    let levels = [10.0, 8.0, 4.0, 2.0, 1.0, 0.5, 0.25];
    let counts: Vec<usize> = levels
        .iter()
        .map(|&l| aggregate(&points, &GridConfig::new(l)).unwrap().stats.active_cells)
        .collect();

    assert_eq!(counts, vec![2, 2, 3, 5, 9, 9, 9]);
    assert!(counts.windows(2).all(|w| w[0] <= w[1]), "{counts:?}");
}

#[test]
fn rows_without_abundance_never_reach_a_cell() {
    let mut rows: Vec<RawRow> = scattered_points(3, 80)
        .iter()
        .map(|p| {
            RawRow::new(
                p.latitude,
                p.longitude,
                &p.site_id,
                &p.richness.to_string(),
                &p.abundance.to_string(),
            )
        })
        .collect();
    rows.push(RawRow::new(-33.0, 151.0, "ghost-1", "10", "NaN"));
    rows.push(RawRow::new(-20.0, 130.0, "ghost-2", "3", ""));

    let mut engine = SampleAggregator::new(GridConfig::new(1.0)).unwrap();
    let result = engine.load_rows(&rows).unwrap();
    assert_eq!(result.stats.points.missing_abundance, 2);
    for f in &result.feature_collection.features {
        assert!(f.properties.sites.iter().all(|id| !id.starts_with("ghost")));
    }
}

#[test]
fn mean_and_binning_examples() {
    let rows = vec![
        RawRow::new(-33.0, 151.0, "S1", "10", "100"),
        RawRow::new(-33.0, 151.0, "S2", "20", "200"),
        RawRow::new(-34.0, 152.0, "S3", "5", "50"),
    ];
    let mut engine = SampleAggregator::new(GridConfig::new(0.5)).unwrap();
    let result = engine.load_rows(&rows).unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["samplePoints"][0], serde_json::json!([-33.0, 151.0, 150.0]));

    let features = &result.feature_collection.features;
    assert!(features.len() >= 2);
    for f in features {
        let expected = if f.properties.sites.len() == 2 { 1.0 } else { 0.5 };
        assert_eq!(f.properties.weighted_sites, expected, "cell {}", f.id);
    }
}

#[test]
fn hashed_and_scanned_populations_match() {
    let points = scattered_points(42, 120);
    for level in SLIDER_LEVELS {
        let hashed = aggregate(&points, &GridConfig::new(level)).unwrap();
        let scanned =
            aggregate(&points, &GridConfig::new(level).with_strategy(PopulateStrategy::Scan)).unwrap();
        assert_eq!(hashed.feature_collection, scanned.feature_collection, "level {level}");
    }
}
