//! Full pipeline runs against a synthetic `.SAFE` product.

use clipper_core::crs::utm_to_wgs84;
use clipper_core::io::{read_class_mapping, read_geotiff, read_samples_csv, write_geotiff};
use clipper_core::prelude::*;
use clipper_pipeline::{
    run, run_with_config, BandPaths, ClassifierKind, PipelineConfig, SafeProductLocator, Stage,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const ORIGIN_X: f64 = 500_000.0;
const ORIGIN_Y: f64 = 4_980_240.0;
const PIXEL: f64 = 60.0;

fn transform() -> GeoTransform {
    GeoTransform::new(ORIGIN_X, ORIGIN_Y, PIXEL, -PIXEL)
}

/// Raw digital numbers of a 4x4 band: water top-left, land bottom-right,
/// sentinel 0 elsewhere
fn raw_band(water: u16, land: u16) -> Vec<u16> {
    let mut values = Vec::with_capacity(16);
    for r in 0..4 {
        for c in 0..4 {
            let jitter = (r * 4 + c) as u16;
            values.push(match (r < 2, c < 2) {
                (true, true) => water + jitter,
                (false, false) => land + jitter,
                _ => 0,
            });
        }
    }
    values
}

fn write_band(path: &Path, values: Vec<u16>) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut raster = Raster::from_vec(values, 4, 4).unwrap();
    raster.set_transform(transform());
    raster.set_crs(Some(CRS::from_epsg(32631)));
    write_geotiff(&raster, path).unwrap();
}

fn band_path(root: &Path, granule: &str, band: &str) -> PathBuf {
    root.join("GRANULE")
        .join(granule)
        .join("IMG_DATA/R60m")
        .join(format!("T31TEJ_20230101T105441_{}_60m.tif", band))
}

/// Product with B04 and B8A at 60 m
fn product(dir: &Path) -> PathBuf {
    let root = dir.join("S2A_MSIL2A_20230101T105441_N0509_R051_T31TEJ.SAFE");
    write_band(&band_path(&root, "L2A_T31TEJ_A000001", "B04"), raw_band(1400, 4000));
    write_band(&band_path(&root, "L2A_T31TEJ_A000001", "B8A"), raw_band(1200, 3500));
    root
}

/// Corners of pixel block `c0..c1` x `r0..r1`, shrunk by 10 m
fn block(c0: usize, r0: usize, c1: usize, r1: usize) -> [(f64, f64); 4] {
    let x0 = ORIGIN_X + c0 as f64 * PIXEL + 10.0;
    let x1 = ORIGIN_X + c1 as f64 * PIXEL - 10.0;
    let y0 = ORIGIN_Y - r1 as f64 * PIXEL + 10.0;
    let y1 = ORIGIN_Y - r0 as f64 * PIXEL - 10.0;
    [(x0, y0), (x1, y0), (x1, y1), (x0, y1)]
}

fn polygon_feature(corners: [(f64, f64); 4], class: &str) -> String {
    let ring: Vec<String> = corners
        .iter()
        .chain(std::iter::once(&corners[0]))
        .map(|(x, y)| format!("[{:.9}, {:.9}]", x, y))
        .collect();
    format!(
        r#"{{ "type": "Feature", "properties": {{ "class": "{}" }},
            "geometry": {{ "type": "Polygon", "coordinates": [[{}]] }} }}"#,
        class,
        ring.join(", ")
    )
}

fn utm_polygons() -> String {
    format!(
        r#"{{ "type": "FeatureCollection",
            "crs": {{ "type": "name", "properties": {{ "name": "urn:ogc:def:crs:EPSG::32631" }} }},
            "features": [{}, {}] }}"#,
        polygon_feature(block(0, 0, 2, 2), "water"),
        polygon_feature(block(2, 2, 4, 4), "land"),
    )
}

fn wgs84_polygons() -> String {
    let to_lonlat = |corners: [(f64, f64); 4]| corners.map(|(x, y)| utm_to_wgs84(x, y, 31, true));
    format!(
        r#"{{ "type": "FeatureCollection", "features": [{}, {}] }}"#,
        polygon_feature(to_lonlat(block(0, 0, 2, 2)), "water"),
        polygon_feature(to_lonlat(block(2, 2, 4, 4)), "land"),
    )
}

fn config(dir: &Path, root: PathBuf, polygons: &str) -> PipelineConfig {
    let polygons_path = dir.join("polygons.geojson");
    fs::write(&polygons_path, polygons).unwrap();
    PipelineConfig {
        product_root: root,
        resolution: Resolution::R60,
        bands: vec![BandId::B04, BandId::B8A],
        polygons_path,
        target_epsg: 32631,
        csv_output_path: dir.join("out/samples.csv"),
        raster_output_path: dir.join("out/classification.tif"),
        mapping_output_path: Some(dir.join("out/classes.json")),
        classifier: ClassifierKind::MinimumDistance,
        sensor: Default::default(),
        verbose: false,
    }
}

fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir_all(dir.path().join("out")).unwrap();
    dir
}

fn expected_mask() -> Vec<ClassId> {
    let mut values = Vec::new();
    for r in 0..4 {
        for c in 0..4 {
            values.push(match (r < 2, c < 2) {
                (true, true) => 1,
                (false, false) => 2,
                _ => 0,
            });
        }
    }
    values
}

#[test]
fn utm_polygons_produce_samples_and_class_map() {
    let dir = workspace();
    let root = product(dir.path());
    let config = config(dir.path(), root, &utm_polygons());

    let report = run_with_config(&config).unwrap();

    assert_eq!(report.mapping.id("water"), Some(1));
    assert_eq!(report.mapping.id("land"), Some(2));
    assert_eq!(
        report.class_counts,
        vec![("water".to_string(), 4), ("land".to_string(), 4)]
    );
    assert_eq!(report.total_samples, 8);
    assert_eq!(report.unclassified_pixels, 8);

    let csv = fs::read_to_string(&config.csv_output_path).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("B04;B8A;class"));
    assert_eq!(lines.count(), 8);

    let table = read_samples_csv(&config.csv_output_path).unwrap();
    assert_eq!(table.classes(), &[1, 1, 1, 1, 2, 2, 2, 2]);
    approx::assert_relative_eq!(table.features()[[0, 0]], 0.04, epsilon = 1e-6);
    approx::assert_relative_eq!(table.features()[[4, 1]], 0.2510, epsilon = 1e-6);

    let classmap = read_geotiff::<u16, _>(&config.raster_output_path).unwrap();
    assert_eq!(classmap.data().iter().copied().collect::<Vec<_>>(), expected_mask());
    assert_eq!(classmap.crs().and_then(CRS::epsg), Some(32631));
    assert_eq!(classmap.transform(), &transform());
    assert_eq!(classmap.nodata(), Some(0));

    let mapping = read_class_mapping(dir.path().join("out/classes.json")).unwrap();
    assert_eq!(mapping, report.mapping);
}

#[test]
fn wgs84_polygons_are_reprojected() {
    let dir = workspace();
    let root = product(dir.path());
    let mut config = config(dir.path(), root, &wgs84_polygons());
    config.classifier = ClassifierKind::MaximumLikelihood;
    config.mapping_output_path = None;

    let report = run_with_config(&config).unwrap();
    assert_eq!(report.total_samples, 8);

    let classmap = read_geotiff::<u16, _>(&config.raster_output_path).unwrap();
    assert_eq!(classmap.data().iter().copied().collect::<Vec<_>>(), expected_mask());
    assert!(!dir.path().join("out/classes.json").exists());
}

#[test]
fn explicit_band_paths() {
    let dir = workspace();
    let root = product(dir.path());
    let config = config(dir.path(), root.clone(), &utm_polygons());
    let locator = BandPaths::new()
        .with(BandId::B04, band_path(&root, "L2A_T31TEJ_A000001", "B04"))
        .with(BandId::B8A, band_path(&root, "L2A_T31TEJ_A000001", "B8A"));

    let report = run(&config, &locator, &clipper_algorithms::MinimumDistance).unwrap();
    assert_eq!(report.total_samples, 8);
}

#[test]
fn missing_band_fails_while_loading_bands() {
    let dir = workspace();
    let root = product(dir.path());
    let mut config = config(dir.path(), root, &utm_polygons());
    config.bands = vec![BandId::B04, BandId::B02];

    let err = run_with_config(&config).unwrap_err();
    assert_eq!(err.stage, Stage::LoadBands);
    assert!(matches!(
        err.source,
        Error::MissingBand {
            band: BandId::B02,
            resolution: Resolution::R60
        }
    ));
    assert!(!config.csv_output_path.exists());
}

#[test]
fn duplicate_band_files_are_ambiguous() {
    let dir = workspace();
    let root = product(dir.path());
    write_band(&band_path(&root, "L2A_T31TEJ_A000002", "B04"), raw_band(1400, 4000));
    let config = config(dir.path(), root.clone(), &utm_polygons());

    let err = run(&config, &SafeProductLocator::new(&root), &clipper_algorithms::MinimumDistance).unwrap_err();
    assert_eq!(err.stage, Stage::LoadBands);
    match err.source {
        Error::AmbiguousBand { band, candidates, .. } => {
            assert_eq!(band, BandId::B04);
            assert_eq!(candidates.len(), 2);
        }
        other => panic!("expected AmbiguousBand, got {:?}", other),
    }
}

#[test]
fn empty_collection_writes_header_then_fails_training() {
    let dir = workspace();
    let root = product(dir.path());
    let empty = r#"{ "type": "FeatureCollection", "features": [] }"#;
    let config = config(dir.path(), root, empty);

    let err = run_with_config(&config).unwrap_err();
    assert_eq!(err.stage, Stage::Classify);
    assert!(matches!(err.source, Error::Training(_)));

    let csv = fs::read_to_string(&config.csv_output_path).unwrap();
    assert_eq!(csv.lines().collect::<Vec<_>>(), vec!["B04;B8A;class"]);
    assert!(!config.raster_output_path.exists());
}

#[test]
fn feature_without_class_fails_while_loading_polygons() {
    let dir = workspace();
    let root = product(dir.path());
    let polygons = utm_polygons().replace(r#""class": "land""#, r#""name": "land""#);
    let config = config(dir.path(), root, &polygons);

    let err = run_with_config(&config).unwrap_err();
    assert_eq!(err.stage, Stage::LoadPolygons);
    assert!(matches!(err.source, Error::Schema(ref msg) if msg.starts_with("feature 1 ")));
}

#[test]
fn invalid_configuration_fails_before_reading() {
    let dir = workspace();
    let root = product(dir.path());
    let mut config = config(dir.path(), root, &utm_polygons());
    config.bands.clear();

    let err = run_with_config(&config).unwrap_err();
    assert_eq!(err.stage, Stage::Configure);
    assert!(matches!(err.source, Error::InvalidParameter { .. }));
}
