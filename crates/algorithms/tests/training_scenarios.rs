//! Rasterize, extract and classify on small synthetic grids.

use clipper_algorithms::prelude::*;
use geo::{Geometry, Rect};
use ndarray::Array3;

/// 4x4 grid of 60 m pixels in UTM 31N
fn transform() -> GeoTransform {
    GeoTransform::new(300_000.0, 4_800_240.0, 60.0, -60.0)
}

fn utm() -> CRS {
    CRS::from_epsg(32631)
}

/// Rect covering pixel columns `c0..c1` and rows `r0..r1`
fn pixel_rect(c0: usize, r0: usize, c1: usize, r1: usize) -> Geometry<f64> {
    let gt = transform();
    let (x0, y0) = gt.pixel_to_geo_corner(c0, r0);
    let (x1, y1) = gt.pixel_to_geo_corner(c1, r1);
    Geometry::Rect(Rect::new((x0, y0), (x1, y1)))
}

fn collection(items: Vec<(Geometry<f64>, &str)>) -> FeatureCollection {
    FeatureCollection::from_features(
        items
            .into_iter()
            .map(|(g, name)| Feature::new(g, name).unwrap())
            .collect(),
        Some(utm()),
    )
}

/// Water pixels are dark, land pixels bright, everything else missing
fn quadrant_stack() -> BandStack {
    let mut data = Array3::<f32>::from_elem((2, 4, 4), f32::NAN);
    for r in 0..4 {
        for c in 0..4 {
            let value = match (r < 2, c < 2) {
                (true, true) => Some([0.04 + 0.001 * (r * 4 + c) as f32, 0.02]),
                (false, false) => Some([0.30 + 0.001 * (r * 4 + c) as f32, 0.25]),
                _ => None,
            };
            if let Some([b0, b1]) = value {
                data[[0, r, c]] = b0;
                data[[1, r, c]] = b1;
            }
        }
    }
    BandStack::new(vec![BandId::B04, BandId::B8A], data, transform(), utm()).unwrap()
}

fn quadrant_features() -> FeatureCollection {
    collection(vec![
        (pixel_rect(0, 0, 2, 2), "water"),
        (pixel_rect(2, 2, 4, 4), "land"),
    ])
}

#[test]
fn quadrant_mask_and_samples() {
    let stack = quadrant_stack();
    let (mask, mapping) = rasterize(&stack.grid(), &quadrant_features()).unwrap();

    assert_eq!(mapping.id("water"), Some(1));
    assert_eq!(mapping.id("land"), Some(2));
    for r in 0..4 {
        for c in 0..4 {
            let expected: ClassId = match (r < 2, c < 2) {
                (true, true) => 1,
                (false, false) => 2,
                _ => 0,
            };
            assert_eq!(mask.get(r, c).unwrap(), expected, "pixel ({}, {})", r, c);
        }
    }

    let table = extract_samples(&stack, &mask, &mapping).unwrap();
    assert_eq!(table.len(), 8);
    assert_eq!(table.classes(), &[1, 1, 1, 1, 2, 2, 2, 2]);
    assert_eq!(table.columns(), &["B04".to_string(), "B8A".to_string()]);
}

#[test]
fn quadrant_prediction_reproduces_mask() {
    let stack = quadrant_stack();
    let (mask, mapping) = rasterize(&stack.grid(), &quadrant_features()).unwrap();
    let table = extract_samples(&stack, &mask, &mapping).unwrap();

    let by_distance = train_and_classify(&stack, &table, &MinimumDistance).unwrap();
    assert_eq!(by_distance.data(), mask.data());

    let by_likelihood = train_and_classify(&stack, &table, &MaximumLikelihood).unwrap();
    assert_eq!(by_likelihood.data(), mask.data());
    assert_eq!(by_likelihood.crs(), Some(&utm()));
}

#[test]
fn empty_collection_yields_empty_table_and_training_error() {
    let stack = quadrant_stack();
    let (mask, mapping) = rasterize(&stack.grid(), &collection(vec![])).unwrap();
    assert!(mapping.is_empty());
    assert_eq!(mask.count_equal(UNCLASSIFIED), 16);

    let table = extract_samples(&stack, &mask, &mapping).unwrap();
    assert!(table.is_empty());
    assert!(matches!(
        train_and_classify(&stack, &table, &MinimumDistance),
        Err(Error::Training(_))
    ));
}

#[test]
fn overlapping_polygons_later_wins() {
    let stack = quadrant_stack();
    let fc = collection(vec![
        (pixel_rect(0, 0, 3, 3), "a"),
        (pixel_rect(1, 1, 4, 4), "b"),
    ]);
    let (mask, _) = rasterize(&stack.grid(), &fc).unwrap();

    assert_eq!(mask.get(0, 0).unwrap(), 1);
    assert_eq!(mask.get(1, 1).unwrap(), 2);
    assert_eq!(mask.get(2, 2).unwrap(), 2);
    assert_eq!(mask.get(0, 2).unwrap(), 1);
    assert_eq!(mask.get(3, 3).unwrap(), 2);
    assert_eq!(mask.get(3, 0).unwrap(), 0);
}

#[test]
fn mask_depends_only_on_grid() {
    let one_band = BandStack::new(
        vec![BandId::B02],
        Array3::<f32>::zeros((1, 4, 4)),
        transform(),
        utm(),
    )
    .unwrap();
    let (a, _) = rasterize(&one_band.grid(), &quadrant_features()).unwrap();
    let (b, _) = rasterize(&quadrant_stack().grid(), &quadrant_features()).unwrap();
    assert_eq!(a.data(), b.data());
}
