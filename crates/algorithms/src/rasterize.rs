//! Polygon rasterization
//!
//! Burns labeled polygons onto a pixel grid, producing a class mask and the
//! class mapping that gives its values meaning.

use clipper_core::classes::{ClassId, ClassMapping, UNCLASSIFIED};
use clipper_core::raster::{GeoTransform, GridSpec, Raster};
use clipper_core::vector::FeatureCollection;
use clipper_core::{Error, Mask, Result};
use geo::{Coord, Geometry, Polygon};
use ndarray::s;
use tracing::debug;

/// Rasterize labeled polygons onto `grid`.
///
/// Class ids are assigned by first occurrence of each class name, starting
/// at 1; background stays 0. Features are burnt in collection order, so
/// where polygons overlap the later one wins.
///
/// A pixel belongs to a polygon when its centre lies inside it (even-odd
/// rule, holes excluded). Centres exactly on a left edge are inside, on a
/// right edge outside. Polygons are mapped into pixel space through the
/// inverse transform, so rotated grids are handled.
///
/// # Errors
/// - [`Error::Alignment`] if both the grid and the features carry a CRS and
///   they differ
/// - [`Error::InvalidParameter`] for a non-invertible transform, or more
///   classes than a [`ClassId`] can hold
pub fn rasterize(grid: &GridSpec, features: &FeatureCollection) -> Result<(Mask, ClassMapping)> {
    if let (Some(grid_crs), Some(feature_crs)) = (grid.crs.as_ref(), features.crs()) {
        if !grid_crs.is_equivalent(feature_crs) {
            return Err(Error::Alignment(format!(
                "features are in {} but the grid is in {}",
                feature_crs, grid_crs
            )));
        }
    }
    if !grid.transform.is_invertible() {
        return Err(Error::InvalidParameter {
            name: "transform",
            value: format!("{:?}", grid.transform.to_gdal()),
            reason: "affine transform is not invertible".into(),
        });
    }

    let mut mapping = ClassMapping::new();
    let mut shapes = Vec::with_capacity(features.len());
    for feature in features.iter() {
        let id = mapping.insert(feature.class_name.as_str())?;
        shapes.push((&feature.geometry, id));
    }

    let mut mask: Mask = Raster::on_grid(grid, UNCLASSIFIED);
    for (geometry, id) in shapes {
        burn_geometry(&mut mask, geometry, id, &grid.transform);
    }

    debug!(
        features = features.len(),
        classes = mapping.len(),
        labeled = mask.len() - mask.count_equal(UNCLASSIFIED),
        "rasterized polygons"
    );
    Ok((mask, mapping))
}

/// Burn one areal geometry with `value`; non-areal parts are ignored
pub fn burn_geometry(mask: &mut Mask, geometry: &Geometry<f64>, value: ClassId, transform: &GeoTransform) {
    match geometry {
        Geometry::Polygon(p) => burn_polygon(mask, p, value, transform),
        Geometry::MultiPolygon(mp) => {
            for p in mp {
                burn_polygon(mask, p, value, transform);
            }
        }
        Geometry::Rect(r) => burn_polygon(mask, &r.to_polygon(), value, transform),
        Geometry::Triangle(t) => burn_polygon(mask, &t.to_polygon(), value, transform),
        Geometry::GeometryCollection(gc) => {
            for g in gc {
                burn_geometry(mask, g, value, transform);
            }
        }
        _ => {}
    }
}

/// Scanline fill at pixel-centre rows
fn burn_polygon(mask: &mut Mask, polygon: &Polygon<f64>, value: ClassId, transform: &GeoTransform) {
    let (rows, cols) = mask.shape();

    // Every ring edge in pixel space; even-odd over all rings handles holes
    let mut edges: Vec<(Coord<f64>, Coord<f64>)> = Vec::new();
    for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
        let pixels: Vec<Coord<f64>> = ring
            .coords()
            .map(|c| {
                let (x, y) = transform.geo_to_pixel(c.x, c.y);
                Coord { x, y }
            })
            .collect();
        if pixels.iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return;
        }
        edges.extend(pixels.windows(2).map(|w| (w[0], w[1])));
        // rings are closed by geo-types, but be lenient with open input
        if let (Some(&first), Some(&last)) = (pixels.first(), pixels.last()) {
            if first != last {
                edges.push((last, first));
            }
        }
    }
    if edges.is_empty() {
        return;
    }

    let (min_y, max_y) = edges.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), (p, q)| {
        (lo.min(p.y).min(q.y), hi.max(p.y).max(q.y))
    });
    let row_start = first_index(min_y, rows);
    let row_end = first_index(max_y, rows);

    let mut crossings: Vec<f64> = Vec::new();
    for row in row_start..row_end {
        let yc = row as f64 + 0.5;

        crossings.clear();
        for (p, q) in &edges {
            if (p.y <= yc) != (q.y <= yc) {
                crossings.push(p.x + (yc - p.y) * (q.x - p.x) / (q.y - p.y));
            }
        }
        crossings.sort_by(f64::total_cmp);

        for span in crossings.chunks_exact(2) {
            let col_start = first_index(span[0], cols);
            let col_end = first_index(span[1], cols);
            if col_start < col_end {
                mask.data_mut()
                    .slice_mut(s![row, col_start..col_end])
                    .fill(value);
            }
        }
    }
}

/// First cell index whose centre is at or past `edge`, clamped to `0..=len`
fn first_index(edge: f64, len: usize) -> usize {
    let index = (edge - 0.5).ceil();
    if index <= 0.0 {
        0
    } else if index >= len as f64 {
        len
    } else {
        index as usize
    }
}
