//! Labeled polygon loading

use clipper_core::io::read_geojson;
use clipper_core::vector::FeatureCollection;
use clipper_core::{Result, CRS};
use std::path::Path;
use tracing::info;

/// Read labeled polygons from GeoJSON and reproject them to `target_crs`.
///
/// Feature order is preserved; it decides which polygon wins where two
/// overlap.
pub fn load_feature_polygons<P: AsRef<Path>>(path: P, target_crs: &CRS) -> Result<FeatureCollection> {
    let path = path.as_ref();
    let features = read_geojson(path)?;
    let source = features.crs().map(CRS::identifier).unwrap_or_default();
    let features = features.reproject(target_crs)?;
    info!(
        path = %path.display(),
        features = features.len(),
        from = %source,
        to = %target_crs,
        "loaded polygons"
    );
    Ok(features)
}
