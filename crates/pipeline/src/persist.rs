//! Output persistence

use clipper_core::io::write_geotiff;
use clipper_core::raster::BandStack;
use clipper_core::{ClassMap, Error, Result, UNCLASSIFIED};
use std::path::Path;
use tracing::info;

pub use clipper_core::io::{write_class_mapping, write_samples_csv};

/// Write a class map as a single-band integer GeoTIFF on the stack's grid.
///
/// The output takes its transform and CRS from `reference`, whatever the
/// class map carries, and marks 0 as nodata.
///
/// # Errors
/// - [`Error::SizeMismatch`] if the class map and the stack differ in shape
/// - [`Error::MissingGeoreference`] if the stack CRS has no EPSG code
/// - [`Error::Io`] if the destination cannot be written
pub fn write_raster<P: AsRef<Path>>(path: P, reference: &BandStack, classmap: &ClassMap) -> Result<()> {
    let (rows, cols) = reference.shape();
    if classmap.shape() != (rows, cols) {
        return Err(Error::SizeMismatch {
            er: rows,
            ec: cols,
            ar: classmap.rows(),
            ac: classmap.cols(),
        });
    }

    let mut output = classmap.clone();
    output.set_transform(*reference.transform());
    output.set_crs(Some(reference.crs().clone()));
    output.set_nodata(Some(UNCLASSIFIED));

    write_geotiff(&output, path.as_ref())?;
    info!(path = %path.as_ref().display(), rows, cols, "wrote class map");
    Ok(())
}
