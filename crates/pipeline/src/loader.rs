//! Band stack loading

use crate::config::{validate_bands, SensorConfig};
use crate::locator::{is_jpeg2000, jpeg2000_unsupported, BandLocator};
use clipper_core::band::{BandId, Resolution};
use clipper_core::io::read_geotiff;
use clipper_core::raster::BandStack;
use clipper_core::Result;
use tracing::{debug, info};

/// Read, normalize and stack the requested bands.
///
/// Every band is resolved through `locator` before any file is opened.
/// Raw samples become reflectance through `sensor`; the nodata sentinel
/// becomes NaN. Bands are stacked in the order given.
///
/// # Errors
/// - [`clipper_core::Error::InvalidParameter`] for an empty or repeating band list
/// - [`clipper_core::Error::MissingBand`] / [`clipper_core::Error::AmbiguousBand`]
///   from the locator
/// - [`clipper_core::Error::UnsupportedDataType`] for a JPEG 2000 band file
/// - [`clipper_core::Error::MissingGeoreference`] for a file without transform or CRS
/// - [`clipper_core::Error::Alignment`] when the bands do not share one grid
pub fn load_band_stack<L>(
    locator: &L,
    resolution: Resolution,
    bands: &[BandId],
    sensor: &SensorConfig,
) -> Result<BandStack>
where
    L: BandLocator + ?Sized,
{
    validate_bands(bands)?;
    sensor.validate()?;

    let paths = bands
        .iter()
        .map(|&band| locator.locate(band, resolution).map(|path| (band, path)))
        .collect::<Result<Vec<_>>>()?;

    let mut layers = Vec::with_capacity(paths.len());
    for (band, path) in paths {
        if is_jpeg2000(&path) {
            return Err(jpeg2000_unsupported(&path));
        }
        debug!(%band, path = %path.display(), "reading band");
        let mut layer = read_geotiff::<f32, _>(&path)?;
        layer.data_mut().mapv_inplace(|raw| sensor.normalize(raw));
        layer.set_nodata(Some(f32::NAN));
        layers.push((band, layer));
    }

    let stack = BandStack::from_layers(layers)?;
    info!(
        bands = stack.band_count(),
        rows = stack.rows(),
        cols = stack.cols(),
        crs = %stack.crs(),
        "loaded band stack"
    );
    Ok(stack)
}
