//! Pipeline configuration

use clipper_core::band::{BandId, Resolution};
use clipper_core::{Error, Result, CRS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Radiometric constants turning raw digital numbers into reflectance.
///
/// Defaults are those of Sentinel-2 L2A products from processing baseline
/// 04.00 on: `reflectance = (raw + radiometric_offset) / quantification_scale`,
/// with `raw == nodata_sentinel` meaning no measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SensorConfig {
    pub radiometric_offset: f64,
    pub quantification_scale: f64,
    pub nodata_sentinel: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            radiometric_offset: -1000.0,
            quantification_scale: 10000.0,
            nodata_sentinel: 0.0,
        }
    }
}

impl SensorConfig {
    /// Reflectance of one raw sample; the sentinel and NaN map to NaN
    pub fn normalize(&self, raw: f32) -> f32 {
        let raw = f64::from(raw);
        if raw.is_nan() || raw == self.nodata_sentinel {
            return f32::NAN;
        }
        ((raw + self.radiometric_offset) / self.quantification_scale) as f32
    }

    pub fn validate(&self) -> Result<()> {
        if !self.quantification_scale.is_finite() || self.quantification_scale == 0.0 {
            return Err(Error::InvalidParameter {
                name: "quantification_scale",
                value: self.quantification_scale.to_string(),
                reason: "must be finite and non-zero".into(),
            });
        }
        if !self.radiometric_offset.is_finite() {
            return Err(Error::InvalidParameter {
                name: "radiometric_offset",
                value: self.radiometric_offset.to_string(),
                reason: "must be finite".into(),
            });
        }
        Ok(())
    }
}

/// Which reference classifier `run_with_config` uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    #[default]
    MinimumDistance,
    MaximumLikelihood,
}

/// Everything a pipeline run needs, usually loaded from a JSON file.
///
/// ```json
/// {
///   "product_root": "S2A_MSIL2A_20230101T105441_N0509_R051_T31TCJ.SAFE",
///   "polygons_path": "polygons.geojson",
///   "target_epsg": 32631,
///   "csv_output_path": "samples.csv",
///   "raster_output_path": "classification.tif"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Root of the `.SAFE` product directory
    pub product_root: PathBuf,
    #[serde(default)]
    pub resolution: Resolution,
    /// Bands to stack, in output column order
    #[serde(default = "BandId::default_selection")]
    pub bands: Vec<BandId>,
    /// GeoJSON file of labeled polygons
    pub polygons_path: PathBuf,
    /// CRS polygons are reprojected to; must match the product grid
    pub target_epsg: u32,
    pub csv_output_path: PathBuf,
    pub raster_output_path: PathBuf,
    /// Optional JSON sidecar with the class name to id mapping
    #[serde(default)]
    pub mapping_output_path: Option<PathBuf>,
    #[serde(default)]
    pub classifier: ClassifierKind,
    #[serde(default)]
    pub sensor: SensorConfig,
    /// Log at DEBUG instead of INFO
    #[serde(default)]
    pub verbose: bool,
}

impl PipelineConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: PipelineConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Target CRS of the run
    pub fn target_crs(&self) -> CRS {
        CRS::from_epsg(self.target_epsg)
    }

    /// Check the values serde cannot
    pub fn validate(&self) -> Result<()> {
        validate_bands(&self.bands)?;
        if self.target_epsg == 0 {
            return Err(Error::InvalidParameter {
                name: "target_epsg",
                value: "0".into(),
                reason: "an explicit EPSG code is required".into(),
            });
        }
        self.sensor.validate()
    }
}

/// Band lists must be non-empty and free of repeats
pub fn validate_bands(bands: &[BandId]) -> Result<()> {
    if bands.is_empty() {
        return Err(Error::InvalidParameter {
            name: "bands",
            value: "[]".into(),
            reason: "at least one band is required".into(),
        });
    }
    for (i, band) in bands.iter().enumerate() {
        if bands[..i].contains(band) {
            return Err(Error::InvalidParameter {
                name: "bands",
                value: band.to_string(),
                reason: "band listed twice".into(),
            });
        }
    }
    Ok(())
}
