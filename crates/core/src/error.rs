//! Error types for the clipper crates

use std::path::PathBuf;
use thiserror::Error;

use crate::band::{BandId, Resolution};
use crate::classes::ClassId;

/// Main error type for clipper operations.
///
/// Every variant is fatal to a pipeline run: these describe data-integrity
/// problems, not transient faults.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No file found for band {band} at {resolution}")]
    MissingBand { band: BandId, resolution: Resolution },

    #[error("Band {band} at {resolution} matches {} files: {candidates:?}", candidates.len())]
    AmbiguousBand {
        band: BandId,
        resolution: Resolution,
        candidates: Vec<PathBuf>,
    },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Alignment error: {0}")]
    Alignment(String),

    #[error("Training error: {0}")]
    Training(String),

    #[error("Missing georeference: {0}")]
    MissingGeoreference(String),

    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),

    #[error("Mask value {0} has no entry in the class mapping")]
    UnknownClass(ClassId),

    #[error("Invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("Index out of bounds: ({row}, {col}) in raster of size ({rows}, {cols})")]
    IndexOutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Raster size mismatch: expected ({er}, {ec}), got ({ar}, {ac})")]
    SizeMismatch { er: usize, ec: usize, ar: usize, ac: usize },

    #[error("Unsupported data type: {0}")]
    UnsupportedDataType(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("TIFF error: {0}")]
    Tiff(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] Box<geojson::Error>),
}

impl From<geojson::Error> for Error {
    fn from(e: geojson::Error) -> Self {
        Error::GeoJson(Box::new(e))
    }
}

impl From<tiff::TiffError> for Error {
    fn from(e: tiff::TiffError) -> Self {
        Error::Tiff(e.to_string())
    }
}

/// Result type alias for clipper operations
pub type Result<T> = std::result::Result<T, Error>;
