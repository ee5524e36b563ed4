//! # Clipper Core
//!
//! Core types and I/O for turning labeled polygons and Sentinel-2 bands into
//! training samples and class maps.
//!
//! This crate provides:
//! - `Raster<T>`: georeferenced 2D grid, used for masks and class maps
//! - `BandStack`: aligned multi-band reflectance stack
//! - `ClassMapping`: ordered class name to id bijection
//! - `SampleTable`: labeled pixel samples
//! - `CRS` handling with WGS84 / UTM reprojection
//! - GeoTIFF, GeoJSON and CSV I/O

pub mod band;
pub mod classes;
pub mod crs;
pub mod error;
pub mod io;
pub mod raster;
pub mod table;
pub mod vector;

pub use band::{BandId, Resolution};
pub use classes::{ClassId, ClassMapping, UNCLASSIFIED};
pub use crs::CRS;
pub use error::{Error, Result};
pub use raster::{BandStack, GeoTransform, GridSpec, Raster, RasterElement};
pub use table::SampleTable;
pub use vector::{Feature, FeatureCollection};

/// Class per pixel; 0 is background
pub type Mask = Raster<ClassId>;

/// Predicted class per pixel; 0 is unclassified
pub type ClassMap = Raster<ClassId>;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::band::{BandId, Resolution};
    pub use crate::classes::{ClassId, ClassMapping, UNCLASSIFIED};
    pub use crate::crs::CRS;
    pub use crate::error::{Error, Result};
    pub use crate::raster::{BandStack, GeoTransform, GridSpec, Raster, RasterElement};
    pub use crate::table::SampleTable;
    pub use crate::vector::{Feature, FeatureCollection};
    pub use crate::{ClassMap, Mask};
}
