//! Raster data structures

mod element;
mod geotransform;
mod grid;
mod stack;

pub use element::{RasterElement, SampleKind};
pub use geotransform::GeoTransform;
pub use grid::{GridSpec, Raster};
pub use stack::BandStack;
