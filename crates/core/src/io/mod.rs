//! Reading and writing rasters, vectors and sample tables

mod atomic;
mod geotiff;
mod samples;
mod vector;

pub use atomic::write_atomically;
pub use geotiff::{read_geotiff, read_geotiff_from_buffer, write_geotiff, write_geotiff_to_buffer};
pub use samples::{read_class_mapping, read_samples_csv, write_class_mapping, write_samples_csv};
pub use vector::{read_geojson, read_geojson_str};
