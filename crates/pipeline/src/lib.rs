//! # Clipper Pipeline
//!
//! End-to-end training sample extraction for Sentinel-2 products:
//! labeled polygons and band files in, a sample CSV and a class map
//! GeoTIFF out.
//!
//! ```no_run
//! use clipper_pipeline::{run_with_config, PipelineConfig};
//!
//! let config = PipelineConfig::from_file("pipeline.json")?;
//! let report = run_with_config(&config)?;
//! println!("{}", report);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod loader;
pub mod locator;
pub mod persist;
pub mod polygons;
pub mod run;

pub use config::{ClassifierKind, PipelineConfig, SensorConfig};
pub use loader::load_band_stack;
pub use locator::{BandLocator, BandPaths, SafeProductLocator};
pub use persist::write_raster;
pub use polygons::load_feature_polygons;
pub use run::{run, run_with_config, PipelineError, PipelineReport, Stage};
