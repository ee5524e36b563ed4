//! # Clipper Algorithms
//!
//! Turning labeled polygons into training samples, and samples into class
//! maps.
//!
//! ## Stages
//!
//! - **rasterize**: burn labeled polygons onto a band stack's grid
//! - **extract**: collect the band values under every labeled pixel
//! - **classification**: fit a classifier on samples and predict per pixel

pub mod classification;
pub mod extract;
mod maybe_rayon;
pub mod rasterize;

pub use classification::{
    classify, fit_samples, train_and_classify, Classifier, MaximumLikelihood, MinimumDistance, Model,
};
pub use extract::extract_samples;
pub use rasterize::rasterize;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classification::{
        classify, fit_samples, train_and_classify, Classifier, MaximumLikelihood, MinimumDistance, Model,
    };
    pub use crate::extract::extract_samples;
    pub use crate::rasterize::rasterize;
    pub use clipper_core::prelude::*;
}
