//! Supervised pixel classification
//!
//! A [`Classifier`] is fitted on labeled band vectors and yields a
//! [`Model`] that predicts one class id per row. Two reference
//! classifiers are provided:
//! - **Minimum Distance**: nearest class centroid
//! - **Maximum Likelihood**: per-band Gaussian per class
//!
//! [`train_and_classify`] wires a classifier to a sample table and a band
//! stack.

mod driver;
mod maximum_likelihood;
mod minimum_distance;
mod signature;

pub use driver::{classify, fit_samples, train_and_classify};
pub use maximum_likelihood::{MaximumLikelihood, MaximumLikelihoodModel, MIN_STD_DEV};
pub use minimum_distance::{MinimumDistance, MinimumDistanceModel};
pub use signature::{signatures_from_samples, ClassSignature};

use clipper_core::classes::ClassId;
use clipper_core::Result;
use ndarray::ArrayView2;

/// Something that learns a [`Model`] from labeled samples.
///
/// `features` has one row per sample and one column per band; `labels`
/// holds the class id of each row.
pub trait Classifier {
    type Model: Model;

    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Fit a model.
    ///
    /// Fails with [`Error::Training`](clipper_core::Error::Training) on
    /// fewer than two distinct labels, mismatched lengths or non-finite
    /// features.
    fn fit(&self, features: ArrayView2<'_, f32>, labels: &[ClassId]) -> Result<Self::Model>;
}

/// A fitted classifier.
pub trait Model {
    /// Number of bands the model was fitted on
    fn band_count(&self) -> usize;

    /// Predict one class id per feature row, in row order
    fn predict(&self, features: ArrayView2<'_, f32>) -> Result<Vec<ClassId>>;
}

/// Reject feature matrices that do not match the model's band count
pub(crate) fn check_band_count(expected: usize, features: &ArrayView2<'_, f32>) -> Result<()> {
    if features.ncols() != expected {
        return Err(clipper_core::Error::InvalidParameter {
            name: "features",
            value: format!("{} columns", features.ncols()),
            reason: format!("model was fitted on {} bands", expected),
        });
    }
    Ok(())
}
