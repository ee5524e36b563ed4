//! Minimum Distance classification

use super::{check_band_count, signatures_from_samples, ClassSignature, Classifier, Model};
use crate::maybe_rayon::*;
use clipper_core::classes::{ClassId, UNCLASSIFIED};
use clipper_core::Result;
use ndarray::{ArrayView1, ArrayView2};

/// Minimum Distance classifier.
///
/// Assigns each pixel to the class with the nearest centroid (Euclidean
/// distance over all bands). Simple and fast but does not account for
/// class variance.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinimumDistance;

/// Class centroids fitted by [`MinimumDistance`]
#[derive(Debug, Clone)]
pub struct MinimumDistanceModel {
    signatures: Vec<ClassSignature>,
    bands: usize,
}

impl MinimumDistanceModel {
    /// Signatures in ascending label order
    pub fn signatures(&self) -> &[ClassSignature] {
        &self.signatures
    }

    fn nearest(&self, pixel: ArrayView1<'_, f32>) -> ClassId {
        if pixel.iter().any(|v| !v.is_finite()) {
            return UNCLASSIFIED;
        }

        let mut best_dist = f64::INFINITY;
        let mut best_label = UNCLASSIFIED;
        // ascending labels + strict comparison: ties go to the lowest id
        for sig in &self.signatures {
            let dist: f64 = pixel
                .iter()
                .zip(&sig.mean)
                .map(|(&v, m)| (f64::from(v) - m).powi(2))
                .sum();
            if dist < best_dist {
                best_dist = dist;
                best_label = sig.label;
            }
        }
        best_label
    }
}

impl Classifier for MinimumDistance {
    type Model = MinimumDistanceModel;

    fn name(&self) -> &'static str {
        "minimum_distance"
    }

    fn fit(&self, features: ArrayView2<'_, f32>, labels: &[ClassId]) -> Result<MinimumDistanceModel> {
        let signatures = signatures_from_samples(features, labels)?;
        Ok(MinimumDistanceModel {
            signatures,
            bands: features.ncols(),
        })
    }
}

impl Model for MinimumDistanceModel {
    fn band_count(&self) -> usize {
        self.bands
    }

    fn predict(&self, features: ArrayView2<'_, f32>) -> Result<Vec<ClassId>> {
        check_band_count(self.bands, &features)?;
        Ok((0..features.nrows())
            .into_par_iter()
            .map(|i| self.nearest(features.row(i)))
            .collect())
    }
}
