//! Maximum Likelihood classification

use super::{check_band_count, signatures_from_samples, ClassSignature, Classifier, Model};
use crate::maybe_rayon::*;
use clipper_core::classes::{ClassId, UNCLASSIFIED};
use clipper_core::Result;
use ndarray::{ArrayView1, ArrayView2};

/// Lower bound on per-band standard deviations, so constant bands and
/// single-sample classes still yield a usable density.
pub const MIN_STD_DEV: f64 = 1e-6;

/// Maximum Likelihood classifier.
///
/// Models every class as independent per-band normal distributions and
/// assigns each pixel to the class with the highest log-likelihood:
///
/// `ln P(x|c) = Σ_b [ -ln(σ_b) - 0.5·ln(2π) - (x_b-μ_b)² / (2σ_b²) ]`
#[derive(Debug, Clone, Copy, Default)]
pub struct MaximumLikelihood;

/// Class densities fitted by [`MaximumLikelihood`]
#[derive(Debug, Clone)]
pub struct MaximumLikelihoodModel {
    signatures: Vec<ClassSignature>,
    /// Precomputed Σ_b -ln(σ_b) - 0.5·ln(2π) per class
    log_consts: Vec<f64>,
    bands: usize,
}

impl MaximumLikelihoodModel {
    /// Signatures in ascending label order, spreads already floored
    pub fn signatures(&self) -> &[ClassSignature] {
        &self.signatures
    }

    fn most_likely(&self, pixel: ArrayView1<'_, f32>) -> ClassId {
        if pixel.iter().any(|v| !v.is_finite()) {
            return UNCLASSIFIED;
        }

        let mut best_ll = f64::NEG_INFINITY;
        let mut best_label = UNCLASSIFIED;
        for (sig, &log_const) in self.signatures.iter().zip(&self.log_consts) {
            let ll = pixel
                .iter()
                .zip(sig.mean.iter().zip(&sig.std_dev))
                .fold(log_const, |acc, (&v, (m, s))| {
                    let z = (f64::from(v) - m) / s;
                    acc - 0.5 * z * z
                });
            if ll > best_ll {
                best_ll = ll;
                best_label = sig.label;
            }
        }
        best_label
    }
}

impl Classifier for MaximumLikelihood {
    type Model = MaximumLikelihoodModel;

    fn name(&self) -> &'static str {
        "maximum_likelihood"
    }

    fn fit(&self, features: ArrayView2<'_, f32>, labels: &[ClassId]) -> Result<MaximumLikelihoodModel> {
        let mut signatures = signatures_from_samples(features, labels)?;
        for sig in &mut signatures {
            for s in &mut sig.std_dev {
                *s = s.max(MIN_STD_DEV);
            }
        }

        let half_ln_2pi = 0.5 * (2.0 * std::f64::consts::PI).ln();
        let log_consts = signatures
            .iter()
            .map(|sig| sig.std_dev.iter().map(|s| -s.ln() - half_ln_2pi).sum())
            .collect();

        Ok(MaximumLikelihoodModel {
            signatures,
            log_consts,
            bands: features.ncols(),
        })
    }
}

impl Model for MaximumLikelihoodModel {
    fn band_count(&self) -> usize {
        self.bands
    }

    fn predict(&self, features: ArrayView2<'_, f32>) -> Result<Vec<ClassId>> {
        check_band_count(self.bands, &features)?;
        Ok((0..features.nrows())
            .into_par_iter()
            .map(|i| self.most_likely(features.row(i)))
            .collect())
    }
}
