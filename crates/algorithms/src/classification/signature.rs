//! Per-class spectral signatures

use clipper_core::classes::ClassId;
use clipper_core::{Error, Result};
use ndarray::ArrayView2;
use std::collections::BTreeMap;

/// Mean and spread of one class across every band.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassSignature {
    /// Class id (output value)
    pub label: ClassId,
    /// Number of training samples
    pub count: usize,
    /// Per-band mean
    pub mean: Vec<f64>,
    /// Per-band sample standard deviation (0 for a single sample)
    pub std_dev: Vec<f64>,
}

/// Derive one signature per distinct label, sorted by label.
///
/// # Errors
/// [`Error::Training`] when features and labels disagree in length, when
/// any feature is non-finite, or when fewer than two classes are present.
pub fn signatures_from_samples(features: ArrayView2<'_, f32>, labels: &[ClassId]) -> Result<Vec<ClassSignature>> {
    let (rows, bands) = features.dim();
    if rows != labels.len() {
        return Err(Error::Training(format!(
            "{} feature rows but {} labels",
            rows,
            labels.len()
        )));
    }
    if bands == 0 {
        return Err(Error::Training("samples have no bands".into()));
    }
    if features.iter().any(|v| !v.is_finite()) {
        return Err(Error::Training("training samples contain non-finite values".into()));
    }

    // Accumulate sum and sum of squares per class
    let mut sums: BTreeMap<ClassId, (usize, Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for (row, &label) in features.rows().into_iter().zip(labels) {
        let (n, sum, sq) = sums
            .entry(label)
            .or_insert_with(|| (0, vec![0.0; bands], vec![0.0; bands]));
        *n += 1;
        for (b, &v) in row.iter().enumerate() {
            let v = f64::from(v);
            sum[b] += v;
            sq[b] += v * v;
        }
    }

    if sums.len() < 2 {
        return Err(Error::Training(format!(
            "need samples from at least 2 classes, found {}",
            sums.len()
        )));
    }

    let signatures = sums
        .into_iter()
        .map(|(label, (count, sum, sq))| {
            let n = count as f64;
            let mean: Vec<f64> = sum.iter().map(|s| s / n).collect();
            let std_dev = if count < 2 {
                vec![0.0; bands]
            } else {
                sq.iter()
                    .zip(&mean)
                    .map(|(q, m)| ((q - n * m * m) / (n - 1.0)).max(0.0).sqrt())
                    .collect()
            };
            ClassSignature {
                label,
                count,
                mean,
                std_dev,
            }
        })
        .collect();

    Ok(signatures)
}
