//! Fit on samples, predict over a band stack

use super::{Classifier, Model};
use clipper_core::classes::{ClassId, UNCLASSIFIED};
use clipper_core::raster::{BandStack, Raster};
use clipper_core::table::SampleTable;
use clipper_core::{ClassMap, Error, Result};
use ndarray::Axis;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Fit `classifier` on a sample table.
///
/// Rows with any non-finite band value are dropped before fitting. At least
/// two distinct classes must remain, otherwise [`Error::Training`] is
/// returned; this also covers an empty table.
pub fn fit_samples<C: Classifier>(table: &SampleTable, classifier: &C) -> Result<C::Model> {
    let features = table.features();
    let keep: Vec<usize> = features
        .rows()
        .into_iter()
        .enumerate()
        .filter(|(_, row)| row.iter().all(|v| v.is_finite()))
        .map(|(i, _)| i)
        .collect();

    let dropped = table.len() - keep.len();
    if dropped > 0 {
        warn!(dropped, kept = keep.len(), "dropping training rows with missing band values");
    }

    let labels: Vec<ClassId> = keep.iter().map(|&i| table.classes()[i]).collect();
    let distinct: BTreeSet<ClassId> = labels.iter().copied().collect();
    if distinct.len() < 2 {
        return Err(Error::Training(format!(
            "need at least 2 classes with complete samples, found {} ({} usable rows)",
            distinct.len(),
            labels.len()
        )));
    }

    info!(
        classifier = classifier.name(),
        samples = labels.len(),
        classes = distinct.len(),
        "fitting classifier"
    );

    if dropped == 0 {
        classifier.fit(features, &labels)
    } else {
        let selected = features.select(Axis(0), &keep);
        classifier.fit(selected.view(), &labels)
    }
}

/// Predict a class for every pixel of `stack`.
///
/// Pixels with a missing (non-finite) value in any band are never handed
/// to the model; they stay [`UNCLASSIFIED`]. The class map shares the
/// stack's grid and uses 0 as nodata.
pub fn classify<M: Model>(stack: &BandStack, model: &M) -> Result<ClassMap> {
    if model.band_count() != stack.band_count() {
        return Err(Error::Alignment(format!(
            "model was fitted on {} bands but the stack has {}",
            model.band_count(),
            stack.band_count()
        )));
    }

    let pixels = stack.pixel_matrix();
    let valid: Vec<usize> = pixels
        .rows()
        .into_iter()
        .enumerate()
        .filter(|(_, row)| row.iter().all(|v| v.is_finite()))
        .map(|(i, _)| i)
        .collect();

    let excluded = pixels.nrows() - valid.len();
    if excluded > 0 {
        debug!(excluded, "pixels with missing band values left unclassified");
    }

    let predictions = if excluded == 0 {
        model.predict(pixels.view())?
    } else {
        model.predict(pixels.select(Axis(0), &valid).view())?
    };
    if predictions.len() != valid.len() {
        return Err(Error::Training(format!(
            "model returned {} predictions for {} pixels",
            predictions.len(),
            valid.len()
        )));
    }

    let mut classmap: ClassMap = Raster::on_grid(&stack.grid(), UNCLASSIFIED);
    classmap.set_nodata(Some(UNCLASSIFIED));
    let cols = stack.cols();
    let data = classmap.data_mut();
    for (&index, &id) in valid.iter().zip(&predictions) {
        data[[index / cols, index % cols]] = id;
    }

    info!(
        pixels = pixels.nrows(),
        classified = valid.len(),
        unclassified = classmap.count_equal(UNCLASSIFIED),
        "classified band stack"
    );
    Ok(classmap)
}

/// Fit on `table`, then classify every pixel of `stack`
pub fn train_and_classify<C: Classifier>(stack: &BandStack, table: &SampleTable, classifier: &C) -> Result<ClassMap> {
    let model = fit_samples(table, classifier)?;
    classify(stack, &model)
}
