//! Labeled training samples

use crate::classes::ClassId;
use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use std::collections::BTreeMap;

/// Name of the label column in persisted tables
pub const CLASS_COLUMN: &str = "class";

/// Feature matrix plus label column, one row per labeled pixel.
///
/// `values` has shape `(rows, columns.len())`. Rows produced by the sample
/// extractor are grouped by class id in ascending order.
#[derive(Debug, Clone)]
pub struct SampleTable {
    columns: Vec<String>,
    values: Array2<f32>,
    classes: Vec<ClassId>,
}

impl SampleTable {
    /// Create a table, checking that columns, values and labels agree
    pub fn new(columns: Vec<String>, values: Array2<f32>, classes: Vec<ClassId>) -> Result<Self> {
        let (rows, cols) = values.dim();
        if cols != columns.len() || rows != classes.len() {
            return Err(Error::SizeMismatch {
                er: classes.len(),
                ec: columns.len(),
                ar: rows,
                ac: cols,
            });
        }
        if let Some(dup) = columns
            .iter()
            .enumerate()
            .find_map(|(i, c)| columns[..i].contains(c).then_some(c))
        {
            return Err(Error::Schema(format!("column '{}' appears twice", dup)));
        }
        if columns.iter().any(|c| c == CLASS_COLUMN) {
            return Err(Error::Schema(format!(
                "'{}' is reserved for the label column",
                CLASS_COLUMN
            )));
        }

        Ok(Self {
            columns,
            values,
            classes,
        })
    }

    /// Table with the given columns and no rows
    pub fn empty(columns: Vec<String>) -> Self {
        let width = columns.len();
        Self {
            columns,
            values: Array2::zeros((0, width)),
            classes: Vec::new(),
        }
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Number of feature columns
    pub fn band_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Feature matrix, shape `(len, band_count)`
    pub fn features(&self) -> ArrayView2<'_, f32> {
        self.values.view()
    }

    /// Feature vector of one row
    pub fn row(&self, index: usize) -> Option<ArrayView1<'_, f32>> {
        (index < self.len()).then(|| self.values.index_axis(Axis(0), index))
    }

    /// Label column
    pub fn classes(&self) -> &[ClassId] {
        &self.classes
    }

    /// Rows per class id, ascending
    pub fn class_counts(&self) -> BTreeMap<ClassId, usize> {
        let mut counts = BTreeMap::new();
        for &id in &self.classes {
            *counts.entry(id).or_insert(0) += 1;
        }
        counts
    }

    /// Distinct class ids, ascending
    pub fn distinct_classes(&self) -> Vec<ClassId> {
        self.class_counts().into_keys().collect()
    }

    /// Exact equality where NaN equals NaN
    pub fn same_as(&self, other: &SampleTable) -> bool {
        self.columns == other.columns
            && self.classes == other.classes
            && self.values.dim() == other.values.dim()
            && self
                .values
                .iter()
                .zip(other.values.iter())
                .all(|(a, b)| a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan()))
    }
}
