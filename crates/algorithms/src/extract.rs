//! Training sample extraction

use clipper_core::classes::{ClassMapping, UNCLASSIFIED};
use clipper_core::raster::BandStack;
use clipper_core::table::SampleTable;
use clipper_core::{Error, Mask, Result};
use ndarray::Array2;
use tracing::debug;

/// Collect the band values of every labeled pixel.
///
/// Rows are grouped by class id in ascending order; within a class they
/// follow row-major pixel order. Background pixels (0) are skipped. Pixels
/// with missing band values are kept as NaN.
///
/// The table is sized in a first counting pass and filled in a second one,
/// so memory stays proportional to the number of labeled pixels.
///
/// # Errors
/// - [`Error::SizeMismatch`] if the mask and the stack differ in shape
/// - [`Error::UnknownClass`] for a mask value missing from `mapping`
pub fn extract_samples(stack: &BandStack, mask: &Mask, mapping: &ClassMapping) -> Result<SampleTable> {
    let (rows, cols) = stack.shape();
    if mask.shape() != (rows, cols) {
        return Err(Error::SizeMismatch {
            er: rows,
            ec: cols,
            ar: mask.rows(),
            ac: mask.cols(),
        });
    }

    // Pass 1: per-class histogram
    let mut counts = vec![0usize; mapping.max_id() as usize + 1];
    for &id in mask.data().iter() {
        if id == UNCLASSIFIED {
            continue;
        }
        if !mapping.contains_id(id) {
            return Err(Error::UnknownClass(id));
        }
        counts[id as usize] += 1;
    }

    let mut cursors = Vec::with_capacity(counts.len());
    let mut total = 0usize;
    for &count in &counts {
        cursors.push(total);
        total += count;
    }

    // Pass 2: scatter rows to their class block
    let bands = stack.band_count();
    let data = stack.view();
    let mut values = Array2::<f32>::zeros((total, bands));
    let mut classes = vec![UNCLASSIFIED; total];
    for ((row, col), &id) in mask.data().indexed_iter() {
        if id == UNCLASSIFIED {
            continue;
        }
        let dst = cursors[id as usize];
        cursors[id as usize] += 1;
        for band in 0..bands {
            values[[dst, band]] = data[[band, row, col]];
        }
        classes[dst] = id;
    }

    for (name, id) in mapping.iter() {
        debug!(class = name, id, samples = counts[id as usize], "extracted samples");
    }

    SampleTable::new(stack.band_names(), values, classes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipper_core::band::BandId;
    use clipper_core::raster::{GeoTransform, Raster};
    use clipper_core::CRS;
    use ndarray::Array3;

    /// Two bands on a 4x4 grid: band 0 = pixel index, band 1 = 100 + pixel index
    fn stack() -> BandStack {
        let mut data = Array3::<f32>::zeros((2, 4, 4));
        for ((b, r, c), v) in data.indexed_iter_mut() {
            *v = (b * 100 + r * 4 + c) as f32;
        }
        BandStack::new(
            vec![BandId::B04, BandId::B8A],
            data,
            GeoTransform::new(0.0, 4.0, 1.0, -1.0),
            CRS::from_epsg(32631),
        )
        .unwrap()
    }

    fn mask(values: [[u16; 4]; 4]) -> Mask {
        let flat: Vec<u16> = values.iter().flatten().copied().collect();
        Raster::from_vec(flat, 4, 4).unwrap()
    }

    #[test]
    fn test_rows_grouped_by_class() {
        let mapping = ClassMapping::from_names(["water", "land"]).unwrap();
        // land listed first in scan order, but water (1) must come first
        let m = mask([[2, 0, 0, 1], [0, 0, 0, 0], [1, 0, 2, 0], [0, 0, 0, 0]]);
        let table = extract_samples(&stack(), &m, &mapping).unwrap();

        assert_eq!(table.columns(), &["B04".to_string(), "B8A".to_string()]);
        assert_eq!(table.classes(), &[1, 1, 2, 2]);
        let first_band: Vec<f32> = table.features().column(0).to_vec();
        // water at pixels 3 and 8, land at 0 and 10
        assert_eq!(first_band, vec![3.0, 8.0, 0.0, 10.0]);
        assert_eq!(table.row(0).unwrap().to_vec(), vec![3.0, 103.0]);
    }

    #[test]
    fn test_every_labeled_pixel_has_one_row() {
        let mapping = ClassMapping::from_names(["a", "b", "c"]).unwrap();
        let m = mask([[1, 1, 3, 0], [2, 0, 3, 3], [0, 0, 0, 1], [2, 2, 2, 0]]);
        let table = extract_samples(&stack(), &m, &mapping).unwrap();

        assert_eq!(table.len(), m.len() - m.count_equal(0));
        for id in mapping.ids() {
            let rows = table.classes().iter().filter(|&&c| c == id).count();
            assert_eq!(rows, m.count_equal(id));
        }
        assert!(table.classes().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_nan_values_are_kept() {
        let mut s = stack().view().to_owned();
        s[[1, 0, 0]] = f32::NAN;
        let s = BandStack::new(
            vec![BandId::B04, BandId::B8A],
            s,
            GeoTransform::new(0.0, 4.0, 1.0, -1.0),
            CRS::from_epsg(32631),
        )
        .unwrap();
        let mapping = ClassMapping::from_names(["water"]).unwrap();
        let m = mask([[1, 0, 0, 0], [0; 4], [0; 4], [0; 4]]);

        let table = extract_samples(&s, &m, &mapping).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.features()[[0, 1]].is_nan());
    }

    #[test]
    fn test_empty_mask() {
        let mapping = ClassMapping::new();
        let m = mask([[0; 4]; 4]);
        let table = extract_samples(&stack(), &m, &mapping).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.band_count(), 2);
    }

    #[test]
    fn test_unknown_class() {
        let mapping = ClassMapping::from_names(["water"]).unwrap();
        let m = mask([[1, 2, 0, 0], [0; 4], [0; 4], [0; 4]]);
        assert!(matches!(
            extract_samples(&stack(), &m, &mapping),
            Err(Error::UnknownClass(2))
        ));
    }

    #[test]
    fn test_shape_mismatch() {
        let mapping = ClassMapping::new();
        let m: Mask = Raster::new(3, 4);
        assert!(matches!(
            extract_samples(&stack(), &m, &mapping),
            Err(Error::SizeMismatch { .. })
        ));
    }
}
