//! Multi-band reflectance stack

use crate::band::BandId;
use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, GridSpec, Raster};
use ndarray::{Array2, Array3, ArrayView1, ArrayView2, ArrayView3, Axis};

/// Maximum transform difference, in pixel widths, still considered aligned
const ALIGNMENT_TOLERANCE: f64 = 1e-9;

/// Ordered stack of single-band grids sharing one pixel grid.
///
/// Data is stored as `(band, row, col)`. Every band has the same shape,
/// transform and CRS; the constructor enforces it. A stack is built once
/// and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct BandStack {
    data: Array3<f32>,
    bands: Vec<BandId>,
    transform: GeoTransform,
    crs: CRS,
}

impl BandStack {
    /// Create a stack from an already stacked array.
    ///
    /// `bands` must name each slice along axis 0 exactly once.
    pub fn new(bands: Vec<BandId>, data: Array3<f32>, transform: GeoTransform, crs: CRS) -> Result<Self> {
        if bands.len() != data.len_of(Axis(0)) {
            return Err(Error::InvalidParameter {
                name: "bands",
                value: format!("{} identifiers", bands.len()),
                reason: format!("stack holds {} band slices", data.len_of(Axis(0))),
            });
        }
        if bands.is_empty() {
            return Err(Error::InvalidParameter {
                name: "bands",
                value: "[]".into(),
                reason: "a band stack needs at least one band".into(),
            });
        }
        for (i, band) in bands.iter().enumerate() {
            if bands[..i].contains(band) {
                return Err(Error::InvalidParameter {
                    name: "bands",
                    value: band.to_string(),
                    reason: "band listed twice".into(),
                });
            }
        }
        if !transform.is_invertible() {
            return Err(Error::InvalidParameter {
                name: "transform",
                value: format!("{:?}", transform.to_gdal()),
                reason: "affine transform is not invertible".into(),
            });
        }

        Ok(Self {
            data: data.as_standard_layout().into_owned(),
            bands,
            transform,
            crs,
        })
    }

    /// Stack single-band rasters in the given order.
    ///
    /// The first layer defines the grid; every other layer must match its
    /// shape, transform and CRS, otherwise [`Error::Alignment`] is returned.
    /// Layers without a CRS are rejected with [`Error::MissingGeoreference`].
    pub fn from_layers(layers: Vec<(BandId, Raster<f32>)>) -> Result<Self> {
        let Some((first_band, first)) = layers.first() else {
            return Err(Error::InvalidParameter {
                name: "bands",
                value: "[]".into(),
                reason: "a band stack needs at least one band".into(),
            });
        };

        let (rows, cols) = first.shape();
        let transform = *first.transform();
        let crs = first
            .crs()
            .cloned()
            .ok_or_else(|| Error::MissingGeoreference(format!("band {} has no CRS", first_band)))?;
        let tolerance = ALIGNMENT_TOLERANCE * transform.cell_size().max(1.0);

        for (band, layer) in &layers[1..] {
            if layer.shape() != (rows, cols) {
                return Err(Error::Alignment(format!(
                    "band {} is {}x{} but band {} is {}x{}",
                    band,
                    layer.cols(),
                    layer.rows(),
                    first_band,
                    cols,
                    rows
                )));
            }
            if !layer.transform().approx_eq(&transform, tolerance) {
                return Err(Error::Alignment(format!(
                    "band {} transform {:?} differs from band {} transform {:?}",
                    band,
                    layer.transform().to_gdal(),
                    first_band,
                    transform.to_gdal()
                )));
            }
            match layer.crs() {
                Some(other) if other.is_equivalent(&crs) => {}
                Some(other) => {
                    return Err(Error::Alignment(format!(
                        "band {} CRS {} differs from band {} CRS {}",
                        band, other, first_band, crs
                    )))
                }
                None => {
                    return Err(Error::MissingGeoreference(format!("band {} has no CRS", band)));
                }
            }
        }

        let mut data = Array3::<f32>::zeros((layers.len(), rows, cols));
        let mut bands = Vec::with_capacity(layers.len());
        for (i, (band, layer)) in layers.into_iter().enumerate() {
            data.index_axis_mut(Axis(0), i).assign(layer.data());
            bands.push(band);
        }

        Self::new(bands, data, transform, crs)
    }

    /// Number of bands
    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    /// Spatial dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows(), self.cols())
    }

    /// Band identifiers in stack order
    pub fn bands(&self) -> &[BandId] {
        &self.bands
    }

    /// Band identifiers as column names
    pub fn band_names(&self) -> Vec<String> {
        self.bands.iter().map(|b| b.to_string()).collect()
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn crs(&self) -> &CRS {
        &self.crs
    }

    /// Pixel grid of every band
    pub fn grid(&self) -> GridSpec {
        GridSpec::new(self.rows(), self.cols(), self.transform, Some(self.crs.clone()))
    }

    /// Full `(band, row, col)` array
    pub fn view(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    /// One band by position
    pub fn band(&self, index: usize) -> Option<ArrayView2<'_, f32>> {
        (index < self.band_count()).then(|| self.data.index_axis(Axis(0), index))
    }

    /// One band by identifier
    pub fn band_by_id(&self, id: BandId) -> Option<ArrayView2<'_, f32>> {
        let index = self.bands.iter().position(|&b| b == id)?;
        self.band(index)
    }

    /// Band vector of one pixel
    pub fn pixel(&self, row: usize, col: usize) -> Result<ArrayView1<'_, f32>> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        Ok(self.data.slice(ndarray::s![.., row, col]))
    }

    /// Flatten to one feature vector per pixel: shape `(rows * cols, bands)`,
    /// pixels in row-major order.
    pub fn pixel_matrix(&self) -> Array2<f32> {
        let (bands, rows, cols) = self.data.dim();
        let mut matrix = Array2::<f32>::zeros((rows * cols, bands));
        for ((b, r, c), &v) in self.data.indexed_iter() {
            matrix[[r * cols + c, b]] = v;
        }
        matrix
    }
}
