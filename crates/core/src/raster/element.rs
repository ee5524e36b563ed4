//! Raster element trait for generic cell values

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// How a cell type is laid out in a TIFF strip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    /// Unsigned integer samples
    Unsigned,
    /// Signed integer samples
    Signed,
    /// IEEE floating point samples
    Float,
}

/// Trait for types that can be stored in a raster cell.
///
/// Masks and class maps use unsigned integers, band data uses `f32`.
pub trait RasterElement:
    Copy + Clone + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// Sample layout used when encoding this type
    const KIND: SampleKind;

    /// Value substituted when a decoded sample does not fit this type
    fn default_nodata() -> Self;

    /// Check if this value represents no-data
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    /// Whether this type is a floating point type
    fn is_float() -> bool {
        Self::KIND == SampleKind::Float
    }

    /// Convert self to f64
    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }
}

macro_rules! impl_raster_element_int {
    ($t:ty, $kind:expr) => {
        impl RasterElement for $t {
            const KIND: SampleKind = $kind;

            fn default_nodata() -> Self {
                <$t>::MIN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                nodata == Some(*self)
            }
        }
    };
}

macro_rules! impl_raster_element_float {
    ($t:ty) => {
        impl RasterElement for $t {
            const KIND: SampleKind = SampleKind::Float;

            fn default_nodata() -> Self {
                <$t>::NAN
            }

            fn is_nodata(&self, nodata: Option<Self>) -> bool {
                if self.is_nan() {
                    return true;
                }
                match nodata {
                    Some(nd) => (self - nd).abs() < <$t>::EPSILON * 100.0,
                    None => false,
                }
            }
        }
    };
}

impl_raster_element_int!(u8, SampleKind::Unsigned);
impl_raster_element_int!(u16, SampleKind::Unsigned);
impl_raster_element_int!(u32, SampleKind::Unsigned);
impl_raster_element_int!(i16, SampleKind::Signed);
impl_raster_element_int!(i32, SampleKind::Signed);
impl_raster_element_float!(f32);
impl_raster_element_float!(f64);
