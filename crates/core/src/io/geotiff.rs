//! Single-band GeoTIFF reading/writing on top of the `tiff` crate
//!
//! Georeferencing is carried by the standard GeoTIFF tags: ModelPixelScale +
//! ModelTiepoint for north-up grids, ModelTransformation for rotated ones, a
//! GeoKeyDirectory holding the EPSG code, and GDAL's ASCII nodata tag.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::io::atomic::write_atomically;
use crate::raster::{GeoTransform, Raster, RasterElement, SampleKind};
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{ColorType as EncodedColor, Gray32, Gray32Float, Gray64Float};
use tiff::encoder::{TiffEncoder, TiffValue};
use tiff::tags::Tag;
use tiff::ColorType;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

const GT_MODEL_TYPE: u16 = 1024;
const GT_RASTER_TYPE: u16 = 1025;
const GEOGRAPHIC_TYPE: u16 = 2048;
const PROJECTED_CS_TYPE: u16 = 3072;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const USER_DEFINED: u16 = 32767;

/// Read a single-band GeoTIFF file into a Raster.
///
/// Any integer or float sample type is accepted and cast to `T`; samples
/// that do not fit become `T::default_nodata()`. The file must carry a
/// transform, otherwise [`Error::MissingGeoreference`] is returned. The CRS
/// is taken from the GeoKey directory when an EPSG code is present.
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    decode_geotiff(BufReader::new(file))
}

/// Read a GeoTIFF from an in-memory buffer
pub fn read_geotiff_from_buffer<T>(data: &[u8]) -> Result<Raster<T>>
where
    T: RasterElement,
{
    decode_geotiff(Cursor::new(data))
}

macro_rules! cast_samples {
    ($buf:expr) => {
        $buf.into_iter()
            .map(|v| num_traits::cast(v).unwrap_or_else(T::default_nodata))
            .collect::<Vec<T>>()
    };
}

fn decode_geotiff<T, R>(reader: R) -> Result<Raster<T>>
where
    T: RasterElement,
    R: Read + Seek,
{
    let mut decoder = Decoder::new(reader)?;

    match decoder.colortype()? {
        ColorType::Gray(_) => {}
        other => {
            return Err(Error::UnsupportedDataType(format!(
                "expected a single-band image, found {:?}",
                other
            )))
        }
    }

    let (width, height) = decoder.dimensions()?;
    let rows = height as usize;
    let cols = width as usize;

    let data: Vec<T> = match decoder.read_image()? {
        DecodingResult::U8(buf) => cast_samples!(buf),
        DecodingResult::U16(buf) => cast_samples!(buf),
        DecodingResult::U32(buf) => cast_samples!(buf),
        DecodingResult::U64(buf) => cast_samples!(buf),
        DecodingResult::I8(buf) => cast_samples!(buf),
        DecodingResult::I16(buf) => cast_samples!(buf),
        DecodingResult::I32(buf) => cast_samples!(buf),
        DecodingResult::I64(buf) => cast_samples!(buf),
        DecodingResult::F32(buf) => cast_samples!(buf),
        DecodingResult::F64(buf) => cast_samples!(buf),
        #[allow(unreachable_patterns)]
        _ => return Err(Error::UnsupportedDataType("unsupported TIFF sample format".into())),
    };

    let mut raster = Raster::from_vec(data, rows, cols)?;
    raster.set_transform(read_transform(&mut decoder)?);

    if let Ok(keys) = decoder.get_tag_u16_vec(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY)) {
        raster.set_crs(crs_from_geokeys(&keys));
    }
    if let Ok(text) = decoder.get_tag_ascii_string(Tag::from_u16_exhaustive(GDAL_NODATA)) {
        let nodata = text
            .trim_matches(|c: char| c == '\0' || c.is_whitespace())
            .parse::<f64>()
            .ok()
            .and_then(num_traits::cast);
        raster.set_nodata(nodata);
    }

    Ok(raster)
}

fn read_transform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<GeoTransform> {
    if let Ok(m) = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TRANSFORMATION)) {
        if m.len() >= 8 {
            // Row-major 4x4 matrix; only the 2D affine part is used
            return Ok(GeoTransform::from_gdal([m[3], m[0], m[1], m[7], m[4], m[5]]));
        }
    }

    let scale = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE)).ok();
    let tiepoint = decoder.get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TIEPOINT)).ok();

    match (scale, tiepoint) {
        (Some(scale), Some(tiepoint)) if scale.len() >= 2 && tiepoint.len() >= 6 => {
            // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
            let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
            let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
            Ok(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]))
        }
        _ => Err(Error::MissingGeoreference(
            "no ModelTransformation or ModelPixelScale + ModelTiepoint tags".into(),
        )),
    }
}

/// EPSG code from a GeoKey directory, projected code first
fn crs_from_geokeys(keys: &[u16]) -> Option<CRS> {
    if keys.len() < 4 {
        return None;
    }
    let count = keys[3] as usize;

    let mut projected = None;
    let mut geographic = None;
    for entry in keys[4..].chunks_exact(4).take(count) {
        let (id, location, value) = (entry[0], entry[1], entry[3]);
        // values stored in other tags are never EPSG codes
        if location != 0 || value == 0 || value == USER_DEFINED {
            continue;
        }
        match id {
            PROJECTED_CS_TYPE => projected = Some(value),
            GEOGRAPHIC_TYPE => geographic = Some(value),
            _ => {}
        }
    }

    projected
        .or(geographic)
        .map(|code| CRS::from_epsg(u32::from(code)))
}

fn geokeys_for(crs: &CRS) -> Result<Vec<u16>> {
    let epsg = crs.epsg().ok_or_else(|| {
        Error::MissingGeoreference(format!("{} has no EPSG code to encode", crs))
    })?;
    let code = u16::try_from(epsg)
        .map_err(|_| Error::UnsupportedCrs(format!("EPSG:{} does not fit a GeoKey", epsg)))?;

    let (model, key) = if crs.is_geographic() {
        (MODEL_TYPE_GEOGRAPHIC, GEOGRAPHIC_TYPE)
    } else {
        (MODEL_TYPE_PROJECTED, PROJECTED_CS_TYPE)
    };

    Ok(vec![
        1, 1, 0, 3, // version 1.1.0, 3 keys
        GT_MODEL_TYPE, 0, 1, model,
        GT_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA,
        key, 0, 1, code,
    ])
}

/// Tags written into every image
struct GeoTags {
    transform: GeoTransform,
    geokeys: Vec<u16>,
    nodata: Option<String>,
}

impl GeoTags {
    fn for_raster<T: RasterElement>(raster: &Raster<T>) -> Result<Self> {
        let crs = raster
            .crs()
            .ok_or_else(|| Error::MissingGeoreference("raster has no CRS".into()))?;
        Ok(Self {
            transform: *raster.transform(),
            geokeys: geokeys_for(crs)?,
            nodata: raster.nodata().and_then(RasterElement::to_f64).map(|v| v.to_string()),
        })
    }
}

fn encode_image<C, W>(encoder: &mut TiffEncoder<W>, rows: usize, cols: usize, data: &[C::Inner], tags: &GeoTags) -> Result<()>
where
    C: EncodedColor,
    [C::Inner]: TiffValue,
    W: Write + Seek,
{
    let mut image = encoder.new_image::<C>(cols as u32, rows as u32)?;
    let dir = image.encoder();
    let gt = &tags.transform;

    if gt.is_rotated() {
        let matrix = [
            gt.pixel_width, gt.row_rotation, 0.0, gt.origin_x,
            gt.col_rotation, gt.pixel_height, 0.0, gt.origin_y,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        dir.write_tag(Tag::from_u16_exhaustive(MODEL_TRANSFORMATION), &matrix[..])?;
    } else {
        let scale = [gt.pixel_width, -gt.pixel_height, 0.0];
        dir.write_tag(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE), &scale[..])?;
        let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
        dir.write_tag(Tag::from_u16_exhaustive(MODEL_TIEPOINT), &tiepoint[..])?;
    }

    dir.write_tag(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY), tags.geokeys.as_slice())?;
    if let Some(nodata) = &tags.nodata {
        dir.write_tag(Tag::from_u16_exhaustive(GDAL_NODATA), nodata.as_str())?;
    }

    image.write_data(data)?;
    Ok(())
}

/// Encode a Raster as a single-band GeoTIFF.
///
/// Unsigned cells are written as 32-bit unsigned integers, `f32` as 32-bit
/// float and everything else as 64-bit float. The raster must carry a CRS
/// with an EPSG code.
pub fn write_geotiff_to_buffer<T>(raster: &Raster<T>) -> Result<Vec<u8>>
where
    T: RasterElement,
{
    let tags = GeoTags::for_raster(raster)?;
    let (rows, cols) = raster.shape();
    let mut buf = Vec::new();

    {
        let mut encoder = TiffEncoder::new(Cursor::new(&mut buf))?;
        match (T::KIND, std::mem::size_of::<T>()) {
            (SampleKind::Unsigned, _) => {
                let data: Vec<u32> = raster
                    .data()
                    .iter()
                    .map(|&v| num_traits::cast(v).unwrap_or(0))
                    .collect();
                encode_image::<Gray32, _>(&mut encoder, rows, cols, &data, &tags)?;
            }
            (SampleKind::Float, 4) => {
                let data: Vec<f32> = raster
                    .data()
                    .iter()
                    .map(|&v| num_traits::cast(v).unwrap_or(f32::NAN))
                    .collect();
                encode_image::<Gray32Float, _>(&mut encoder, rows, cols, &data, &tags)?;
            }
            _ => {
                let data: Vec<f64> = raster
                    .data()
                    .iter()
                    .map(|&v| num_traits::cast(v).unwrap_or(f64::NAN))
                    .collect();
                encode_image::<Gray64Float, _>(&mut encoder, rows, cols, &data, &tags)?;
            }
        }
    }

    Ok(buf)
}

/// Write a Raster to a GeoTIFF file, replacing `path` atomically
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let buf = write_geotiff_to_buffer(raster)?;
    write_atomically(path, |w| Ok(w.write_all(&buf)?))
}
