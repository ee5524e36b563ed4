//! Band file resolution
//!
//! A [`BandLocator`] turns a band identifier and a resolution into the one
//! file holding that band. Resolution happens for every requested band before
//! any pixel is read, so a missing band fails the run early.

use clipper_core::band::{BandId, Resolution};
use clipper_core::{Error, Result};
use glob::Pattern;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolves band identifiers to raster files.
pub trait BandLocator {
    /// Every file that could hold `band` at `resolution`
    fn candidates(&self, band: BandId, resolution: Resolution) -> Result<Vec<PathBuf>>;

    /// The single file holding `band` at `resolution`.
    ///
    /// # Errors
    /// - [`Error::MissingBand`] when nothing matches
    /// - [`Error::AmbiguousBand`] when more than one file matches
    fn locate(&self, band: BandId, resolution: Resolution) -> Result<PathBuf> {
        let mut candidates = self.candidates(band, resolution)?;
        match candidates.len() {
            0 => Err(Error::MissingBand { band, resolution }),
            1 => Ok(candidates.remove(0)),
            _ => Err(Error::AmbiguousBand {
                band,
                resolution,
                candidates,
            }),
        }
    }
}

/// Sentinel-2 `.SAFE` product layout:
/// `GRANULE/<granule>/IMG_DATA/R<res>m/<tile>_<datetime>_<band>_<res>m.<ext>`
///
/// Only `.tif`/`.tiff` files are candidates. A band present solely as
/// JPEG 2000 fails with [`Error::UnsupportedDataType`] naming the file.
#[derive(Debug, Clone)]
pub struct SafeProductLocator {
    root: PathBuf,
}

impl SafeProductLocator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn pattern(&self, band: BandId, resolution: Resolution) -> String {
        let root = Pattern::escape(&self.root.to_string_lossy());
        format!(
            "{}/GRANULE/*/IMG_DATA/{}/*_{}_*",
            root.trim_end_matches('/'),
            resolution.dir_name(),
            band
        )
    }
}

impl BandLocator for SafeProductLocator {
    fn candidates(&self, band: BandId, resolution: Resolution) -> Result<Vec<PathBuf>> {
        let pattern = self.pattern(band, resolution);
        let paths = glob::glob(&pattern).map_err(|e| Error::InvalidParameter {
            name: "product_root",
            value: self.root.display().to_string(),
            reason: e.to_string(),
        })?;

        let mut found = Vec::new();
        let mut jpeg2000 = Vec::new();
        for entry in paths {
            let path = entry.map_err(|e| Error::Io(e.into_error()))?;
            if !path.is_file() {
                continue;
            }
            if is_geotiff(&path) {
                found.push(path);
            } else if is_jpeg2000(&path) {
                jpeg2000.push(path);
            }
        }
        debug!(%band, %resolution, matches = found.len(), pattern = %pattern, "band candidates");

        // Products ship JPEG 2000 bands; only GeoTIFF conversions can be read
        if found.is_empty() {
            if let Some(path) = jpeg2000.into_iter().min() {
                return Err(jpeg2000_unsupported(&path));
            }
        }
        found.sort();
        Ok(found)
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

/// `.tif` or `.tiff`
pub fn is_geotiff(path: &Path) -> bool {
    has_extension(path, &["tif", "tiff"])
}

/// `.jp2` or `.j2k`
pub fn is_jpeg2000(path: &Path) -> bool {
    has_extension(path, &["jp2", "j2k"])
}

/// Error for a band file that is JPEG 2000 encoded
pub fn jpeg2000_unsupported(path: &Path) -> Error {
    Error::UnsupportedDataType(format!(
        "{} is JPEG 2000; convert the band to GeoTIFF first",
        path.display()
    ))
}

/// Explicit band to file mapping; the resolution is ignored.
#[derive(Debug, Clone, Default)]
pub struct BandPaths {
    paths: HashMap<BandId, PathBuf>,
}

impl BandPaths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, band: BandId, path: impl Into<PathBuf>) -> Self {
        self.insert(band, path);
        self
    }

    pub fn insert(&mut self, band: BandId, path: impl Into<PathBuf>) {
        self.paths.insert(band, path.into());
    }
}

impl BandLocator for BandPaths {
    fn candidates(&self, band: BandId, _resolution: Resolution) -> Result<Vec<PathBuf>> {
        Ok(self.paths.get(&band).cloned().into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    fn product() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let img = dir.path().join("GRANULE/L2A_T31TCJ_A000001/IMG_DATA");
        touch(&img.join("R60m/T31TCJ_20230101T105441_B04_60m.tif"));
        touch(&img.join("R60m/T31TCJ_20230101T105441_B8A_60m.tif"));
        touch(&img.join("R20m/T31TCJ_20230101T105441_B04_20m.tif"));
        fs::create_dir_all(img.join("R60m/T31TCJ_20230101T105441_B02_dir")).unwrap();
        dir
    }

    #[test]
    fn test_locate_by_resolution() {
        let dir = product();
        let locator = SafeProductLocator::new(dir.path());

        let b04 = locator.locate(BandId::B04, Resolution::R60).unwrap();
        assert!(b04.ends_with("R60m/T31TCJ_20230101T105441_B04_60m.tif"));
        let b04 = locator.locate(BandId::B04, Resolution::R20).unwrap();
        assert!(b04.ends_with("R20m/T31TCJ_20230101T105441_B04_20m.tif"));
    }

    #[test]
    fn test_missing_band() {
        let dir = product();
        let locator = SafeProductLocator::new(dir.path());
        assert!(matches!(
            locator.locate(BandId::B8A, Resolution::R20),
            Err(Error::MissingBand {
                band: BandId::B8A,
                resolution: Resolution::R20
            })
        ));
        // directories never count as band files
        assert!(matches!(
            locator.locate(BandId::B02, Resolution::R60),
            Err(Error::MissingBand { .. })
        ));
    }

    #[test]
    fn test_ambiguous_band_lists_sorted_candidates() {
        let dir = product();
        let second = dir
            .path()
            .join("GRANULE/L2A_T31TCJ_A000002/IMG_DATA/R60m/T31TCJ_20230102T105441_B04_60m.tif");
        touch(&second);

        let locator = SafeProductLocator::new(dir.path());
        match locator.locate(BandId::B04, Resolution::R60) {
            Err(Error::AmbiguousBand { candidates, .. }) => {
                assert_eq!(candidates.len(), 2);
                assert!(candidates[0] < candidates[1]);
            }
            other => panic!("expected AmbiguousBand, got {:?}", other),
        }
    }

    #[test]
    fn test_band_code_is_delimited() {
        let dir = product();
        // B8A must not be found by a B08 query
        let locator = SafeProductLocator::new(dir.path());
        assert!(locator.candidates(BandId::B08, Resolution::R60).unwrap().is_empty());
    }

    #[test]
    fn test_jpeg2000_only_band_is_unsupported() {
        let dir = product();
        let jp2 = dir
            .path()
            .join("GRANULE/L2A_T31TCJ_A000001/IMG_DATA/R60m/T31TCJ_20230101T105441_B03_60m.jp2");
        touch(&jp2);

        let locator = SafeProductLocator::new(dir.path());
        match locator.locate(BandId::B03, Resolution::R60) {
            Err(Error::UnsupportedDataType(msg)) => assert!(msg.contains("B03_60m.jp2")),
            other => panic!("expected UnsupportedDataType, got {:?}", other),
        }
    }

    #[test]
    fn test_geotiff_preferred_over_jpeg2000() {
        let dir = product();
        let jp2 = dir
            .path()
            .join("GRANULE/L2A_T31TCJ_A000001/IMG_DATA/R60m/T31TCJ_20230101T105441_B04_60m.jp2");
        touch(&jp2);

        let locator = SafeProductLocator::new(dir.path());
        let b04 = locator.locate(BandId::B04, Resolution::R60).unwrap();
        assert!(b04.ends_with("T31TCJ_20230101T105441_B04_60m.tif"));
    }

    #[test]
    fn test_explicit_paths() {
        let paths = BandPaths::new().with(BandId::B04, "/data/red.tif");
        assert_eq!(
            paths.locate(BandId::B04, Resolution::R10).unwrap(),
            PathBuf::from("/data/red.tif")
        );
        assert!(matches!(
            paths.locate(BandId::B03, Resolution::R10),
            Err(Error::MissingBand { .. })
        ));
    }
}
