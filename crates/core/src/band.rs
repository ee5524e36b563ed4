//! Sentinel-2 band identifiers and product resolutions
//!
//! Both are closed sets, validated once at the configuration / loader
//! boundary so the rest of the pipeline never handles free-form band names.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Spectral band of the Sentinel-2 MultiSpectral Instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BandId {
    /// Coastal aerosol
    B01,
    /// Blue
    B02,
    /// Green
    B03,
    /// Red
    B04,
    /// Vegetation red edge
    B05,
    /// Vegetation red edge
    B06,
    /// Vegetation red edge
    B07,
    /// NIR
    B08,
    /// Narrow NIR
    B8A,
    /// Water vapour
    B09,
    /// SWIR, cirrus
    B10,
    /// SWIR
    B11,
    /// SWIR
    B12,
}

impl BandId {
    /// Every band, in spectral order
    pub const ALL: [BandId; 13] = [
        BandId::B01,
        BandId::B02,
        BandId::B03,
        BandId::B04,
        BandId::B05,
        BandId::B06,
        BandId::B07,
        BandId::B08,
        BandId::B8A,
        BandId::B09,
        BandId::B10,
        BandId::B11,
        BandId::B12,
    ];

    /// Band code as it appears in product file names, e.g. `B8A`
    pub fn as_str(&self) -> &'static str {
        match self {
            BandId::B01 => "B01",
            BandId::B02 => "B02",
            BandId::B03 => "B03",
            BandId::B04 => "B04",
            BandId::B05 => "B05",
            BandId::B06 => "B06",
            BandId::B07 => "B07",
            BandId::B08 => "B08",
            BandId::B8A => "B8A",
            BandId::B09 => "B09",
            BandId::B10 => "B10",
            BandId::B11 => "B11",
            BandId::B12 => "B12",
        }
    }

    /// Default band selection: red, green, blue and narrow NIR
    pub fn default_selection() -> Vec<BandId> {
        vec![BandId::B04, BandId::B03, BandId::B02, BandId::B8A]
    }
}

impl fmt::Display for BandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BandId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase();
        BandId::ALL
            .iter()
            .copied()
            .find(|band| band.as_str() == upper)
            .ok_or_else(|| Error::InvalidParameter {
                name: "band",
                value: s.to_string(),
                reason: "not a Sentinel-2 band identifier (B01-B12, B8A)".into(),
            })
    }
}

impl TryFrom<String> for BandId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<BandId> for String {
    fn from(band: BandId) -> Self {
        band.as_str().to_string()
    }
}

/// Spatial resolution of a product's band files, in metres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ResolutionRepr", into = "u32")]
pub enum Resolution {
    R10,
    R20,
    #[default]
    R60,
}

impl Resolution {
    /// Ground sampling distance in metres
    pub fn meters(&self) -> u32 {
        match self {
            Resolution::R10 => 10,
            Resolution::R20 => 20,
            Resolution::R60 => 60,
        }
    }

    /// Directory name used inside `IMG_DATA`, e.g. `R60m`
    pub fn dir_name(&self) -> String {
        format!("R{}m", self.meters())
    }

    /// Resolution from a metre value
    pub fn from_meters(meters: u32) -> Result<Self> {
        match meters {
            10 => Ok(Resolution::R10),
            20 => Ok(Resolution::R20),
            60 => Ok(Resolution::R60),
            _ => Err(Error::InvalidParameter {
                name: "resolution",
                value: meters.to_string(),
                reason: "must be one of 10, 20, 60".into(),
            }),
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.meters())
    }
}

impl FromStr for Resolution {
    type Err = Error;

    /// Accepts `60`, `60m` and `R60m`
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix(['R', 'r'])
            .unwrap_or(trimmed)
            .trim_end_matches(['m', 'M']);
        let meters: u32 = digits.parse().map_err(|_| Error::InvalidParameter {
            name: "resolution",
            value: s.to_string(),
            reason: "expected a metre value such as 60, 60m or R60m".into(),
        })?;
        Resolution::from_meters(meters)
    }
}

impl From<Resolution> for u32 {
    fn from(r: Resolution) -> Self {
        r.meters()
    }
}

/// Serialized form accepted for a resolution: a bare number or a string.
#[derive(Deserialize)]
#[serde(untagged)]
enum ResolutionRepr {
    Meters(u32),
    Text(String),
}

impl TryFrom<ResolutionRepr> for Resolution {
    type Error = Error;

    fn try_from(repr: ResolutionRepr) -> Result<Self> {
        match repr {
            ResolutionRepr::Meters(m) => Resolution::from_meters(m),
            ResolutionRepr::Text(s) => s.parse(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_parse() {
        assert_eq!("B04".parse::<BandId>().unwrap(), BandId::B04);
        assert_eq!("b8a".parse::<BandId>().unwrap(), BandId::B8A);
        assert!("B13".parse::<BandId>().is_err());
        assert!("red".parse::<BandId>().is_err());
    }

    #[test]
    fn test_band_display_roundtrip() {
        for band in BandId::ALL {
            assert_eq!(band.to_string().parse::<BandId>().unwrap(), band);
        }
    }

    #[test]
    fn test_resolution_parse() {
        assert_eq!("60".parse::<Resolution>().unwrap(), Resolution::R60);
        assert_eq!("20m".parse::<Resolution>().unwrap(), Resolution::R20);
        assert_eq!("R10m".parse::<Resolution>().unwrap(), Resolution::R10);
        assert!("30".parse::<Resolution>().is_err());
        assert_eq!(Resolution::R60.dir_name(), "R60m");
        assert_eq!(Resolution::default(), Resolution::R60);
    }

    #[test]
    fn test_serde_forms() {
        let bands: Vec<BandId> = serde_json::from_str(r#"["B04", "b8a"]"#).unwrap();
        assert_eq!(bands, vec![BandId::B04, BandId::B8A]);

        let r: Resolution = serde_json::from_str("20").unwrap();
        assert_eq!(r, Resolution::R20);
        let r: Resolution = serde_json::from_str(r#""R10m""#).unwrap();
        assert_eq!(r, Resolution::R10);
        assert!(serde_json::from_str::<Resolution>("15").is_err());
        assert_eq!(serde_json::to_string(&Resolution::R60).unwrap(), "60");
    }
}
