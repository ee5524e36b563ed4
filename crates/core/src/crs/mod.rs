//! Coordinate Reference System handling

mod utm;

pub use utm::{parse_utm_epsg, reproject_geometry, utm_to_wgs84, wgs84_to_utm};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coordinate Reference System representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CRS {
    /// WKT representation
    wkt: Option<String>,
    /// EPSG code if known
    epsg: Option<u32>,
}

impl CRS {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            wkt: None,
            epsg: Some(code),
        }
    }

    /// Create a CRS from a WKT string
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            wkt: Some(wkt.into()),
            epsg: None,
        }
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Get WKT representation
    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// Whether coordinates are longitude/latitude degrees.
    ///
    /// Only EPSG codes are classified: the 4000-4999 block holds the
    /// geographic 2D systems.
    pub fn is_geographic(&self) -> bool {
        matches!(self.epsg, Some(code) if (4000..5000).contains(&code))
    }

    /// Check if two CRS are equivalent
    pub fn is_equivalent(&self, other: &CRS) -> bool {
        if let (Some(a), Some(b)) = (self.epsg, other.epsg) {
            return a == b;
        }

        // WKT comparison is textual and therefore conservative
        if let (Some(a), Some(b)) = (&self.wkt, &other.wkt) {
            return a == b;
        }

        false
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(wkt) = &self.wkt {
            let head: String = wkt.chars().take(50).collect();
            return format!("WKT:{}", head);
        }
        "Unknown".to_string()
    }
}

impl FromStr for CRS {
    type Err = Error;

    /// Parses `EPSG:32631`, `epsg:32631`, `32631` and OGC URNs such as
    /// `urn:ogc:def:crs:EPSG::32631`. `CRS84` and `OGC:CRS84` map to WGS84.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.ends_with("CRS84") {
            return Ok(CRS::wgs84());
        }

        let upper = trimmed.to_ascii_uppercase();
        // The code is the last ':'-separated field, after any URN version
        let code = if upper.contains("EPSG") {
            upper.rsplit(':').next().unwrap_or_default()
        } else {
            upper.as_str()
        };

        code.parse::<u32>()
            .map(CRS::from_epsg)
            .map_err(|_| Error::UnsupportedCrs(format!("cannot parse CRS identifier '{}'", s)))
    }
}

impl fmt::Display for CRS {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}
