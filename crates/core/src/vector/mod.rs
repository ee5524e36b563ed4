//! Labeled vector features

use crate::crs::{reproject_geometry, CRS};
use crate::error::{Error, Result};
use geo_types::Geometry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Attribute carrying the training class of a feature
pub const CLASS_ATTRIBUTE: &str = "class";

/// Attribute value types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// A training polygon: an areal geometry tagged with exactly one class name.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Polygon, MultiPolygon, Rect, Triangle, or a collection of those
    pub geometry: Geometry<f64>,
    /// Training class
    pub class_name: String,
    /// Remaining attributes, `class` excluded
    pub properties: HashMap<String, AttributeValue>,
    /// Optional feature ID
    pub id: Option<String>,
}

impl Feature {
    /// Create a new feature; the geometry must be areal
    pub fn new(geometry: Geometry<f64>, class_name: impl Into<String>) -> Result<Self> {
        let class_name = class_name.into();
        if class_name.trim().is_empty() {
            return Err(Error::Schema("feature has an empty class name".into()));
        }
        if !is_areal(&geometry) {
            return Err(Error::Schema(format!(
                "feature of class '{}' has a non-areal geometry",
                class_name
            )));
        }
        Ok(Self {
            geometry,
            class_name,
            properties: HashMap::new(),
            id: None,
        })
    }

    /// Set an attribute
    pub fn set_property(&mut self, key: impl Into<String>, value: AttributeValue) {
        self.properties.insert(key.into(), value);
    }

    /// Get an attribute
    pub fn get_property(&self, key: &str) -> Option<&AttributeValue> {
        self.properties.get(key)
    }
}

/// Whether a geometry covers an area and can be burnt into a mask
pub fn is_areal(geometry: &Geometry<f64>) -> bool {
    match geometry {
        Geometry::Polygon(_) | Geometry::MultiPolygon(_) | Geometry::Rect(_) | Geometry::Triangle(_) => true,
        Geometry::GeometryCollection(gc) => gc.iter().all(is_areal),
        _ => false,
    }
}

/// Ordered collection of labeled features in one CRS.
///
/// Order matters: it fixes class ids and the overlap tie-break when the
/// collection is rasterized.
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    features: Vec<Feature>,
    crs: Option<CRS>,
}

impl FeatureCollection {
    pub fn new(crs: Option<CRS>) -> Self {
        Self {
            features: Vec::new(),
            crs,
        }
    }

    pub fn from_features(features: Vec<Feature>, crs: Option<CRS>) -> Self {
        Self { features, crs }
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// CRS of every geometry in the collection
    pub fn crs(&self) -> Option<&CRS> {
        self.crs.as_ref()
    }

    /// Reproject every geometry to `target`, keeping feature order.
    ///
    /// A collection without a CRS cannot be reprojected.
    pub fn reproject(self, target: &CRS) -> Result<Self> {
        let source = self.crs.clone().ok_or_else(|| {
            Error::MissingGeoreference("feature collection has no CRS to reproject from".into())
        })?;

        let features = self
            .features
            .into_iter()
            .map(|mut feature| {
                feature.geometry = reproject_geometry(&feature.geometry, &source, target)?;
                Ok(feature)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            features,
            crs: Some(target.clone()),
        })
    }
}

impl IntoIterator for FeatureCollection {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}
