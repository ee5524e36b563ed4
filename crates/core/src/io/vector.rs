//! GeoJSON input for labeled polygons

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::vector::{is_areal, AttributeValue, Feature, FeatureCollection, CLASS_ATTRIBUTE};
use geo_types::Geometry;
use geojson::{GeoJson, JsonObject, JsonValue};
use std::path::Path;

/// Read a GeoJSON file of labeled polygons.
///
/// See [`read_geojson_str`].
pub fn read_geojson<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let text = std::fs::read_to_string(path.as_ref())?;
    read_geojson_str(&text)
}

/// Parse a GeoJSON `FeatureCollection` (or a single `Feature`).
///
/// Every feature needs an areal geometry and a non-empty string `class`
/// property; violations are reported as [`Error::Schema`] with the feature
/// index. The CRS comes from the legacy `crs` member and defaults to WGS84.
/// Feature order is preserved. No reprojection happens here.
pub fn read_geojson_str(text: &str) -> Result<FeatureCollection> {
    let (features, members) = match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(fc) => (fc.features, fc.foreign_members),
        GeoJson::Feature(feature) => {
            let members = feature.foreign_members.clone();
            (vec![feature], members)
        }
        GeoJson::Geometry(_) => {
            return Err(Error::Schema(
                "expected a FeatureCollection or Feature, found a bare geometry".into(),
            ))
        }
    };

    let crs = match members.as_ref().and_then(|m| m.get("crs")) {
        Some(member) => crs_from_member(member)?,
        None => CRS::wgs84(),
    };

    let features = features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| convert_feature(index, feature))
        .collect::<Result<Vec<_>>>()?;

    Ok(FeatureCollection::from_features(features, Some(crs)))
}

/// Legacy (GeoJSON 2008) `crs` member: named or EPSG-typed
fn crs_from_member(member: &JsonValue) -> Result<CRS> {
    let properties = member.get("properties");
    let named = properties.and_then(|p| p.get("name")).and_then(JsonValue::as_str);
    let code = properties.and_then(|p| p.get("code")).and_then(JsonValue::as_u64);

    match (named, code) {
        (Some(name), _) => name.parse(),
        (None, Some(code)) => u32::try_from(code)
            .map(CRS::from_epsg)
            .map_err(|_| Error::UnsupportedCrs(format!("EPSG code {} out of range", code))),
        (None, None) => Err(Error::UnsupportedCrs(format!(
            "unrecognized crs member {}",
            member
        ))),
    }
}

fn convert_feature(index: usize, feature: geojson::Feature) -> Result<Feature> {
    let geometry = feature
        .geometry
        .ok_or_else(|| Error::Schema(format!("feature {} has no geometry", index)))?;
    let geometry = Geometry::<f64>::try_from(geometry.value)
        .map_err(|e| Error::Schema(format!("feature {}: {}", index, e)))?;
    if !is_areal(&geometry) {
        return Err(Error::Schema(format!(
            "feature {}: {} geometry cannot be rasterized",
            index,
            geometry_kind(&geometry)
        )));
    }

    let mut properties: JsonObject = feature.properties.unwrap_or_default();
    let class_name = match properties.remove(CLASS_ATTRIBUTE) {
        Some(JsonValue::String(name)) if !name.trim().is_empty() => name,
        Some(other) => {
            return Err(Error::Schema(format!(
                "feature {}: '{}' must be a non-empty string, found {}",
                index, CLASS_ATTRIBUTE, other
            )))
        }
        None => {
            return Err(Error::Schema(format!(
                "feature {} has no '{}' property",
                index, CLASS_ATTRIBUTE
            )))
        }
    };

    let mut out = Feature::new(geometry, class_name)?;
    for (key, value) in properties {
        out.set_property(key, attribute_value(value));
    }
    out.id = feature.id.map(|id| match id {
        geojson::feature::Id::String(s) => s,
        geojson::feature::Id::Number(n) => n.to_string(),
    });
    Ok(out)
}

fn attribute_value(value: JsonValue) -> AttributeValue {
    match value {
        JsonValue::Null => AttributeValue::Null,
        JsonValue::Bool(b) => AttributeValue::Bool(b),
        JsonValue::Number(n) => match n.as_i64() {
            Some(i) => AttributeValue::Int(i),
            None => AttributeValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        JsonValue::String(s) => AttributeValue::String(s),
        other => AttributeValue::String(other.to_string()),
    }
}

fn geometry_kind(geometry: &Geometry<f64>) -> &'static str {
    match geometry {
        Geometry::Point(_) => "Point",
        Geometry::Line(_) => "Line",
        Geometry::LineString(_) => "LineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
        Geometry::Rect(_) => "Rect",
        Geometry::Triangle(_) => "Triangle",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = r#"{"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}"#;

    fn collection(features: &[String], crs: Option<&str>) -> String {
        let crs = crs.map(|c| format!(r#""crs": {},"#, c)).unwrap_or_default();
        format!(
            r#"{{"type": "FeatureCollection", {} "features": [{}]}}"#,
            crs,
            features.join(",")
        )
    }

    fn feature(properties: &str, geometry: &str) -> String {
        format!(
            r#"{{"type": "Feature", "properties": {}, "geometry": {}}}"#,
            properties, geometry
        )
    }

    #[test]
    fn test_reads_classes_in_order() {
        let text = collection(
            &[
                feature(r#"{"class": "water", "area": 12}"#, SQUARE),
                feature(r#"{"class": "land", "note": "dry"}"#, SQUARE),
            ],
            None,
        );
        let fc = read_geojson_str(&text).unwrap();
        assert_eq!(fc.len(), 2);
        assert_eq!(fc.crs().and_then(CRS::epsg), Some(4326));
        let names: Vec<_> = fc.iter().map(|f| f.class_name.as_str()).collect();
        assert_eq!(names, vec!["water", "land"]);
        assert_eq!(fc.features()[0].get_property("area"), Some(&AttributeValue::Int(12)));
        assert!(fc.features()[0].get_property(CLASS_ATTRIBUTE).is_none());
    }

    #[test]
    fn test_named_crs_member() {
        let text = collection(
            &[feature(r#"{"class": "water"}"#, SQUARE)],
            Some(r#"{"type": "name", "properties": {"name": "urn:ogc:def:crs:EPSG::32631"}}"#),
        );
        let fc = read_geojson_str(&text).unwrap();
        assert_eq!(fc.crs().and_then(CRS::epsg), Some(32631));
    }

    #[test]
    fn test_empty_collection() {
        let fc = read_geojson_str(&collection(&[], None)).unwrap();
        assert!(fc.is_empty());
    }

    #[test]
    fn test_missing_class_names_feature_index() {
        let text = collection(
            &[
                feature(r#"{"class": "water"}"#, SQUARE),
                feature(r#"{"kind": "land"}"#, SQUARE),
            ],
            None,
        );
        match read_geojson_str(&text) {
            Err(Error::Schema(msg)) => assert!(msg.contains("feature 1"), "{}", msg),
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_string_class_rejected() {
        let text = collection(&[feature(r#"{"class": 3}"#, SQUARE)], None);
        assert!(matches!(read_geojson_str(&text), Err(Error::Schema(_))));
        let text = collection(&[feature(r#"{"class": ""}"#, SQUARE)], None);
        assert!(matches!(read_geojson_str(&text), Err(Error::Schema(_))));
    }

    #[test]
    fn test_point_geometry_rejected() {
        let point = r#"{"type": "Point", "coordinates": [0, 0]}"#;
        let text = collection(&[feature(r#"{"class": "water"}"#, point)], None);
        match read_geojson_str(&text) {
            Err(Error::Schema(msg)) => assert!(msg.contains("Point"), "{}", msg),
            other => panic!("expected schema error, got {:?}", other),
        }
    }

    #[test]
    fn test_null_geometry_rejected() {
        let text = collection(&[feature(r#"{"class": "water"}"#, "null")], None);
        assert!(matches!(read_geojson_str(&text), Err(Error::Schema(_))));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(read_geojson_str("{ nope"), Err(Error::GeoJson(_))));
    }
}
