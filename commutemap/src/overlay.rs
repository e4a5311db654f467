//! Overlay feature normalization.
//!
//! Every collection fetched from the aggregation API passes through
//! [`normalize_collection`] before it is cached:
//!
//! - numeric properties are never negative; schema numeric fields that are
//!   missing or unusable become `0`
//! - string properties are trimmed; empty strings and missing schema text
//!   fields become [`UNKNOWN`]
//! - only `Polygon` and `MultiPolygon` geometries are accepted

use geojson::{Feature, FeatureCollection, Value};
use serde_json::{Map, Number, Value as JsonValue};
use thiserror::Error;

type JsonObject = Map<String, JsonValue>;

/// Placeholder for empty or missing text properties.
pub const UNKNOWN: &str = "unknown";

/// Property names of the densely inhabited district (DID) schema.
pub mod did {
    /// DID identifier
    pub const ID: &str = "A16_001";
    /// Serial number
    pub const SERIAL: &str = "A16_002";
    /// Municipality name
    pub const REGION_NAME: &str = "A16_003";
    /// DID code
    pub const CODE: &str = "A16_004";
    pub const POPULATION: &str = "A16_005";
    /// Area in square metres
    pub const AREA: &str = "A16_006";
    pub const PREVIOUS_POPULATION: &str = "A16_007";
    pub const PREVIOUS_AREA: &str = "A16_008";
    pub const POPULATION_RATIO: &str = "A16_009";
    pub const AREA_RATIO: &str = "A16_010";
    /// Census year
    pub const SURVEY_YEAR: &str = "A16_011";
    pub const POPULATION_MALE: &str = "A16_012";
    pub const POPULATION_FEMALE: &str = "A16_013";
    pub const HOUSEHOLDS: &str = "A16_014";
}

/// Errors raised while normalizing overlay data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NormalizeError {
    /// Feature geometry is not a Polygon or MultiPolygon.
    #[error("Unsupported geometry at feature {index}: {kind}")]
    UnsupportedGeometry { index: usize, kind: String },
}

/// Named fields that must be present after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PropertySchema {
    numeric: Vec<String>,
    text: Vec<String>,
}

impl PropertySchema {
    /// A schema with no required fields.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The DID schema served by the aggregation API.
    pub fn did() -> Self {
        Self::empty()
            .with_text([did::ID, did::SERIAL, did::REGION_NAME])
            .with_numeric([
                did::CODE,
                did::POPULATION,
                did::AREA,
                did::PREVIOUS_POPULATION,
                did::PREVIOUS_AREA,
                did::POPULATION_RATIO,
                did::AREA_RATIO,
                did::SURVEY_YEAR,
                did::POPULATION_MALE,
                did::POPULATION_FEMALE,
                did::HOUSEHOLDS,
            ])
    }

    pub fn with_numeric<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.numeric.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn with_text<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.text.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn numeric_fields(&self) -> &[String] {
        &self.numeric
    }

    pub fn text_fields(&self) -> &[String] {
        &self.text
    }
}

/// Normalizes every feature of a collection.
///
/// Fails on the first feature whose geometry is not polygonal.
pub fn normalize_collection(
    collection: FeatureCollection,
    schema: &PropertySchema,
) -> Result<FeatureCollection, NormalizeError> {
    let FeatureCollection {
        bbox,
        features,
        foreign_members,
    } = collection;

    let features = features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| normalize_feature(feature, schema, index))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(FeatureCollection {
        bbox,
        features,
        foreign_members,
    })
}

/// Normalizes a single feature. `index` is only used for error reporting.
pub fn normalize_feature(
    mut feature: Feature,
    schema: &PropertySchema,
    index: usize,
) -> Result<Feature, NormalizeError> {
    match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Value::Polygon(_)) | Some(Value::MultiPolygon(_)) => {}
        Some(other) => {
            return Err(NormalizeError::UnsupportedGeometry {
                index,
                kind: geometry_kind(other).to_string(),
            })
        }
        None => {
            return Err(NormalizeError::UnsupportedGeometry {
                index,
                kind: "none".to_string(),
            })
        }
    }

    let properties = feature.properties.get_or_insert_with(JsonObject::new);
    normalize_properties(properties, schema);
    Ok(feature)
}

fn normalize_properties(properties: &mut JsonObject, schema: &PropertySchema) {
    for value in properties.values_mut() {
        match value {
            JsonValue::Number(n) => {
                if n.as_f64().is_some_and(|v| v < 0.0) {
                    *n = Number::from(0);
                }
            }
            JsonValue::String(s) => {
                if s.trim().is_empty() {
                    *s = UNKNOWN.to_string();
                } else if s.trim().len() != s.len() {
                    *s = s.trim().to_string();
                }
            }
            _ => {}
        }
    }

    for field in &schema.numeric {
        let entry = properties
            .entry(field.clone())
            .or_insert(JsonValue::Null);
        match entry {
            JsonValue::Number(_) => {}
            // Numeric strings ("1234") are accepted as numbers
            JsonValue::String(s) => {
                let parsed = s.parse::<f64>().ok();
                *entry = match parsed {
                    Some(v) if v.is_finite() && v > 0.0 => number_value(v),
                    _ => JsonValue::from(0),
                };
            }
            _ => *entry = JsonValue::from(0),
        }
    }

    for field in &schema.text {
        let entry = properties
            .entry(field.clone())
            .or_insert(JsonValue::Null);
        if entry.is_null() {
            *entry = JsonValue::from(UNKNOWN);
        }
    }
}

fn number_value(v: f64) -> JsonValue {
    if v.fract() == 0.0 && v <= i64::MAX as f64 {
        JsonValue::from(v as i64)
    } else {
        JsonValue::from(v)
    }
}

fn geometry_kind(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

/// Aggregate view of a normalized DID collection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverlaySummary {
    pub feature_count: usize,
    pub total_population: f64,
    pub total_households: f64,
    /// Distinct region names in first-seen order
    pub regions: Vec<String>,
}

/// Summarizes a collection using the DID property names.
pub fn summarize(collection: &FeatureCollection) -> OverlaySummary {
    let mut summary = OverlaySummary {
        feature_count: collection.features.len(),
        ..Default::default()
    };

    for feature in &collection.features {
        let Some(props) = feature.properties.as_ref() else {
            continue;
        };
        let number = |key: &str| props.get(key).and_then(JsonValue::as_f64).unwrap_or(0.0);
        summary.total_population += number(did::POPULATION);
        summary.total_households += number(did::HOUSEHOLDS);

        if let Some(name) = props.get(did::REGION_NAME).and_then(JsonValue::as_str) {
            if !summary.regions.iter().any(|r| r == name) {
                summary.regions.push(name.to_string());
            }
        }
    }

    summary
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    /// A unit square polygon feature with the given properties.
    pub(crate) fn polygon_feature(properties: serde_json::Value) -> Feature {
        let geometry = geojson::Geometry::new(Value::Polygon(vec![vec![
            vec![139.76, 35.68],
            vec![139.77, 35.68],
            vec![139.77, 35.69],
            vec![139.76, 35.69],
            vec![139.76, 35.68],
        ]]));
        Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: properties.as_object().cloned(),
            foreign_members: None,
        }
    }

    pub(crate) fn collection(features: Vec<Feature>) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }

    /// Builds a property object from key/value pairs.
    fn did_props(pairs: &[(&str, serde_json::Value)]) -> serde_json::Value {
        serde_json::Value::Object(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    fn props(feature: &Feature) -> &JsonObject {
        feature.properties.as_ref().unwrap()
    }

    #[test]
    fn test_negative_population_and_padded_name() {
        let schema = PropertySchema::empty()
            .with_numeric(["population"])
            .with_text(["name"]);
        let feature = polygon_feature(json!({ "population": -5, "name": "  Shibuya  " }));

        let normalized = normalize_feature(feature, &schema, 0).unwrap();

        assert_eq!(props(&normalized)["population"], json!(0));
        assert_eq!(props(&normalized)["name"], json!("Shibuya"));
    }

    #[test]
    fn test_did_schema_fills_missing_fields() {
        let feature = polygon_feature(did_props(&[
            (did::REGION_NAME, json!("   ")),
            (did::POPULATION, json!(-12)),
            (did::HOUSEHOLDS, json!(5321)),
        ]));

        let normalized = normalize_feature(feature, &PropertySchema::did(), 0).unwrap();
        let p = props(&normalized);

        assert_eq!(p[did::REGION_NAME], json!(UNKNOWN));
        assert_eq!(p[did::ID], json!(UNKNOWN));
        assert_eq!(p[did::POPULATION], json!(0));
        assert_eq!(p[did::AREA], json!(0));
        assert_eq!(p[did::HOUSEHOLDS], json!(5321));
    }

    #[test]
    fn test_numeric_strings_and_nulls() {
        let schema = PropertySchema::empty().with_numeric(["a", "b", "c", "d"]);
        let feature = polygon_feature(json!({ "a": "1200", "b": null, "c": "n/a", "d": "-3" }));

        let normalized = normalize_feature(feature, &schema, 0).unwrap();
        let p = props(&normalized);

        assert_eq!(p["a"], json!(1200));
        assert_eq!(p["b"], json!(0));
        assert_eq!(p["c"], json!(0));
        assert_eq!(p["d"], json!(0));
    }

    #[test]
    fn test_fractional_values_survive() {
        let feature = polygon_feature(json!({ "ratio": 0.37, "neg": -0.5 }));
        let normalized = normalize_feature(feature, &PropertySchema::empty(), 0).unwrap();
        assert_eq!(props(&normalized)["ratio"], json!(0.37));
        assert_eq!(props(&normalized)["neg"], json!(0));
    }

    #[test]
    fn test_missing_properties_object_is_created() {
        let mut feature = polygon_feature(json!({}));
        feature.properties = None;
        let schema = PropertySchema::empty().with_text(["name"]);

        let normalized = normalize_feature(feature, &schema, 0).unwrap();
        assert_eq!(props(&normalized)["name"], json!(UNKNOWN));
    }

    #[test]
    fn test_point_geometry_rejected() {
        let mut feature = polygon_feature(json!({}));
        feature.geometry = Some(geojson::Geometry::new(Value::Point(vec![139.7, 35.6])));

        let data = collection(vec![polygon_feature(json!({})), feature]);
        let err = normalize_collection(data, &PropertySchema::did()).unwrap_err();

        assert_eq!(
            err,
            NormalizeError::UnsupportedGeometry {
                index: 1,
                kind: "Point".to_string()
            }
        );
    }

    #[test]
    fn test_missing_geometry_rejected() {
        let mut feature = polygon_feature(json!({}));
        feature.geometry = None;
        let err = normalize_feature(feature, &PropertySchema::empty(), 4).unwrap_err();
        assert!(matches!(
            err,
            NormalizeError::UnsupportedGeometry { index: 4, ref kind } if kind == "none"
        ));
    }

    #[test]
    fn test_multipolygon_accepted() {
        let mut feature = polygon_feature(json!({}));
        feature.geometry = Some(geojson::Geometry::new(Value::MultiPolygon(vec![vec![vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![1.0, 1.0],
            vec![0.0, 0.0],
        ]]])));
        assert!(normalize_feature(feature, &PropertySchema::empty(), 0).is_ok());
    }

    #[test]
    fn test_summarize() {
        let data = collection(vec![
            polygon_feature(did_props(&[
                (did::REGION_NAME, json!("Shibuya")),
                (did::POPULATION, json!(1000)),
                (did::HOUSEHOLDS, json!(400)),
            ])),
            polygon_feature(did_props(&[
                (did::REGION_NAME, json!("Shibuya")),
                (did::POPULATION, json!(500)),
            ])),
            polygon_feature(did_props(&[
                (did::REGION_NAME, json!("Minato")),
                (did::POPULATION, json!(250.5)),
            ])),
        ]);

        let summary = summarize(&data);
        assert_eq!(summary.feature_count, 3);
        assert_eq!(summary.total_population, 1750.5);
        assert_eq!(summary.total_households, 400.0);
        assert_eq!(summary.regions, vec!["Shibuya".to_string(), "Minato".to_string()]);
    }
}
