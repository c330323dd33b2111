// src/model.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys owned by the population side of a merge; boundary data never overwrites them.
pub const CORE_FIELDS: &[&str] = &["countryName", "countryCode", "year", "value"];

/// One (country, year, value) observation, optionally enriched with boundary data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationRecord {
    pub country_name: String,
    pub country_code: String,
    pub year: i32,
    pub value: f64,
    /// Fields copied verbatim from the matched boundary record
    /// (`geo_point_2d`, `geo_shape`, `continent`, `iso3`, ...).
    #[serde(flatten)]
    pub enrichment: Map<String, Value>,
}

impl PopulationRecord {
    pub fn new(
        country_name: impl Into<String>,
        country_code: impl Into<String>,
        year: i32,
        value: f64,
    ) -> Self {
        Self {
            country_name: country_name.into(),
            country_code: country_code.into(),
            year,
            value,
            enrichment: Map::new(),
        }
    }

    /// Returns a copy of `self` carrying every field of `boundary` except the core keys.
    pub fn enriched_with(&self, boundary: &BoundaryRecord) -> Self {
        let mut enrichment = self.enrichment.clone();
        for (key, value) in boundary.fields() {
            if CORE_FIELDS.contains(&key.as_str()) {
                continue;
            }
            enrichment.insert(key.clone(), value.clone());
        }
        Self {
            enrichment,
            ..self.clone()
        }
    }

    pub fn is_enriched(&self) -> bool {
        !self.enrichment.is_empty()
    }

    /// Raw enrichment field by name.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.enrichment.get(key)
    }

    pub fn geo_point(&self) -> Option<GeoPoint> {
        self.typed_field("geo_point_2d")
    }

    pub fn geo_shape(&self) -> Option<GeoShape> {
        self.typed_field("geo_shape")
    }

    pub fn continent(&self) -> Option<&str> {
        self.field("continent").and_then(Value::as_str)
    }

    pub fn region(&self) -> Option<&str> {
        self.field("region").and_then(Value::as_str)
    }

    fn typed_field<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.field(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// A record from the boundaries API. Only `iso3` is interpreted; everything
/// else is carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoundaryRecord(Map<String, Value>);

impl BoundaryRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn iso3(&self) -> Option<&str> {
        self.0.get("iso3").and_then(Value::as_str)
    }

    /// `iso3` trimmed and uppercased; `None` when missing or blank.
    pub fn join_key(&self) -> Option<String> {
        self.iso3().and_then(normalize_code)
    }
}

impl From<Map<String, Value>> for BoundaryRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// One page of the boundaries API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BoundaryPage {
    /// Required: a page without it cannot tell how many pages remain.
    pub total_count: usize,
    #[serde(default)]
    pub results: Vec<BoundaryRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoShape {
    #[serde(rename = "type")]
    pub kind: String,
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Value,
}

/// Trim + uppercase a country code. Blank codes have no key.
pub fn normalize_code(code: &str) -> Option<String> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn boundary(value: Value) -> BoundaryRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_enrichment_keeps_core_fields() {
        let pop = PopulationRecord::new("India", "IND", 2020, 1_380_004_385.0);
        let b = boundary(json!({
            "iso3": "IND",
            "continent": "Asia",
            "year": 1999,
            "countryName": "Bharat",
            "geo_point_2d": {"lon": 78.9, "lat": 22.8}
        }));

        let enriched = pop.enriched_with(&b);
        assert_eq!(enriched.country_name, "India");
        assert_eq!(enriched.year, 2020);
        assert_eq!(enriched.continent(), Some("Asia"));
        assert_eq!(enriched.geo_point(), Some(GeoPoint { lon: 78.9, lat: 22.8 }));
        assert!(enriched.field("year").is_none());
        assert!(!pop.is_enriched());
    }

    #[test]
    fn test_geo_shape_decodes_when_well_formed() {
        let pop = PopulationRecord::new("Chad", "TCD", 2000, 8.0e6);
        let b = boundary(json!({
            "iso3": "TCD",
            "geo_shape": {
                "type": "Feature",
                "geometry": {"type": "Polygon", "coordinates": [[[14.0, 13.0], [15.0, 13.0], [14.0, 12.0]]]},
                "properties": {}
            }
        }));
        let shape = pop.enriched_with(&b).geo_shape().expect("shape");
        assert_eq!(shape.kind, "Feature");
        assert_eq!(shape.geometry.kind, "Polygon");

        let bad = pop.enriched_with(&boundary(json!({"geo_shape": "nope"})));
        assert!(bad.geo_shape().is_none());
    }

    #[test]
    fn test_serialized_record_is_flat() {
        let pop = PopulationRecord::new("Chad", "TCD", 2000, 8.0e6)
            .enriched_with(&boundary(json!({"iso3": "TCD", "status": "Member State"})));
        let v = serde_json::to_value(&pop).unwrap();
        assert_eq!(v["countryCode"], "TCD");
        assert_eq!(v["status"], "Member State");
    }

    #[test]
    fn test_join_key() {
        assert_eq!(boundary(json!({"iso3": " usa "})).join_key(), Some("USA".into()));
        assert_eq!(boundary(json!({"iso3": "  "})).join_key(), None);
        assert_eq!(boundary(json!({"iso3": null})).join_key(), None);
        assert_eq!(boundary(json!({})).join_key(), None);
    }

    #[test]
    fn test_page_requires_total_count() {
        let page: BoundaryPage = serde_json::from_str(r#"{"total_count": 3}"#).unwrap();
        assert_eq!(page.total_count, 3);
        assert!(page.results.is_empty());

        let missing = serde_json::from_str::<BoundaryPage>(r#"{"results": [{"iso3": "FRA"}]}"#);
        assert!(missing.is_err());
    }
}
