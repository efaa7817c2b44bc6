//! Locations and semantic tags as they appear in timeline exports.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Scale factor between decimal degrees and E7 integers.
pub const E7_SCALE: f64 = 10_000_000.0;

/// Categorical tag attached to a location by the export.
///
/// Unknown tags round-trip unchanged through [`SemanticType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SemanticType {
    Home,
    Work,
    Unknown,
    SearchedAddress,
    AliasedLocation,
    Other(String),
}

impl SemanticType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Home => "TYPE_HOME",
            Self::Work => "TYPE_WORK",
            Self::Unknown => "TYPE_UNKNOWN",
            Self::SearchedAddress => "TYPE_SEARCHED_ADDRESS",
            Self::AliasedLocation => "TYPE_ALIASED_LOCATION",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for SemanticType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "TYPE_HOME" => Self::Home,
            "TYPE_WORK" => Self::Work,
            "TYPE_UNKNOWN" => Self::Unknown,
            "TYPE_SEARCHED_ADDRESS" => Self::SearchedAddress,
            "TYPE_ALIASED_LOCATION" => Self::AliasedLocation,
            _ => Self::Other(tag),
        }
    }
}

impl From<SemanticType> for String {
    fn from(tag: SemanticType) -> Self {
        match tag {
            SemanticType::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

/// A location inside a timeline record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Latitude in degrees × 10^7.
    #[serde(rename = "latitudeE7", default, skip_serializing_if = "Option::is_none")]
    pub latitude_e7: Option<i64>,

    /// Longitude in degrees × 10^7.
    #[serde(rename = "longitudeE7", default, skip_serializing_if = "Option::is_none")]
    pub longitude_e7: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantic_type: Option<SemanticType>,

    /// Fields placescrub does not interpret, kept for round-tripping.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Location {
    /// Create a location at the given E7 coordinates.
    pub fn at_e7(latitude_e7: i64, longitude_e7: i64) -> Self {
        Self {
            latitude_e7: Some(latitude_e7),
            longitude_e7: Some(longitude_e7),
            ..Default::default()
        }
    }

    /// Both E7 coordinates, when present.
    pub fn e7(&self) -> Option<(i64, i64)> {
        Some((self.latitude_e7?, self.longitude_e7?))
    }

    /// Decimal-degree `(latitude, longitude)`, when both coordinates exist.
    pub fn to_degrees(&self) -> Option<(f64, f64)> {
        self.e7().map(|(lat, lon)| e7_to_degrees(lat, lon))
    }

    pub fn has_semantic_type(&self, tag: &SemanticType) -> bool {
        self.semantic_type.as_ref() == Some(tag)
    }

    pub fn is_home(&self) -> bool {
        self.has_semantic_type(&SemanticType::Home)
    }
}

/// Convert an E7 coordinate pair to decimal degrees.
pub fn e7_to_degrees(latitude_e7: i64, longitude_e7: i64) -> (f64, f64) {
    (
        latitude_e7 as f64 / E7_SCALE,
        longitude_e7 as f64 / E7_SCALE,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_parses_takeout_fields() {
        let raw = r#"{
            "latitudeE7": 374040000,
            "longitudeE7": -1221430000,
            "placeId": "ChIJ-abc",
            "address": "1 Main St",
            "name": "Shoreline Park",
            "semanticType": "TYPE_HOME",
            "sourceInfo": {"deviceTag": 12}
        }"#;
        let location: Location = serde_json::from_str(raw).unwrap();
        assert_eq!(location.e7(), Some((374_040_000, -1_221_430_000)));
        assert!(location.is_home());
        assert_eq!(location.name.as_deref(), Some("Shoreline Park"));
        assert!(location.extra.contains_key("sourceInfo"));
    }

    #[test]
    fn test_unknown_semantic_type_round_trips() {
        let location: Location =
            serde_json::from_str(r#"{"semanticType":"TYPE_SCHOOL"}"#).unwrap();
        assert_eq!(
            location.semantic_type,
            Some(SemanticType::Other("TYPE_SCHOOL".to_string()))
        );
        let json = serde_json::to_string(&location).unwrap();
        assert_eq!(json, r#"{"semanticType":"TYPE_SCHOOL"}"#);
    }

    #[test]
    fn test_to_degrees_requires_both_coordinates() {
        let full = Location::at_e7(374_040_000, -1_221_430_000);
        let (lat, lon) = full.to_degrees().unwrap();
        assert!((lat - 37.404).abs() < 1e-9);
        assert!((lon + 122.143).abs() < 1e-9);

        let partial = Location {
            latitude_e7: Some(1),
            ..Default::default()
        };
        assert_eq!(partial.to_degrees(), None);
    }
}
