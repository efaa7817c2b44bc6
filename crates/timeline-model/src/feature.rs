//! GeoJSON point features, the pipeline's output artifact.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `"type": "FeatureCollection"` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollectionType {
    #[default]
    FeatureCollection,
}

/// `"type": "Feature"` marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FeatureType {
    #[default]
    Feature,
}

/// Feature geometry. Only points are produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    /// `[longitude, latitude]` in decimal degrees.
    Point { coordinates: [f64; 2] },
}

impl Geometry {
    pub fn point(longitude: f64, latitude: f64) -> Self {
        Self::Point {
            coordinates: [longitude, latitude],
        }
    }

    /// `(longitude, latitude)` of the point.
    pub fn lon_lat(&self) -> (f64, f64) {
        match self {
            Self::Point { coordinates } => (coordinates[0], coordinates[1]),
        }
    }
}

/// Feature properties. Keys are present only when the source supplied them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    /// Activity type of the segment that led to this place.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transportation: Option<String>,

    /// Capture time in seconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_url: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_image: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Image shown in the dashboard tooltip.
    #[serde(
        rename = "<img>_tooltip",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub img_tooltip: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A point with attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default)]
    pub kind: FeatureType,
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: FeatureProperties,
}

impl Feature {
    pub fn new(geometry: Geometry, properties: FeatureProperties) -> Self {
        Self {
            kind: FeatureType::Feature,
            geometry,
            properties,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.properties.name.as_deref()
    }
}

/// An ordered set of features.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default)]
    pub kind: CollectionType,
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: CollectionType::FeatureCollection,
            features,
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Load a collection from a GeoJSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FeatureError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| FeatureError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| FeatureError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Write the collection as pretty-printed GeoJSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), FeatureError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| FeatureError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| FeatureError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        std::fs::write(path, json).map_err(|e| FeatureError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Errors that can occur when reading or writing feature collections.
#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_json_shape() {
        let feature = Feature::new(
            Geometry::point(-122.143, 37.404),
            FeatureProperties {
                name: Some("Shoreline Park".to_string()),
                img_tooltip: Some("http://localhost:3000/p1/a.jpg".to_string()),
                ..Default::default()
            },
        );
        let value = serde_json::to_value(FeatureCollection::new(vec![feature])).unwrap();

        assert_eq!(value["type"], "FeatureCollection");
        let first = &value["features"][0];
        assert_eq!(first["type"], "Feature");
        assert_eq!(first["geometry"]["type"], "Point");
        assert_eq!(first["geometry"]["coordinates"][0], -122.143);
        assert_eq!(first["geometry"]["coordinates"][1], 37.404);
        assert_eq!(first["properties"]["name"], "Shoreline Park");
        assert_eq!(
            first["properties"]["<img>_tooltip"],
            "http://localhost:3000/p1/a.jpg"
        );
        assert!(first["properties"].get("address").is_none());
        assert!(first["properties"].get("transportation").is_none());
    }

    #[test]
    fn test_foreign_properties_survive_reload() {
        let raw = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [1.5, 2.5]},
                "properties": {"name": "Beach", "rating": 4}
            }]
        }"#;
        let collection: FeatureCollection = serde_json::from_str(raw).unwrap();
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.features[0].geometry.lon_lat(), (1.5, 2.5));
        assert_eq!(collection.features[0].name(), Some("Beach"));
        assert_eq!(collection.features[0].properties.extra["rating"], 4);
    }
}
