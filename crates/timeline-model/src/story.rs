//! Photo-story metadata exports.
//!
//! The export is one JSON document with an `ig_stories` array. A story may
//! carry EXIF data with GPS coordinates and a capture time; otherwise only its
//! creation timestamp is known and it has to be placed by interval matching.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Path segment that precedes a story's media-relative path.
pub const STORY_MEDIA_SEGMENT: &str = "media/stories";

/// Top-level story export document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoryExport {
    #[serde(default)]
    pub ig_stories: Vec<RawStory>,
}

/// One story entry as exported.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawStory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_metadata: Option<MediaMetadata>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MediaMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_metadata: Option<PhotoMetadata>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhotoMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exif_data: Option<Vec<ExifEntry>>,
}

/// One element of `exif_data`. The two-element form puts GPS in the first
/// entry and the capture time in the second.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExifEntry {
    /// Decimal degrees; kept raw so one malformed value only affects its story.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time_original: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Where a story's position comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum StorySource {
    /// GPS coordinates in decimal degrees, straight from EXIF.
    Geotagged {
        latitude: f64,
        longitude: f64,
        /// EXIF capture time, when present.
        captured_at: Option<String>,
    },
    /// Only a timestamp; the position must be matched against the timeline.
    Timestamp(String),
}

/// A story reduced to what the pipeline needs.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryRecord {
    pub uri: String,
    pub source: StorySource,
}

impl StoryRecord {
    /// The part of the uri after `media/stories`, if the uri has one.
    pub fn relative_path(&self) -> Option<&str> {
        self.uri
            .split_once(STORY_MEDIA_SEGMENT)
            .map(|(_, rest)| rest)
    }

    /// Last path segment of the uri.
    pub fn file_name(&self) -> &str {
        self.uri.rsplit('/').next().unwrap_or(&self.uri)
    }

    /// Whether the uri names a JPEG image (case-insensitive `jpg` suffix).
    pub fn is_jpeg(&self) -> bool {
        self.uri.to_ascii_lowercase().ends_with("jpg")
    }

    /// Whether the uri points into the export's local story media folder.
    pub fn is_local_media(&self) -> bool {
        self.uri.starts_with("media/stories/")
    }

    /// Timestamp used for interval matching, if the story needs one.
    pub fn match_timestamp(&self) -> Option<&str> {
        match &self.source {
            StorySource::Timestamp(ts) => Some(ts),
            StorySource::Geotagged { .. } => None,
        }
    }
}

/// A story that could not be turned into a [`StoryRecord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedStory {
    pub index: usize,
    pub reason: String,
}

/// Result of reducing an export to story records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoryExtraction {
    pub records: Vec<StoryRecord>,
    pub skipped: Vec<SkippedStory>,
}

impl StoryExport {
    /// Load a story export from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoryError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| StoryError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| StoryError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Reduce every story to a record, collecting the ones that cannot be placed.
    pub fn extract(&self) -> StoryExtraction {
        let mut extraction = StoryExtraction::default();
        for (index, story) in self.ig_stories.iter().enumerate() {
            match story.to_record() {
                Ok(record) => extraction.records.push(record),
                Err(reason) => {
                    tracing::warn!("Skipping story #{index}: {reason}");
                    extraction.skipped.push(SkippedStory { index, reason });
                }
            }
        }
        extraction
    }
}

impl RawStory {
    fn exif(&self) -> Option<&[ExifEntry]> {
        self.media_metadata
            .as_ref()?
            .photo_metadata
            .as_ref()?
            .exif_data
            .as_deref()
    }

    fn to_record(&self) -> Result<StoryRecord, String> {
        let uri = self.uri.clone().ok_or_else(|| "missing uri".to_string())?;
        let creation = self.creation_timestamp.as_ref().and_then(value_to_text);

        let source = match self.exif() {
            Some([gps, capture]) => {
                let captured_at = capture.date_time_original.as_ref().and_then(value_to_text);
                match (&gps.latitude, &gps.longitude) {
                    (Some(latitude), Some(longitude)) => StorySource::Geotagged {
                        latitude: coordinate(latitude)?,
                        longitude: coordinate(longitude)?,
                        captured_at,
                    },
                    _ => StorySource::Timestamp(
                        captured_at
                            .or(creation)
                            .ok_or_else(|| "no coordinates and no timestamp".to_string())?,
                    ),
                }
            }
            _ => StorySource::Timestamp(
                creation.ok_or_else(|| "no coordinates and no creation_timestamp".to_string())?,
            ),
        };

        Ok(StoryRecord { uri, source })
    }
}

fn coordinate(value: &Value) -> Result<f64, String> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|degrees| degrees.is_finite())
        .ok_or_else(|| format!("unreadable GPS coordinate {value}"))
}

fn value_to_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Errors that can occur when loading a story export.
#[derive(Debug, thiserror::Error)]
pub enum StoryError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Error parsing JSON in file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_EXPORT: &str = r#"{
        "ig_stories": [
            {
                "uri": "media/stories/202108/photo_a.jpg",
                "creation_timestamp": 1627812000,
                "media_metadata": {"photo_metadata": {"exif_data": [
                    {"latitude": 37.42, "longitude": -122.08},
                    {"date_time_original": "2021:08:01 10:00:00"}
                ]}}
            },
            {
                "uri": "media/stories/202108/photo_b.jpg",
                "creation_timestamp": 1627815600,
                "media_metadata": {"photo_metadata": {"exif_data": [
                    {"scene_capture_type": "standard"},
                    {"software": "x"}
                ]}}
            },
            {
                "uri": "media/stories/202108/clip.mp4",
                "creation_timestamp": 1627819200,
                "media_metadata": {"photo_metadata": {"exif_data": [{"iso": 100}]}}
            },
            {
                "uri": "media/stories/202108/photo_c.JPG",
                "creation_timestamp": 1627822800
            },
            {
                "uri": "media/stories/202108/photo_d.jpg"
            },
            {
                "uri": "media/stories/202108/photo_e.jpg",
                "creation_timestamp": 1627826400,
                "media_metadata": {"photo_metadata": {"exif_data": [
                    {"latitude": "north-ish", "longitude": -122.08},
                    {"date_time_original": "2021:08:01 14:00:00"}
                ]}}
            },
            {
                "uri": "media/stories/202108/photo_f.jpg",
                "creation_timestamp": 1627830000,
                "media_metadata": {"photo_metadata": {"exif_data": [
                    {"latitude": "37.5", "longitude": "-122.1"},
                    {}
                ]}}
            }
        ]
    }"#;

    fn extract() -> StoryExtraction {
        serde_json::from_str::<StoryExport>(SAMPLE_EXPORT)
            .unwrap()
            .extract()
    }

    #[test]
    fn test_geotagged_story_keeps_exif_capture_time() {
        let extraction = extract();
        assert_eq!(
            extraction.records[0].source,
            StorySource::Geotagged {
                latitude: 37.42,
                longitude: -122.08,
                captured_at: Some("2021:08:01 10:00:00".to_string()),
            }
        );
        assert_eq!(extraction.records[0].match_timestamp(), None);
    }

    #[test]
    fn test_two_entry_exif_without_gps_falls_back_to_creation_time() {
        let extraction = extract();
        assert_eq!(
            extraction.records[1].match_timestamp(),
            Some("1627815600")
        );
    }

    #[test]
    fn test_other_exif_shapes_and_missing_metadata_use_creation_time() {
        let extraction = extract();
        assert_eq!(
            extraction.records[2].match_timestamp(),
            Some("1627819200")
        );
        assert_eq!(
            extraction.records[3].match_timestamp(),
            Some("1627822800")
        );
    }

    #[test]
    fn test_story_without_any_time_or_position_is_skipped() {
        let extraction = extract();
        assert_eq!(extraction.records.len(), 5);
        assert_eq!(extraction.skipped[0].index, 4);
    }

    #[test]
    fn test_malformed_gps_skips_only_that_story() {
        let extraction = extract();
        assert_eq!(extraction.skipped.len(), 2);
        assert_eq!(extraction.skipped[1].index, 5);
        assert!(extraction.skipped[1].reason.contains("north-ish"));

        assert_eq!(
            extraction.records[4].source,
            StorySource::Geotagged {
                latitude: 37.5,
                longitude: -122.1,
                captured_at: None,
            }
        );
    }

    #[test]
    fn test_uri_helpers() {
        let extraction = extract();
        let photo = &extraction.records[0];
        assert_eq!(photo.relative_path(), Some("/202108/photo_a.jpg"));
        assert_eq!(photo.file_name(), "photo_a.jpg");
        assert!(photo.is_jpeg());
        assert!(photo.is_local_media());

        assert!(extraction.records[3].is_jpeg());
        assert!(!extraction.records[2].is_jpeg());
    }
}
