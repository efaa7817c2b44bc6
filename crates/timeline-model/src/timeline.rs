//! Timeline records for one period (one export file, usually a month).
//!
//! Each entry of `timelineObjects` is a single-key object tagged either
//! `placeVisit` or `activitySegment`. Entries with any other shape are kept
//! verbatim as [`TimelineRecord::Other`] so rewriting a period never drops
//! data the export contained.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use placescrub_common::parse_epoch_millis;

use crate::location::Location;

/// Raw start/end fields of a record's `duration` object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineDuration {
    /// RFC 3339 start time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_timestamp: Option<String>,

    /// RFC 3339 end time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_timestamp: Option<String>,

    /// Legacy start time in epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_timestamp_ms: Option<String>,

    /// Legacy end time in epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_timestamp_ms: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A resolved time interval. Both ends are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Widen both ends by `buffer`, clamping at the representable range.
    pub fn buffered(&self, buffer: chrono::Duration) -> Self {
        let (low, high) = if buffer >= chrono::Duration::zero() {
            (DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::MAX_UTC)
        } else {
            (DateTime::<Utc>::MAX_UTC, DateTime::<Utc>::MIN_UTC)
        };
        Self {
            start: self.start.checked_sub_signed(buffer).unwrap_or(low),
            end: self.end.checked_add_signed(buffer).unwrap_or(high),
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }

    /// Distance from `instant` to the nearer of the two edges.
    pub fn distance_to_nearer_edge(&self, instant: DateTime<Utc>) -> chrono::Duration {
        let to_start = (instant - self.start).abs();
        let to_end = (instant - self.end).abs();
        to_start.min(to_end)
    }
}

impl TimelineDuration {
    /// Build a duration from two RFC 3339 timestamps.
    pub fn from_rfc3339(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start_timestamp: Some(start.into()),
            end_timestamp: Some(end.into()),
            ..Default::default()
        }
    }

    /// Resolve to an interval, preferring RFC 3339 fields over legacy millis.
    pub fn interval(&self) -> Option<Interval> {
        let start = resolve_instant(&self.start_timestamp, &self.start_timestamp_ms)?;
        let end = resolve_instant(&self.end_timestamp, &self.end_timestamp_ms)?;
        Some(Interval::new(start, end))
    }
}

fn resolve_instant(rfc3339: &Option<String>, millis: &Option<String>) -> Option<DateTime<Utc>> {
    if let Some(text) = rfc3339 {
        if let Ok(t) = DateTime::parse_from_rfc3339(text.trim()) {
            return Some(t.with_timezone(&Utc));
        }
    }
    parse_epoch_millis(millis.as_ref()?)
}

/// A stay at one location.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceVisit {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<TimelineDuration>,

    /// Alternate guesses for where the visit happened.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub other_candidate_locations: Vec<Location>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Movement between two locations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySegment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_location: Option<Location>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_location: Option<Location>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<TimelineDuration>,

    /// Transportation mode label (e.g. `IN_PASSENGER_VEHICLE`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_type: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One entry of a period's `timelineObjects`.
#[derive(Debug, Clone, PartialEq)]
pub enum TimelineRecord {
    PlaceVisit(PlaceVisit),
    ActivitySegment(ActivitySegment),
    /// Any entry that is neither of the above, kept as-is.
    Other(Map<String, Value>),
}

const PLACE_VISIT_KEY: &str = "placeVisit";
const ACTIVITY_SEGMENT_KEY: &str = "activitySegment";

impl TimelineRecord {
    pub fn as_place_visit(&self) -> Option<&PlaceVisit> {
        match self {
            Self::PlaceVisit(visit) => Some(visit),
            _ => None,
        }
    }

    pub fn as_activity_segment(&self) -> Option<&ActivitySegment> {
        match self {
            Self::ActivitySegment(segment) => Some(segment),
            _ => None,
        }
    }

    /// The record's interval and the location a match on it resolves to.
    ///
    /// Place visits resolve to their `location`; activity segments to their
    /// `startLocation`.
    pub fn match_candidate(&self) -> Option<(Interval, &Location)> {
        match self {
            Self::PlaceVisit(visit) => {
                Some((visit.duration.as_ref()?.interval()?, visit.location.as_ref()?))
            }
            Self::ActivitySegment(segment) => Some((
                segment.duration.as_ref()?.interval()?,
                segment.start_location.as_ref()?,
            )),
            Self::Other(_) => None,
        }
    }
}

impl Serialize for TimelineRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::PlaceVisit(visit) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(PLACE_VISIT_KEY, visit)?;
                map.end()
            }
            Self::ActivitySegment(segment) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(ACTIVITY_SEGMENT_KEY, segment)?;
                map.end()
            }
            Self::Other(raw) => raw.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for TimelineRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut raw = Map::<String, Value>::deserialize(deserializer)?;
        if let Some(value) = raw.remove(PLACE_VISIT_KEY) {
            return PlaceVisit::deserialize(value)
                .map(Self::PlaceVisit)
                .map_err(D::Error::custom);
        }
        if let Some(value) = raw.remove(ACTIVITY_SEGMENT_KEY) {
            return ActivitySegment::deserialize(value)
                .map(Self::ActivitySegment)
                .map_err(D::Error::custom);
        }
        Ok(Self::Other(raw))
    }
}

/// The parsed contents of one period file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelinePeriod {
    #[serde(default)]
    pub timeline_objects: Vec<TimelineRecord>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TimelinePeriod {
    pub fn new(timeline_objects: Vec<TimelineRecord>) -> Self {
        Self {
            timeline_objects,
            extra: Map::new(),
        }
    }

    /// Iterate place visits in record order.
    pub fn place_visits(&self) -> impl Iterator<Item = &PlaceVisit> {
        self.timeline_objects
            .iter()
            .filter_map(TimelineRecord::as_place_visit)
    }
}
