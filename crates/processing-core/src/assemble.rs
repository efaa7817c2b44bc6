//! Turning place visits and story points into GeoJSON features.

use std::path::Path;

use placescrub_common::parse_timestamp;
use placescrub_timeline_model::{
    Feature, FeatureCollection, FeatureProperties, Geometry, PlaceVisit, StoryRecord,
    StorySource, TimelinePeriod, TimelineRecord,
};

use crate::interval_match::LocationMatch;

/// Path components naming a participant start with this prefix.
const PARTICIPANT_PREFIX: &str = "participant";

/// A place visit together with the transportation mode that led to it.
#[derive(Debug, Clone, Copy)]
pub struct PlaceVisitEntry<'a> {
    pub visit: &'a PlaceVisit,
    /// `activityType` of the immediately preceding activity segment.
    pub transportation: Option<&'a str>,
}

/// Collect a period's place visits with their transportation modes.
///
/// The mode comes from the record directly before the visit, and only when
/// that record is an activity segment carrying an `activityType`.
pub fn place_visit_entries(period: &TimelinePeriod) -> Vec<PlaceVisitEntry<'_>> {
    let mut entries = Vec::new();
    let mut previous: Option<&TimelineRecord> = None;
    for record in &period.timeline_objects {
        if let TimelineRecord::PlaceVisit(visit) = record {
            let transportation = previous
                .and_then(TimelineRecord::as_activity_segment)
                .and_then(|segment| segment.activity_type.as_deref());
            entries.push(PlaceVisitEntry {
                visit,
                transportation,
            });
        }
        previous = Some(record);
    }
    entries
}

/// A story with a resolved position.
#[derive(Debug, Clone, PartialEq)]
pub enum StoryPoint {
    /// Positioned by its own EXIF GPS data.
    Geotagged(StoryRecord),
    /// Positioned by interval matching against the timeline.
    Matched {
        story: StoryRecord,
        location: LocationMatch,
    },
}

/// Builds URLs under which story images are served to the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUrlBuilder {
    base_url: String,
    participant: Option<String>,
}

impl MediaUrlBuilder {
    pub fn new(base_url: impl Into<String>, participant: Option<String>) -> Self {
        Self {
            base_url: base_url.into(),
            participant,
        }
    }

    /// Derive the participant from the story metadata path.
    pub fn for_story_file(base_url: impl Into<String>, story_path: &Path) -> Self {
        Self::new(base_url, participant_from_path(story_path))
    }

    pub fn url_for(&self, story: &StoryRecord) -> String {
        match &self.participant {
            Some(participant) => {
                format!("{}{}/{}", self.base_url, participant, story.file_name())
            }
            None => format!("{}{}", self.base_url, story.file_name()),
        }
    }
}

/// The nearest path component that names a participant.
pub fn participant_from_path(path: &Path) -> Option<String> {
    path.components()
        .rev()
        .filter_map(|c| c.as_os_str().to_str())
        .find(|part| part.starts_with(PARTICIPANT_PREFIX))
        .map(str::to_string)
}

/// Emits one feature per resolvable place visit or story point.
#[derive(Debug, Clone)]
pub struct FeatureAssembler {
    media: MediaUrlBuilder,
}

impl FeatureAssembler {
    pub fn new(media: MediaUrlBuilder) -> Self {
        Self { media }
    }

    /// Merge story points and place visits into one collection.
    ///
    /// Story features come first, then place visits, each in input order.
    /// Entries without a position are dropped.
    pub fn assemble(&self, places: &[PlaceVisitEntry<'_>], stories: &[StoryPoint]) -> FeatureCollection {
        let features = stories
            .iter()
            .filter_map(|point| self.story_feature(point))
            .chain(places.iter().filter_map(|entry| self.place_feature(entry)))
            .collect();
        FeatureCollection::new(features)
    }

    pub fn place_feature(&self, entry: &PlaceVisitEntry<'_>) -> Option<Feature> {
        let location = entry.visit.location.as_ref()?;
        let (latitude, longitude) = location.to_degrees()?;

        let properties = FeatureProperties {
            name: location.name.clone(),
            address: location.address.clone(),
            longitude: Some(longitude),
            latitude: Some(latitude),
            transportation: entry.transportation.map(str::to_string),
            ..Default::default()
        };
        Some(Feature::new(Geometry::point(longitude, latitude), properties))
    }

    pub fn story_feature(&self, point: &StoryPoint) -> Option<Feature> {
        match point {
            StoryPoint::Geotagged(story) => self.geotagged_feature(story),
            StoryPoint::Matched { story, location } => Some(self.matched_feature(story, location)),
        }
    }

    fn geotagged_feature(&self, story: &StoryRecord) -> Option<Feature> {
        let StorySource::Geotagged {
            latitude,
            longitude,
            captured_at,
        } = &story.source
        else {
            return None;
        };

        let mut properties = FeatureProperties {
            longitude: Some(*longitude),
            latitude: Some(*latitude),
            ..Default::default()
        };
        if story.is_jpeg() {
            properties.has_url = Some(true);
        }
        if let Some(captured) = captured_at.as_deref() {
            match parse_timestamp(captured) {
                Ok(instant) => {
                    properties.timestamp = Some(instant.timestamp());
                    properties.datetime = Some(instant.format("%Y-%m-%d %H:%M:%S").to_string());
                }
                Err(e) => tracing::warn!("Story {}: {e}", story.uri),
            }
        }
        if story.relative_path().is_some_and(|p| p.ends_with(".jpg")) {
            properties.relative_url = Some(story.uri.clone());
            if story.is_local_media() {
                self.attach_image(story, &mut properties);
            }
        }

        Some(Feature::new(Geometry::point(*longitude, *latitude), properties))
    }

    fn matched_feature(&self, story: &StoryRecord, location: &LocationMatch) -> Feature {
        let (latitude, longitude) = location.to_degrees();
        let mut properties = FeatureProperties {
            longitude: Some(longitude),
            latitude: Some(latitude),
            ..Default::default()
        };
        if story.is_jpeg() {
            self.attach_image(story, &mut properties);
        }
        Feature::new(Geometry::point(longitude, latitude), properties)
    }

    fn attach_image(&self, story: &StoryRecord, properties: &mut FeatureProperties) {
        let url = self.media.url_for(story);
        properties.has_image = Some(true);
        properties.img_tooltip = Some(url.clone());
        properties.url = Some(url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use placescrub_timeline_model::{ActivitySegment, Location};
    use std::path::PathBuf;

    fn assembler() -> FeatureAssembler {
        FeatureAssembler::new(MediaUrlBuilder::new(
            "http://localhost:3000/",
            Some("participant7".to_string()),
        ))
    }

    fn place(lat: i64, lon: i64, name: Option<&str>) -> TimelineRecord {
        TimelineRecord::PlaceVisit(PlaceVisit {
            location: Some(Location {
                name: name.map(str::to_string),
                ..Location::at_e7(lat, lon)
            }),
            ..Default::default()
        })
    }

    fn ride(activity_type: Option<&str>) -> TimelineRecord {
        TimelineRecord::ActivitySegment(ActivitySegment {
            activity_type: activity_type.map(str::to_string),
            ..Default::default()
        })
    }

    #[test]
    fn test_place_visit_converts_e7_once() {
        let period = TimelinePeriod::new(vec![place(374_040_000, -1_221_430_000, None)]);
        let entries = place_visit_entries(&period);
        let feature = assembler().place_feature(&entries[0]).unwrap();

        let (lon, lat) = feature.geometry.lon_lat();
        assert!((lat - 37.404).abs() < 1e-9);
        assert!((lon + 122.143).abs() < 1e-9);
        assert_eq!(feature.properties.latitude, Some(lat));
        assert_eq!(feature.properties.longitude, Some(lon));
        assert_eq!(feature.properties.transportation, None);
        assert_eq!(feature.properties.name, None);
        assert_eq!(feature.properties.address, None);
    }

    #[test]
    fn test_transportation_comes_from_preceding_segment() {
        let period = TimelinePeriod::new(vec![
            ride(Some("IN_BUS")),
            place(1, 1, Some("Library")),
            place(2, 2, Some("Cafe")),
            ride(None),
            place(3, 3, Some("Office")),
        ]);
        let entries = place_visit_entries(&period);
        let modes: Vec<_> = entries.iter().map(|e| e.transportation).collect();
        assert_eq!(modes, vec![Some("IN_BUS"), None, None]);
    }

    #[test]
    fn test_first_record_has_no_predecessor() {
        let period = TimelinePeriod::new(vec![place(1, 1, None), ride(Some("WALKING"))]);
        let entries = place_visit_entries(&period);
        assert_eq!(entries[0].transportation, None);
    }

    #[test]
    fn test_visit_without_coordinates_is_dropped() {
        let period = TimelinePeriod::new(vec![
            TimelineRecord::PlaceVisit(PlaceVisit::default()),
            place(1, 1, None),
        ]);
        let entries = place_visit_entries(&period);
        let collection = assembler().assemble(&entries, &[]);
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_geotagged_story_properties() {
        let story = StoryRecord {
            uri: "media/stories/202108/photo_a.jpg".to_string(),
            source: StorySource::Geotagged {
                latitude: 37.42,
                longitude: -122.08,
                captured_at: Some("2021:08:01 10:00:00".to_string()),
            },
        };
        let feature = assembler()
            .story_feature(&StoryPoint::Geotagged(story))
            .unwrap();
        let p = &feature.properties;

        assert_eq!(feature.geometry.lon_lat(), (-122.08, 37.42));
        assert_eq!(p.has_url, Some(true));
        assert_eq!(p.timestamp, Some(1_627_812_000));
        assert_eq!(p.datetime.as_deref(), Some("2021-08-01 10:00:00"));
        assert_eq!(p.relative_url.as_deref(), Some("media/stories/202108/photo_a.jpg"));
        assert_eq!(p.has_image, Some(true));
        assert_eq!(
            p.url.as_deref(),
            Some("http://localhost:3000/participant7/photo_a.jpg")
        );
        assert_eq!(p.img_tooltip, p.url);
    }

    #[test]
    fn test_matched_story_uses_e7_location() {
        let story = StoryRecord {
            uri: "media/stories/202108/photo_b.jpg".to_string(),
            source: StorySource::Timestamp("1627815600".to_string()),
        };
        let location = LocationMatch {
            latitude_e7: 374_040_000,
            longitude_e7: -1_221_430_000,
            closeness: chrono::Duration::zero(),
            source: None,
        };
        let feature = assembler()
            .story_feature(&StoryPoint::Matched { story, location })
            .unwrap();

        let (lon, lat) = feature.geometry.lon_lat();
        assert!((lat - 37.404).abs() < 1e-9);
        assert!((lon + 122.143).abs() < 1e-9);
        assert_eq!(feature.properties.has_image, Some(true));
        assert_eq!(feature.properties.relative_url, None);
    }

    #[test]
    fn test_stories_precede_places() {
        let period = TimelinePeriod::new(vec![place(1, 1, Some("Park"))]);
        let entries = place_visit_entries(&period);
        let story = StoryRecord {
            uri: "media/stories/x/clip.mp4".to_string(),
            source: StorySource::Geotagged {
                latitude: 1.0,
                longitude: 2.0,
                captured_at: None,
            },
        };
        let collection = assembler().assemble(&entries, &[StoryPoint::Geotagged(story)]);
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.features[0].properties.has_url, None);
        assert_eq!(collection.features[1].name(), Some("Park"));
    }

    #[test]
    fn test_participant_from_path() {
        assert_eq!(
            participant_from_path(&PathBuf::from("/data/participant3/stories.json")),
            Some("participant3".to_string())
        );
        assert_eq!(participant_from_path(&PathBuf::from("/data/stories.json")), None);

        let story = StoryRecord {
            uri: "media/stories/x/a.jpg".to_string(),
            source: StorySource::Timestamp("0".to_string()),
        };
        let builder = MediaUrlBuilder::new("http://host/", None);
        assert_eq!(builder.url_for(&story), "http://host/a.jpg");
    }
}
