//! placescrub Processing Core: the anonymization pipeline
//!
//! Turns a raw location-history archive into a shareable map layer:
//! - **Anonymize:** Shift home visits by a run-scoped noise and relabel them
//! - **Interval Match:** Locate timestamp-only stories on the timeline
//! - **Assemble:** Emit GeoJSON features for places and stories
//! - **Keyword Filter:** Keep only features whose name mentions a keyword
//!
//! Everything except [`pipeline`] is pure computation over model types.

pub mod anonymize;
pub mod assemble;
pub mod interval_match;
pub mod keyword_filter;
pub mod pipeline;
pub mod stats;

pub use anonymize::{anonymize, AnonymizeReport, LocationAnonymizer, Noise};
pub use assemble::{FeatureAssembler, MediaUrlBuilder, PlaceVisitEntry, StoryPoint};
pub use interval_match::{IntervalMatcher, LocationMatch, MatchOutcome};
pub use keyword_filter::KeywordFilter;
pub use pipeline::{FilterRequest, Pipeline, PipelineOptions, RunReport, StoryReport};
pub use stats::HistoryStats;
