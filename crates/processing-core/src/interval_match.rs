//! Placing an external timestamp on the timeline.
//!
//! Every place visit and activity segment defines an interval, widened on
//! both sides by a symmetric buffer. A timestamp inside a widened interval is
//! a hit; its closeness is the distance to the nearer widened edge, and the
//! closest hit wins (ties keep the earlier record).
//!
//! With [`MatchStrategy::FirstMatchingFile`] the search stops at the first
//! file, in traversal order, that has any hit, even if a later file holds a
//! closer one. [`MatchStrategy::ClosestAcrossTree`] scans everything.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use placescrub_common::{hours_to_duration, parse_timestamp, MatchStrategy, TimestampError};
use placescrub_timeline_model::{
    e7_to_degrees, period_files, read_period_file, PeriodContent, TimelinePeriod,
};

/// The location an interval search resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationMatch {
    pub latitude_e7: i64,
    pub longitude_e7: i64,
    /// Distance from the target to the nearer buffered edge.
    pub closeness: chrono::Duration,
    /// Period file the match came from, when searching a tree.
    pub source: Option<PathBuf>,
}

impl LocationMatch {
    /// Decimal-degree `(latitude, longitude)`.
    pub fn to_degrees(&self) -> (f64, f64) {
        e7_to_degrees(self.latitude_e7, self.longitude_e7)
    }
}

/// Result of matching a textual timestamp against a tree.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Matched(LocationMatch),
    NotFound,
    UnrecognizedTimestamp(TimestampError),
    RootNotFound(PathBuf),
}

impl MatchOutcome {
    pub fn into_match(self) -> Option<LocationMatch> {
        match self {
            Self::Matched(m) => Some(m),
            _ => None,
        }
    }
}

/// Interval search over timeline periods.
#[derive(Debug, Clone, Copy)]
pub struct IntervalMatcher {
    buffer: chrono::Duration,
    strategy: MatchStrategy,
}

impl IntervalMatcher {
    /// Create a matcher with the given buffer and the default strategy.
    ///
    /// Negative and NaN buffers are treated as zero.
    pub fn new(buffer_hours: f64) -> Self {
        let buffer_hours = if buffer_hours >= 0.0 {
            buffer_hours
        } else {
            tracing::warn!("Ignoring invalid buffer of {buffer_hours} hours");
            0.0
        };
        Self {
            buffer: hours_to_duration(buffer_hours),
            strategy: MatchStrategy::default(),
        }
    }

    pub fn with_strategy(mut self, strategy: MatchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn buffer(&self) -> chrono::Duration {
        self.buffer
    }

    pub fn strategy(&self) -> MatchStrategy {
        self.strategy
    }

    /// Parse `timestamp` and search every period file under `root`.
    pub fn match_in_tree(&self, timestamp: &str, root: &Path) -> MatchOutcome {
        let target = match parse_timestamp(timestamp) {
            Ok(target) => target,
            Err(e) => {
                tracing::warn!("{e}");
                return MatchOutcome::UnrecognizedTimestamp(e);
            }
        };
        if !root.is_dir() {
            tracing::warn!("Match root not found: {}", root.display());
            return MatchOutcome::RootNotFound(root.to_path_buf());
        }

        let periods = period_files(root).filter_map(|path| match read_period_file(&path) {
            Ok(PeriodContent::Timeline(period)) => Some((path, period)),
            Ok(PeriodContent::Empty) => None,
            Err(e) => {
                tracing::warn!("Skipping period during match: {e}");
                None
            }
        });

        match self.find_in_periods(target, periods) {
            Some(found) => MatchOutcome::Matched(found),
            None => MatchOutcome::NotFound,
        }
    }

    /// Search periods in iteration order according to the strategy.
    ///
    /// Periods are consumed lazily, so under `FirstMatchingFile` nothing past
    /// the first matching file is read.
    pub fn find_in_periods<I>(&self, target: DateTime<Utc>, periods: I) -> Option<LocationMatch>
    where
        I: IntoIterator<Item = (PathBuf, TimelinePeriod)>,
    {
        let mut best: Option<LocationMatch> = None;
        for (path, period) in periods {
            let Some(mut found) = self.best_in_period(target, &period) else {
                continue;
            };
            tracing::debug!(
                "Found a matching location in {} with time difference {}",
                path.display(),
                found.closeness
            );
            found.source = Some(path);

            match self.strategy {
                MatchStrategy::FirstMatchingFile => return Some(found),
                MatchStrategy::ClosestAcrossTree => {
                    if best
                        .as_ref()
                        .map_or(true, |current| found.closeness < current.closeness)
                    {
                        best = Some(found);
                    }
                }
            }
        }
        best
    }

    /// Closest record of one period whose buffered interval contains `target`.
    pub fn best_in_period(
        &self,
        target: DateTime<Utc>,
        period: &TimelinePeriod,
    ) -> Option<LocationMatch> {
        let mut best: Option<LocationMatch> = None;
        for record in &period.timeline_objects {
            let Some((interval, location)) = record.match_candidate() else {
                continue;
            };
            let Some((latitude_e7, longitude_e7)) = location.e7() else {
                continue;
            };
            let widened = interval.buffered(self.buffer);
            if !widened.contains(target) {
                continue;
            }
            let closeness = widened.distance_to_nearer_edge(target);
            if best
                .as_ref()
                .map_or(true, |current| closeness < current.closeness)
            {
                best = Some(LocationMatch {
                    latitude_e7,
                    longitude_e7,
                    closeness,
                    source: None,
                });
            }
        }
        best
    }
}
