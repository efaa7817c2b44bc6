//! Scrubbing of sensitive (home) locations.
//!
//! One [`Noise`] value is drawn per run and threaded explicitly into the
//! anonymizer, so every home-tagged visit in the run is shifted by the same
//! amount. The transform is pure: inputs are never mutated, a new period or
//! archive is returned.

use std::ops::AddAssign;

use rand::Rng;

use placescrub_timeline_model::{
    Location, PlaceVisit, SemanticType, TimelineArchive, TimelinePeriod, TimelineRecord,
};

/// Address written over every anonymized home visit.
pub const HOME_PLACEHOLDER_ADDRESS: &str = "Google Searched Place";

/// Granularity of the noise, in E7 units (0.001 degrees).
pub const NOISE_STEP_E7: i64 = 10_000;

/// Run-scoped coordinate offset in E7 units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Noise(i64);

impl Noise {
    /// A fixed noise value, for reproducible runs and tests.
    pub fn new(value_e7: i64) -> Self {
        Self(value_e7)
    }

    /// Draw a value uniformly from {1, …, 9} × 10,000.
    pub fn draw<R: Rng>(rng: &mut R) -> Self {
        Self(rng.gen_range(1..=9) * NOISE_STEP_E7)
    }

    /// Draw from the thread-local RNG.
    pub fn random() -> Self {
        Self::draw(&mut rand::thread_rng())
    }

    pub fn value_e7(&self) -> i64 {
        self.0
    }
}

/// Counts of what an anonymization pass changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnonymizeReport {
    pub periods: usize,
    pub homes_shifted: usize,
    /// Home visits whose coordinates could not be shifted and were removed.
    pub homes_dropped: usize,
    pub candidates_relabeled: usize,
}

impl AddAssign for AnonymizeReport {
    fn add_assign(&mut self, other: Self) {
        self.periods += other.periods;
        self.homes_shifted += other.homes_shifted;
        self.homes_dropped += other.homes_dropped;
        self.candidates_relabeled += other.candidates_relabeled;
    }
}

/// Rewrites home-tagged locations using a single run-scoped noise value.
#[derive(Debug, Clone, Copy)]
pub struct LocationAnonymizer {
    noise: Noise,
}

impl LocationAnonymizer {
    pub fn new(noise: Noise) -> Self {
        Self { noise }
    }

    pub fn noise(&self) -> Noise {
        self.noise
    }

    /// Anonymize every period of an archive.
    pub fn anonymize_archive(&self, archive: &TimelineArchive) -> (TimelineArchive, AnonymizeReport) {
        let mut output = TimelineArchive::default();
        let mut report = AnonymizeReport::default();
        for (year, name, period) in archive.periods() {
            let (anonymized, period_report) = self.anonymize_period(period);
            report += period_report;
            output.insert(year, name, anonymized);
        }
        tracing::info!(
            "Anonymized {} period(s): {} home visit(s) shifted, {} candidate(s) relabeled",
            report.periods,
            report.homes_shifted,
            report.candidates_relabeled
        );
        (output, report)
    }

    /// Anonymize one period, returning a new period.
    pub fn anonymize_period(&self, period: &TimelinePeriod) -> (TimelinePeriod, AnonymizeReport) {
        let mut report = AnonymizeReport {
            periods: 1,
            ..Default::default()
        };
        let timeline_objects = period
            .timeline_objects
            .iter()
            .map(|record| match record {
                TimelineRecord::PlaceVisit(visit) => {
                    TimelineRecord::PlaceVisit(self.anonymize_visit(visit, &mut report))
                }
                other => other.clone(),
            })
            .collect();

        (
            TimelinePeriod {
                timeline_objects,
                extra: period.extra.clone(),
            },
            report,
        )
    }

    fn anonymize_visit(&self, visit: &PlaceVisit, report: &mut AnonymizeReport) -> PlaceVisit {
        let mut visit = visit.clone();

        if let Some(location) = visit.location.as_mut().filter(|l| l.is_home()) {
            if self.scrub_home(location) {
                report.homes_shifted += 1;
            } else {
                tracing::warn!("Home visit coordinates out of range, dropping them");
                report.homes_dropped += 1;
            }
        }

        for candidate in visit
            .other_candidate_locations
            .iter_mut()
            .filter(|c| c.is_home())
        {
            candidate.semantic_type = Some(SemanticType::SearchedAddress);
            report.candidates_relabeled += 1;
        }

        visit
    }

    /// Returns false when the shift overflowed and the coordinates were dropped.
    fn scrub_home(&self, location: &mut Location) -> bool {
        let noise = self.noise.value_e7();
        location.semantic_type = Some(SemanticType::Unknown);
        location.address = Some(HOME_PLACEHOLDER_ADDRESS.to_string());

        let latitude = location.latitude_e7.map(|lat| lat.checked_add(noise));
        let longitude = location.longitude_e7.map(|lon| lon.checked_sub(noise));
        if latitude == Some(None) || longitude == Some(None) {
            location.latitude_e7 = None;
            location.longitude_e7 = None;
            return false;
        }
        location.latitude_e7 = latitude.flatten();
        location.longitude_e7 = longitude.flatten();
        true
    }
}

/// Anonymize one period with the given noise.
pub fn anonymize(period: &TimelinePeriod, noise: Noise) -> TimelinePeriod {
    LocationAnonymizer::new(noise).anonymize_period(period).0
}
