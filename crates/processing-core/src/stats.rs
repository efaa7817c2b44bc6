//! Quality statistics over a loaded location history.
//!
//! Used to decide whether an export holds enough history to be worth
//! anonymizing: how many months it spans and how many distinct places each
//! month contains.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use placescrub_common::ValidationThresholds;
use placescrub_timeline_model::{LoadReport, TimelineArchive};

/// Place counts for one period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MonthPlaces {
    /// Distinct `placeId`s visited.
    pub unique_places: usize,
    /// Place visits carrying a `placeId`.
    pub total_visits: usize,
}

impl MonthPlaces {
    /// Share of visits that went to a distinct place, in `[0.0, 1.0]`.
    pub fn unique_rate(&self) -> f64 {
        if self.total_visits == 0 {
            return 0.0;
        }
        self.unique_places as f64 / self.total_visits as f64
    }
}

/// Summary statistics of one archive.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistoryStats {
    pub num_years: usize,
    pub num_months: usize,
    /// Period files that could not be read or parsed.
    pub num_failed_files: usize,
    /// Period files holding valid JSON with no data.
    pub num_empty_files: usize,
    pub places_by_month: BTreeMap<String, MonthPlaces>,
    pub months_too_few_places: Vec<String>,
    pub history_too_short: bool,
    pub thresholds: ThresholdsUsed,
}

/// Thresholds the stats were computed against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ThresholdsUsed {
    pub min_places_per_month: usize,
    pub min_month_history: usize,
}

impl HistoryStats {
    pub fn compute(
        archive: &TimelineArchive,
        report: &LoadReport,
        thresholds: &ValidationThresholds,
    ) -> Self {
        let mut stats = Self {
            num_years: archive.years.len(),
            num_failed_files: report.parse_failures(),
            num_empty_files: report.empty_count(),
            thresholds: ThresholdsUsed {
                min_places_per_month: thresholds.min_places_per_month,
                min_month_history: thresholds.min_month_history,
            },
            ..Default::default()
        };

        for (_, month, period) in archive.periods() {
            stats.num_months += 1;

            let place_ids: Vec<&str> = period
                .place_visits()
                .filter_map(|visit| visit.location.as_ref()?.place_id.as_deref())
                .collect();
            let places = MonthPlaces {
                unique_places: place_ids.iter().collect::<BTreeSet<_>>().len(),
                total_visits: place_ids.len(),
            };

            if places.unique_places < thresholds.min_places_per_month {
                stats.months_too_few_places.push(month.to_string());
            }
            stats.places_by_month.insert(month.to_string(), places);
        }

        stats.history_too_short = stats.num_months < thresholds.min_month_history;
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use placescrub_timeline_model::{Location, PlaceVisit, TimelinePeriod, TimelineRecord};
    use std::path::PathBuf;

    fn visit(place_id: Option<&str>) -> TimelineRecord {
        TimelineRecord::PlaceVisit(PlaceVisit {
            location: Some(Location {
                place_id: place_id.map(str::to_string),
                ..Location::at_e7(0, 0)
            }),
            ..Default::default()
        })
    }

    #[test]
    fn test_counts_unique_places_per_month() {
        let mut archive = TimelineArchive::default();
        archive.insert(
            "2023",
            "2023_JANUARY",
            TimelinePeriod::new(vec![
                visit(Some("a")),
                visit(Some("a")),
                visit(Some("b")),
                visit(None),
            ]),
        );
        archive.insert("2023", "2023_FEBRUARY", TimelinePeriod::new(vec![]));
        let report = LoadReport {
            periods_loaded: 2,
            empty_files: vec![PathBuf::from("2023/2023_MARCH.json")],
            skipped: vec![],
        };

        let stats = HistoryStats::compute(
            &archive,
            &report,
            &ValidationThresholds {
                min_places_per_month: 2,
                min_month_history: 12,
            },
        );

        assert_eq!(stats.num_years, 1);
        assert_eq!(stats.num_months, 2);
        assert_eq!(stats.num_empty_files, 1);
        assert_eq!(stats.num_failed_files, 0);

        let january = stats.places_by_month["2023_JANUARY"];
        assert_eq!(january.unique_places, 2);
        assert_eq!(january.total_visits, 3);
        assert!((january.unique_rate() - 2.0 / 3.0).abs() < 1e-9);

        assert_eq!(stats.months_too_few_places, vec!["2023_FEBRUARY".to_string()]);
        assert!(stats.history_too_short);
    }

    #[test]
    fn test_empty_month_has_zero_rate() {
        assert_eq!(MonthPlaces::default().unique_rate(), 0.0);
    }
}
