//! Summarize how much usable history an export holds.

use std::path::PathBuf;

use placescrub_common::config::AppConfig;
use placescrub_processing_core::HistoryStats;
use placescrub_timeline_model::TimelineArchive;

pub fn run(input: PathBuf, json: bool, config: &AppConfig) -> anyhow::Result<()> {
    let (archive, load) = TimelineArchive::load(&input)
        .map_err(|e| anyhow::anyhow!("Failed to load timeline: {e}"))?;
    let stats = HistoryStats::compute(&archive, &load, &config.validation);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("Validating location history at: {}", input.display());
    println!("  Years: {}", stats.num_years);
    println!("  Months: {}", stats.num_months);
    println!("  Empty files: {}", stats.num_empty_files);
    println!("  Failed files: {}", stats.num_failed_files);

    for (month, places) in &stats.places_by_month {
        println!(
            "  {month}: {} unique places in {} visits",
            places.unique_places, places.total_visits
        );
    }

    let mut issues = Vec::new();
    if stats.history_too_short {
        issues.push(format!(
            "only {} month(s) of history, at least {} expected",
            stats.num_months, stats.thresholds.min_month_history
        ));
    }
    for month in &stats.months_too_few_places {
        issues.push(format!(
            "{month} has fewer than {} unique places",
            stats.thresholds.min_places_per_month
        ));
    }

    if issues.is_empty() {
        println!("\nHistory is usable.");
    } else {
        println!("\nValidation issues:");
        for issue in &issues {
            println!("  - {issue}");
        }
        println!("\n{} issue(s) found.", issues.len());
    }

    Ok(())
}
