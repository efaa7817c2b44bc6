//! Locate a single timestamp on a timeline tree.

use std::path::PathBuf;

use placescrub_common::config::{AppConfig, MatchStrategy};
use placescrub_processing_core::{IntervalMatcher, MatchOutcome};

pub fn run(
    timestamp: String,
    tree: PathBuf,
    buffer_hours: Option<f64>,
    closest_across_tree: bool,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let strategy = if closest_across_tree {
        MatchStrategy::ClosestAcrossTree
    } else {
        config.pipeline.match_strategy
    };
    let matcher = IntervalMatcher::new(buffer_hours.unwrap_or(config.pipeline.buffer_hours))
        .with_strategy(strategy);

    match matcher.match_in_tree(&timestamp, &tree) {
        MatchOutcome::Matched(found) => {
            let (latitude, longitude) = found.to_degrees();
            println!("{latitude}, {longitude}");
            println!("  Closeness: {}s", found.closeness.num_seconds());
            if let Some(source) = &found.source {
                println!("  Source: {}", source.display());
            }
        }
        MatchOutcome::NotFound => println!("no match"),
        MatchOutcome::UnrecognizedTimestamp(e) => println!("no match ({e})"),
        MatchOutcome::RootNotFound(path) => {
            anyhow::bail!("Timeline tree not found: {}", path.display())
        }
    }

    Ok(())
}
