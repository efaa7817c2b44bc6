//! Keyword-filter an existing feature collection.

use std::path::PathBuf;

use placescrub_common::config::AppConfig;
use placescrub_processing_core::KeywordFilter;
use placescrub_timeline_model::FeatureCollection;

pub fn run(
    collection: PathBuf,
    output: PathBuf,
    keywords: Vec<String>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    println!("Filtering features in: {}", collection.display());

    let features = FeatureCollection::load(&collection)
        .map_err(|e| anyhow::anyhow!("Failed to load features: {e}"))?;

    let filter = if keywords.is_empty() {
        KeywordFilter::new(&config.filter.keywords)
    } else {
        KeywordFilter::new(&keywords)
    };
    let kept = filter.apply(&features);

    kept.save(&output)
        .map_err(|e| anyhow::anyhow!("Failed to write filtered features: {e}"))?;

    println!("  Keywords: {}", filter.keywords().join(", "));
    println!("  Kept {} of {} features", kept.len(), features.len());
    println!("\nFiltered GeoJSON written to: {}", output.display());

    Ok(())
}
