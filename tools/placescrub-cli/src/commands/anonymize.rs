//! Write an anonymized copy of a timeline tree.

use std::path::PathBuf;

use placescrub_common::config::AppConfig;
use placescrub_processing_core::{Noise, Pipeline, PipelineOptions};

pub fn run(
    input: PathBuf,
    output: PathBuf,
    noise: Option<i64>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    println!("Anonymizing timeline at: {}", input.display());

    let options = PipelineOptions::new(&input, &output, &config.pipeline);
    let scratch = options.scratch_dir();
    let noise = noise.map(Noise::new).unwrap_or_else(Noise::random);
    let (load, report) = Pipeline::new(options)
        .anonymize(noise)
        .map_err(|e| anyhow::anyhow!("Anonymization failed: {e}"))?;

    println!(
        "  Periods: {} loaded, {} empty, {} failed",
        load.periods_loaded,
        load.empty_count(),
        load.parse_failures()
    );
    println!("  Home visits shifted: {}", report.homes_shifted);
    if report.homes_dropped > 0 {
        println!("  Home visits without usable coordinates: {}", report.homes_dropped);
    }
    println!("  Candidates relabeled: {}", report.candidates_relabeled);
    println!("\nAnonymized timeline written to: {}", scratch.display());

    Ok(())
}
