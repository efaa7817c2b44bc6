//! Run the full anonymization pipeline.

use std::io;
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use placescrub_common::config::{AppConfig, MatchStrategy, MatchTarget};
use placescrub_processing_core::{FilterRequest, Noise, Pipeline, PipelineOptions};

use crate::prompt;

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Directory holding the year folders of the export
    pub input: PathBuf,

    /// Output directory; the feature file is named after its last component
    pub output: PathBuf,

    /// Story metadata file (stories.json)
    pub stories: Option<PathBuf>,

    /// Hours added to both ends of every interval when matching stories
    #[arg(long, value_parser = super::parse_buffer_hours)]
    pub buffer_hours: Option<f64>,

    /// Search every period file and keep the closest match
    #[arg(long)]
    pub closest_across_tree: bool,

    /// Which timeline tree stories are matched against
    #[arg(long, value_enum)]
    pub match_against: Option<MatchAgainst>,

    /// Keep the anonymized scratch tree after the run
    #[arg(long)]
    pub keep_scratch: bool,

    /// Write a keyword-filtered copy without asking
    #[arg(long, conflicts_with = "no_filter")]
    pub filter: bool,

    /// Skip the keyword-filtered copy without asking
    #[arg(long)]
    pub no_filter: bool,

    /// Keywords for the filtered copy
    #[arg(long, num_args = 1..)]
    pub keywords: Option<Vec<String>>,

    /// File name (without extension) of the filtered copy
    #[arg(long)]
    pub filtered_name: Option<String>,

    /// Fixed noise in E7 units instead of a random draw
    #[arg(long, hide = true, value_parser = super::parse_noise)]
    pub noise: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MatchAgainst {
    Raw,
    Anonymized,
}

impl From<MatchAgainst> for MatchTarget {
    fn from(value: MatchAgainst) -> Self {
        match value {
            MatchAgainst::Raw => MatchTarget::Raw,
            MatchAgainst::Anonymized => MatchTarget::Anonymized,
        }
    }
}

pub fn run(args: RunArgs, config: &AppConfig) -> anyhow::Result<()> {
    println!("Anonymizing location history at: {}", args.input.display());

    let mut options = PipelineOptions::new(&args.input, &args.output, &config.pipeline);
    options.stories_path = args.stories.clone();
    if let Some(hours) = args.buffer_hours {
        options.buffer_hours = hours;
    }
    if args.closest_across_tree {
        options.match_strategy = MatchStrategy::ClosestAcrossTree;
    }
    if let Some(target) = args.match_against {
        options.match_against = target.into();
    }
    options.keep_scratch |= args.keep_scratch;
    let output_stem = options
        .output_file()
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default()
        .to_string();
    options.filter = filter_request(&args, config, &output_stem)?;

    let noise = args.noise.map(Noise::new).unwrap_or_else(Noise::random);
    let report = Pipeline::new(options)
        .run(noise)
        .map_err(|e| anyhow::anyhow!("Pipeline failed: {e}"))?;

    println!(
        "  Periods: {} loaded, {} empty, {} failed",
        report.load.periods_loaded,
        report.load.empty_count(),
        report.load.parse_failures()
    );
    println!("  Home visits shifted: {}", report.anonymize.homes_shifted);
    if report.anonymize.homes_dropped > 0 {
        println!(
            "  Home visits without usable coordinates: {}",
            report.anonymize.homes_dropped
        );
    }
    println!(
        "  Stories: {} geotagged, {} matched, {} unmatched, {} skipped",
        report.stories.geotagged,
        report.stories.matched,
        report.stories.unmatched,
        report.stories.skipped.len() + report.stories.unrecognized_timestamps
    );
    if let Some(error) = &report.stories.load_error {
        println!("  Stories not loaded: {error}");
    }
    println!(
        "  Features: {} ({} places)",
        report.total_features, report.place_features
    );
    println!("\nGeoJSON written to: {}", report.output_file.display());
    if let Some(filtered) = &report.filtered {
        println!(
            "Filtered GeoJSON ({} features) written to: {}",
            filtered.features,
            filtered.path.display()
        );
    }
    if let Some(scratch) = &report.scratch_dir {
        println!("Anonymized timeline kept at: {}", scratch.display());
    }

    Ok(())
}

/// Settle the filtering choice from flags, asking for whatever is missing.
fn filter_request(
    args: &RunArgs,
    config: &AppConfig,
    output_stem: &str,
) -> anyhow::Result<Option<FilterRequest>> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();

    let wanted = if args.filter {
        true
    } else if args.no_filter {
        false
    } else {
        prompt::ask_true_false(&mut input, &mut out, "Filter Locations? (true/false)")?
    };
    if !wanted {
        return Ok(None);
    }

    let keywords = match &args.keywords {
        Some(keywords) => keywords.clone(),
        None => prompt::ask_keywords(&mut input, &mut out)?
            .unwrap_or_else(|| config.filter.keywords.clone()),
    };
    let file_stem = match &args.filtered_name {
        Some(name) => {
            prompt::check_filename(name, output_stem).map_err(|message| {
                anyhow::anyhow!("Invalid --filtered-name {name:?}: {message}")
            })?;
            name.clone()
        }
        None => prompt::ask_filename(&mut input, &mut out, output_stem)?,
    };

    Ok(Some(FilterRequest {
        keywords: Some(keywords),
        file_stem,
    }))
}
