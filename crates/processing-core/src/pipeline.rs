//! End-to-end run: load, anonymize, match stories, assemble, filter.
//!
//! Only an unusable input root (or an output location that cannot be
//! written) aborts a run. Per-file and per-story problems are logged and
//! accumulated into the [`RunReport`].

use std::path::{Component, Path, PathBuf};

use placescrub_common::{
    MatchStrategy, MatchTarget, PipelineDefaults, PlacescrubError, PlacescrubResult,
};
use placescrub_timeline_model::{
    ArchiveError, FeatureError, LoadReport, SkippedStory, StoryExport, StorySource,
    TimelineArchive,
};

use crate::anonymize::{AnonymizeReport, LocationAnonymizer, Noise};
use crate::assemble::{place_visit_entries, FeatureAssembler, MediaUrlBuilder, StoryPoint};
use crate::interval_match::{IntervalMatcher, MatchOutcome};
use crate::keyword_filter::KeywordFilter;

/// File name used when the output directory has no usable last component.
const FALLBACK_OUTPUT_STEM: &str = "features";

/// Request to write a keyword-filtered copy of the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRequest {
    /// Keywords to keep; `None` means the defaults.
    pub keywords: Option<Vec<String>>,
    /// Output file name without extension.
    pub file_stem: String,
}

/// Everything one run needs to know.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub stories_path: Option<PathBuf>,
    pub buffer_hours: f64,
    pub match_strategy: MatchStrategy,
    pub match_against: MatchTarget,
    pub media_base_url: String,
    pub scratch_dir_name: String,
    pub keep_scratch: bool,
    pub filter: Option<FilterRequest>,
}

impl PipelineOptions {
    pub fn new(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        defaults: &PipelineDefaults,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            stories_path: None,
            buffer_hours: defaults.buffer_hours,
            match_strategy: defaults.match_strategy,
            match_against: defaults.match_against,
            media_base_url: defaults.media_base_url.clone(),
            scratch_dir_name: defaults.scratch_dir_name.clone(),
            keep_scratch: defaults.keep_scratch,
            filter: None,
        }
    }

    /// Where the anonymized periods are written during the run.
    pub fn scratch_dir(&self) -> PathBuf {
        self.output_dir.join(&self.scratch_dir_name)
    }

    /// `<output_dir>/<last component of output_dir>.json`.
    pub fn output_file(&self) -> PathBuf {
        let stem = self
            .output_dir
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty() && *name != "." && *name != "..")
            .unwrap_or(FALLBACK_OUTPUT_STEM);
        self.output_dir.join(format!("{stem}.json"))
    }
}

/// What happened to the stories of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoryReport {
    pub geotagged: usize,
    pub matched: usize,
    pub unmatched: usize,
    pub unrecognized_timestamps: usize,
    /// Stories that could not be placed, with the reason.
    pub skipped: Vec<SkippedStory>,
    /// Set when the story file itself could not be loaded.
    pub load_error: Option<String>,
}

/// A filtered copy of the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredOutput {
    pub path: PathBuf,
    pub features: usize,
}

/// Per-run accounting.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub noise: Noise,
    pub load: LoadReport,
    pub anonymize: AnonymizeReport,
    pub stories: StoryReport,
    pub place_features: usize,
    pub total_features: usize,
    pub output_file: PathBuf,
    pub filtered: Option<FilteredOutput>,
    /// The scratch tree, when it was kept.
    pub scratch_dir: Option<PathBuf>,
}

/// The full anonymization pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    options: PipelineOptions,
}

impl Pipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Load and anonymize the input, writing the scratch tree.
    pub fn anonymize(&self, noise: Noise) -> PlacescrubResult<(LoadReport, AnonymizeReport)> {
        let (raw, load) = TimelineArchive::load(&self.options.input_dir).map_err(archive_error)?;
        self.prepare_output_dir()?;

        let (anonymized, report) = LocationAnonymizer::new(noise).anonymize_archive(&raw);

        let scratch = self.options.scratch_dir();
        if scratch.exists() {
            std::fs::remove_dir_all(&scratch)?;
        }
        std::fs::create_dir_all(&scratch).map_err(|e| {
            PlacescrubError::output(format!("cannot create {}: {e}", scratch.display()))
        })?;
        let written = anonymized.write_to(&scratch).map_err(archive_error)?;
        tracing::info!(
            "Sensitive data has been anonymized and saved at {} ({written} file(s))",
            scratch.display()
        );
        Ok((load, report))
    }

    /// Execute every stage with the given run-scoped noise.
    pub fn run(&self, noise: Noise) -> PlacescrubResult<RunReport> {
        let opts = &self.options;
        tracing::info!("Start anonymizing participant's data");
        let (load, anonymize) = self.anonymize(noise)?;
        let scratch = opts.scratch_dir();

        let assembler = FeatureAssembler::new(self.media_urls());
        let mut stories = StoryReport::default();
        let story_points = self.resolve_stories(&scratch, &mut stories);

        let (anonymized, _) = TimelineArchive::load(&scratch).map_err(archive_error)?;
        let entries: Vec<_> = anonymized
            .periods()
            .flat_map(|(_, _, period)| place_visit_entries(period))
            .collect();
        let collection = assembler.assemble(&entries, &story_points);
        let story_features = story_points
            .iter()
            .filter(|point| assembler.story_feature(point).is_some())
            .count();
        let place_features = collection.len() - story_features;

        let output_file = opts.output_file();
        collection.save(&output_file).map_err(feature_error)?;
        tracing::info!(
            "Wrote {} feature(s) to {}",
            collection.len(),
            output_file.display()
        );

        let filtered = match &opts.filter {
            Some(request) => {
                let filter = KeywordFilter::from_optional(request.keywords.as_deref());
                let subset = filter.apply(&collection);
                let path = opts.output_dir.join(format!("{}.json", request.file_stem));
                subset.save(&path).map_err(feature_error)?;
                tracing::info!("Filtered GeoJson file has been saved to {}", path.display());
                Some(FilteredOutput {
                    path,
                    features: subset.len(),
                })
            }
            None => None,
        };

        let scratch_dir = if opts.keep_scratch {
            Some(scratch)
        } else {
            std::fs::remove_dir_all(&scratch)?;
            None
        };

        Ok(RunReport {
            noise,
            load,
            anonymize,
            stories,
            place_features,
            total_features: collection.len(),
            output_file,
            filtered,
            scratch_dir,
        })
    }

    fn media_urls(&self) -> MediaUrlBuilder {
        match &self.options.stories_path {
            Some(path) => MediaUrlBuilder::for_story_file(&self.options.media_base_url, path),
            None => MediaUrlBuilder::new(&self.options.media_base_url, None),
        }
    }

    fn resolve_stories(&self, scratch: &Path, report: &mut StoryReport) -> Vec<StoryPoint> {
        let Some(path) = &self.options.stories_path else {
            return Vec::new();
        };
        let export = match StoryExport::load(path) {
            Ok(export) => export,
            Err(e) => {
                let error = PlacescrubError::story(e.to_string());
                tracing::warn!("Continuing without stories: {error}");
                report.load_error = Some(error.to_string());
                return Vec::new();
            }
        };

        let extraction = export.extract();
        report.skipped = extraction.skipped;

        let search_root = match self.options.match_against {
            MatchTarget::Raw => self.options.input_dir.as_path(),
            MatchTarget::Anonymized => scratch,
        };
        let matcher = IntervalMatcher::new(self.options.buffer_hours)
            .with_strategy(self.options.match_strategy);

        let mut points = Vec::new();
        for story in extraction.records {
            let timestamp = match &story.source {
                StorySource::Geotagged { .. } => {
                    report.geotagged += 1;
                    points.push(StoryPoint::Geotagged(story));
                    continue;
                }
                StorySource::Timestamp(ts) => ts.clone(),
            };
            match matcher.match_in_tree(&timestamp, search_root) {
                MatchOutcome::Matched(location) => {
                    report.matched += 1;
                    points.push(StoryPoint::Matched { story, location });
                }
                MatchOutcome::UnrecognizedTimestamp(_) => report.unrecognized_timestamps += 1,
                MatchOutcome::NotFound | MatchOutcome::RootNotFound(_) => {
                    tracing::debug!("No timeline interval contains story {}", story.uri);
                    report.unmatched += 1;
                }
            }
        }
        tracing::info!(
            "Stories: {} geotagged, {} matched, {} unmatched",
            report.geotagged,
            report.matched,
            report.unmatched
        );
        points
    }

    /// Make sure neither the output nor the scratch directory overlaps the
    /// input tree, then create the output directory.
    fn prepare_output_dir(&self) -> PlacescrubResult<()> {
        let output = &self.options.output_dir;
        let name = Path::new(&self.options.scratch_dir_name);
        if !matches!(
            name.components().collect::<Vec<_>>().as_slice(),
            [Component::Normal(_)]
        ) {
            return Err(PlacescrubError::output(format!(
                "scratch directory name {:?} must be a single plain path component",
                self.options.scratch_dir_name
            )));
        }

        let input = self.options.input_dir.canonicalize()?;
        if resolve_lenient(output)?.starts_with(&input) {
            return Err(PlacescrubError::output(format!(
                "output directory {} lies inside the input tree {}",
                output.display(),
                input.display()
            )));
        }
        let scratch = resolve_lenient(&self.options.scratch_dir())?;
        if scratch.starts_with(&input) || input.starts_with(&scratch) {
            return Err(PlacescrubError::output(format!(
                "scratch directory {} overlaps the input tree {}",
                scratch.display(),
                input.display()
            )));
        }

        std::fs::create_dir_all(output).map_err(|e| {
            PlacescrubError::output(format!("cannot create {}: {e}", output.display()))
        })
    }
}

/// Canonicalize the longest existing prefix of `path` and append the rest.
fn resolve_lenient(path: &Path) -> std::io::Result<PathBuf> {
    let mut existing = path;
    let mut missing = Vec::new();
    while !existing.as_os_str().is_empty() && !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => break,
        }
    }
    let base = if existing.as_os_str().is_empty() {
        std::env::current_dir()?
    } else {
        existing.canonicalize()?
    };
    Ok(missing.into_iter().rev().fold(base, |acc, name| acc.join(name)))
}

fn archive_error(e: ArchiveError) -> PlacescrubError {
    match e {
        ArchiveError::RootNotFound { path } => PlacescrubError::InvalidRoot { path },
        ArchiveError::Io { path, source } => PlacescrubError::output(format!(
            "I/O error at {}: {source}",
            path.display()
        )),
        other => PlacescrubError::timeline(other.to_string()),
    }
}

fn feature_error(e: FeatureError) -> PlacescrubError {
    PlacescrubError::output(e.to_string())
}
