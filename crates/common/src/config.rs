//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Pipeline defaults used by `placescrub run`.
    pub pipeline: PipelineDefaults,

    /// Keyword filter defaults.
    pub filter: FilterDefaults,

    /// Thresholds for `placescrub validate`.
    pub validation: ValidationThresholds,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// How the interval matcher walks a search tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Return the best candidate of the first file (in traversal order)
    /// that contains any matching interval.
    #[default]
    FirstMatchingFile,
    /// Scan every file and return the globally closest candidate.
    ClosestAcrossTree,
}

/// Which timeline tree story timestamps are matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchTarget {
    /// The untouched input export.
    Raw,
    /// The anonymized scratch tree written earlier in the run.
    #[default]
    Anonymized,
}

/// Default pipeline parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineDefaults {
    /// Symmetric tolerance added to both ends of every interval (hours).
    pub buffer_hours: f64,

    /// Matcher traversal behavior.
    pub match_strategy: MatchStrategy,

    /// Tree consulted when matching story timestamps.
    pub match_against: MatchTarget,

    /// Prefix for constructed story media URLs.
    pub media_base_url: String,

    /// Name of the anonymized scratch directory under the output directory.
    pub scratch_dir_name: String,

    /// Keep the anonymized scratch tree after a successful run.
    pub keep_scratch: bool,
}

/// Keyword filter parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterDefaults {
    /// Keywords used when the caller supplies none.
    pub keywords: Vec<String>,
}

/// Location history quality thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationThresholds {
    /// Minimum number of unique places a month should contain.
    pub min_places_per_month: usize,

    /// Minimum number of months of history.
    pub min_month_history: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "placescrub=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

/// Common public-place terms kept by the keyword filter by default.
pub const DEFAULT_FILTER_KEYWORDS: &[&str] = &[
    "park",
    "plaza",
    "church",
    "school",
    "community center",
    "parking lot",
    "playground",
    "promenade",
    "boardwalk",
    "mall",
    "garden",
    "beach",
    "strip",
    "overlook",
];

impl Default for PipelineDefaults {
    fn default() -> Self {
        Self {
            buffer_hours: 0.0,
            match_strategy: MatchStrategy::default(),
            match_against: MatchTarget::default(),
            media_base_url: "http://localhost:3000/".to_string(),
            scratch_dir_name: "anonymized_location_data".to_string(),
            keep_scratch: false,
        }
    }
}

impl Default for FilterDefaults {
    fn default() -> Self {
        Self {
            keywords: DEFAULT_FILTER_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
        }
    }
}

impl Default for ValidationThresholds {
    fn default() -> Self {
        Self {
            min_places_per_month: 20,
            min_month_history: 12,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("placescrub").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.pipeline.buffer_hours, 0.0);
        assert_eq!(
            config.pipeline.match_strategy,
            MatchStrategy::FirstMatchingFile
        );
        assert_eq!(config.pipeline.scratch_dir_name, "anonymized_location_data");
        assert_eq!(config.filter.keywords.len(), 14);
        assert_eq!(config.validation.min_places_per_month, 20);
        assert_eq!(config.validation.min_month_history, 12);
    }

    #[test]
    fn test_partial_config_fills_missing_sections() {
        let raw = r#"{"pipeline":{"buffer_hours":2.5,"match_strategy":"closest_across_tree"}}"#;
        let config: AppConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.pipeline.buffer_hours, 2.5);
        assert_eq!(
            config.pipeline.match_strategy,
            MatchStrategy::ClosestAcrossTree
        );
        assert_eq!(config.pipeline.match_against, MatchTarget::Anonymized);
        assert_eq!(config.logging.level, "info");
    }
}
