//! Keeping only features whose name mentions a public-place keyword.

use placescrub_common::DEFAULT_FILTER_KEYWORDS;
use placescrub_timeline_model::{Feature, FeatureCollection};

/// Case-insensitive substring filter over feature names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordFilter {
    keywords: Vec<String>,
}

impl Default for KeywordFilter {
    fn default() -> Self {
        Self::new(DEFAULT_FILTER_KEYWORDS.iter().copied())
    }
}

impl KeywordFilter {
    /// Build a filter; keywords are case-folded and blank ones dropped.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Use the given keywords, or the defaults when none are supplied.
    pub fn from_optional(keywords: Option<&[String]>) -> Self {
        match keywords {
            Some(keywords) if keywords.iter().any(|k| !k.trim().is_empty()) => Self::new(keywords),
            _ => Self::default(),
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Whether a feature's name contains any keyword. Unnamed features never match.
    pub fn matches(&self, feature: &Feature) -> bool {
        let Some(name) = feature.name() else {
            return false;
        };
        let name = name.to_lowercase();
        self.keywords.iter().any(|keyword| name.contains(keyword))
    }

    /// A new collection holding only the matching features, in order.
    pub fn apply(&self, collection: &FeatureCollection) -> FeatureCollection {
        FeatureCollection {
            kind: collection.kind,
            features: collection
                .features
                .iter()
                .filter(|f| self.matches(f))
                .cloned()
                .collect(),
        }
    }
}
