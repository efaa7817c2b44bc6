//! Error types shared across placescrub crates.

use std::path::PathBuf;

/// Top-level error type for placescrub operations.
#[derive(Debug, thiserror::Error)]
pub enum PlacescrubError {
    #[error("Invalid input root: {path}")]
    InvalidRoot { path: PathBuf },

    #[error("Timeline error: {message}")]
    Timeline { message: String },

    #[error("Story error: {message}")]
    Story { message: String },

    #[error("Output error: {message}")]
    Output { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias using PlacescrubError.
pub type PlacescrubResult<T> = Result<T, PlacescrubError>;

impl PlacescrubError {
    pub fn timeline(msg: impl Into<String>) -> Self {
        Self::Timeline {
            message: msg.into(),
        }
    }

    pub fn story(msg: impl Into<String>) -> Self {
        Self::Story {
            message: msg.into(),
        }
    }

    pub fn output(msg: impl Into<String>) -> Self {
        Self::Output {
            message: msg.into(),
        }
    }

    /// Whether this error should abort the whole run.
    ///
    /// Only an unusable input root or an unwritable output is fatal;
    /// everything else is isolated to the file or record that produced it.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidRoot { .. } | Self::Output { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_root_is_fatal() {
        let err = PlacescrubError::InvalidRoot {
            path: PathBuf::from("/missing"),
        };
        assert!(err.is_fatal());
        assert_eq!(err.to_string(), "Invalid input root: /missing");
    }

    #[test]
    fn test_story_error_is_not_fatal() {
        assert!(!PlacescrubError::story("bad stories file").is_fatal());
        assert!(!PlacescrubError::timeline("unexpected structure").is_fatal());
    }
}
