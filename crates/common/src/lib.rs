//! placescrub Common Utilities
//!
//! Shared infrastructure for all placescrub crates:
//! - Error types and result aliases
//! - Timestamp parsing for story and timeline times
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
