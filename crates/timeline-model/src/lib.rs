//! placescrub Timeline Model
//!
//! Defines the data contracts placescrub reads and writes:
//! - **Location:** E7 coordinates plus optional place metadata and semantic tag
//! - **Timeline:** Per-period records (`placeVisit` / `activitySegment`)
//! - **Archive:** The year → period tree loaded from a location-history export
//! - **Story:** Photo-story metadata used to place media on the map
//! - **Feature:** GeoJSON point features emitted as the final artifact
//!
//! Coordinates stay as integer E7 values everywhere in this crate; the only
//! conversion to decimal degrees is [`Location::to_degrees`], which feature
//! emission calls exactly once per point.

pub mod archive;
pub mod feature;
pub mod location;
pub mod story;
pub mod timeline;

pub use archive::*;
pub use feature::*;
pub use location::*;
pub use story::*;
pub use timeline::*;
