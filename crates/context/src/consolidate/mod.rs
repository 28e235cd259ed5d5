//! Result consolidation: turning raw scored chunks into what a chat turn shows.
//!
//! - [`ranges`] merges page and time intervals
//! - [`media`] extracts proxied image, video and audio references
//! - [`sources`] collapses chunks into one source per document
//!
//! All three are pure and synchronous over an immutable chunk slice.

pub mod media;
pub mod ranges;
pub mod sources;

pub use media::{DEFAULT_STREAM_ENDPOINT, MediaExtractor};
pub use ranges::{Bound, Interval};
pub use sources::SourceDeduplicator;
