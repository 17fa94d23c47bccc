//! JSON file backends for the canonical venue set and the ratings document.
//!
//! Both documents are read whole and rewritten whole. Writes go to a sibling
//! temporary file that is renamed over the target, so a failed save leaves
//! the previous document in place.

mod file;
mod ratings;
mod venues;

pub mod error;

pub use error::{Error, Result};
pub use file::content_version;
pub use ratings::JsonRatingsStore;
pub use venues::JsonVenueStore;
