//! Source normalizers: provider payloads in, [`VenueCandidate`]s out.
//!
//! Pure and synchronous. Fetching the payloads is `wicket-remote`'s job;
//! everything here works on an already-parsed [`serde_json::Value`].
//!
//! [`VenueCandidate`]: wicket_core::venue::VenueCandidate

pub mod encode;
pub mod error;
pub mod normalize;
pub mod profile;

pub use encode::to_feature_collection;
pub use error::{Error, Result};
pub use normalize::{Normalized, SkipReason, Skipped, normalize};
pub use profile::{Profile, SourceKind};

/// Parse `raw` and normalize it with the profile for `kind`.
pub fn normalize_str(kind: SourceKind, raw: &str) -> Result<Normalized> {
  let payload: serde_json::Value = serde_json::from_str(raw)?;
  normalize(kind.profile(), &payload)
}
