//! Storage abstractions for the canonical venue set and the ratings document.
//!
//! Implemented by `wicket-store-json` (local files) and `wicket-remote`
//! (GitHub contents API). Higher layers (`wicket-api`, `wicket-cli`) depend on
//! these traits, not on any concrete backend.

use std::future::Future;

use serde::Serialize;
use serde_json::Value;

use crate::{rating::RatingsDocument, venue::Venue};

// ─── Canonical set ───────────────────────────────────────────────────────────

/// A document element that could not be admitted on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejected {
  /// Position in the stored document.
  pub index:  usize,
  pub reason: String,
  /// Whether the element is in [`LoadedVenues::held`]. Only elements without
  /// finite coordinates are dropped.
  pub held:   bool,
}

/// The result of loading the canonical set: every valid record, in stored
/// order, plus the elements that were skipped.
#[derive(Debug, Clone, Default)]
pub struct LoadedVenues {
  pub venues:   Vec<Venue>,
  pub rejected: Vec<Rejected>,
  /// Rejected elements that still describe a located place. They take no
  /// part in matching and are written back verbatim by
  /// [`VenueStore::save`].
  pub held:     Vec<Value>,
}

/// The canonical venue document. Read fully, written fully; a failed write
/// must leave the previous document intact.
pub trait VenueStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Load the whole set. A store that does not exist yet is an empty set.
  fn load(&self) -> impl Future<Output = Result<LoadedVenues, Self::Error>> + Send + '_;

  /// Replace the whole set with `venues` followed by the `held` elements.
  fn save<'a>(
    &'a self,
    venues: &'a [Venue],
    held: &'a [Value],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

// ─── Ratings ─────────────────────────────────────────────────────────────────

/// Result of an optimistic-concurrency write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStatus {
  Committed,
  /// The document changed since it was fetched; re-fetch and retry.
  Conflict,
}

/// A versioned ratings document with compare-and-swap writes.
pub trait RatingsStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Fetch the current document and its version token.
  fn fetch(&self) -> impl Future<Output = Result<RatingsDocument, Self::Error>> + Send + '_;

  /// Write `document` if the stored version still equals `document.version`.
  fn commit<'a>(
    &'a self,
    document: &'a RatingsDocument,
    message: &'a str,
  ) -> impl Future<Output = Result<CommitStatus, Self::Error>> + Send + 'a;
}
