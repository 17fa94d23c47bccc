//! Error types for the source normalizers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The payload is not a feature collection, an element list, or an array.
  #[error("unsupported payload: {0}")]
  UnsupportedPayload(String),

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
