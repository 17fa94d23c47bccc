//! Error type for `wicket-store-json`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("I/O error on {}: {source}", .path.display())]
  Io {
    path:   PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The document is not valid JSON, or a ratings entry does not decode.
  #[error("malformed document {}: {source}", .path.display())]
  Malformed {
    path:   PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("document {} is not a JSON array", .0.display())]
  NotAnArray(PathBuf),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

impl Error {
  pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
    let path = path.into();
    move |source| Self::Io { path, source }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
