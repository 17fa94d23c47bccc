//! Error types for `wicket-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("Missing field: {0}")]
  MissingField(&'static str),

  #[error("invalid value for {field}: {value}")]
  InvalidField { field: &'static str, value: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
