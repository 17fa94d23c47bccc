//! Error type for `wicket-remote`.

use thiserror::Error;

/// Upstream response bodies are cut to this many characters in errors.
pub const BODY_EXCERPT_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum Error {
  /// The upstream answered with a non-success status.
  #[error("{url} returned {status}: {body}")]
  Status {
    url:    String,
    status: u16,
    /// Response body, truncated to [`BODY_EXCERPT_CHARS`].
    body:   String,
  },

  #[error("HTTP transport error: {0}")]
  Transport(#[from] reqwest::Error),

  /// A configured endpoint that no fetcher knows how to query.
  #[error("unsupported URL: {0}")]
  UnsupportedUrl(String),

  #[error("invalid URL: {0}")]
  InvalidUrl(#[from] url::ParseError),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("base64 error: {0}")]
  Base64(#[from] base64::DecodeError),

  #[error("unexpected response from {url}: {detail}")]
  UnexpectedResponse { url: String, detail: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) fn excerpt(body: &str) -> String { body.chars().take(BODY_EXCERPT_CHARS).collect() }
