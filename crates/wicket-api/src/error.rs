//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Error bodies are the plain message (`Missing field: pitch`), which is what
//! existing rating widgets display verbatim.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
};
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  BadRequest(String),

  /// Optimistic-concurrency retries ran out.
  #[error("{0}")]
  Conflict(String),

  /// The canonical venue store failed.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// The ratings document store failed.
  #[error("ratings store failed: {0}")]
  Upstream(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<wicket_core::Error> for ApiError {
  fn from(e: wicket_core::Error) -> Self { Self::BadRequest(e.to_string()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
      ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
    };
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    (status, self.to_string()).into_response()
  }
}
