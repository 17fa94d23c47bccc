//! HTTP API for Wicket: rating submission plus read-only venue endpoints.
//!
//! Exposes an axum [`Router`] backed by any [`VenueStore`] and
//! [`RatingsStore`]. TLS, CORS and rate limiting are the caller's concern.
//!
//! Venue ids contain a `/` (`way/123`), so clients percent-encode them in
//! paths: `GET /grounds/way%2F123`.

pub mod error;
pub mod grounds;
pub mod ratings;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use wicket_core::store::{RatingsStore, VenueStore};

pub use error::ApiError;

/// Shared state threaded through all handlers.
pub struct AppState<V, R> {
  pub venues:  Arc<V>,
  pub ratings: Arc<R>,
}

impl<V, R> Clone for AppState<V, R> {
  fn clone(&self) -> Self {
    Self { venues: Arc::clone(&self.venues), ratings: Arc::clone(&self.ratings) }
  }
}

/// Build the API router over `state`.
pub fn api_router<V, R>(state: AppState<V, R>) -> Router<()>
where
  V: VenueStore + 'static,
  R: RatingsStore + 'static,
{
  Router::new()
    .route("/ratings", post(ratings::submit::<V, R>))
    .route("/grounds", get(grounds::list::<V, R>))
    .route("/grounds/{id}", get(grounds::get_one::<V, R>))
    .route("/grounds/{id}/ratings", get(ratings::for_ground::<V, R>))
    .with_state(state)
}

/// Whether `id` names a venue in the canonical set.
pub(crate) async fn venue_exists<V: VenueStore>(venues: &V, id: &str) -> Result<bool, ApiError> {
  let loaded = venues.load().await.map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(loaded.venues.iter().any(|v| v.id == id))
}
