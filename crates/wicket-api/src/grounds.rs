//! Handlers for `/grounds` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/grounds` | The whole canonical set |
//! | `GET`  | `/grounds/{id}` | 404 if not found |

use axum::{
  Json,
  extract::{Path, State},
};
use wicket_core::{
  store::{RatingsStore, VenueStore},
  venue::Venue,
};

use crate::{AppState, error::ApiError};

/// `GET /grounds`
pub async fn list<V, R>(State(state): State<AppState<V, R>>) -> Result<Json<Vec<Venue>>, ApiError>
where
  V: VenueStore,
  R: RatingsStore,
{
  let loaded = state.venues.load().await.map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(loaded.venues))
}

/// `GET /grounds/{id}`
pub async fn get_one<V, R>(
  State(state): State<AppState<V, R>>,
  Path(id): Path<String>,
) -> Result<Json<Venue>, ApiError>
where
  V: VenueStore,
  R: RatingsStore,
{
  let loaded = state.venues.load().await.map_err(|e| ApiError::Store(Box::new(e)))?;
  let venue = loaded
    .venues
    .into_iter()
    .find(|v| v.id == id)
    .ok_or_else(|| ApiError::NotFound(format!("ground {id} not found")))?;
  Ok(Json(venue))
}
