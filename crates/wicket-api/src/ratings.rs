//! Handlers for rating submission and retrieval.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/ratings` | Body: [`RatingSubmission`]; `{"ok":true}` on success |
//! | `GET`  | `/grounds/{id}/ratings` | 404 if the ground is unknown |

use axum::{
  Json,
  body::Bytes,
  extract::{Path, State},
  http::{HeaderMap, header},
};
use chrono::Utc;
use serde_json::{Value, json};
use wicket_core::{
  rating::{RatingEntry, RatingSubmission},
  store::{CommitStatus, RatingsStore, VenueStore},
};

use crate::{AppState, error::ApiError, venue_exists};

/// Re-fetch and retry this many times after a version conflict.
pub const COMMIT_RETRIES: usize = 3;

fn parse_submission(body: &[u8]) -> Result<RatingSubmission, ApiError> {
  if body.iter().all(u8::is_ascii_whitespace) {
    return Ok(RatingSubmission::default());
  }
  serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {e}")))
}

/// Append `entry` to the ratings document, retrying on conflicts.
async fn append<R: RatingsStore>(ratings: &R, entry: RatingEntry) -> Result<(), ApiError> {
  let message = entry.commit_message();

  for attempt in 0..=COMMIT_RETRIES {
    let mut document = ratings.fetch().await.map_err(|e| ApiError::Upstream(Box::new(e)))?;
    document.entries.push(entry.clone());

    match ratings.commit(&document, &message).await {
      Ok(CommitStatus::Committed) => return Ok(()),
      Ok(CommitStatus::Conflict) => {
        tracing::debug!(attempt, ground_id = %entry.ground_id, "ratings commit conflicted; retrying");
      }
      Err(e) => return Err(ApiError::Upstream(Box::new(e))),
    }
  }

  Err(ApiError::Conflict("Ratings are busy, please try again".to_owned()))
}

/// `POST /ratings`
pub async fn submit<V, R>(
  State(state): State<AppState<V, R>>,
  headers: HeaderMap,
  body: Bytes,
) -> Result<Json<Value>, ApiError>
where
  V: VenueStore,
  R: RatingsStore,
{
  let user_agent = headers
    .get(header::USER_AGENT)
    .and_then(|v| v.to_str().ok())
    .unwrap_or_default();
  let entry = parse_submission(&body)?.validate(user_agent, Utc::now())?;

  if !venue_exists(state.venues.as_ref(), &entry.ground_id).await? {
    return Err(ApiError::NotFound(format!("Unknown ground: {}", entry.ground_id)));
  }

  let ground_id = entry.ground_id.clone();
  append(state.ratings.as_ref(), entry).await?;
  tracing::info!(%ground_id, "rating recorded");
  Ok(Json(json!({ "ok": true })))
}

/// `GET /grounds/{id}/ratings`
pub async fn for_ground<V, R>(
  State(state): State<AppState<V, R>>,
  Path(id): Path<String>,
) -> Result<Json<Vec<RatingEntry>>, ApiError>
where
  V: VenueStore,
  R: RatingsStore,
{
  if !venue_exists(state.venues.as_ref(), &id).await? {
    return Err(ApiError::NotFound(format!("ground {id} not found")));
  }
  let document = state.ratings.fetch().await.map_err(|e| ApiError::Upstream(Box::new(e)))?;
  Ok(Json(document.for_ground(&id).cloned().collect()))
}
