//! [`JsonRatingsStore`]: the ratings document as a local JSON array.
//!
//! The version token is the SHA-256 of the file content, so writers in other
//! processes are detected as conflicts too. In-process commits are
//! serialized by a mutex around the compare-and-write.

use std::{path::PathBuf, sync::Arc};

use tokio::sync::Mutex;
use wicket_core::{
  rating::{RatingEntry, RatingsDocument},
  store::{CommitStatus, RatingsStore},
};

use crate::{
  Error, Result,
  file::{content_version, read_optional, write_atomic},
};

#[derive(Debug, Clone)]
pub struct JsonRatingsStore {
  path:  PathBuf,
  write: Arc<Mutex<()>>,
}

impl JsonRatingsStore {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into(), write: Arc::new(Mutex::new(())) }
  }

  async fn read(&self) -> Result<RatingsDocument> {
    let Some(bytes) = read_optional(&self.path).await? else {
      return Ok(RatingsDocument::default());
    };
    let entries: Vec<RatingEntry> = serde_json::from_slice(&bytes)
      .map_err(|source| Error::Malformed { path: self.path.clone(), source })?;
    Ok(RatingsDocument { entries, version: Some(content_version(&bytes)) })
  }
}

impl RatingsStore for JsonRatingsStore {
  type Error = Error;

  async fn fetch(&self) -> Result<RatingsDocument> { self.read().await }

  async fn commit(&self, document: &RatingsDocument, message: &str) -> Result<CommitStatus> {
    let _guard = self.write.lock().await;

    let current = read_optional(&self.path).await?.map(|bytes| content_version(&bytes));
    if current != document.version {
      tracing::debug!(path = %self.path.display(), "ratings document changed since fetch");
      return Ok(CommitStatus::Conflict);
    }

    let mut bytes = serde_json::to_vec_pretty(&document.entries)?;
    bytes.push(b'\n');
    write_atomic(&self.path, &bytes).await?;
    tracing::info!(path = %self.path.display(), entries = document.entries.len(), %message, "committed ratings");
    Ok(CommitStatus::Committed)
  }
}
