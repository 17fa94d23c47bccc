//! [`JsonVenueStore`]: the canonical venue document as one JSON array.

use std::{
  collections::HashSet,
  path::{Path, PathBuf},
};

use serde::Serialize;
use serde_json::Value;
use wicket_core::{
  lenient,
  store::{LoadedVenues, Rejected, VenueStore},
  venue::Venue,
};

use crate::{
  Error, Result,
  file::{read_optional, write_atomic},
};

/// The canonical venue set stored as a pretty-printed JSON array.
#[derive(Debug, Clone)]
pub struct JsonVenueStore {
  path: PathBuf,
}

impl JsonVenueStore {
  pub fn new(path: impl Into<PathBuf>) -> Self { Self { path: path.into() } }

  pub fn path(&self) -> &Path { &self.path }
}

/// One element of the written document.
#[derive(Serialize)]
#[serde(untagged)]
enum Element<'a> {
  Venue(&'a Venue),
  Held(&'a Value),
}

fn located(element: &Value) -> bool {
  let coordinate = |key: &str| element.get(key).and_then(lenient::value_number);
  coordinate("lat").is_some() && coordinate("lon").is_some()
}

/// Decode each element independently so one bad record does not sink the
/// whole document. Elements without finite coordinates are dropped; any
/// other rejected element is held and written back unchanged.
fn admit(elements: Vec<Value>) -> LoadedVenues {
  let mut loaded = LoadedVenues::default();
  let mut seen = HashSet::new();

  for (index, element) in elements.into_iter().enumerate() {
    if !located(&element) {
      let reason = "missing or non-finite coordinates".to_owned();
      tracing::warn!(index, %reason, "dropping canonical record");
      loaded.rejected.push(Rejected { index, reason, held: false });
      continue;
    }

    let reason = match Venue::from_document(element.clone()) {
      Err(e) => e.to_string(),
      Ok(venue) if venue.id.is_empty() => "empty id".to_owned(),
      Ok(venue) if !seen.insert(venue.id.clone()) => format!("duplicate id {}", venue.id),
      Ok(venue) => {
        loaded.venues.push(venue);
        continue;
      }
    };
    tracing::warn!(index, %reason, "holding canonical record unchanged");
    loaded.rejected.push(Rejected { index, reason, held: true });
    loaded.held.push(element);
  }

  loaded
}

impl VenueStore for JsonVenueStore {
  type Error = Error;

  async fn load(&self) -> Result<LoadedVenues> {
    let Some(bytes) = read_optional(&self.path).await? else {
      tracing::info!(path = %self.path.display(), "no canonical document yet; starting empty");
      return Ok(LoadedVenues::default());
    };

    let document: Value = serde_json::from_slice(&bytes)
      .map_err(|source| Error::Malformed { path: self.path.clone(), source })?;
    let Value::Array(elements) = document else {
      return Err(Error::NotAnArray(self.path.clone()));
    };

    let loaded = admit(elements);
    tracing::debug!(
      venues = loaded.venues.len(),
      rejected = loaded.rejected.len(),
      "loaded canonical document"
    );
    Ok(loaded)
  }

  async fn save(&self, venues: &[Venue], held: &[Value]) -> Result<()> {
    let document: Vec<Element<'_>> = venues
      .iter()
      .map(Element::Venue)
      .chain(held.iter().map(Element::Held))
      .collect();
    let mut bytes = serde_json::to_vec_pretty(&document)?;
    bytes.push(b'\n');
    write_atomic(&self.path, &bytes).await?;
    tracing::info!(
      path = %self.path.display(),
      venues = venues.len(),
      held = held.len(),
      "saved canonical document"
    );
    Ok(())
  }
}
