//! Writing candidates back out as a GeoJSON batch file in the common shape.
//!
//! `wicket fetch` saves one such file per source; the `common` profile reads
//! it back for `wicket merge`.

use serde_json::{Value, json};
use wicket_core::venue::VenueCandidate;

use crate::Result;

/// Encode candidates as a FeatureCollection. Every candidate attribute goes
/// into `properties`; the geometry is a `[lon, lat]` point, or `null` for a
/// candidate without coordinates.
pub fn to_feature_collection(candidates: &[VenueCandidate]) -> Result<Value> {
  let features = candidates
    .iter()
    .map(|candidate| -> Result<Value> {
      let geometry = match candidate.coordinates() {
        Some(at) => json!({ "type": "Point", "coordinates": [at.lon, at.lat] }),
        None => Value::Null,
      };
      Ok(json!({
        "type": "Feature",
        "properties": serde_json::to_value(candidate)?,
        "geometry": geometry,
      }))
    })
    .collect::<Result<Vec<_>>>()?;

  Ok(json!({ "type": "FeatureCollection", "features": features }))
}
