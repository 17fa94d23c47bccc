//! `wicket merge`: batch files + canonical document → canonical document.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use wicket_core::{
  merge::{Disposition, SourceBatch, merge},
  store::VenueStore as _,
};
use wicket_sources::{SourceKind, normalize_str};
use wicket_store_json::JsonVenueStore;

use crate::settings::Settings;

/// Registry sources first so their records seed the set and later
/// community sources fill them in.
pub const DEFAULT_ORDER: [SourceKind; 4] = [
  SourceKind::ActivePlaces,
  SourceKind::ScotlandOpen,
  SourceKind::OsGreenspace,
  SourceKind::Osm,
];

/// Read one batch file. A missing default batch is skipped; a missing
/// explicitly named batch is an error.
async fn read_batch(path: &Path, required: bool) -> anyhow::Result<Option<SourceBatch>> {
  let raw = match tokio::fs::read_to_string(path).await {
    Ok(raw) => raw,
    Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
      tracing::info!(path = %path.display(), "no batch file; skipping");
      return Ok(None);
    }
    Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
  };

  let normalized = normalize_str(SourceKind::Common, &raw)
    .with_context(|| format!("parsing batch {}", path.display()))?;
  if !normalized.skipped.is_empty() {
    tracing::warn!(path = %path.display(), skipped = normalized.skipped.len(), "batch items skipped");
  }
  let label = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
  Ok(Some(SourceBatch::new(label, normalized.candidates)))
}

pub async fn run(
  settings: &Settings,
  explicit: &[PathBuf],
  dry_run: bool,
  report_path: Option<&Path>,
) -> anyhow::Result<()> {
  let store = JsonVenueStore::new(&settings.data.grounds);
  let loaded = store
    .load()
    .await
    .with_context(|| format!("loading {}", settings.data.grounds.display()))?;
  if !loaded.rejected.is_empty() {
    tracing::warn!(
      rejected = loaded.rejected.len(),
      held = loaded.held.len(),
      "canonical records not admitted on load"
    );
  }

  let paths: Vec<(PathBuf, bool)> = if explicit.is_empty() {
    DEFAULT_ORDER.iter().map(|k| (settings.data.batch_path(*k), false)).collect()
  } else {
    explicit.iter().map(|p| (p.clone(), true)).collect()
  };
  let mut batches = Vec::new();
  for (path, required) in &paths {
    batches.extend(read_batch(path, *required).await?);
  }

  let before = loaded.venues.len();
  let outcome = merge(loaded.venues, batches, &settings.merge);
  let report = &outcome.report;
  for skipped in report.outcomes.iter().filter(|o| matches!(o.disposition, Disposition::Skipped { .. })) {
    tracing::warn!(batch = %skipped.batch, index = skipped.index, "candidate without coordinates");
  }
  tracing::info!(
    before,
    after = outcome.venues.len(),
    merged = report.merged(),
    appended = report.appended(),
    skipped = report.skipped(),
    "merge complete"
  );

  if let Some(path) = report_path {
    let bytes = serde_json::to_vec_pretty(report)?;
    tokio::fs::write(path, bytes)
      .await
      .with_context(|| format!("writing report {}", path.display()))?;
  }

  if dry_run {
    tracing::info!("dry run; canonical document left unchanged");
    return Ok(());
  }
  store
    .save(&outcome.venues, &loaded.held)
    .await
    .with_context(|| format!("saving {}", settings.data.grounds.display()))
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use tempfile::TempDir;

  use super::*;

  #[tokio::test]
  async fn merge_command_combines_batches_into_the_canonical_document() {
    let dir = TempDir::new().unwrap();
    let mut settings = Settings::default();
    settings.data.grounds = dir.path().join("grounds.json");
    settings.data.batch_dir = dir.path().join("tmp");
    std::fs::create_dir_all(&settings.data.batch_dir).unwrap();

    std::fs::write(
      &settings.data.grounds,
      json!([{ "id": "A", "name": "Lord's", "lat": 51.5294, "lon": -0.1727, "source": "osm" }]).to_string(),
    )
    .unwrap();
    std::fs::write(
      settings.data.batch_path(SourceKind::ActivePlaces),
      json!({ "type": "FeatureCollection", "features": [
        { "type": "Feature",
          "properties": { "id": "active_places/1", "name": "Lords Cricket Ground",
                          "club_url": "https://lords.org", "source": "active_places" },
          "geometry": { "type": "Point", "coordinates": [-0.1730, 51.5296] } },
        { "type": "Feature",
          "properties": { "id": "active_places/2", "name": "Elsewhere CC", "source": "active_places" },
          "geometry": { "type": "Point", "coordinates": [-1.0, 52.0] } },
      ]})
      .to_string(),
    )
    .unwrap();

    run(&settings, &[], false, None).await.unwrap();

    let loaded = JsonVenueStore::new(&settings.data.grounds).load().await.unwrap();
    let ids: Vec<_> = loaded.venues.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, ["A", "active_places/2"]);
    assert_eq!(loaded.venues[0].facility.club_url.as_deref(), Some("https://lords.org"));
    assert!(loaded.venues[0].verified);
  }

  #[tokio::test]
  async fn duplicate_canonical_ids_are_kept_through_a_merge() {
    let dir = TempDir::new().unwrap();
    let mut settings = Settings::default();
    settings.data.grounds = dir.path().join("grounds.json");
    settings.data.batch_dir = dir.path().join("tmp");
    std::fs::create_dir_all(&settings.data.batch_dir).unwrap();

    std::fs::write(
      &settings.data.grounds,
      json!([
        { "id": "A", "name": "Lord's", "lat": 51.5294, "lon": -0.1727, "source": "osm" },
        { "id": "A", "name": "Lord's (old entry)", "lat": 51.5294, "lon": -0.1727, "what3words": "a.b.c" },
      ])
      .to_string(),
    )
    .unwrap();
    std::fs::write(
      settings.data.batch_path(SourceKind::Osm),
      json!({ "type": "FeatureCollection", "features": [
        { "type": "Feature", "properties": { "name": "Somewhere New", "source": "osm" },
          "geometry": { "type": "Point", "coordinates": [-1.0, 52.0] } },
      ]})
      .to_string(),
    )
    .unwrap();

    run(&settings, &[], false, None).await.unwrap();

    let written: Vec<serde_json::Value> =
      serde_json::from_str(&std::fs::read_to_string(&settings.data.grounds).unwrap()).unwrap();
    assert_eq!(written.len(), 3);
    assert!(written.iter().any(|e| e["name"] == "Lord's (old entry)" && e["what3words"] == "a.b.c"));
  }

  #[tokio::test]
  async fn missing_explicit_batch_is_an_error() {
    let dir = TempDir::new().unwrap();
    let mut settings = Settings::default();
    settings.data.grounds = dir.path().join("grounds.json");

    let missing = dir.path().join("nope.geojson");
    assert!(run(&settings, &[missing], false, None).await.is_err());
  }

  #[tokio::test]
  async fn dry_run_leaves_the_document_alone() {
    let dir = TempDir::new().unwrap();
    let mut settings = Settings::default();
    settings.data.grounds = dir.path().join("grounds.json");
    let batch = dir.path().join("extra.geojson");
    std::fs::write(
      &batch,
      json!({ "type": "FeatureCollection", "features": [
        { "type": "Feature", "properties": { "name": "New Ground", "source": "osm" },
          "geometry": { "type": "Point", "coordinates": [0.0, 51.0] } },
      ]})
      .to_string(),
    )
    .unwrap();
    let report = dir.path().join("report.json");

    run(&settings, &[batch], true, Some(report.as_path())).await.unwrap();

    assert!(!settings.data.grounds.exists());
    let written: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(report).unwrap()).unwrap();
    assert_eq!(written["outcomes"][0]["disposition"]["outcome"], "appended");
  }
}
