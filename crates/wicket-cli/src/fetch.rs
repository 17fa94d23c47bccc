//! `wicket fetch`: provider payloads → normalized batch files.

use anyhow::{Context as _, bail};
use strum::IntoEnumIterator as _;
use wicket_remote::{Fetcher, HttpClient};
use wicket_sources::{SourceKind, normalize, to_feature_collection};

use crate::settings::Settings;

/// Every source with a remote endpoint.
pub fn fetchable() -> Vec<SourceKind> {
  SourceKind::iter().filter(|k| *k != SourceKind::Common).collect()
}

async fn fetch_one(settings: &Settings, fetcher: &Fetcher, kind: SourceKind) -> anyhow::Result<()> {
  let Some(payload) = fetcher.fetch(kind).await.with_context(|| format!("fetching {kind}"))? else {
    return Ok(());
  };
  let normalized = normalize(kind.profile(), &payload).with_context(|| format!("normalizing {kind}"))?;
  for skipped in &normalized.skipped {
    tracing::debug!(source = %kind, index = skipped.index, reason = ?skipped.reason, "skipped item");
  }

  let path = settings.data.batch_path(kind);
  if let Some(dir) = path.parent() {
    tokio::fs::create_dir_all(dir)
      .await
      .with_context(|| format!("creating {}", dir.display()))?;
  }
  let document = to_feature_collection(&normalized.candidates)?;
  let bytes = serde_json::to_vec_pretty(&document)?;
  tokio::fs::write(&path, bytes)
    .await
    .with_context(|| format!("writing {}", path.display()))?;

  tracing::info!(
    source = %kind,
    candidates = normalized.candidates.len(),
    skipped = normalized.skipped.len(),
    path = %path.display(),
    "saved batch"
  );
  Ok(())
}

pub async fn run(settings: &Settings, only: &[SourceKind]) -> anyhow::Result<()> {
  let kinds = if only.is_empty() { fetchable() } else { only.to_vec() };
  let client = HttpClient::new(&settings.http).context("failed to build HTTP client")?;
  let fetcher = Fetcher::new(client, settings.sources.clone());

  let mut failed = Vec::new();
  for kind in kinds {
    // One provider being down should not lose the others' batches.
    if let Err(e) = fetch_one(settings, &fetcher, kind).await {
      tracing::error!(source = %kind, error = format!("{e:#}"), "fetch failed");
      failed.push(kind.to_string());
    }
  }

  if !failed.is_empty() {
    bail!("failed to fetch: {}", failed.join(", "));
  }
  Ok(())
}
