//! `wicket enrich`: enrichment passes over the canonical document.

use anyhow::Context as _;
use wicket_core::store::{LoadedVenues, VenueStore as _};
use wicket_remote::{HttpClient, ImageEnricher, PlayCricketClient};
use wicket_store_json::JsonVenueStore;

use crate::settings::Settings;

async fn load(store: &JsonVenueStore) -> anyhow::Result<LoadedVenues> {
  let loaded = store
    .load()
    .await
    .with_context(|| format!("loading {}", store.path().display()))?;
  if !loaded.rejected.is_empty() {
    tracing::warn!(
      rejected = loaded.rejected.len(),
      held = loaded.held.len(),
      "canonical records not admitted on load"
    );
  }
  Ok(loaded)
}

pub async fn images(settings: &Settings) -> anyhow::Result<()> {
  let client = HttpClient::new(&settings.http).context("failed to build HTTP client")?;
  let enricher = ImageEnricher::new(client, &settings.images);

  let store = JsonVenueStore::new(&settings.data.grounds);
  let mut loaded = load(&store).await?;
  let report = enricher.enrich(&mut loaded.venues).await;

  if report.updated > 0 {
    store.save(&loaded.venues, &loaded.held).await.context("saving enriched venues")?;
  }
  Ok(())
}

pub async fn play_cricket(settings: &mut Settings, counties: Vec<String>) -> anyhow::Result<()> {
  if !counties.is_empty() {
    settings.play_cricket.county_filter = counties;
  }
  let client = HttpClient::new(&settings.http).context("failed to build HTTP client")?;
  let Some(play_cricket) = PlayCricketClient::new(client, settings.play_cricket.clone()) else {
    tracing::info!("no Play-Cricket token configured (WICKET_PLAY_CRICKET__TOKEN); skipping");
    return Ok(());
  };

  let store = JsonVenueStore::new(&settings.data.grounds);
  let mut loaded = load(&store).await?;
  let report = play_cricket.enrich(&mut loaded.venues).await;
  if !report.county_failures.is_empty() {
    tracing::warn!(counties = report.county_failures.len(), "some county club lists failed");
  }

  if report.matched > 0 {
    store.save(&loaded.venues, &loaded.held).await.context("saving enriched venues")?;
  }
  Ok(())
}
