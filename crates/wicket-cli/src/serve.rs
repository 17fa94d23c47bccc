//! `wicket serve`: the HTTP API.

use std::sync::Arc;

use anyhow::Context as _;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use wicket_api::{AppState, api_router};
use wicket_core::store::RatingsStore;
use wicket_remote::{GithubRatingsStore, HttpClient};
use wicket_store_json::{JsonRatingsStore, JsonVenueStore};

use crate::settings::Settings;

async fn serve_with<R: RatingsStore + 'static>(settings: &Settings, ratings: R) -> anyhow::Result<()> {
  let state = AppState {
    venues:  Arc::new(JsonVenueStore::new(&settings.data.grounds)),
    ratings: Arc::new(ratings),
  };
  let app = api_router(state).layer(TraceLayer::new_for_http());

  let address = format!("{}:{}", settings.server.host, settings.server.port);
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  tracing::info!("Listening on http://{address}");

  axum::serve(listener, app).await.context("server error")
}

pub async fn run(settings: &Settings) -> anyhow::Result<()> {
  let client = HttpClient::new(&settings.http).context("failed to build HTTP client")?;
  match GithubRatingsStore::new(client, &settings.github) {
    Some(github) => {
      tracing::info!(repo = ?settings.github.repo, "ratings stored on GitHub");
      serve_with(settings, github).await
    }
    None => {
      tracing::info!(path = %settings.data.ratings.display(), "ratings stored locally");
      serve_with(settings, JsonRatingsStore::new(&settings.data.ratings)).await
    }
  }
}
