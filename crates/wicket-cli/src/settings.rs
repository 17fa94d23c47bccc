//! Layered configuration: defaults, then an optional TOML file, then
//! `WICKET_*` environment variables (`__` separates nested keys, e.g.
//! `WICKET_PLAY_CRICKET__TOKEN`).

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;
use wicket_core::merge::MergeConfig;
use wicket_remote::{Endpoints, GithubConfig, HttpConfig, ImageConfig, PlayCricketConfig};
use wicket_sources::SourceKind;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub data:         DataSettings,
  pub server:       ServerSettings,
  pub http:         HttpConfig,
  pub sources:      Endpoints,
  pub merge:        MergeConfig,
  pub images:       ImageConfig,
  pub play_cricket: PlayCricketConfig,
  pub github:       GithubConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataSettings {
  /// The canonical venue document.
  pub grounds:   PathBuf,
  /// Local ratings document, used when GitHub is not configured.
  pub ratings:   PathBuf,
  /// Where `fetch` writes and `merge` reads per-source batch files.
  pub batch_dir: PathBuf,
}

impl Default for DataSettings {
  fn default() -> Self {
    Self {
      grounds:   PathBuf::from("data/grounds.json"),
      ratings:   PathBuf::from("data/ratings.json"),
      batch_dir: PathBuf::from("tmp"),
    }
  }
}

impl DataSettings {
  pub fn batch_path(&self, kind: SourceKind) -> PathBuf {
    self.batch_dir.join(format!("{kind}.geojson"))
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
  pub host: String,
  pub port: u16,
}

impl Default for ServerSettings {
  fn default() -> Self { Self { host: "127.0.0.1".to_owned(), port: 8787 } }
}

impl Settings {
  /// Load settings. A missing file is fine; a malformed one is not.
  pub fn load(file: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(file).required(false))
      .add_source(
        config::Environment::with_prefix("WICKET")
          .prefix_separator("_")
          .separator("__"),
      )
      .build()
      .with_context(|| format!("failed to read configuration from {}", file.display()))?
      .try_deserialize()
      .context("failed to deserialise settings")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_configuration_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(settings.data.grounds, PathBuf::from("data/grounds.json"));
    assert_eq!(settings.merge, MergeConfig::default());
    assert_eq!(settings.play_cricket.last_county_id, 100);
    assert!(settings.github.token.is_none());
  }

  #[test]
  fn file_values_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wicket.toml");
    std::fs::write(
      &path,
      r#"
        [data]
        grounds = "out/grounds.json"

        [merge.matching]
        max_distance_m = 500.0

        [sources]
        active_places = "https://example.com/arcgis/rest/services/Sites/FeatureServer/0"
      "#,
    )
    .unwrap();

    let settings = Settings::load(&path).unwrap();
    assert_eq!(settings.data.grounds, PathBuf::from("out/grounds.json"));
    assert_eq!(settings.data.batch_dir, PathBuf::from("tmp"));
    assert_eq!(settings.merge.matching.max_distance_m, 500.0);
    assert_eq!(settings.merge.matching.min_similarity, 0.35);
    assert!(settings.sources.active_places.is_some());
  }
}
