//! Wikimedia image enrichment for venues without a picture.
//!
//! A venue with a `wikipedia` cross-reference gets its article's summary
//! thumbnail; otherwise Commons is searched for `"<name> cricket ground
//! <county>"` and the first image hit is used.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;
use wicket_core::venue::{Facility, Venue};

use crate::{HttpClient, Result};

const COMMONS_API: &str = "https://commons.wikimedia.org/w/api.php";
const WIKIPEDIA_LICENSE: &str = "Likely CC BY-SA; see source page";
const COMMONS_LICENSE: &str = "See Commons page";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
  /// Pause after every venue that received an image.
  pub delay_ms: u64,
}

impl Default for ImageConfig {
  fn default() -> Self { Self { delay_ms: 1_000 } }
}

/// An image and its attribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
  pub url:     String,
  pub credit:  String,
  pub license: String,
}

/// Split an OSM-style `wikipedia` value (`"en:Lord's Cricket Ground"`) into
/// language and title.
pub fn parse_wikipedia_tag(tag: &str) -> Option<(&str, &str)> {
  let (lang, title) = tag.split_once(':')?;
  let lang_ok = !lang.is_empty() && lang.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
  (lang_ok && !title.trim().is_empty()).then_some((lang, title.trim()))
}

pub fn summary_url(lang: &str, title: &str) -> Result<Url> {
  let mut url = Url::parse(&format!("https://{lang}.wikipedia.org/api/rest_v1/page/summary/"))?;
  if let Ok(mut segments) = url.path_segments_mut() {
    segments.pop_if_empty().push(title);
  }
  Ok(url)
}

pub fn commons_search_url(query: &str) -> Result<Url> {
  Ok(Url::parse_with_params(COMMONS_API, [
    ("action", "query"),
    ("origin", "*"),
    ("format", "json"),
    ("prop", "imageinfo"),
    ("iiprop", "url|extmetadata"),
    ("generator", "search"),
    ("gsrsearch", query),
    ("gsrlimit", "1"),
  ])?)
}

pub fn commons_query(venue: &Venue) -> String {
  let county = venue.facility.county.as_deref().unwrap_or_default();
  format!("{} cricket ground {county}", venue.name).trim().to_owned()
}

/// The thumbnail of a REST page summary.
pub fn image_from_summary(summary: &Value) -> Option<Image> {
  let url = summary.pointer("/thumbnail/source")?.as_str()?.to_owned();
  let credit = match summary.pointer("/titles/display").and_then(Value::as_str) {
    Some(title) => format!("Image via Wikipedia ({title})"),
    None => "Image via Wikipedia".to_owned(),
  };
  Some(Image { url, credit, license: WIKIPEDIA_LICENSE.to_owned() })
}

/// The first page with image info in a Commons generator search.
pub fn image_from_commons(response: &Value) -> Option<Image> {
  let pages = response.pointer("/query/pages")?.as_object()?;
  let info = pages.values().find_map(|page| page.pointer("/imageinfo/0"))?;
  let url = info.get("url")?.as_str()?.to_owned();
  let meta = |key: &str| {
    info
      .pointer(&format!("/extmetadata/{key}/value"))
      .and_then(Value::as_str)
      .map(str::trim)
      .filter(|s| !s.is_empty())
  };
  let credit = match meta("Artist") {
    Some(artist) => format!("© {artist} (Wikimedia Commons)"),
    None => "Wikimedia Commons".to_owned(),
  };
  let license = meta("LicenseShortName").unwrap_or(COMMONS_LICENSE).to_owned();
  Some(Image { url, credit, license })
}

// ─── Report ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ItemFailure {
  pub id:    String,
  pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImageReport {
  pub updated:  usize,
  /// Venues that already had an image.
  pub kept:     usize,
  /// Venues for which no lookup found an image.
  pub missing:  usize,
  pub failures: Vec<ItemFailure>,
}

// ─── Enricher ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ImageEnricher {
  client: HttpClient,
  delay:  Duration,
}

impl ImageEnricher {
  pub fn new(client: HttpClient, config: &ImageConfig) -> Self {
    Self { client, delay: Duration::from_millis(config.delay_ms) }
  }

  async fn wikipedia_image(&self, tag: &str) -> Result<Option<Image>> {
    let Some((lang, title)) = parse_wikipedia_tag(tag) else {
      return Ok(None);
    };
    let summary: Value = self.client.get_json(summary_url(lang, title)?.as_str()).await?;
    Ok(image_from_summary(&summary))
  }

  async fn commons_image(&self, venue: &Venue) -> Result<Option<Image>> {
    let url = commons_search_url(&commons_query(venue))?;
    let response: Value = self.client.get_json(url.as_str()).await?;
    Ok(image_from_commons(&response))
  }

  /// Look up one venue: Wikipedia first when referenced, Commons otherwise
  /// or when Wikipedia has nothing.
  async fn lookup(&self, venue: &Venue) -> Result<Option<Image>> {
    if let Some(tag) = venue.facility.wikipedia.as_deref() {
      match self.wikipedia_image(tag).await {
        Ok(Some(image)) => return Ok(Some(image)),
        Ok(None) => {}
        Err(e) => tracing::debug!(id = %venue.id, error = %e, "wikipedia summary failed"),
      }
    }
    self.commons_image(venue).await
  }

  /// Fill `image_url`, `image_credit` and `image_license` where missing.
  /// Lookup failures are collected in the report.
  pub async fn enrich(&self, venues: &mut [Venue]) -> ImageReport {
    let mut report = ImageReport::default();

    for venue in venues.iter_mut() {
      if venue.facility.image_url.is_some() {
        report.kept += 1;
        continue;
      }
      match self.lookup(venue).await {
        Ok(Some(image)) => {
          venue.enrich(&Facility {
            image_url: Some(image.url),
            image_credit: Some(image.credit),
            image_license: Some(image.license),
            ..Facility::default()
          });
          report.updated += 1;
          tokio::time::sleep(self.delay).await;
        }
        Ok(None) => report.missing += 1,
        Err(e) => {
          tracing::warn!(id = %venue.id, error = %e, "image lookup failed");
          report.failures.push(ItemFailure { id: venue.id.clone(), error: e.to_string() });
        }
      }
    }

    tracing::info!(
      updated = report.updated,
      missing = report.missing,
      failed = report.failures.len(),
      "image enrichment complete"
    );
    report
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn wikipedia_tags_split_on_the_first_colon() {
    assert_eq!(parse_wikipedia_tag("en:Lord's Cricket Ground"), Some(("en", "Lord's Cricket Ground")));
    assert_eq!(parse_wikipedia_tag("en:Talk:Thing"), Some(("en", "Talk:Thing")));
    assert_eq!(parse_wikipedia_tag("Lord's"), None);
    assert_eq!(parse_wikipedia_tag("evil.host/x:Title"), None);
  }

  #[test]
  fn summary_url_encodes_the_title() {
    let url = summary_url("en", "Old Trafford Cricket Ground").unwrap();
    assert_eq!(
      url.as_str(),
      "https://en.wikipedia.org/api/rest_v1/page/summary/Old%20Trafford%20Cricket%20Ground"
    );
  }

  #[test]
  fn commons_search_carries_the_query() {
    let url = commons_search_url("Lord's cricket ground Middlesex").unwrap();
    let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
    assert!(pairs.contains(&("gsrsearch".into(), "Lord's cricket ground Middlesex".into())));
    assert!(pairs.contains(&("gsrlimit".into(), "1".into())));
  }

  #[test]
  fn summary_thumbnail_becomes_an_image() {
    let summary = json!({
      "titles": { "display": "Lord's" },
      "thumbnail": { "source": "https://upload.wikimedia.org/lords.jpg" }
    });
    let image = image_from_summary(&summary).unwrap();
    assert_eq!(image.url, "https://upload.wikimedia.org/lords.jpg");
    assert_eq!(image.credit, "Image via Wikipedia (Lord's)");
    assert!(image_from_summary(&json!({ "title": "No image" })).is_none());
  }

  #[test]
  fn commons_hit_carries_artist_and_license() {
    let response = json!({ "query": { "pages": { "123": { "imageinfo": [{
      "url": "https://upload.wikimedia.org/ground.jpg",
      "extmetadata": {
        "Artist": { "value": "Jane Doe" },
        "LicenseShortName": { "value": "CC BY-SA 4.0" }
      }
    }]}}}});
    let image = image_from_commons(&response).unwrap();
    assert_eq!(image.credit, "© Jane Doe (Wikimedia Commons)");
    assert_eq!(image.license, "CC BY-SA 4.0");

    let bare = json!({ "query": { "pages": { "1": { "imageinfo": [{ "url": "u" }] } } } });
    let image = image_from_commons(&bare).unwrap();
    assert_eq!(image.credit, "Wikimedia Commons");
    assert_eq!(image.license, COMMONS_LICENSE);

    assert!(image_from_commons(&json!({ "batchcomplete": "" })).is_none());
  }

  #[test]
  fn commons_query_omits_missing_county() {
    let mut venue: Venue =
      serde_json::from_value(json!({ "id": "a", "name": "Lord's", "lat": 51.0, "lon": 0.0 })).unwrap();
    assert_eq!(commons_query(&venue), "Lord's cricket ground");
    venue.facility.county = Some("Middlesex".into());
    assert_eq!(commons_query(&venue), "Lord's cricket ground Middlesex");
  }
}
