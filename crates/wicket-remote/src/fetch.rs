//! Provider fetchers: one payload per source, ready for the normalizers.

use serde::Deserialize;
use serde_json::Value;
use url::Url;
use wicket_sources::SourceKind;

use crate::{Error, HttpClient, Result};

/// UK cricket pitches as nodes, ways and relations, with way/relation
/// centres and all tags.
pub const OVERPASS_QUERY: &str = r#"[out:json][timeout:180];
area["ISO3166-1"="GB"][admin_level=2]->.uk;
(
  node["leisure"="pitch"]["sport"="cricket"](area.uk);
  way["leisure"="pitch"]["sport"="cricket"](area.uk);
  relation["leisure"="pitch"]["sport"="cricket"](area.uk);
);
out center tags;
"#;

/// Where each provider is fetched from. Unset optional endpoints skip their
/// source.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Endpoints {
  pub overpass:      String,
  /// An ArcGIS FeatureServer/MapServer layer or a WFS endpoint.
  pub active_places: Option<String>,
  pub scotland_open: Option<String>,
  /// Must point at a pre-converted `.geojson` file.
  pub os_greenspace: Option<String>,
}

impl Default for Endpoints {
  fn default() -> Self {
    Self {
      overpass:      "https://overpass-api.de/api/interpreter".to_owned(),
      active_places: None,
      scotland_open: Some(
        "https://opendata.arcgis.com/api/v3/datasets/f13873a2-e78c-4f2b-a1af-cfb8f9895330_8/downloads/data?format=geojson&spatialRefId=4326"
          .to_owned(),
      ),
      os_greenspace: None,
    }
  }
}

/// Rewrite a configured Active Places endpoint into a GeoJSON query.
///
/// ArcGIS layers get the standard `query` path; WFS endpoints get a
/// `GetFeature` request for JSON unless an output format is already set.
pub fn active_places_query_url(endpoint: &str) -> Result<String> {
  if endpoint.contains("/FeatureServer/") || endpoint.contains("/MapServer/") {
    return Ok(format!(
      "{}/query?where=1%3D1&outFields=*&f=geojson",
      endpoint.trim_end_matches('/')
    ));
  }

  let lower = endpoint.to_ascii_lowercase();
  if lower.contains("service=wfs") || lower.contains("ows?") {
    if endpoint.contains("outputFormat=") {
      return Ok(endpoint.to_owned());
    }
    let separator = if endpoint.contains('?') { '&' } else { '?' };
    return Ok(format!(
      "{endpoint}{separator}service=WFS&request=GetFeature&outputFormat=application/json"
    ));
  }

  Err(Error::UnsupportedUrl(format!(
    "{endpoint} (expected an ArcGIS FeatureServer/MapServer layer or a WFS endpoint)"
  )))
}

/// Greenspace is only published as GeoPackage/GML; automation needs a
/// pre-converted GeoJSON mirror.
pub fn greenspace_url(endpoint: &str) -> Result<&str> {
  let path = Url::parse(endpoint)?.path().to_ascii_lowercase();
  if path.ends_with(".geojson") {
    Ok(endpoint)
  } else {
    Err(Error::UnsupportedUrl(format!("{endpoint} (expected a .geojson file)")))
  }
}

/// Fetches raw provider payloads.
#[derive(Debug, Clone)]
pub struct Fetcher {
  client:    HttpClient,
  endpoints: Endpoints,
}

impl Fetcher {
  pub fn new(client: HttpClient, endpoints: Endpoints) -> Self { Self { client, endpoints } }

  /// Fetch the payload for `kind`, or `None` when the source has no
  /// endpoint configured.
  pub async fn fetch(&self, kind: SourceKind) -> Result<Option<Value>> {
    let endpoints = &self.endpoints;
    let payload = match kind {
      SourceKind::Osm => Some(self.overpass(&endpoints.overpass).await?),
      SourceKind::ActivePlaces => match &endpoints.active_places {
        Some(endpoint) => Some(self.client.get_json(&active_places_query_url(endpoint)?).await?),
        None => None,
      },
      SourceKind::ScotlandOpen => match &endpoints.scotland_open {
        Some(endpoint) => Some(self.client.get_json(endpoint).await?),
        None => None,
      },
      SourceKind::OsGreenspace => match &endpoints.os_greenspace {
        Some(endpoint) => Some(self.client.get_json(greenspace_url(endpoint)?).await?),
        None => None,
      },
      SourceKind::Common => None,
    };
    if payload.is_none() {
      tracing::info!(source = %kind, "no endpoint configured; skipping");
    }
    Ok(payload)
  }

  async fn overpass(&self, endpoint: &str) -> Result<Value> {
    tracing::debug!(%endpoint, "querying Overpass");
    let request = self.client.post(endpoint).form(&[("data", OVERPASS_QUERY)]);
    self.client.send_json(request).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn arcgis_layers_get_a_geojson_query() {
    let url = "https://services1.arcgis.com/x/arcgis/rest/services/Sites/FeatureServer/0/";
    assert_eq!(
      active_places_query_url(url).unwrap(),
      "https://services1.arcgis.com/x/arcgis/rest/services/Sites/FeatureServer/0/query?where=1%3D1&outFields=*&f=geojson"
    );
  }

  #[test]
  fn wfs_endpoints_get_a_get_feature_request() {
    assert_eq!(
      active_places_query_url("https://maps.example/ows?typeName=sites").unwrap(),
      "https://maps.example/ows?typeName=sites&service=WFS&request=GetFeature&outputFormat=application/json"
    );
    let explicit = "https://maps.example/wfs?service=WFS&outputFormat=json";
    assert_eq!(active_places_query_url(explicit).unwrap(), explicit);
  }

  #[test]
  fn other_active_places_urls_are_rejected() {
    assert!(matches!(
      active_places_query_url("https://example.com/sites.csv"),
      Err(Error::UnsupportedUrl(_))
    ));
  }

  #[test]
  fn greenspace_needs_geojson() {
    assert!(greenspace_url("https://mirror.example/greenspace.GeoJSON?v=2").is_ok());
    assert!(greenspace_url("https://osdatahub.os.uk/downloads/open/OpenGreenspace/GeoPackage").is_err());
  }
}
