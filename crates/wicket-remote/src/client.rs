//! Shared async HTTP client for every upstream Wicket talks to.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{Error, Result, error::excerpt};

/// Settings shared by all outbound requests.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
  /// Sent on every request; Overpass and Wikimedia ask for a contact.
  pub user_agent:   String,
  pub timeout_secs: u64,
}

impl Default for HttpConfig {
  fn default() -> Self {
    Self {
      user_agent:   concat!("wicket/", env!("CARGO_PKG_VERSION")).to_owned(),
      timeout_secs: 180,
    }
  }
}

/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Debug, Clone)]
pub struct HttpClient {
  client: Client,
}

impl HttpClient {
  pub fn new(config: &HttpConfig) -> Result<Self> {
    let client = Client::builder()
      .user_agent(&config.user_agent)
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()?;
    Ok(Self { client })
  }

  pub fn get(&self, url: &str) -> RequestBuilder { self.client.get(url) }

  pub fn post(&self, url: &str) -> RequestBuilder { self.client.post(url) }

  pub fn put(&self, url: &str) -> RequestBuilder { self.client.put(url) }

  /// `GET url` and decode the JSON body.
  pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
    self.send_json(self.get(url)).await
  }

  /// Send `request`, failing on a non-success status, and decode the body.
  pub async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
    let response = checked(request.send().await?).await?;
    Ok(response.json().await?)
  }
}

/// Turn a non-success response into [`Error::Status`] carrying an excerpt of
/// the body.
pub async fn checked(response: Response) -> Result<Response> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }
  let url = response.url().to_string();
  let body = response.text().await.unwrap_or_default();
  tracing::debug!(%url, %status, "upstream request failed");
  Err(Error::Status { url, status: status.as_u16(), body: excerpt(&body) })
}
