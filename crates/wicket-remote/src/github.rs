//! [`GithubRatingsStore`]: the ratings document kept in a GitHub repository
//! and written through the contents API. The blob `sha` is the version
//! token; GitHub refuses a write whose `sha` is stale.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use wicket_core::{
  rating::{RatingEntry, RatingsDocument},
  store::{CommitStatus, RatingsStore},
};

use crate::{Error, HttpClient, Result, client::checked};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
  pub token:    Option<String>,
  /// `owner/repo`.
  pub repo:     Option<String>,
  pub branch:   String,
  pub path:     String,
  pub api_base: String,
}

impl Default for GithubConfig {
  fn default() -> Self {
    Self {
      token:    None,
      repo:     None,
      branch:   "main".to_owned(),
      path:     "data/ratings.json".to_owned(),
      api_base: "https://api.github.com".to_owned(),
    }
  }
}

#[derive(Debug, Deserialize)]
struct Contents {
  sha:      String,
  #[serde(default)]
  content:  String,
  #[serde(default)]
  encoding: Option<String>,
}

#[derive(Debug, Serialize)]
struct PutContents<'a> {
  message: &'a str,
  content: String,
  branch:  &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  sha:     Option<&'a str>,
}

/// Decode a contents API payload into ratings entries. A blank file is an
/// empty document.
fn decode_contents(url: &str, contents: &Contents) -> Result<Vec<RatingEntry>> {
  if let Some(encoding) = contents.encoding.as_deref()
    && encoding != "base64"
  {
    return Err(Error::UnexpectedResponse {
      url:    url.to_owned(),
      detail: format!("content encoding {encoding}"),
    });
  }
  // The API wraps base64 content at 60 columns.
  let packed: String = contents.content.split_whitespace().collect();
  let bytes = STANDARD.decode(packed)?;
  if bytes.iter().all(u8::is_ascii_whitespace) {
    return Ok(Vec::new());
  }
  Ok(serde_json::from_slice(&bytes)?)
}

fn encode_contents(entries: &[RatingEntry]) -> Result<String> {
  Ok(STANDARD.encode(serde_json::to_vec_pretty(entries)?))
}

#[derive(Debug, Clone)]
pub struct GithubRatingsStore {
  client: HttpClient,
  token:  String,
  url:    String,
  branch: String,
}

impl GithubRatingsStore {
  /// `None` unless both a token and a repository are configured.
  pub fn new(client: HttpClient, config: &GithubConfig) -> Option<Self> {
    let token = config.token.clone().filter(|t| !t.is_empty())?;
    let repo = config.repo.as_deref().filter(|r| !r.is_empty())?;
    let url = format!(
      "{}/repos/{repo}/contents/{}",
      config.api_base.trim_end_matches('/'),
      config.path.trim_start_matches('/')
    );
    Some(Self { client, token, url, branch: config.branch.clone() })
  }

  fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
    request.bearer_auth(&self.token).header("Accept", "application/vnd.github+json")
  }
}

impl RatingsStore for GithubRatingsStore {
  type Error = Error;

  async fn fetch(&self) -> Result<RatingsDocument> {
    let request = self.authorized(self.client.get(&self.url)).query(&[("ref", &self.branch)]);
    let response = request.send().await?;
    if response.status() == StatusCode::NOT_FOUND {
      return Ok(RatingsDocument::default());
    }
    let contents: Contents = checked(response).await?.json().await?;
    let entries = decode_contents(&self.url, &contents)?;
    Ok(RatingsDocument { entries, version: Some(contents.sha) })
  }

  async fn commit(&self, document: &RatingsDocument, message: &str) -> Result<CommitStatus> {
    let body = PutContents {
      message,
      content: encode_contents(&document.entries)?,
      branch: &self.branch,
      sha: document.version.as_deref(),
    };
    let response = self.authorized(self.client.put(&self.url)).json(&body).send().await?;
    match response.status() {
      // Stale sha, or a missing sha for a file that now exists.
      StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
        tracing::debug!(url = %self.url, "ratings commit conflicted");
        Ok(CommitStatus::Conflict)
      }
      _ => {
        checked(response).await?;
        tracing::info!(url = %self.url, %message, "committed ratings");
        Ok(CommitStatus::Committed)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;

  fn entry() -> RatingEntry {
    RatingEntry {
      ground_id:  "way/1".into(),
      pitch:      4.0,
      pavilion:   3.0,
      bar:        5.0,
      atmosphere: 4.0,
      value:      2.0,
      name:       String::new(),
      comment:    String::new(),
      created_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
      ua:         String::new(),
    }
  }

  #[test]
  fn contents_round_trip_through_wrapped_base64() {
    let encoded = encode_contents(&[entry()]).unwrap();
    let wrapped = encoded
      .as_bytes()
      .chunks(60)
      .map(|c| std::str::from_utf8(c).unwrap())
      .collect::<Vec<_>>()
      .join("\n");
    let contents = Contents { sha: "abc".into(), content: wrapped, encoding: Some("base64".into()) };
    assert_eq!(decode_contents("u", &contents).unwrap(), vec![entry()]);
  }

  #[test]
  fn blank_file_is_empty_and_garbage_is_an_error() {
    let blank = Contents { sha: "s".into(), content: String::new(), encoding: None };
    assert!(decode_contents("u", &blank).unwrap().is_empty());

    let garbage = Contents { sha: "s".into(), content: STANDARD.encode("{not json"), encoding: None };
    assert!(matches!(decode_contents("u", &garbage), Err(Error::Json(_))));

    let odd = Contents { sha: "s".into(), content: String::new(), encoding: Some("none".into()) };
    assert!(matches!(decode_contents("u", &odd), Err(Error::UnexpectedResponse { .. })));
  }

  #[test]
  fn store_requires_token_and_repo() {
    let client = HttpClient::new(&Default::default()).unwrap();
    assert!(GithubRatingsStore::new(client.clone(), &GithubConfig::default()).is_none());

    let config = GithubConfig {
      token: Some("t".into()),
      repo: Some("owner/repo".into()),
      ..GithubConfig::default()
    };
    let store = GithubRatingsStore::new(client, &config).unwrap();
    assert_eq!(store.url, "https://api.github.com/repos/owner/repo/contents/data/ratings.json");
  }
}
