//! Rating submissions and the ratings document.
//!
//! Ratings live in a separate, versioned document keyed by venue `id`. That
//! external reference is why merges must never change or drop an id.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result, lenient};

pub const MAX_NAME_CHARS: usize = 80;
pub const MAX_COMMENT_CHARS: usize = 300;
pub const MAX_USER_AGENT_CHARS: usize = 120;

/// The request body accepted by the rating endpoint. Every field is optional
/// at the type level so that validation can name the first one missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RatingSubmission {
  #[serde(default, deserialize_with = "lenient::text")]
  pub ground_id:  Option<String>,
  #[serde(default)]
  pub pitch:      Option<Value>,
  #[serde(default)]
  pub pavilion:   Option<Value>,
  #[serde(default)]
  pub bar:        Option<Value>,
  #[serde(default)]
  pub atmosphere: Option<Value>,
  #[serde(default)]
  pub value:      Option<Value>,
  #[serde(default, deserialize_with = "lenient::text")]
  pub name:       Option<String>,
  #[serde(default, deserialize_with = "lenient::text")]
  pub comment:    Option<String>,
}

/// One stored rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingEntry {
  pub ground_id:  String,
  pub pitch:      f64,
  pub pavilion:   f64,
  pub bar:        f64,
  pub atmosphere: f64,
  pub value:      f64,
  #[serde(default)]
  pub name:       String,
  #[serde(default)]
  pub comment:    String,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub ua:         String,
}

fn truncate(s: &str, max_chars: usize) -> String { s.chars().take(max_chars).collect() }

fn score(field: &'static str, raw: Option<&Value>) -> Result<f64> {
  let raw = match raw {
    None | Some(Value::Null) => return Err(Error::MissingField(field)),
    Some(raw) => raw,
  };
  lenient::value_number(raw).ok_or_else(|| Error::InvalidField {
    field,
    value: raw.to_string(),
  })
}

impl RatingSubmission {
  /// Check required fields in a fixed order and build the entry to store.
  pub fn validate(self, user_agent: &str, now: DateTime<Utc>) -> Result<RatingEntry> {
    let ground_id = self.ground_id.ok_or(Error::MissingField("ground_id"))?;
    let pitch = score("pitch", self.pitch.as_ref())?;
    let pavilion = score("pavilion", self.pavilion.as_ref())?;
    let bar = score("bar", self.bar.as_ref())?;
    let atmosphere = score("atmosphere", self.atmosphere.as_ref())?;
    let value = score("value", self.value.as_ref())?;

    Ok(RatingEntry {
      ground_id,
      pitch,
      pavilion,
      bar,
      atmosphere,
      value,
      name: truncate(self.name.as_deref().unwrap_or_default(), MAX_NAME_CHARS),
      comment: truncate(self.comment.as_deref().unwrap_or_default(), MAX_COMMENT_CHARS),
      created_at: now,
      ua: truncate(user_agent, MAX_USER_AGENT_CHARS),
    })
  }
}

impl RatingEntry {
  /// Commit message used by versioned backends.
  pub fn commit_message(&self) -> String {
    format!(
      "Add rating for {} at {}",
      self.ground_id,
      self.created_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
  }
}

// ─── Document ────────────────────────────────────────────────────────────────

/// The full ratings document plus the version token it was read at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingsDocument {
  pub entries: Vec<RatingEntry>,
  /// Opaque backend version; `None` when the document does not exist yet.
  pub version: Option<String>,
}

impl RatingsDocument {
  pub fn for_ground<'a>(&'a self, ground_id: &'a str) -> impl Iterator<Item = &'a RatingEntry> + 'a {
    self.entries.iter().filter(move |e| e.ground_id == ground_id)
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use serde_json::json;

  use super::*;

  fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() }

  fn full() -> Value {
    json!({
      "ground_id": "way/123",
      "pitch": 4, "pavilion": "3", "bar": 5, "atmosphere": 4.5, "value": 2,
      "name": "Alice", "comment": "Lovely tea."
    })
  }

  #[test]
  fn valid_submission_builds_entry() {
    let sub: RatingSubmission = serde_json::from_value(full()).unwrap();
    let entry = sub.validate("curl/8", now()).unwrap();
    assert_eq!(entry.ground_id, "way/123");
    assert_eq!(entry.pavilion, 3.0);
    assert_eq!(entry.atmosphere, 4.5);
    assert_eq!(entry.name, "Alice");
    assert_eq!(entry.ua, "curl/8");
    assert_eq!(entry.created_at, now());
  }

  #[test]
  fn each_missing_rating_field_is_named() {
    for field in ["ground_id", "pitch", "pavilion", "bar", "atmosphere", "value"] {
      let mut body = full();
      body.as_object_mut().unwrap().remove(field);
      let sub: RatingSubmission = serde_json::from_value(body).unwrap();
      let err = sub.validate("", now()).unwrap_err();
      assert_eq!(err.to_string(), format!("Missing field: {field}"));
    }
  }

  #[test]
  fn null_counts_as_missing() {
    let mut body = full();
    body["bar"] = Value::Null;
    let sub: RatingSubmission = serde_json::from_value(body).unwrap();
    assert!(matches!(sub.validate("", now()), Err(Error::MissingField("bar"))));
  }

  #[test]
  fn non_numeric_score_is_invalid() {
    let mut body = full();
    body["value"] = json!("great");
    let sub: RatingSubmission = serde_json::from_value(body).unwrap();
    assert!(matches!(sub.validate("", now()), Err(Error::InvalidField { field: "value", .. })));
  }

  #[test]
  fn free_text_is_truncated() {
    let mut body = full();
    body["name"] = json!("n".repeat(200));
    body["comment"] = json!("c".repeat(1_000));
    let sub: RatingSubmission = serde_json::from_value(body).unwrap();
    let entry = sub.validate(&"u".repeat(500), now()).unwrap();
    assert_eq!(entry.name.chars().count(), MAX_NAME_CHARS);
    assert_eq!(entry.comment.chars().count(), MAX_COMMENT_CHARS);
    assert_eq!(entry.ua.chars().count(), MAX_USER_AGENT_CHARS);
  }

  #[test]
  fn document_filters_by_ground() {
    let sub: RatingSubmission = serde_json::from_value(full()).unwrap();
    let entry = sub.validate("", now()).unwrap();
    let mut other = entry.clone();
    other.ground_id = "way/9".into();
    let doc = RatingsDocument { entries: vec![entry, other], version: None };
    assert_eq!(doc.for_ground("way/9").count(), 1);
  }
}
