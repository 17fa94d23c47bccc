//! Tolerant `deserialize_with` helpers for venue documents.
//!
//! The canonical document has been written by several generations of tooling,
//! and provider payloads are worse. A blank string, `null`, and a missing key
//! all mean "absent"; numbers turn up where strings were expected and vice
//! versa.

use serde::{Deserialize, Deserializer, de::Error as _};
use serde_json::Value;

use crate::venue::DEFAULT_NAME;

/// Render a scalar JSON value as trimmed text. Blank strings, `null`, arrays
/// and objects yield `None`.
pub fn value_text(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => {
      let trimmed = s.trim();
      (!trimmed.is_empty()).then(|| trimmed.to_owned())
    }
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    Value::Null | Value::Array(_) | Value::Object(_) => None,
  }
}

/// Coerce a JSON number or numeric string into a finite `f64`.
pub fn value_number(value: &Value) -> Option<f64> {
  let n = match value {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse::<f64>().ok(),
    _ => None,
  }?;
  n.is_finite().then_some(n)
}

/// Interpret the many spellings of a yes/no attribute.
pub fn value_flag(value: &Value) -> Option<bool> {
  match value {
    Value::Bool(b) => Some(*b),
    Value::Number(n) => n.as_f64().map(|n| n != 0.0),
    Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
      "yes" | "true" | "1" | "y" => Some(true),
      "no" | "false" | "0" | "n" => Some(false),
      _ => None,
    },
    _ => None,
  }
}

pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<Value>::deserialize(deserializer)?;
  Ok(value.as_ref().and_then(value_text))
}

/// Like [`text`] but for fields that are always present; absent becomes `""`.
pub fn text_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(text(deserializer)?.unwrap_or_default())
}

/// Display names are never blank.
pub fn name<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(text(deserializer)?.unwrap_or_else(|| DEFAULT_NAME.to_owned()))
}

pub fn default_name() -> String { DEFAULT_NAME.to_owned() }

pub fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<Value>::deserialize(deserializer)?;
  Ok(value.as_ref().and_then(value_flag))
}

pub fn bool_or_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(flag(deserializer)?.unwrap_or(false))
}

pub fn count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<Value>::deserialize(deserializer)?;
  Ok(
    value
      .as_ref()
      .and_then(value_number)
      .filter(|n| *n >= 0.0 && n.fract() == 0.0 && *n <= f64::from(u32::MAX))
      .map(|n| n as u32),
  )
}

pub fn coordinate<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<Value>::deserialize(deserializer)?;
  Ok(value.as_ref().and_then(value_number))
}

/// Canonical venues must carry finite coordinates; anything else is a decode
/// error so the caller can reject the element.
pub fn required_coordinate<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
  D: Deserializer<'de>,
{
  coordinate(deserializer)?
    .ok_or_else(|| D::Error::custom("coordinate is missing or not a finite number"))
}

/// A list of strings; tolerates `null`, a single string, or mixed scalars.
pub fn strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Option::<Value>::deserialize(deserializer)?;
  Ok(match value {
    Some(Value::Array(items)) => items.iter().filter_map(value_text).collect(),
    Some(other) => value_text(&other).into_iter().collect(),
    None => Vec::new(),
  })
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn blank_text_is_absent() {
    assert_eq!(value_text(&json!("  ")), None);
    assert_eq!(value_text(&json!(null)), None);
    assert_eq!(value_text(&json!(" Lord's ")), Some("Lord's".into()));
    assert_eq!(value_text(&json!(42)), Some("42".into()));
  }

  #[test]
  fn numbers_accept_numeric_strings() {
    assert_eq!(value_number(&json!("51.5")), Some(51.5));
    assert_eq!(value_number(&json!(-0.17)), Some(-0.17));
    assert_eq!(value_number(&json!("north")), None);
    assert_eq!(value_number(&json!("NaN")), None);
    assert_eq!(value_number(&json!(null)), None);
  }

  #[test]
  fn flags_understand_osm_spellings() {
    assert_eq!(value_flag(&json!("yes")), Some(true));
    assert_eq!(value_flag(&json!("No")), Some(false));
    assert_eq!(value_flag(&json!("")), None);
    assert_eq!(value_flag(&json!(true)), Some(true));
  }
}
