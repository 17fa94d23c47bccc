//! Geographic distance and name-token similarity.
//!
//! Both measures are pure and deterministic; the match resolver combines
//! them with fixed thresholds.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 point in degrees. Only constructible from finite values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
  pub lat: f64,
  pub lon: f64,
}

impl Coordinates {
  pub fn new(lat: f64, lon: f64) -> Option<Self> {
    (lat.is_finite() && lon.is_finite()).then_some(Self { lat, lon })
  }
}

/// Great-circle distance in metres.
pub fn distance_meters(a: Coordinates, b: Coordinates) -> f64 {
  let d_lat = (b.lat - a.lat).to_radians();
  let d_lon = (b.lon - a.lon).to_radians();
  let lat_a = a.lat.to_radians();
  let lat_b = b.lat.to_radians();

  let h = (d_lat / 2.0).sin().powi(2)
    + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
  2.0 * EARTH_RADIUS_M * h.clamp(0.0, 1.0).sqrt().asin()
}

/// Lower-cased alphanumeric tokens of `s`.
///
/// Apostrophes are dropped so possessives fold onto their stem
/// (`Lord's` → `lords`); any other character outside `[a-z0-9]` separates
/// tokens.
pub fn tokens(s: &str) -> BTreeSet<String> {
  let mut cleaned = String::with_capacity(s.len());
  for c in s.chars().flat_map(char::to_lowercase) {
    match c {
      'a'..='z' | '0'..='9' => cleaned.push(c),
      '\'' | '\u{2019}' | '`' => {}
      _ => cleaned.push(' '),
    }
  }
  cleaned.split_whitespace().map(str::to_owned).collect()
}

fn jaccard(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
  if a.is_empty() || b.is_empty() {
    return 0.0;
  }
  let shared = a.intersection(b).count();
  shared as f64 / (a.len() + b.len() - shared) as f64
}

/// Jaccard similarity of the token sets of `a` and `b`, in `[0, 1]`.
/// Zero when either side has no tokens.
pub fn name_similarity(a: &str, b: &str) -> f64 {
  jaccard(&tokens(a), &tokens(b))
}

/// Whether `a` and `b` name the same thing once `generic` tokens such as
/// `cricket` or `club` are discarded: both keep at least one token and the
/// remaining sets are equal (`Lord's` and `Lords Cricket Ground`).
pub fn same_distinctive_tokens(a: &str, b: &str, generic: &[String]) -> bool {
  let strip = |s: &str| -> BTreeSet<String> {
    tokens(s)
      .into_iter()
      .filter(|t| !generic.iter().any(|g| g == t))
      .collect()
  };
  let a = strip(a);
  !a.is_empty() && a == strip(b)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn at(lat: f64, lon: f64) -> Coordinates { Coordinates::new(lat, lon).unwrap() }

  #[test]
  fn distance_to_self_is_zero() {
    let p = at(51.529, -0.173);
    assert_eq!(distance_meters(p, p), 0.0);
  }

  #[test]
  fn distance_is_symmetric() {
    let a = at(51.529, -0.173);
    let b = at(53.456, -2.287);
    let ab = distance_meters(a, b);
    let ba = distance_meters(b, a);
    assert!((ab - ba).abs() < 1e-9, "{ab} != {ba}");
  }

  #[test]
  fn one_degree_of_latitude() {
    let d = distance_meters(at(0.0, 0.0), at(1.0, 0.0));
    let expected = EARTH_RADIUS_M * 1f64.to_radians();
    assert!((d - expected).abs() < 1e-6);
  }

  #[test]
  fn non_finite_coordinates_are_rejected() {
    assert!(Coordinates::new(f64::NAN, 0.0).is_none());
    assert!(Coordinates::new(0.0, f64::INFINITY).is_none());
  }

  #[test]
  fn tokens_normalise_case_punctuation_and_possessives() {
    let t = tokens("  Lord's   Cricket-Ground (MCC) ");
    let expected: BTreeSet<String> =
      ["lords", "cricket", "ground", "mcc"].into_iter().map(String::from).collect();
    assert_eq!(t, expected);
  }

  #[test]
  fn identical_names_score_one() {
    assert_eq!(name_similarity("Trent Bridge", "trent  bridge"), 1.0);
    assert_eq!(name_similarity("Old Trafford", "Old Trafford"), 1.0);
  }

  #[test]
  fn empty_side_scores_zero() {
    assert_eq!(name_similarity("Old Trafford", ""), 0.0);
    assert_eq!(name_similarity("", ""), 0.0);
    assert_eq!(name_similarity("!!!", "Old Trafford"), 0.0);
  }

  #[test]
  fn partial_overlap_is_jaccard() {
    // {a, b, c} vs {a, d, e}: 1 shared of 5.
    assert!((name_similarity("alpha beta gamma", "alpha delta epsilon") - 0.2).abs() < 1e-12);
  }

  #[test]
  fn distinctive_tokens_must_match_exactly() {
    let generic = vec!["cricket".to_string(), "ground".to_string(), "club".to_string()];
    assert!(same_distinctive_tokens("Lord's", "Lords Cricket Ground", &generic));
    assert!(!same_distinctive_tokens("Cricket Ground", "Cricket Ground", &generic));
    assert!(!same_distinctive_tokens("Riverside Park", "Riverside Cricket Club Ground", &generic));
  }
}
