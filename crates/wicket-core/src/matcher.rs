//! Nearest-neighbour-then-threshold match resolution.
//!
//! Every canonical record is ranked by distance to the candidate (ties broken
//! by name similarity, then by position in the set). Only the top-ranked
//! record is considered, and it is accepted only if it is both close enough
//! and similar enough. Proximity alone over-merges dense urban grounds; name
//! overlap alone over-merges generic names.

use serde::{Deserialize, Serialize};

use crate::{
  similarity::{Coordinates, distance_meters, name_similarity, same_distinctive_tokens},
  venue::{Venue, VenueCandidate},
};

/// Acceptance thresholds for [`find_match`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchPolicy {
  /// A match must be strictly closer than this.
  pub max_distance_m: f64,
  /// A match must score strictly above this.
  pub min_similarity: f64,
  /// Tokens too common to identify a venue on their own.
  pub generic_tokens: Vec<String>,
}

impl Default for MatchPolicy {
  fn default() -> Self {
    Self {
      max_distance_m: 700.0,
      min_similarity: 0.35,
      generic_tokens: [
        "cricket", "ground", "grounds", "club", "cc", "sports", "sport",
        "recreation", "playing", "field", "fields", "pitch", "the", "and",
      ]
      .into_iter()
      .map(String::from)
      .collect(),
    }
  }
}

/// The accepted best candidate for a match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
  /// Position of the matched record in the canonical slice.
  pub index:      usize,
  pub distance_m: f64,
  pub similarity: f64,
}

/// Best name score of `candidate_name` against a record's name and club.
///
/// Scores are raw token Jaccard, except that a name equal to the record's
/// name or club once generic words are dropped scores `1.0`.
pub fn name_score(record: &Venue, candidate_name: &str, policy: &MatchPolicy) -> f64 {
  let club = record.facility.club.as_deref().unwrap_or_default();
  let generic = &policy.generic_tokens;
  if same_distinctive_tokens(&record.name, candidate_name, generic)
    || same_distinctive_tokens(club, candidate_name, generic)
  {
    return 1.0;
  }
  name_similarity(&record.name, candidate_name).max(name_similarity(club, candidate_name))
}

/// Select the canonical record `candidate` refers to, if any.
///
/// Returns `None` when the candidate has no finite coordinates, the set is
/// empty, or the nearest record fails either threshold.
pub fn find_match(
  candidate: &VenueCandidate,
  canonical: &[Venue],
  policy: &MatchPolicy,
) -> Option<Match> {
  let here = candidate.coordinates()?;
  let name = candidate.display_name();

  let best = canonical
    .iter()
    .enumerate()
    .filter_map(|(index, record)| {
      let there = Coordinates::new(record.lat, record.lon)?;
      Some(Match {
        index,
        distance_m: distance_meters(there, here),
        similarity: name_score(record, name, policy),
      })
    })
    // `min_by` keeps the first of equal elements, so ties fall back to set
    // order.
    .min_by(|a, b| {
      a.distance_m
        .total_cmp(&b.distance_m)
        .then_with(|| b.similarity.total_cmp(&a.similarity))
    })?;

  (best.distance_m < policy.max_distance_m && best.similarity > policy.min_similarity)
    .then_some(best)
}
