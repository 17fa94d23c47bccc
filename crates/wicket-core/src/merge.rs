//! The merge engine: fold ordered source batches into the canonical set.
//!
//! `merge` is a pure function of (existing set, batches, config). Candidates
//! are processed strictly in order because every decision sees the state left
//! by the previous one; never reorder or parallelise this loop.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  matcher::{MatchPolicy, find_match},
  venue::{Venue, VenueCandidate},
};

/// Provenance tag given to records whose source left it blank.
pub const UNKNOWN_SOURCE: &str = "unknown";

// ─── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
  pub matching:              MatchPolicy,
  /// Registry-type sources whose contribution marks a venue verified.
  pub authoritative_sources: Vec<String>,
}

impl Default for MergeConfig {
  fn default() -> Self {
    Self {
      matching:              MatchPolicy::default(),
      authoritative_sources: vec!["active_places".into(), "scotland_open".into()],
    }
  }
}

impl MergeConfig {
  pub fn is_authoritative(&self, source: &str) -> bool {
    self.authoritative_sources.iter().any(|s| s == source)
  }
}

// ─── Input / output ──────────────────────────────────────────────────────────

/// One source's normalized candidates, in normalizer order.
#[derive(Debug, Clone, Default)]
pub struct SourceBatch {
  /// Label used in the report, usually the provider id or file name.
  pub label:      String,
  pub candidates: Vec<VenueCandidate>,
}

impl SourceBatch {
  pub fn new(label: impl Into<String>, candidates: Vec<VenueCandidate>) -> Self {
    Self { label: label.into(), candidates }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
  MissingCoordinates,
}

/// What happened to one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Disposition {
  Merged { id: String, distance_m: f64, similarity: f64 },
  Appended { id: String },
  Skipped { reason: SkipReason },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateOutcome {
  pub batch:       String,
  /// Position of the candidate within its batch.
  pub index:       usize,
  pub disposition: Disposition,
}

/// Per-candidate log of a merge run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergeReport {
  pub outcomes: Vec<CandidateOutcome>,
}

impl MergeReport {
  fn count(&self, pred: impl Fn(&Disposition) -> bool) -> usize {
    self.outcomes.iter().filter(|o| pred(&o.disposition)).count()
  }

  pub fn merged(&self) -> usize { self.count(|d| matches!(d, Disposition::Merged { .. })) }

  pub fn appended(&self) -> usize { self.count(|d| matches!(d, Disposition::Appended { .. })) }

  pub fn skipped(&self) -> usize { self.count(|d| matches!(d, Disposition::Skipped { .. })) }
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
  /// Existing records (in their original order), followed by appended ones.
  pub venues: Vec<Venue>,
  pub report: MergeReport,
}

// ─── Working set ─────────────────────────────────────────────────────────────

struct WorkingSet {
  venues: Vec<Venue>,
  ids:    HashSet<String>,
}

impl WorkingSet {
  fn seed(existing: Vec<Venue>) -> Self {
    let ids = existing.iter().map(|v| v.id.clone()).collect();
    Self { venues: existing, ids }
  }

  /// `base` if free, else the first free `base-2`, `base-3`, …
  fn unique_id(&self, base: String) -> String {
    if !self.ids.contains(&base) {
      return base;
    }
    let mut n = 2u64;
    loop {
      let attempt = format!("{base}-{n}");
      if !self.ids.contains(&attempt) {
        return attempt;
      }
      n += 1;
    }
  }

  fn push(&mut self, venue: Venue) {
    self.ids.insert(venue.id.clone());
    self.venues.push(venue);
  }
}

/// Deterministic id for a candidate with no natural key. Identical input
/// always yields the identical id, so repeated runs agree.
pub fn fallback_id(candidate: &VenueCandidate, lat: f64, lon: f64) -> String {
  let source = source_tag(&candidate.source);
  let seed = format!("{source}|{}|{lat:.6}|{lon:.6}", candidate.display_name());
  format!("{source}/{}", Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes()))
}

fn source_tag(source: &str) -> &str {
  let trimmed = source.trim();
  if trimmed.is_empty() { UNKNOWN_SOURCE } else { trimmed }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Merge `batches`, in order, into `existing`.
///
/// Existing records keep their ids and values except for gaps the candidates
/// fill. Unmatched candidates are appended with a fresh id.
pub fn merge(
  existing: Vec<Venue>,
  batches: Vec<SourceBatch>,
  config: &MergeConfig,
) -> MergeOutcome {
  let mut set = WorkingSet::seed(existing);
  let mut report = MergeReport::default();

  for batch in batches {
    for (index, candidate) in batch.candidates.into_iter().enumerate() {
      let disposition = absorb(&mut set, candidate, config);
      report.outcomes.push(CandidateOutcome {
        batch: batch.label.clone(),
        index,
        disposition,
      });
    }
  }

  MergeOutcome { venues: set.venues, report }
}

fn absorb(set: &mut WorkingSet, candidate: VenueCandidate, config: &MergeConfig) -> Disposition {
  let Some(at) = candidate.coordinates() else {
    return Disposition::Skipped { reason: SkipReason::MissingCoordinates };
  };
  let authoritative = config.is_authoritative(candidate.source.trim());

  if let Some(m) = find_match(&candidate, &set.venues, &config.matching) {
    let record = &mut set.venues[m.index];
    record.enrich(&candidate.facility);
    if record.name.trim().is_empty() {
      record.name = candidate.display_name().to_owned();
    }
    if record.source.trim().is_empty() {
      record.source = source_tag(&candidate.source).to_owned();
    }
    record.verified |= authoritative;
    return Disposition::Merged {
      id:         record.id.clone(),
      distance_m: m.distance_m,
      similarity: m.similarity,
    };
  }

  let base = candidate
    .key
    .as_deref()
    .map(str::trim)
    .filter(|k| !k.is_empty())
    .map(str::to_owned)
    .unwrap_or_else(|| fallback_id(&candidate, at.lat, at.lon));
  let id = set.unique_id(base);

  let venue = Venue {
    id:       id.clone(),
    name:     candidate.display_name().to_owned(),
    lat:      at.lat,
    lon:      at.lon,
    source:   source_tag(&candidate.source).to_owned(),
    verified: authoritative,
    facility: candidate.facility,
    extra:    Default::default(),
  };
  set.push(venue);
  Disposition::Appended { id }
}
