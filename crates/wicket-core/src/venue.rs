//! Venue types: the canonical record and the incoming candidate.
//!
//! A [`Venue`] is what the canonical document holds and what ratings point at
//! through its `id`. A [`VenueCandidate`] is the common shape every source
//! normalizer produces; it has no identity until the merge engine admits it.
//! Both share the descriptive attributes in [`Facility`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{lenient, similarity::Coordinates};

/// Display name used when a provider has none.
pub const DEFAULT_NAME: &str = "Cricket ground";

// ─── Shared attributes ───────────────────────────────────────────────────────

/// Descriptive, independently optional venue attributes.
///
/// Every field follows the monotonic enrichment rule in
/// [`Facility::fill_from`]: gaps are filled, existing values are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Facility {
  #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
  pub club:                 Option<String>,
  #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
  pub county:               Option<String>,
  #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
  pub address:              Option<String>,
  #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
  pub postcode:             Option<String>,

  // ── Facilities ──────────────────────────────────────────────────────────
  #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
  pub pitch_type:           Option<String>,
  /// Number of prepared wicket strips on the square.
  #[serde(default, deserialize_with = "lenient::count", skip_serializing_if = "Option::is_none")]
  pub strips:               Option<u32>,
  #[serde(default, deserialize_with = "lenient::flag", skip_serializing_if = "Option::is_none")]
  pub nets:                 Option<bool>,
  #[serde(default, deserialize_with = "lenient::flag", skip_serializing_if = "Option::is_none")]
  pub bar:                  Option<bool>,
  #[serde(default, deserialize_with = "lenient::flag", skip_serializing_if = "Option::is_none")]
  pub parking:              Option<bool>,
  #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
  pub description:          Option<String>,

  // ── Display enrichment ──────────────────────────────────────────────────
  #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
  pub image_url:            Option<String>,
  #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
  pub image_credit:         Option<String>,
  #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
  pub image_license:        Option<String>,

  // ── Links ───────────────────────────────────────────────────────────────
  #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
  pub club_url:             Option<String>,
  #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
  pub play_cricket_url:     Option<String>,
  #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
  pub booking_url:          Option<String>,
  #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
  pub website:              Option<String>,

  // ── Cross-references ────────────────────────────────────────────────────
  /// Wikidata item, e.g. `Q1140547`.
  #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
  pub wikidata:             Option<String>,
  /// Wikipedia article as `<lang>:<title>`, e.g. `en:Lord's_Cricket_Ground`.
  #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
  pub wikipedia:            Option<String>,
  #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
  pub play_cricket_club_id: Option<String>,
  #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
  pub club_official_name:   Option<String>,
  #[serde(default, deserialize_with = "lenient::strings", skip_serializing_if = "Vec::is_empty")]
  pub league_names:         Vec<String>,
}

fn is_blank(value: Option<&str>) -> bool {
  value.is_none_or(|v| v.trim().is_empty())
}

fn fill_text(slot: &mut Option<String>, incoming: &Option<String>) {
  if is_blank(slot.as_deref()) && !is_blank(incoming.as_deref()) {
    slot.clone_from(incoming);
  }
}

/// `Some(false)` counts as a gap; an incoming `true` may fill it.
fn fill_flag(slot: &mut Option<bool>, incoming: Option<bool>) {
  match (*slot, incoming) {
    (Some(true), _) | (_, None) => {}
    (_, Some(value)) => *slot = Some(value),
  }
}

fn fill_count(slot: &mut Option<u32>, incoming: Option<u32>) {
  match (*slot, incoming) {
    (None, Some(n)) => *slot = Some(n),
    (Some(0), Some(n)) if n > 0 => *slot = Some(n),
    _ => {}
  }
}

impl Facility {
  /// Fill every empty attribute of `self` from `incoming`. Attributes that
  /// already hold a value are left untouched regardless of what `incoming`
  /// says.
  pub fn fill_from(&mut self, incoming: &Facility) {
    fill_text(&mut self.club, &incoming.club);
    fill_text(&mut self.county, &incoming.county);
    fill_text(&mut self.address, &incoming.address);
    fill_text(&mut self.postcode, &incoming.postcode);
    fill_text(&mut self.pitch_type, &incoming.pitch_type);
    fill_count(&mut self.strips, incoming.strips);
    fill_flag(&mut self.nets, incoming.nets);
    fill_flag(&mut self.bar, incoming.bar);
    fill_flag(&mut self.parking, incoming.parking);
    fill_text(&mut self.description, &incoming.description);
    fill_text(&mut self.image_url, &incoming.image_url);
    fill_text(&mut self.image_credit, &incoming.image_credit);
    fill_text(&mut self.image_license, &incoming.image_license);
    fill_text(&mut self.club_url, &incoming.club_url);
    fill_text(&mut self.play_cricket_url, &incoming.play_cricket_url);
    fill_text(&mut self.booking_url, &incoming.booking_url);
    fill_text(&mut self.website, &incoming.website);
    fill_text(&mut self.wikidata, &incoming.wikidata);
    fill_text(&mut self.wikipedia, &incoming.wikipedia);
    fill_text(&mut self.play_cricket_club_id, &incoming.play_cricket_club_id);
    fill_text(&mut self.club_official_name, &incoming.club_official_name);
    if self.league_names.is_empty() {
      self.league_names.clone_from(&incoming.league_names);
    }
  }
}

// ─── Venue ───────────────────────────────────────────────────────────────────

/// A canonical venue record. The `id` is issued once and never changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
  #[serde(deserialize_with = "lenient::text_or_empty")]
  pub id:       String,
  #[serde(default = "lenient::default_name", deserialize_with = "lenient::name")]
  pub name:     String,
  #[serde(deserialize_with = "lenient::required_coordinate")]
  pub lat:      f64,
  #[serde(deserialize_with = "lenient::required_coordinate")]
  pub lon:      f64,
  #[serde(flatten)]
  pub facility: Facility,
  /// Set once any contributing source is authoritative; never cleared.
  #[serde(default, deserialize_with = "lenient::bool_or_false")]
  pub verified: bool,
  /// Provenance of the record's first contributor; filled once.
  #[serde(default, deserialize_with = "lenient::text_or_empty")]
  pub source:   String,
  /// Document keys Wicket does not interpret, kept verbatim.
  #[serde(flatten)]
  pub extra:    Map<String, Value>,
}

impl Venue {
  /// Decode a stored element without losing anything it carries.
  ///
  /// Unknown keys land in [`Venue::extra`] through serde. Known keys whose
  /// value reads as absent (`"club_url": ""`, `"nets": ""`, `"strips": null`)
  /// would not be written back, so they are kept in `extra` too until a
  /// value fills them.
  pub fn from_document(element: Value) -> serde_json::Result<Self> {
    let mut venue: Venue = serde_json::from_value(element.clone())?;
    let Value::Object(raw) = element else {
      return Ok(venue);
    };
    let Value::Object(written) = serde_json::to_value(&venue)? else {
      return Ok(venue);
    };
    for (key, value) in raw {
      if !written.contains_key(&key) {
        venue.extra.insert(key, value);
      }
    }
    Ok(venue)
  }

  pub fn coordinates(&self) -> Option<Coordinates> {
    Coordinates::new(self.lat, self.lon)
  }

  /// [`Facility::fill_from`], keeping `extra` clear of keys the facility now
  /// writes itself.
  pub fn enrich(&mut self, incoming: &Facility) {
    self.facility.fill_from(incoming);
    if self.extra.is_empty() {
      return;
    }
    if let Ok(Value::Object(filled)) = serde_json::to_value(&self.facility) {
      self.extra.retain(|key, _| !filled.contains_key(key));
    }
  }
}

// ─── Candidate ───────────────────────────────────────────────────────────────

/// An unreconciled venue description produced by a source normalizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VenueCandidate {
  /// Provenance-derived natural key (`"<provider-type>/<provider-id>"`),
  /// adopted as the venue id if the candidate is admitted as new.
  #[serde(
    rename = "id",
    default,
    deserialize_with = "lenient::text",
    skip_serializing_if = "Option::is_none"
  )]
  pub key:      Option<String>,
  #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
  pub name:     Option<String>,
  #[serde(default, deserialize_with = "lenient::coordinate")]
  pub lat:      Option<f64>,
  #[serde(default, deserialize_with = "lenient::coordinate")]
  pub lon:      Option<f64>,
  #[serde(flatten)]
  pub facility: Facility,
  #[serde(default, deserialize_with = "lenient::text_or_empty")]
  pub source:   String,
}

impl VenueCandidate {
  /// Convenience constructor with every optional attribute unset.
  pub fn new(source: impl Into<String>, lat: f64, lon: f64) -> Self {
    Self {
      source: source.into(),
      lat: Some(lat),
      lon: Some(lon),
      ..Self::default()
    }
  }

  /// `None` unless both coordinates are present and finite.
  pub fn coordinates(&self) -> Option<Coordinates> {
    Coordinates::new(self.lat?, self.lon?)
  }

  /// The name used for matching and admission.
  pub fn display_name(&self) -> &str {
    self
      .name
      .as_deref()
      .filter(|n| !n.trim().is_empty())
      .unwrap_or(DEFAULT_NAME)
  }
}
