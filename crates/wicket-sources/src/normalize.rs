//! The generic extraction routine that turns a provider payload into
//! candidates by walking a [`Profile`].

use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;
use wicket_core::{
  lenient,
  similarity::Coordinates,
  venue::{DEFAULT_NAME, Facility, VenueCandidate},
};

use crate::{
  Error, Result,
  profile::{Field, Keyword, Layout, Locate, Mapping, Profile, Rule},
};

const COMMONS_FILE_PATH: &str = "https://commons.wikimedia.org/wiki/Special:FilePath/";

/// Objects that may hold an item's attributes, in order of preference.
const BAGS: [&str; 3] = ["properties", "attributes", "tags"];

// ─── Outcomes ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
  /// The container element is not a JSON object.
  NotAnObject,
  /// No coordinate location yielded a finite pair.
  MissingCoordinates,
  /// A keyword-filtered source whose record does not mention the keyword.
  NotCricket,
  /// A common-shape record that does not decode as a candidate.
  Malformed(String),
}

/// An input item that did not become a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
  /// Position in the payload's item list.
  pub index:  usize,
  pub reason: SkipReason,
}

/// The candidates extracted from one payload, in payload order.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
  pub candidates: Vec<VenueCandidate>,
  pub skipped:    Vec<Skipped>,
}

// ─── Record access ───────────────────────────────────────────────────────────

/// One payload item together with its property bag.
#[derive(Clone, Copy)]
struct Record<'a> {
  item: &'a Map<String, Value>,
  bag:  &'a Map<String, Value>,
}

impl<'a> Record<'a> {
  fn new(item: &'a Map<String, Value>) -> Self {
    let bag = BAGS
      .iter()
      .find_map(|key| item.get(*key)?.as_object())
      .unwrap_or(item);
    Self { item, bag }
  }

  fn get(&self, key: &str) -> Option<&'a Value> {
    if let Some(own) = key.strip_prefix('@') {
      return self.item.get(own);
    }
    self.bag.get(key).or_else(|| self.item.get(key))
  }

  fn text(&self, key: &str) -> Option<String> { self.get(key).and_then(lenient::value_text) }

  fn geometry(&self) -> Option<&'a Map<String, Value>> { self.item.get("geometry")?.as_object() }
}

// ─── Rules ───────────────────────────────────────────────────────────────────

fn first_text(record: &Record<'_>, keys: &[&str]) -> Option<String> {
  keys.iter().find_map(|key| record.text(key))
}

fn apply(rule: Rule, record: &Record<'_>) -> Option<String> {
  match rule {
    Rule::Keys(keys) => first_text(record, keys),
    Rule::Joined(keys) => {
      let parts: Vec<String> = keys.iter().filter_map(|key| record.text(key)).collect();
      (!parts.is_empty()).then(|| parts.join(", "))
    }
    Rule::Composite(keys) => keys
      .iter()
      .map(|key| record.text(key))
      .collect::<Option<Vec<_>>>()
      .map(|parts| parts.join("/")),
    Rule::Prefixed(prefix, keys) => first_text(record, keys).map(|v| format!("{prefix}/{v}")),
    Rule::CommonsFile(key) => record.text(key).and_then(|file| commons_file_url(&file)),
  }
}

fn resolve(rules: &[Rule], record: &Record<'_>) -> Option<String> {
  rules.iter().find_map(|rule| apply(*rule, record))
}

/// Rewrite a Commons `File:` name as a direct `Special:FilePath` URL.
pub fn commons_file_url(file: &str) -> Option<String> {
  let name = match file.get(..5) {
    Some(prefix) if prefix.eq_ignore_ascii_case("file:") => &file[5..],
    _ => file,
  }
  .trim();
  if name.is_empty() {
    return None;
  }
  let mut url = Url::parse(COMMONS_FILE_PATH).ok()?;
  url.path_segments_mut().ok()?.pop_if_empty().push(name);
  Some(url.into())
}

fn assign(facility: &mut Facility, field: Field, value: String) {
  let flag = |v: String| lenient::value_flag(&Value::String(v));
  match field {
    Field::Club => facility.club = Some(value),
    Field::County => facility.county = Some(value),
    Field::Address => facility.address = Some(value),
    Field::Postcode => facility.postcode = Some(value),
    Field::PitchType => facility.pitch_type = Some(value),
    Field::Strips => facility.strips = value.parse().ok(),
    Field::Nets => facility.nets = flag(value),
    Field::Bar => facility.bar = flag(value),
    Field::Parking => facility.parking = flag(value),
    Field::Description => facility.description = Some(value),
    Field::ImageUrl => facility.image_url = Some(value),
    Field::ClubUrl => facility.club_url = Some(value),
    Field::Website => facility.website = Some(value),
    Field::Wikidata => facility.wikidata = Some(value),
    Field::Wikipedia => facility.wikipedia = Some(value),
  }
}

fn mentions(keyword: &Keyword, name: Option<&str>, record: &Record<'_>) -> bool {
  let needle = keyword.needle.to_lowercase();
  name
    .into_iter()
    .map(str::to_owned)
    .chain(keyword.keys.iter().filter_map(|key| record.text(key)))
    .any(|text| text.to_lowercase().contains(&needle))
}

// ─── Coordinates ─────────────────────────────────────────────────────────────

fn pair(lat: Option<&Value>, lon: Option<&Value>) -> Option<Coordinates> {
  Coordinates::new(lenient::value_number(lat?)?, lenient::value_number(lon?)?)
}

/// `[lon, lat]` position array.
fn position(value: &Value) -> Option<Coordinates> {
  let position = value.as_array()?;
  pair(position.get(1), position.first())
}

fn ring_centroid(ring: &[Value]) -> Option<Coordinates> {
  let mut points: Vec<Coordinates> = ring.iter().filter_map(position).collect();
  // Closed rings repeat the first vertex.
  if points.len() > 1 && points.first() == points.last() {
    points.pop();
  }
  if points.is_empty() {
    return None;
  }
  let n = points.len() as f64;
  let lat = points.iter().map(|p| p.lat).sum::<f64>() / n;
  let lon = points.iter().map(|p| p.lon).sum::<f64>() / n;
  Coordinates::new(lat, lon)
}

fn locate(locate: Locate, record: &Record<'_>) -> Option<Coordinates> {
  match locate {
    Locate::PointGeometry => position(record.geometry()?.get("coordinates")?),
    Locate::PolygonCentroid => {
      let geometry = record.geometry()?;
      let coordinates = geometry.get("coordinates")?.as_array()?;
      let ring = match geometry.get("type")?.as_str()? {
        "Polygon" => coordinates.first()?,
        "MultiPolygon" => coordinates.first()?.as_array()?.first()?,
        _ => return None,
      };
      ring_centroid(ring.as_array()?)
    }
    Locate::GeometryXy => {
      let geometry = record.geometry()?;
      pair(geometry.get("y"), geometry.get("x"))
    }
    Locate::GeometryLatLon => {
      let geometry = record.geometry()?;
      pair(geometry.get("latitude"), geometry.get("longitude"))
    }
    Locate::Keys { lat, lon } => pair(record.get(lat), record.get(lon)),
    Locate::Nested { object, lat, lon } => {
      let nested = record.item.get(object)?.as_object()?;
      pair(nested.get(lat), nested.get(lon))
    }
  }
}

fn coordinates(locations: &[Locate], record: &Record<'_>) -> Option<Coordinates> {
  locations.iter().find_map(|l| locate(*l, record))
}

// ─── Extraction ──────────────────────────────────────────────────────────────

fn items(payload: &Value) -> Result<&[Value]> {
  match payload {
    Value::Array(items) => Ok(items.as_slice()),
    Value::Object(document) => document
      .get("features")
      .or_else(|| document.get("elements"))
      .and_then(Value::as_array)
      .map(Vec::as_slice)
      .ok_or_else(|| {
        Error::UnsupportedPayload("object without a `features` or `elements` array".into())
      }),
    Value::Null => Err(Error::UnsupportedPayload("null document".into())),
    _ => Err(Error::UnsupportedPayload("scalar document".into())),
  }
}

fn mapped(
  profile: &Profile,
  key: &[Rule],
  name: &[Rule],
  fields: &[Mapping],
  keyword: Option<&Keyword>,
  record: &Record<'_>,
) -> Result<VenueCandidate, SkipReason> {
  let name = resolve(name, record);
  if let Some(keyword) = keyword
    && !mentions(keyword, name.as_deref(), record)
  {
    return Err(SkipReason::NotCricket);
  }
  let at = coordinates(profile.coordinates, record).ok_or(SkipReason::MissingCoordinates)?;

  let mut facility = Facility::default();
  for mapping in fields {
    if let Some(value) = resolve(mapping.rules, record) {
      assign(&mut facility, mapping.field, value);
    }
  }

  Ok(VenueCandidate {
    key: resolve(key, record),
    name: Some(name.unwrap_or_else(|| DEFAULT_NAME.to_owned())),
    lat: Some(at.lat),
    lon: Some(at.lon),
    facility,
    source: profile.kind.as_ref().to_owned(),
  })
}

fn common(profile: &Profile, record: &Record<'_>) -> Result<VenueCandidate, SkipReason> {
  let mut candidate: VenueCandidate = serde_json::from_value(Value::Object(record.bag.clone()))
    .map_err(|e| SkipReason::Malformed(e.to_string()))?;
  if candidate.coordinates().is_none() {
    let at = coordinates(profile.coordinates, record).ok_or(SkipReason::MissingCoordinates)?;
    candidate.lat = Some(at.lat);
    candidate.lon = Some(at.lon);
  }
  if candidate.name.is_none() {
    candidate.name = Some(DEFAULT_NAME.to_owned());
  }
  Ok(candidate)
}

/// Extract every candidate `profile` can find in `payload`.
///
/// Only an unrecognizable container is an error; items that cannot become
/// candidates are reported in [`Normalized::skipped`].
pub fn normalize(profile: &Profile, payload: &Value) -> Result<Normalized> {
  let mut out = Normalized::default();

  for (index, item) in items(payload)?.iter().enumerate() {
    let outcome = match item.as_object() {
      None => Err(SkipReason::NotAnObject),
      Some(item) => {
        let record = Record::new(item);
        match &profile.layout {
          Layout::Mapped { key, name, fields, keyword } => {
            mapped(profile, key, name, fields, keyword.as_ref(), &record)
          }
          Layout::Common => common(profile, &record),
        }
      }
    };
    match outcome {
      Ok(candidate) => out.candidates.push(candidate),
      Err(reason) => out.skipped.push(Skipped { index, reason }),
    }
  }

  Ok(out)
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::SourceKind;

  fn run(kind: SourceKind, payload: Value) -> Normalized {
    normalize(kind.profile(), &payload).unwrap()
  }

  #[test]
  fn osm_elements_use_node_coordinates_or_way_center() {
    let out = run(
      SourceKind::Osm,
      json!({ "elements": [
        { "type": "node", "id": 1, "lat": 51.5, "lon": -0.17,
          "tags": { "name": "Lord's", "operator": "MCC", "website": "https://lords.org" } },
        { "type": "way", "id": 123, "center": { "lat": 53.45, "lon": -2.28 },
          "tags": { "name": "Old Trafford", "addr:street": "Talbot Road", "addr:city": "Manchester" } },
        { "type": "relation", "id": 7, "tags": { "name": "Nowhere", "type": "multipolygon" } },
      ]}),
    );

    assert_eq!(out.candidates.len(), 2);
    let lords = &out.candidates[0];
    assert_eq!(lords.key.as_deref(), Some("node/1"));
    assert_eq!(lords.facility.club.as_deref(), Some("MCC"));
    assert_eq!(lords.facility.club_url.as_deref(), Some("https://lords.org"));
    assert_eq!(lords.source, "osm");

    let old_trafford = &out.candidates[1];
    assert_eq!(old_trafford.key.as_deref(), Some("way/123"));
    assert_eq!((old_trafford.lat, old_trafford.lon), (Some(53.45), Some(-2.28)));
    assert_eq!(old_trafford.facility.address.as_deref(), Some("Talbot Road, Manchester"));

    assert_eq!(out.skipped, vec![Skipped { index: 2, reason: SkipReason::MissingCoordinates }]);
  }

  #[test]
  fn element_type_is_not_shadowed_by_a_type_tag() {
    let out = run(
      SourceKind::Osm,
      json!({ "elements": [
        { "type": "relation", "id": 7, "center": { "lat": 52.0, "lon": -1.0 },
          "tags": { "name": "Ground", "type": "multipolygon" } },
      ]}),
    );
    assert_eq!(out.candidates[0].key.as_deref(), Some("relation/7"));
  }

  #[test]
  fn commons_tag_becomes_file_path_url() {
    let out = run(
      SourceKind::Osm,
      json!({ "elements": [
        { "type": "node", "id": 2, "lat": 51.0, "lon": 0.0,
          "tags": { "wikimedia_commons": "File:Old Trafford.jpg" } },
      ]}),
    );
    let candidate = &out.candidates[0];
    assert_eq!(
      candidate.facility.image_url.as_deref(),
      Some("https://commons.wikimedia.org/wiki/Special:FilePath/Old%20Trafford.jpg")
    );
    assert_eq!(candidate.name.as_deref(), Some(DEFAULT_NAME));
  }

  #[test]
  fn alias_lists_take_the_first_non_blank_key() {
    let out = run(
      SourceKind::ActivePlaces,
      json!({ "features": [{
        "attributes": {
          "OBJECTID": 42, "SiteName": "", "FacilityName": "Village Cricket Club",
          "Postcode": " ", "POSTCODE": "AB1 2CD",
          "Address1": "1 High St", "Town": "Ambridge",
        },
        "geometry": { "x": "-1.5", "y": 52.1 },
      }]}),
    );

    let candidate = &out.candidates[0];
    assert_eq!(candidate.key.as_deref(), Some("active_places/42"));
    assert_eq!(candidate.name.as_deref(), Some("Village Cricket Club"));
    assert_eq!(candidate.facility.postcode.as_deref(), Some("AB1 2CD"));
    assert_eq!(candidate.facility.address.as_deref(), Some("1 High St, Ambridge"));
    assert_eq!((candidate.lat, candidate.lon), (Some(52.1), Some(-1.5)));
  }

  #[test]
  fn keyword_filter_checks_name_and_listed_fields() {
    let out = run(
      SourceKind::ScotlandOpen,
      json!({ "features": [
        { "properties": { "OBJECTID": 1, "FacilityName": "Leisure Centre", "Sport": "Cricket" },
          "geometry": { "type": "Point", "coordinates": [-3.2, 55.9] } },
        { "properties": { "OBJECTID": 2, "FacilityName": "Swimming Pool", "Sport": "Swimming" },
          "geometry": { "type": "Point", "coordinates": [-3.1, 55.8] } },
        { "properties": { "OBJECTID": 3, "FacilityName": "Grange Cricket Ground" },
          "geometry": { "type": "Point", "coordinates": [-3.2, 55.96] } },
      ]}),
    );

    let keys: Vec<_> = out.candidates.iter().filter_map(|c| c.key.as_deref()).collect();
    assert_eq!(keys, ["scotland_open/1", "scotland_open/3"]);
    assert_eq!(out.skipped, vec![Skipped { index: 1, reason: SkipReason::NotCricket }]);
  }

  #[test]
  fn greenspace_polygons_use_their_vertex_mean() {
    let out = run(
      SourceKind::OsGreenspace,
      json!({ "features": [{
        "properties": { "id": "G1", "function": "Playing Field", "distName1": "Cricket Meadow" },
        "geometry": { "type": "Polygon", "coordinates": [[
          [-1.0, 52.0], [-1.0, 52.2], [-0.8, 52.2], [-0.8, 52.0], [-1.0, 52.0]
        ]]},
      }]}),
    );

    let candidate = &out.candidates[0];
    assert!((candidate.lat.unwrap() - 52.1).abs() < 1e-9);
    assert!((candidate.lon.unwrap() + 0.9).abs() < 1e-9);
    assert_eq!(candidate.facility.description.as_deref(), Some("Playing Field"));
  }

  #[test]
  fn non_objects_are_skipped_and_bad_containers_fail() {
    let out = run(SourceKind::Osm, json!([1, { "type": "node", "id": 3, "lat": 1.0, "lon": 2.0 }]));
    assert_eq!(out.candidates.len(), 1);
    assert_eq!(out.skipped[0].reason, SkipReason::NotAnObject);

    assert!(matches!(
      normalize(SourceKind::Osm.profile(), &json!({ "rows": [] })),
      Err(Error::UnsupportedPayload(_))
    ));
    assert!(normalize(SourceKind::Osm.profile(), &json!("nope")).is_err());
  }

  #[test]
  fn common_shape_reads_properties_with_geometry_fallback() {
    let out = run(
      SourceKind::Common,
      json!({ "type": "FeatureCollection", "features": [
        { "type": "Feature",
          "properties": { "id": "active_places/9", "name": "", "postcode": "X1", "nets": "yes",
                          "source": "active_places" },
          "geometry": { "type": "Point", "coordinates": [-2.0, 53.0] } },
        { "type": "Feature", "properties": { "name": "No place" }, "geometry": null },
      ]}),
    );

    let candidate = &out.candidates[0];
    assert_eq!(candidate.key.as_deref(), Some("active_places/9"));
    assert_eq!(candidate.name.as_deref(), Some(DEFAULT_NAME));
    assert_eq!(candidate.facility.nets, Some(true));
    assert_eq!((candidate.lat, candidate.lon), (Some(53.0), Some(-2.0)));
    assert_eq!(candidate.source, "active_places");
    assert_eq!(out.skipped, vec![Skipped { index: 1, reason: SkipReason::MissingCoordinates }]);
  }
}
