//! Declarative per-source field-mapping tables.
//!
//! Each provider spells the same logical field a dozen ways. Rather than a
//! conditional chain per source, a [`Profile`] lists, for every logical field,
//! the ordered [`Rule`]s that may produce it; the first rule yielding a
//! non-blank value wins. One generic routine in [`crate::normalize`] consumes
//! every table.
//!
//! Key lookups consult the item's property bag first and the item itself
//! second. A key starting with `@` is looked up on the item only (Overpass
//! relations carry a `type` tag that must not shadow the element type).

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

// ─── Source kinds ────────────────────────────────────────────────────────────

/// The providers Wicket knows how to read. The snake_case name doubles as the
/// `source` tag stored on venues.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter,
  Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
  /// Sport England Active Places (ArcGIS FeatureServer or WFS).
  ActivePlaces,
  /// Scottish sports facilities open data.
  ScotlandOpen,
  /// OpenStreetMap via the Overpass API.
  Osm,
  /// OS Open Greenspace, pre-converted to GeoJSON.
  OsGreenspace,
  /// Already in the common candidate shape (intermediate batch files).
  Common,
}

impl SourceKind {
  pub fn profile(self) -> &'static Profile {
    match self {
      Self::ActivePlaces => &ACTIVE_PLACES,
      Self::ScotlandOpen => &SCOTLAND_OPEN,
      Self::Osm => &OSM,
      Self::OsGreenspace => &OS_GREENSPACE,
      Self::Common => &COMMON,
    }
  }
}

// ─── Table vocabulary ────────────────────────────────────────────────────────

/// One way of producing a text value from a record.
#[derive(Debug, Clone, Copy)]
pub enum Rule {
  /// First non-blank value among these keys.
  Keys(&'static [&'static str]),
  /// Non-blank values of these keys joined with `", "`.
  Joined(&'static [&'static str]),
  /// Values of all keys joined with `/`; yields nothing unless all resolve.
  Composite(&'static [&'static str]),
  /// `<prefix>/<first non-blank value among keys>`.
  Prefixed(&'static str, &'static [&'static str]),
  /// A Wikimedia Commons `File:` name rewritten as a direct file URL.
  CommonsFile(&'static str),
}

/// Where a pair of coordinates may be found.
#[derive(Debug, Clone, Copy)]
pub enum Locate {
  /// GeoJSON `geometry.coordinates` of a `Point` (`[lon, lat]`).
  PointGeometry,
  /// Vertex mean of the outer ring of a `Polygon` / first `MultiPolygon`.
  PolygonCentroid,
  /// ArcGIS `geometry.y` / `geometry.x`.
  GeometryXy,
  /// `geometry.latitude` / `geometry.longitude`.
  GeometryLatLon,
  /// Plain record keys.
  Keys { lat: &'static str, lon: &'static str },
  /// An object on the item, e.g. Overpass `center`.
  Nested { object: &'static str, lat: &'static str, lon: &'static str },
}

/// Logical attributes a table may populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
  Club,
  County,
  Address,
  Postcode,
  PitchType,
  Strips,
  Nets,
  Bar,
  Parking,
  Description,
  ImageUrl,
  ClubUrl,
  Website,
  Wikidata,
  Wikipedia,
}

/// The rules that may produce one logical field.
#[derive(Debug, Clone, Copy)]
pub struct Mapping {
  pub field: Field,
  pub rules: &'static [Rule],
}

/// Keep only records whose name or listed fields mention `needle`.
#[derive(Debug, Clone, Copy)]
pub struct Keyword {
  pub needle: &'static str,
  pub keys:   &'static [&'static str],
}

/// How records of one layout become candidates.
#[derive(Debug)]
pub enum Layout {
  /// Provider-specific names, resolved through the tables.
  Mapped {
    key:     &'static [Rule],
    name:    &'static [Rule],
    fields:  &'static [Mapping],
    keyword: Option<Keyword>,
  },
  /// The property bag already is a serialized candidate.
  Common,
}

#[derive(Debug)]
pub struct Profile {
  pub kind:        SourceKind,
  pub layout:      Layout,
  pub coordinates: &'static [Locate],
}

// ─── Tables ──────────────────────────────────────────────────────────────────

const CRICKET: &str = "cricket";

static ACTIVE_PLACES: Profile = Profile {
  kind:        SourceKind::ActivePlaces,
  layout:      Layout::Mapped {
    key:     &[Rule::Prefixed("active_places", &["OBJECTID", "GlobalID", "SiteID", "SITE_ID"])],
    name:    &[Rule::Keys(&[
      "SiteName", "FacilityName", "Name", "SITE_NAME", "FACILITY_NAME", "name",
    ])],
    fields:  &[
      Mapping { field: Field::Postcode, rules: &[Rule::Keys(&["Postcode", "POSTCODE", "Post_Code", "PostCode"])] },
      Mapping { field: Field::Address, rules: &[
        Rule::Keys(&["Address", "ADDRESS"]),
        Rule::Joined(&["Address1", "Address2", "Town"]),
      ] },
      Mapping { field: Field::Website, rules: &[Rule::Keys(&["Website", "WEBSITE", "URL", "SiteUrl"])] },
      Mapping { field: Field::County, rules: &[Rule::Keys(&["County", "COUNTY", "AdministrativeArea"])] },
    ],
    keyword: Some(Keyword {
      needle: CRICKET,
      keys:   &["FacilityType", "FACILITY_TYPE", "Sport", "PrimaryUse"],
    }),
  },
  coordinates: &[
    Locate::GeometryXy,
    Locate::GeometryLatLon,
    Locate::PointGeometry,
    Locate::Keys { lat: "lat", lon: "lon" },
  ],
};

static SCOTLAND_OPEN: Profile = Profile {
  kind:        SourceKind::ScotlandOpen,
  layout:      Layout::Mapped {
    key:     &[Rule::Prefixed("scotland_open", &["OBJECTID", "GlobalID"])],
    name:    &[Rule::Keys(&["FacilityName", "SiteName", "Name", "name"])],
    fields:  &[
      Mapping { field: Field::Address, rules: &[Rule::Keys(&["Address", "Address1"])] },
      Mapping { field: Field::Postcode, rules: &[Rule::Keys(&["Postcode", "POSTCODE"])] },
      Mapping { field: Field::Website, rules: &[Rule::Keys(&["Web", "Website", "URL"])] },
      Mapping { field: Field::County, rules: &[Rule::Keys(&["LocalAuthority", "Council", "AdminArea"])] },
    ],
    keyword: Some(Keyword { needle: CRICKET, keys: &["Sport", "FacilityType"] }),
  },
  coordinates: &[Locate::PointGeometry, Locate::GeometryXy],
};

static OSM: Profile = Profile {
  kind:        SourceKind::Osm,
  layout:      Layout::Mapped {
    key:     &[Rule::Composite(&["@type", "@id"])],
    name:    &[Rule::Keys(&["name"])],
    fields:  &[
      Mapping { field: Field::Club, rules: &[Rule::Keys(&["operator", "club"])] },
      Mapping { field: Field::County, rules: &[Rule::Keys(&["addr:county", "is_in:county"])] },
      Mapping { field: Field::Address, rules: &[Rule::Joined(&["addr:housenumber", "addr:street", "addr:city"])] },
      Mapping { field: Field::Postcode, rules: &[Rule::Keys(&["addr:postcode"])] },
      Mapping { field: Field::PitchType, rules: &[Rule::Keys(&["surface"])] },
      Mapping { field: Field::ClubUrl, rules: &[Rule::Keys(&["website", "contact:website", "url"])] },
      Mapping { field: Field::ImageUrl, rules: &[Rule::Keys(&["image"]), Rule::CommonsFile("wikimedia_commons")] },
      Mapping { field: Field::Wikidata, rules: &[Rule::Keys(&["wikidata"])] },
      Mapping { field: Field::Wikipedia, rules: &[Rule::Keys(&["wikipedia"])] },
      Mapping { field: Field::Description, rules: &[Rule::Keys(&["description"])] },
      Mapping { field: Field::Parking, rules: &[Rule::Keys(&["parking"])] },
    ],
    keyword: None,
  },
  coordinates: &[
    Locate::Keys { lat: "@lat", lon: "@lon" },
    Locate::Nested { object: "center", lat: "lat", lon: "lon" },
  ],
};

static OS_GREENSPACE: Profile = Profile {
  kind:        SourceKind::OsGreenspace,
  layout:      Layout::Mapped {
    key:     &[Rule::Prefixed("os_greenspace", &["id", "ID", "fid"])],
    name:    &[Rule::Keys(&["distName1", "distname1", "name", "NAME"])],
    fields:  &[Mapping { field: Field::Description, rules: &[Rule::Keys(&["function", "FUNCTION"])] }],
    keyword: Some(Keyword {
      needle: CRICKET,
      keys:   &["function", "FUNCTION", "theme", "descriptio"],
    }),
  },
  coordinates: &[Locate::PointGeometry, Locate::PolygonCentroid, Locate::GeometryXy],
};

static COMMON: Profile = Profile {
  kind:        SourceKind::Common,
  layout:      Layout::Common,
  coordinates: &[Locate::PointGeometry],
};

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use strum::IntoEnumIterator;

  use super::*;

  #[test]
  fn kinds_round_trip_through_their_tags() {
    for kind in SourceKind::iter() {
      assert_eq!(SourceKind::from_str(kind.as_ref()).unwrap(), kind);
      assert_eq!(kind.profile().kind, kind);
    }
    assert_eq!(SourceKind::ActivePlaces.to_string(), "active_places");
  }
}
