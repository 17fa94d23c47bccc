//! Play-Cricket club enrichment.
//!
//! Clubs are listed per county id; each venue is matched to the club whose
//! name best resembles the venue's club (or name) and gains the club's
//! official name, id, site and leagues.

use std::{collections::BTreeMap, time::Duration};

use serde::{Deserialize, Serialize};
use wicket_core::{
  lenient,
  similarity::name_similarity,
  venue::{Facility, Venue},
};

use crate::{HttpClient, Result, images::ItemFailure};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlayCricketConfig {
  /// API token; enrichment is skipped without one.
  pub token:           Option<String>,
  pub base_url:        String,
  /// Club lists are requested for every county id in this inclusive range.
  pub first_county_id: u32,
  pub last_county_id:  u32,
  pub min_similarity:  f64,
  /// Pause between county list requests.
  pub delay_ms:        u64,
  /// Only venues whose county mentions one of these are considered.
  pub county_filter:   Vec<String>,
}

impl Default for PlayCricketConfig {
  fn default() -> Self {
    Self {
      token:           None,
      base_url:        "https://www.play-cricket.com/api/v2".to_owned(),
      first_county_id: 1,
      last_county_id:  100,
      min_similarity:  0.65,
      delay_ms:        300,
      county_filter:   Vec::new(),
    }
  }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Club {
  #[serde(deserialize_with = "lenient::text_or_empty")]
  pub id:   String,
  #[serde(default, deserialize_with = "lenient::text_or_empty")]
  pub name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ClubList {
  #[serde(default)]
  clubs: Vec<Club>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClubDetail {
  #[serde(default, deserialize_with = "lenient::text")]
  pub name:        Option<String>,
  #[serde(default, deserialize_with = "lenient::text")]
  pub website_url: Option<String>,
  #[serde(default)]
  pub leagues:     Vec<League>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct League {
  #[serde(default, deserialize_with = "lenient::text")]
  pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClubDetailEnvelope {
  #[serde(default)]
  club: ClubDetail,
}

// ─── Matching ────────────────────────────────────────────────────────────────

/// Collapse the per-county lists into one list keyed by club id.
pub fn dedupe(clubs: impl IntoIterator<Item = Club>) -> Vec<Club> {
  clubs
    .into_iter()
    .filter(|c| !c.id.is_empty())
    .map(|c| (c.id.clone(), c))
    .collect::<BTreeMap<_, _>>()
    .into_values()
    .collect()
}

/// The club most similar to the venue's club or name, if any reaches
/// `threshold`. The first of equally similar clubs wins.
pub fn best_club<'a>(venue: &Venue, clubs: &'a [Club], threshold: f64) -> Option<(&'a Club, f64)> {
  let basis = venue.facility.club.as_deref().unwrap_or(&venue.name);
  clubs
    .iter()
    .map(|club| (club, name_similarity(basis, &club.name)))
    .filter(|(_, s)| *s >= threshold)
    .reduce(|best, next| if next.1 > best.1 { next } else { best })
}

fn fold(s: &str) -> String {
  s.to_lowercase()
    .split(|c: char| !c.is_alphanumeric())
    .filter(|t| !t.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
}

/// Whether the venue's county mentions any filter entry. An empty filter
/// admits everything.
pub fn county_matches(venue: &Venue, filter: &[String]) -> bool {
  if filter.is_empty() {
    return true;
  }
  let county = fold(venue.facility.county.as_deref().unwrap_or_default());
  filter.iter().map(|wanted| fold(wanted)).any(|wanted| !wanted.is_empty() && county.contains(&wanted))
}

/// The enrichment a matched club contributes.
pub fn club_facility(club: &Club, detail: &ClubDetail) -> Facility {
  Facility {
    club_official_name: Some(detail.name.clone().unwrap_or_else(|| club.name.clone())),
    play_cricket_club_id: Some(club.id.clone()),
    play_cricket_url: Some(
      detail
        .website_url
        .clone()
        .unwrap_or_else(|| format!("https://play-cricket.com/Club/{}", club.id)),
    ),
    league_names: detail.leagues.iter().filter_map(|l| l.name.clone()).collect(),
    ..Facility::default()
  }
}

// ─── Report ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize)]
pub struct PlayCricketReport {
  pub clubs:           usize,
  pub matched:         usize,
  pub unmatched:       usize,
  /// Venues excluded by the county filter.
  pub filtered:        usize,
  pub county_failures: Vec<ItemFailure>,
  /// Matched venues whose club detail could not be fetched; they were
  /// enriched from the list entry alone.
  pub detail_failures: Vec<ItemFailure>,
}

// ─── Client ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct PlayCricketClient {
  client: HttpClient,
  token:  String,
  config: PlayCricketConfig,
}

impl PlayCricketClient {
  /// `None` when no token is configured.
  pub fn new(client: HttpClient, config: PlayCricketConfig) -> Option<Self> {
    let token = config.token.clone().filter(|t| !t.trim().is_empty())?;
    Some(Self { client, token, config })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{path}", self.config.base_url.trim_end_matches('/'))
  }

  async fn county_clubs(&self, county_id: u32) -> Result<Vec<Club>> {
    let request = self
      .client
      .get(&self.url("/clubs.json"))
      .query(&[("api_token", self.token.clone()), ("county_id", county_id.to_string())]);
    let list: ClubList = self.client.send_json(request).await?;
    Ok(list.clubs)
  }

  async fn club_detail(&self, id: &str) -> Result<ClubDetail> {
    let request = self
      .client
      .get(&self.url(&format!("/clubs/{id}.json")))
      .query(&[("api_token", self.token.as_str())]);
    let envelope: ClubDetailEnvelope = self.client.send_json(request).await?;
    Ok(envelope.club)
  }

  /// Every club across the configured county ids, deduplicated.
  pub async fn all_clubs(&self, report: &mut PlayCricketReport) -> Vec<Club> {
    let delay = Duration::from_millis(self.config.delay_ms);
    let mut clubs = Vec::new();
    for county_id in self.config.first_county_id..=self.config.last_county_id {
      match self.county_clubs(county_id).await {
        Ok(list) => clubs.extend(list),
        Err(e) => {
          tracing::debug!(county_id, error = %e, "county club list failed");
          report
            .county_failures
            .push(ItemFailure { id: county_id.to_string(), error: e.to_string() });
        }
      }
      tokio::time::sleep(delay).await;
    }
    let clubs = dedupe(clubs);
    report.clubs = clubs.len();
    tracing::info!(clubs = clubs.len(), "fetched Play-Cricket clubs");
    clubs
  }

  /// Match every venue against the club list and fill the club fields.
  /// Matched venues become verified.
  pub async fn enrich(&self, venues: &mut [Venue]) -> PlayCricketReport {
    let mut report = PlayCricketReport::default();
    let clubs = self.all_clubs(&mut report).await;

    for venue in venues.iter_mut() {
      if !county_matches(venue, &self.config.county_filter) {
        report.filtered += 1;
        continue;
      }
      let Some((club, similarity)) = best_club(venue, &clubs, self.config.min_similarity) else {
        report.unmatched += 1;
        continue;
      };

      let detail = match self.club_detail(&club.id).await {
        Ok(detail) => detail,
        Err(e) => {
          tracing::warn!(id = %venue.id, club = %club.id, error = %e, "club detail failed");
          report.detail_failures.push(ItemFailure { id: venue.id.clone(), error: e.to_string() });
          ClubDetail::default()
        }
      };

      tracing::debug!(id = %venue.id, club = %club.name, similarity, "matched club");
      venue.enrich(&club_facility(club, &detail));
      venue.verified = true;
      report.matched += 1;
    }

    tracing::info!(
      matched = report.matched,
      unmatched = report.unmatched,
      "Play-Cricket enrichment complete"
    );
    report
  }
}
