//! Response classification and capture-buffer routing.
//!
//! Every network response observed on a page passes through [`classify`],
//! which decides whether it is camp API traffic and, if so, which buffer slot
//! it belongs to. The decision is a typed [`Classification`] rather than a
//! swallowed exception, so the ignored-vs-captured distinction is testable
//! without a browser:
//!
//! - [`Classification::Captured`] — a payload for one of the three slots
//! - [`Classification::NonMatching`] — traffic the pipeline does not care
//!   about (wrong host, wrong content type, or an empty envelope)
//! - [`Classification::ParseError`] — a matching endpoint whose body did not
//!   parse; expected noise from preflights and upstream error pages
//!
//! [`record`] is the single merge point: it applies a captured payload to the
//! accumulator. Callers that share the accumulator across pages serialize
//! their calls with a mutex.

use serde_json::Error as JsonError;
use tracing::{debug, info};

use crate::config::ScrapeConfig;
use crate::models::{ApiEnvelope, CaptureBuffer, HeroBrief, HeroDetail, RosterData, SeasonData};

/// A payload routed to one of the three capture slots.
#[derive(Debug, Clone)]
pub enum CapturedPayload {
    Season(SeasonData),
    Roster(Vec<HeroBrief>),
    Detail(HeroDetail),
}

/// Outcome of classifying one network response.
#[derive(Debug)]
pub enum Classification {
    Captured(CapturedPayload),
    NonMatching,
    ParseError(JsonError),
}

/// Classify a response by URL substring and content type.
///
/// A response qualifies when its URL contains the API host marker and its
/// content type contains `json`; it is then routed by whichever endpoint
/// marker its URL contains. The three markers are mutually exclusive
/// substrings, so at most one route matches.
pub fn classify(
    config: &ScrapeConfig,
    url: &str,
    content_type: &str,
    body: &str,
) -> Classification {
    if !url.contains(&config.api_host_marker)
        || !content_type.to_ascii_lowercase().contains("json")
    {
        return Classification::NonMatching;
    }

    if url.contains(&config.season_marker) {
        return match serde_json::from_str::<ApiEnvelope<SeasonData>>(body) {
            Ok(envelope) => match envelope.data {
                Some(season) => Classification::Captured(CapturedPayload::Season(season)),
                None => Classification::NonMatching,
            },
            Err(e) => Classification::ParseError(e),
        };
    }

    if url.contains(&config.roster_marker) {
        return match serde_json::from_str::<ApiEnvelope<RosterData>>(body) {
            Ok(envelope) => match envelope.data {
                Some(roster) => Classification::Captured(CapturedPayload::Roster(roster.heroList)),
                None => Classification::NonMatching,
            },
            Err(e) => Classification::ParseError(e),
        };
    }

    if url.contains(&config.detail_marker) {
        return match serde_json::from_str::<ApiEnvelope<HeroDetail>>(body) {
            Ok(envelope) => match envelope.data {
                Some(detail) => Classification::Captured(CapturedPayload::Detail(detail)),
                None => Classification::NonMatching,
            },
            Err(e) => Classification::ParseError(e),
        };
    }

    Classification::NonMatching
}

/// Apply a captured payload to the accumulator.
///
/// Season and roster captures replace the previous value; details are keyed
/// by the hero id the payload itself carries, so details observed on the
/// shared overview page and on per-hero pages land under the same key.
pub fn record(buffer: &mut CaptureBuffer, payload: CapturedPayload) {
    match payload {
        CapturedPayload::Season(season) => {
            info!(
                season = season.seasonName.as_deref().unwrap_or("unknown"),
                adjustments = season.adjustList.len(),
                "Captured season summary"
            );
            buffer.season = Some(season);
        }
        CapturedPayload::Roster(heroes) => {
            info!(count = heroes.len(), "Captured hero roster");
            buffer.hero_list = heroes;
        }
        CapturedPayload::Detail(detail) => {
            debug!(
                hero_id = detail.heroInfo.heroId,
                hero = detail.heroInfo.heroName.as_deref().unwrap_or(""),
                change_sets = detail.adjustInfo.len(),
                "Captured hero detail"
            );
            buffer.hero_details.insert(detail.heroInfo.heroId, detail);
        }
    }
}
