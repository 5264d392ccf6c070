//! Data models for captured camp API payloads and the published document.
//!
//! This module defines the core data structures used throughout the pipeline:
//! - Upstream payload shapes: [`SeasonData`], [`RosterData`], [`HeroDetail`]
//! - [`CaptureBuffer`]: the accumulator populated by the response interceptor
//! - Output shapes: [`OutputDocument`], [`Adjustment`], [`SkillChange`]
//!
//! The models use camelCase field names to match the JSON the camp API emits
//! and the JSON the site consumes, hence the `#[allow(non_snake_case)]`
//! attributes. Upstream fields are modeled as `Option` throughout because the
//! API omits fields freely; output serialization drops absent fields the same
//! way.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use itertools::Itertools;

/// Envelope every camp API response wraps its payload in.
///
/// Error responses and empty pages ship the envelope with `data` absent or
/// `null`; those are treated as non-captures, not parse failures.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    /// The payload, when the upstream call succeeded.
    pub data: Option<T>,
}

/// A rate statistic as the API ships it: usually a number, occasionally a
/// placeholder string such as `"N/A"` for heroes without match data.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Rate {
    /// A numeric rate, either a fraction (`0.0512`) or already percent-scaled.
    Num(f64),
    /// A non-numeric placeholder, passed through untouched.
    Text(String),
}

/// A boolean-ish flag; the API is inconsistent about `true`/`false` vs `1`/`0`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Flag {
    Bool(bool),
    Num(i64),
}

impl Flag {
    /// Truthiness the way the portal's own frontend evaluates it.
    pub fn is_set(&self) -> bool {
        match self {
            Flag::Bool(b) => *b,
            Flag::Num(n) => *n != 0,
        }
    }
}

/// Season-level summary captured from the `adjustforseason` endpoint.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeasonData {
    /// Season identifier; the API has shipped this both as a number and a string.
    #[serde(default)]
    pub seasonId: Option<serde_json::Value>,
    #[serde(default)]
    pub seasonName: Option<String>,
    /// Version label such as `2026/02/05`, reused in detail page URLs.
    #[serde(default)]
    pub versionName: Option<String>,
    /// Ordered list of per-hero adjustment summaries for the season.
    pub adjustList: Vec<AdjustEntry>,
}

/// One entry of a season's adjustment list.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AdjustEntry {
    #[serde(default)]
    pub heroInfo: Option<AdjustHeroInfo>,
    #[serde(default)]
    pub shortDesc: Option<String>,
    #[serde(default)]
    pub contentTag: Option<ContentTag>,
}

/// Hero descriptor embedded in an adjustment entry, including rate stats.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AdjustHeroInfo {
    #[serde(default)]
    pub heroId: Option<i64>,
    #[serde(default)]
    pub heroName: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub winningProbability: Option<Rate>,
    #[serde(default)]
    pub appearanceRate: Option<Rate>,
    /// Ban rate; the upstream field name is misspelled and kept verbatim.
    #[serde(default)]
    pub banRote: Option<Rate>,
}

/// Category tag attached to an adjustment (buff, nerf, rework, ...).
#[allow(non_snake_case)]
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ContentTag {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub tagEnum: Option<serde_json::Value>,
    #[serde(default)]
    pub bgColorH5: Option<String>,
}

/// Roster payload captured from the `getallherobriefinfo` endpoint.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RosterData {
    pub heroList: Vec<HeroBrief>,
}

/// Minimal hero descriptor; also the shape published in the output roster.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HeroBrief {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heroId: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heroName: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Per-hero detail captured from the `adjustheroinfo` endpoint.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HeroDetail {
    pub heroInfo: DetailHeroInfo,
    /// Dated change sets, newest season first as the portal renders them.
    #[serde(default)]
    pub adjustInfo: Vec<AdjustRecord>,
}

/// Hero descriptor on a detail payload. `heroId` is required here: it is the
/// key the detail is stored under, so a payload without it is a parse failure
/// rather than a capture with an unusable key.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DetailHeroInfo {
    pub heroId: i64,
    #[serde(default)]
    pub heroName: Option<String>,
}

/// One change set in a hero's adjustment history.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AdjustRecord {
    #[serde(default)]
    pub isCurrent: Option<Flag>,
    #[serde(default)]
    pub adjustContent: Option<AdjustContent>,
}

#[allow(non_snake_case)]
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AdjustContent {
    #[serde(default)]
    pub attribute: Vec<AttributeChange>,
}

/// A single attribute or skill change within a change set.
#[allow(non_snake_case)]
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AttributeChange {
    #[serde(default)]
    pub title: Option<String>,
    /// Rich-text description with `<br>` line breaks and styling markup.
    #[serde(default)]
    pub attributeDesc: Option<String>,
    #[serde(default)]
    pub heroSkillInfo: Option<HeroSkillInfo>,
}

#[allow(non_snake_case)]
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HeroSkillInfo {
    #[serde(default)]
    pub skillName: Option<String>,
    #[serde(default)]
    pub skillIcon: Option<String>,
    #[serde(default)]
    pub skillIndexDesc: Option<String>,
}

/// A hero the detail fetcher should visit, discovered from the season summary.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTarget {
    pub hero_id: i64,
    /// Display name for progress logs; falls back to `Hero <id>`.
    pub hero_name: String,
}

/// In-memory accumulator populated by the response interceptor.
///
/// One buffer exists per pipeline run. It is created empty, mutated only by
/// [`crate::intercept::record`] as intercepted payloads arrive, read by the
/// discovery step between the overview visit and the detail loop, and read
/// once more by the normalizer after the loop completes.
#[derive(Debug, Default)]
pub struct CaptureBuffer {
    /// The season summary, replaced wholesale on each capture.
    pub season: Option<SeasonData>,
    /// The full hero roster, replaced wholesale on each capture.
    pub hero_list: Vec<HeroBrief>,
    /// Per-hero details, keyed by the hero id carried in the payload itself.
    pub hero_details: HashMap<i64, HeroDetail>,
}

impl CaptureBuffer {
    /// Heroes to visit for detail enrichment, in adjustment-list order with
    /// duplicate ids collapsed to their first occurrence.
    pub fn adjustment_targets(&self) -> Vec<FetchTarget> {
        let Some(season) = &self.season else {
            return Vec::new();
        };
        season
            .adjustList
            .iter()
            .filter_map(|adj| adj.heroInfo.as_ref())
            .filter_map(|hero| {
                hero.heroId.map(|hero_id| FetchTarget {
                    hero_id,
                    hero_name: hero
                        .heroName
                        .clone()
                        .unwrap_or_else(|| format!("Hero {hero_id}")),
                })
            })
            .unique_by(|target| target.hero_id)
            .collect()
    }

    /// Version label for detail URLs, or `None` when no season was captured
    /// or the season payload shipped without one.
    pub fn version_name(&self) -> Option<String> {
        self.season.as_ref().and_then(|s| s.versionName.clone())
    }
}

/// The published document: one season's adjustments, enriched and flattened.
#[allow(non_snake_case)]
#[derive(Debug, Deserialize, Serialize)]
pub struct OutputDocument {
    /// UTC capture time, RFC 3339 with millisecond precision.
    pub scrapedAt: String,
    pub season: SeasonDescriptor,
    pub adjustments: Vec<Adjustment>,
    pub heroList: Vec<HeroBrief>,
}

#[allow(non_snake_case)]
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SeasonDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versionName: Option<String>,
}

/// One normalized adjustment entry.
#[allow(non_snake_case)]
#[derive(Debug, Deserialize, Serialize)]
pub struct Adjustment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heroId: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heroName: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heroIcon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortDesc: Option<String>,
    /// Tag label, e.g. "Strengthen" or "Weaken".
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagEnum: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tagColor: Option<String>,
    pub stats: RateStats,
    /// Empty when no detail was captured for the hero; the entry still ships.
    pub skillChanges: Vec<SkillChange>,
}

/// Percent-formatted rate statistics.
#[allow(non_snake_case)]
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RateStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winRate: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickRate: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banRate: Option<Rate>,
}

/// One skill or attribute change in the current change set.
#[allow(non_snake_case)]
#[derive(Debug, Deserialize, Serialize)]
pub struct SkillChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skillName: Option<String>,
    pub skillIcon: String,
    pub skillIndex: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// The raw rich-text description as captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The description with markup stripped, ready for plain display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptionText: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(hero_id: Option<i64>, name: &str) -> AdjustEntry {
        AdjustEntry {
            heroInfo: Some(AdjustHeroInfo {
                heroId: hero_id,
                heroName: Some(name.to_string()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_rate_deserializes_number_and_text() {
        let num: Rate = serde_json::from_str("0.0512").unwrap();
        assert_eq!(num, Rate::Num(0.0512));

        let text: Rate = serde_json::from_str("\"N/A\"").unwrap();
        assert_eq!(text, Rate::Text("N/A".to_string()));
    }

    #[test]
    fn test_flag_truthiness() {
        let from_bool: Flag = serde_json::from_str("true").unwrap();
        assert!(from_bool.is_set());

        let from_one: Flag = serde_json::from_str("1").unwrap();
        assert!(from_one.is_set());

        let from_zero: Flag = serde_json::from_str("0").unwrap();
        assert!(!from_zero.is_set());

        assert!(!Flag::Bool(false).is_set());
    }

    #[test]
    fn test_adjustment_targets_preserve_order_and_dedupe() {
        let buffer = CaptureBuffer {
            season: Some(SeasonData {
                seasonId: None,
                seasonName: None,
                versionName: None,
                adjustList: vec![
                    entry(Some(7), "Marco Polo"),
                    entry(Some(3), "Angela"),
                    entry(Some(7), "Marco Polo"),
                    entry(None, "nameless"),
                ],
            }),
            ..Default::default()
        };

        let targets = buffer.adjustment_targets();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].hero_id, 7);
        assert_eq!(targets[0].hero_name, "Marco Polo");
        assert_eq!(targets[1].hero_id, 3);
    }

    #[test]
    fn test_adjustment_targets_empty_without_season() {
        let buffer = CaptureBuffer::default();
        assert!(buffer.adjustment_targets().is_empty());
        assert_eq!(buffer.version_name(), None);
    }

    #[test]
    fn test_hero_name_fallback() {
        let buffer = CaptureBuffer {
            season: Some(SeasonData {
                seasonId: None,
                seasonName: None,
                versionName: None,
                adjustList: vec![AdjustEntry {
                    heroInfo: Some(AdjustHeroInfo {
                        heroId: Some(42),
                        ..Default::default()
                    }),
                    ..Default::default()
                }],
            }),
            ..Default::default()
        };

        assert_eq!(buffer.adjustment_targets()[0].hero_name, "Hero 42");
    }

    #[test]
    fn test_envelope_with_null_data() {
        let env: ApiEnvelope<SeasonData> = serde_json::from_str(r#"{"data": null}"#).unwrap();
        assert!(env.data.is_none());
    }

    #[test]
    fn test_season_requires_adjust_list() {
        let missing = serde_json::from_str::<SeasonData>(r#"{"seasonName": "S1"}"#);
        assert!(missing.is_err());
    }

    #[test]
    fn test_output_omits_absent_fields() {
        let adjustment = Adjustment {
            heroId: Some(7),
            heroName: None,
            heroIcon: None,
            shortDesc: None,
            kind: Some("Strengthen".to_string()),
            tagEnum: None,
            tagColor: None,
            stats: RateStats::default(),
            skillChanges: Vec::new(),
        };

        let json = serde_json::to_string(&adjustment).unwrap();
        assert!(json.contains("\"heroId\":7"));
        assert!(json.contains("\"type\":\"Strengthen\""));
        assert!(!json.contains("heroName"));
        assert!(!json.contains("winRate"));
        assert!(json.contains("\"skillChanges\":[]"));
    }
}
