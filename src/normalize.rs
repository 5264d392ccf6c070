//! Pure transformation from the capture buffer to the published document.
//!
//! Nothing in this module touches the browser or the filesystem; given the
//! same buffer and timestamp, [`build_document`] produces the same document.
//!
//! Three small rules carry the normalization:
//! - rates arrive either as fractions or as percent-scaled numbers and are
//!   unified to two-decimal percentages ([`format_percent`])
//! - each hero's change history contains at most one "current" change set
//!   ([`current_adjustment`])
//! - rich-text change descriptions are flattened to plain text
//!   ([`clean_description`])

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{
    AdjustRecord, Adjustment, CaptureBuffer, Flag, HeroDetail, OutputDocument, Rate, RateStats,
    SeasonDescriptor, SkillChange,
};

static MARKUP_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Unify a rate to a two-decimal percentage.
///
/// Values below 1 are fractions and scale by 100 before rounding; values at
/// or above 1 are already percent-scaled and only round. Non-numeric
/// placeholders pass through unchanged.
pub fn format_percent(rate: &Rate) -> Rate {
    match rate {
        Rate::Num(v) => {
            let percent = if *v < 1.0 {
                (v * 10000.0).round() / 100.0
            } else {
                (v * 100.0).round() / 100.0
            };
            Rate::Num(percent)
        }
        Rate::Text(s) => Rate::Text(s.clone()),
    }
}

/// Flatten rich-text markup to display text: literal `<br>` breaks become
/// newlines, every other tag is stripped.
pub fn clean_description(raw: &str) -> String {
    let with_breaks = raw.replace("<br>", "\n");
    MARKUP_TAG.replace_all(&with_breaks, "").into_owned()
}

/// Select the change set considered active for the displayed season: the
/// first entry flagged current, else the first entry, else none.
pub fn current_adjustment(detail: &HeroDetail) -> Option<&AdjustRecord> {
    detail
        .adjustInfo
        .iter()
        .find(|record| record.isCurrent.as_ref().is_some_and(Flag::is_set))
        .or_else(|| detail.adjustInfo.first())
}

/// Flatten one change set into output skill changes.
///
/// Attribute-level changes without skill info fall back to the attribute
/// title for the skill name and empty strings for icon and index, matching
/// how the portal renders them.
fn skill_changes(record: &AdjustRecord) -> Vec<SkillChange> {
    let attributes = record
        .adjustContent
        .as_ref()
        .map(|content| content.attribute.as_slice())
        .unwrap_or(&[]);

    attributes
        .iter()
        .map(|attr| {
            let skill = attr.heroSkillInfo.as_ref();
            SkillChange {
                skillName: skill
                    .and_then(|s| s.skillName.clone())
                    .or_else(|| attr.title.clone()),
                skillIcon: skill.and_then(|s| s.skillIcon.clone()).unwrap_or_default(),
                skillIndex: skill
                    .and_then(|s| s.skillIndexDesc.clone())
                    .unwrap_or_default(),
                title: attr.title.clone(),
                description: attr.attributeDesc.clone(),
                descriptionText: attr.attributeDesc.as_deref().map(clean_description),
            }
        })
        .collect()
}

/// Build the published document from a capture buffer.
///
/// Every adjustment entry of the captured season appears in the output;
/// entries whose hero has no captured detail ship with an empty change list.
/// The caller supplies the timestamp, keeping this function pure.
pub fn build_document(buffer: &CaptureBuffer, scraped_at: String) -> OutputDocument {
    let season = buffer.season.as_ref();

    let adjustments = season
        .map(|s| s.adjustList.as_slice())
        .unwrap_or(&[])
        .iter()
        .map(|adj| {
            let hero = adj.heroInfo.as_ref();
            let tag = adj.contentTag.as_ref();
            let hero_id = hero.and_then(|h| h.heroId);
            let changes = hero_id
                .and_then(|id| buffer.hero_details.get(&id))
                .and_then(current_adjustment)
                .map(skill_changes)
                .unwrap_or_default();

            Adjustment {
                heroId: hero_id,
                heroName: hero.and_then(|h| h.heroName.clone()),
                heroIcon: hero.and_then(|h| h.icon.clone()),
                shortDesc: adj.shortDesc.clone(),
                kind: tag.and_then(|t| t.text.clone()),
                tagEnum: tag.and_then(|t| t.tagEnum.clone()),
                tagColor: tag.and_then(|t| t.bgColorH5.clone()),
                stats: RateStats {
                    winRate: hero
                        .and_then(|h| h.winningProbability.as_ref())
                        .map(format_percent),
                    pickRate: hero
                        .and_then(|h| h.appearanceRate.as_ref())
                        .map(format_percent),
                    banRate: hero.and_then(|h| h.banRote.as_ref()).map(format_percent),
                },
                skillChanges: changes,
            }
        })
        .collect();

    OutputDocument {
        scrapedAt: scraped_at,
        season: SeasonDescriptor {
            id: season.and_then(|s| s.seasonId.clone()),
            name: season.and_then(|s| s.seasonName.clone()),
            versionName: season.and_then(|s| s.versionName.clone()),
        },
        adjustments,
        heroList: buffer.hero_list.clone(),
    }
}
