//! JSON output generation for the published adjustment document.
//!
//! Serializes the normalized document as indented JSON and writes it under
//! the output directory, overwriting any previous run's file. Write failures
//! are fatal to the run: a stale document is better than a truncated one, so
//! nothing is written unless serialization succeeded first.

use crate::models::OutputDocument;
use std::error::Error;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write an [`OutputDocument`] to `{output_dir}/{file_name}`.
///
/// Creates the output directory (recursively) if it does not exist. Returns
/// the path written on success.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir))]
pub async fn write_document(
    document: &OutputDocument,
    output_dir: &str,
    file_name: &str,
) -> Result<String, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(document)?;

    if let Err(e) = fs::create_dir_all(output_dir).await {
        error!(%output_dir, error = %e, "Failed to create output directory");
        return Err(e.into());
    }

    let path = format!("{}/{}", output_dir.trim_end_matches('/'), file_name);
    info!(path = %path, "Writing adjustments JSON");
    fs::write(&path, json).await?;
    info!(path = %path, adjustments = document.adjustments.len(), "Wrote adjustments JSON");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AdjustContent, AdjustEntry, AdjustHeroInfo, AdjustRecord, AttributeChange, CaptureBuffer,
        DetailHeroInfo, Flag, HeroDetail, SeasonData,
    };
    use crate::normalize::build_document;

    fn mock_buffer() -> CaptureBuffer {
        let mut buffer = CaptureBuffer {
            season: Some(SeasonData {
                seasonId: Some(serde_json::json!("12")),
                seasonName: Some("S12".to_string()),
                versionName: Some("2026/02/05".to_string()),
                adjustList: vec![AdjustEntry {
                    heroInfo: Some(AdjustHeroInfo {
                        heroId: Some(7),
                        heroName: Some("Marco Polo".to_string()),
                        ..Default::default()
                    }),
                    ..Default::default()
                }],
            }),
            ..Default::default()
        };
        buffer.hero_details.insert(
            7,
            HeroDetail {
                heroInfo: DetailHeroInfo {
                    heroId: 7,
                    heroName: None,
                },
                adjustInfo: vec![AdjustRecord {
                    isCurrent: Some(Flag::Num(1)),
                    adjustContent: Some(AdjustContent {
                        attribute: vec![AttributeChange {
                            title: Some("Attack".to_string()),
                            attributeDesc: Some("Up<br>a lot".to_string()),
                            heroSkillInfo: None,
                        }],
                    }),
                }],
            },
        );
        buffer
    }

    fn temp_dir(tag: &str) -> String {
        let dir = std::env::temp_dir().join(format!(
            "hok_patch_scrape_test_{tag}_{}",
            std::process::id()
        ));
        dir.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn test_write_and_read_back() {
        let document = build_document(&mock_buffer(), "2026-02-06T00:00:00.000Z".to_string());
        let dir = temp_dir("roundtrip");

        let path = write_document(&document, &dir, "adjustments-data.json")
            .await
            .unwrap();

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();

        assert_eq!(parsed["season"]["id"], "12");
        assert_eq!(parsed["adjustments"].as_array().unwrap().len(), 1);
        assert_eq!(parsed["adjustments"][0]["heroId"], 7);
        assert_eq!(
            parsed["adjustments"][0]["skillChanges"]
                .as_array()
                .unwrap()
                .len(),
            1
        );
        // indented output, not a single line
        assert!(raw.lines().count() > 1);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_overwrites_previous_document() {
        let dir = temp_dir("overwrite");
        let first = build_document(&mock_buffer(), "first".to_string());
        let second = build_document(&mock_buffer(), "second".to_string());

        write_document(&first, &dir, "adjustments-data.json")
            .await
            .unwrap();
        let path = write_document(&second, &dir, "adjustments-data.json")
            .await
            .unwrap();

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(raw.contains("\"second\""));
        assert!(!raw.contains("\"first\""));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_unwritable_directory_is_an_error_not_a_panic() {
        // A file standing where the directory should be makes create_dir_all fail.
        let blocker = temp_dir("blocked");
        tokio::fs::write(&blocker, b"in the way").await.unwrap();

        let document = build_document(&CaptureBuffer::default(), "t".to_string());
        let result = write_document(&document, &blocker, "adjustments-data.json").await;
        assert!(result.is_err());

        tokio::fs::remove_file(&blocker).await.unwrap();
    }
}
