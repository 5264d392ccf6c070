//! Runtime configuration for a scrape run.
//!
//! Every knob has a built-in default matching the live portal, so the tool
//! runs with no configuration at all. An optional YAML file can override any
//! subset of fields, which is mainly useful when the portal moves endpoints
//! or when a slower machine needs longer settle delays.

use serde::Deserialize;
use std::error::Error;
use tracing::info;

/// Desktop Chrome user agent sent with every page; the portal serves a
/// degraded mobile shell to unknown agents.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// All tunables for one scrape run.
///
/// Deserialized from YAML with per-field defaults: a config file only needs
/// the fields it wants to change.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// The hash route that renders the season adjustment overview.
    pub portal_url: String,
    /// Substring identifying camp API traffic among all page requests.
    pub api_host_marker: String,
    /// Substring routing a response to the season summary slot.
    pub season_marker: String,
    /// Substring routing a response to the roster slot.
    pub roster_marker: String,
    /// Substring routing a response to the per-hero detail map.
    pub detail_marker: String,
    /// User agent override applied to every page.
    pub user_agent: String,
    /// Navigation timeout for the overview page, in seconds.
    pub nav_timeout_secs: u64,
    /// Navigation timeout for each detail page, in seconds.
    pub detail_nav_timeout_secs: u64,
    /// Unconditional settle delay after the overview navigation, in
    /// milliseconds, to let late API calls land.
    pub summary_settle_ms: u64,
    /// Settle delay after each detail navigation, in milliseconds.
    pub detail_settle_ms: u64,
    /// Upper bound for the random jitter added to each detail settle delay.
    pub settle_jitter_ms: u64,
    /// Version label used for detail URLs when the season payload lacks one.
    pub fallback_version: String,
    /// File name of the published document inside the output directory.
    pub output_file: String,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            portal_url: "https://camp.honorofkings.com/h5/app/index.html#/adjustment-detail"
                .to_string(),
            api_host_marker: "api-camp.honorofkings.com".to_string(),
            season_marker: "adjustforseason".to_string(),
            roster_marker: "getallherobriefinfo".to_string(),
            detail_marker: "adjustheroinfo".to_string(),
            user_agent: USER_AGENT.to_string(),
            nav_timeout_secs: 60,
            detail_nav_timeout_secs: 30,
            summary_settle_ms: 4000,
            detail_settle_ms: 2500,
            settle_jitter_ms: 400,
            fallback_version: "2026/02/05".to_string(),
            output_file: "adjustments-data.json".to_string(),
        }
    }
}

impl ScrapeConfig {
    /// Load configuration from an optional YAML file, falling back to the
    /// built-in defaults when no path is given.
    pub async fn load(path: Option<&str>) -> Result<Self, Box<dyn Error>> {
        match path {
            Some(p) => {
                let raw = tokio::fs::read_to_string(p).await?;
                let config: ScrapeConfig = serde_yaml::from_str(&raw)?;
                info!(path = %p, "Loaded scrape configuration");
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScrapeConfig::default();
        assert!(config.portal_url.contains("adjustment-detail"));
        assert_eq!(config.season_marker, "adjustforseason");
        assert_eq!(config.nav_timeout_secs, 60);
        assert_eq!(config.output_file, "adjustments-data.json");
    }

    #[test]
    fn test_partial_yaml_override() {
        let yaml = "detail_settle_ms: 500\noutput_file: out.json\n";
        let config: ScrapeConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.detail_settle_ms, 500);
        assert_eq!(config.output_file, "out.json");
        // untouched fields keep their defaults
        assert_eq!(config.roster_marker, "getallherobriefinfo");
        assert_eq!(config.summary_settle_ms, 4000);
    }

    #[test]
    fn test_markers_are_mutually_exclusive() {
        let config = ScrapeConfig::default();
        assert!(!config.season_marker.contains(&config.detail_marker));
        assert!(!config.detail_marker.contains(&config.season_marker));
        assert!(!config.roster_marker.contains(&config.season_marker));
    }
}
