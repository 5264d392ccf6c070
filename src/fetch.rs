//! Sequential per-hero detail fetching.
//!
//! Each hero discovered in the season summary gets its own short-lived page:
//! open, attach the interceptor, navigate to the hero's detail route, settle,
//! close. Fetches run strictly one at a time with a jittered pause between
//! navigations; the portal tolerates a patient reader far better than a
//! burst of parallel tabs. A failed navigation skips that hero and moves on.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use rand::{Rng, rng};
use tracing::{debug, info, instrument, warn};

use chromiumoxide::browser::Browser;

use crate::browser::{self, SharedBuffer};
use crate::config::ScrapeConfig;
use crate::models::FetchTarget;

/// Build the detail route for one hero. The query lives inside the hash
/// fragment, so the label is percent-encoded by hand rather than through a
/// URL builder.
pub fn detail_url(portal_url: &str, hero_id: i64, version_name: &str) -> String {
    format!(
        "{portal_url}?heroId={hero_id}&versionName={}",
        urlencoding::encode(version_name)
    )
}

/// Visit every target's detail page in order, enriching the shared buffer.
///
/// Per-hero failures are logged and skipped; the loop always runs to the end
/// of the target list.
#[instrument(level = "info", skip_all)]
pub async fn fetch_hero_details(
    browser: &Browser,
    buffer: &SharedBuffer,
    config: &Arc<ScrapeConfig>,
    targets: &[FetchTarget],
    version_name: &str,
) {
    let total = targets.len();
    for (i, target) in targets.iter().enumerate() {
        info!(
            index = i + 1,
            total,
            hero_id = target.hero_id,
            hero = %target.hero_name,
            "Fetching hero detail"
        );
        if let Err(e) = fetch_one(browser, buffer, config, target, version_name).await {
            warn!(
                hero_id = target.hero_id,
                hero = %target.hero_name,
                error = %e,
                "Detail fetch failed; continuing with next hero"
            );
        }
    }
}

/// Fetch one hero's detail page on a fresh, isolated page.
async fn fetch_one(
    browser: &Browser,
    buffer: &SharedBuffer,
    config: &Arc<ScrapeConfig>,
    target: &FetchTarget,
    version_name: &str,
) -> Result<(), Box<dyn Error>> {
    let page = browser::new_page(browser, config).await?;
    browser::attach_interceptor(&page, buffer.clone(), config.clone()).await?;

    let url = detail_url(&config.portal_url, target.hero_id, version_name);
    let jitter = rng().random_range(0..=config.settle_jitter_ms);
    let settle = Duration::from_millis(config.detail_settle_ms + jitter);
    let nav_timeout = Duration::from_secs(config.detail_nav_timeout_secs);

    let result = browser::navigate_and_settle(&page, &url, nav_timeout, settle).await;

    if let Err(e) = page.close().await {
        debug!(hero_id = target.hero_id, error = %e, "Failed to close detail page");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_url_encodes_version_label() {
        let url = detail_url(
            "https://camp.honorofkings.com/h5/app/index.html#/adjustment-detail",
            7,
            "2026/02/05",
        );
        assert_eq!(
            url,
            "https://camp.honorofkings.com/h5/app/index.html#/adjustment-detail\
             ?heroId=7&versionName=2026%2F02%2F05"
        );
    }

    #[test]
    fn test_detail_url_plain_label() {
        let url = detail_url("https://portal/#/route", 42, "v1");
        assert_eq!(url, "https://portal/#/route?heroId=42&versionName=v1");
    }
}
