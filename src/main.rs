//! # HoK Patch Scrape
//!
//! A scraping pipeline that captures seasonal hero balance adjustments from
//! the Honor of Kings companion portal and publishes them as a single flat
//! JSON document for the site that displays them.
//!
//! The portal is a single-page app and its API rejects direct clients, so the
//! pipeline drives a real headless Chromium session and passively intercepts
//! the JSON the rendered page fetches for itself.
//!
//! ## Usage
//!
//! ```sh
//! hok_patch_scrape -o ./output
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Overview**: Visit the adjustment overview route; the interceptor
//!    captures the season summary and the hero roster as the page loads them
//! 2. **Discovery**: Read hero ids and the version label out of the summary
//! 3. **Enrichment**: Visit each hero's detail route on its own page, one at
//!    a time, capturing per-hero change histories
//! 4. **Output**: Normalize the captured buffer and write the JSON document
//!
//! Detail fetching is deliberately sequential: one polite reader instead of a
//! burst of parallel tabs. A hero whose page fails to load is skipped, and
//! its entry ships without skill details. The browser is closed whether the
//! run succeeds or fails.

use chrono::{SecondsFormat, Utc};
use chromiumoxide::browser::Browser;
use clap::Parser;
use std::error::Error;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod browser;
mod cli;
mod config;
mod fetch;
mod intercept;
mod models;
mod normalize;
mod outputs;
mod utils;

use browser::SharedBuffer;
use cli::Cli;
use config::ScrapeConfig;
use models::CaptureBuffer;
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("patch scrape starting up");

    // Parse CLI and load configuration
    let args = Cli::parse();
    let config = Arc::new(ScrapeConfig::load(args.config.as_deref()).await?);

    // Early check: ensure the output dir is writable before paying for a browser
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let (mut browser, handler_task) = browser::launch(&args).await?;

    let result = run(&browser, &config, &args).await;
    if let Err(e) = &result {
        error!(error = %e, "Scrape run failed");
    }

    // Cleanup runs on both the success and the failure path.
    if let Err(e) = browser.close().await {
        warn!(error = %e, "Failed to close browser");
    }
    if let Err(e) = browser.wait().await {
        warn!(error = %e, "Failed to wait for browser shutdown");
    }
    handler_task.abort();

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    result
}

/// Drive one full scrape: overview, discovery, detail loop, normalize, write.
#[instrument(level = "info", skip_all)]
async fn run(
    browser: &Browser,
    config: &Arc<ScrapeConfig>,
    args: &Cli,
) -> Result<(), Box<dyn Error>> {
    let buffer: SharedBuffer = Arc::new(Mutex::new(CaptureBuffer::default()));

    // ---- Overview page: season summary + roster arrive via the interceptor ----
    info!(url = %config.portal_url, "Visiting adjustment overview page");
    let page = browser::new_page(browser, config).await?;
    browser::attach_interceptor(&page, buffer.clone(), config.clone()).await?;
    browser::navigate_and_settle(
        &page,
        &config.portal_url,
        Duration::from_secs(config.nav_timeout_secs),
        Duration::from_millis(config.summary_settle_ms),
    )
    .await?;

    // ---- Discovery ----
    let (targets, version_name) = {
        let guard = buffer.lock().unwrap_or_else(PoisonError::into_inner);
        let version = guard
            .version_name()
            .unwrap_or_else(|| config.fallback_version.clone());
        (guard.adjustment_targets(), version)
    };
    if targets.is_empty() {
        warn!("No season adjustments captured; the output document will be empty");
    }
    info!(
        heroes = targets.len(),
        version = %version_name,
        "Discovered heroes with adjustments"
    );

    // ---- Sequential detail enrichment ----
    fetch::fetch_hero_details(browser, &buffer, config, &targets, &version_name).await;

    // ---- Normalize ----
    let document = {
        let guard = buffer.lock().unwrap_or_else(PoisonError::into_inner);
        normalize::build_document(
            &guard,
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        )
    };

    let with_details = document
        .adjustments
        .iter()
        .filter(|a| !a.skillChanges.is_empty())
        .count();
    info!(
        season = document.season.name.as_deref().unwrap_or("unknown"),
        adjustments = document.adjustments.len(),
        with_skill_details = with_details,
        roster = document.heroList.len(),
        "Scrape summary"
    );

    // ---- Write ----
    let path = outputs::json::write_document(&document, &args.output_dir, &config.output_file)
        .await?;
    info!(path = %path, "Saved adjustment document");

    Ok(())
}
