//! Headless browser driver and per-page response interception.
//!
//! The pipeline never talks to the camp API directly: a real Chromium session
//! renders the portal, and this module watches the network traffic the page
//! itself generates. Interception runs over CDP `Network` events. A response
//! body is only available once loading finishes, so the interceptor keeps a
//! small pending map from request id to response metadata and fetches the
//! body on the matching `loadingFinished` event.

use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventLoadingFinished, EventResponseReceived,
    GetResponseBodyParams, RequestId,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, instrument, warn};

use crate::cli::Cli;
use crate::config::ScrapeConfig;
use crate::intercept::{self, Classification};
use crate::models::CaptureBuffer;

/// The capture buffer as shared between the fetch loop and the interceptor
/// tasks of concurrently live pages. The mutex serializes writes; reads only
/// happen at suspension points between navigations.
pub type SharedBuffer = Arc<Mutex<CaptureBuffer>>;

/// Metadata held between `responseReceived` and `loadingFinished`.
struct PendingResponse {
    url: String,
    mime_type: String,
}

/// Launch a Chromium instance and drive its CDP handler in the background.
///
/// The returned task runs until the browser closes; the caller awaits it as
/// part of shutdown.
#[instrument(level = "info", skip_all)]
pub async fn launch(args: &Cli) -> Result<(Browser, JoinHandle<()>), Box<dyn Error>> {
    let mut builder = BrowserConfig::builder()
        .no_sandbox()
        .arg("--disable-setuid-sandbox");
    if let Some(path) = &args.chrome_path {
        builder = builder.chrome_executable(path);
    }
    if args.headful {
        builder = builder.with_head();
    }

    let (browser, mut handler) = Browser::launch(builder.build()?).await?;
    let handler_task = tokio::spawn(async move {
        while let Some(result) = handler.next().await {
            if let Err(e) = result {
                debug!(error = %e, "Browser handler stopped");
                break;
            }
        }
    });

    info!(headful = args.headful, "Browser launched");
    Ok((browser, handler_task))
}

/// Open a blank page with the configured user agent applied.
///
/// Pages start at `about:blank` so the interceptor can attach before any
/// portal request is issued.
pub async fn new_page(browser: &Browser, config: &ScrapeConfig) -> Result<Page, Box<dyn Error>> {
    let page = browser.new_page("about:blank").await?;
    page.set_user_agent(config.user_agent.as_str()).await?;
    Ok(page)
}

/// Attach the response interceptor to a page.
///
/// Spawns a consumer task that drains the page's network event streams,
/// classifies each qualifying response, and merges captures into the shared
/// buffer. The task ends on its own when the page closes and its event
/// streams terminate.
pub async fn attach_interceptor(
    page: &Page,
    buffer: SharedBuffer,
    config: Arc<ScrapeConfig>,
) -> Result<(), Box<dyn Error>> {
    page.execute(EnableParams::default()).await?;

    let mut responses = page.event_listener::<EventResponseReceived>().await?;
    let mut finished = page.event_listener::<EventLoadingFinished>().await?;
    let mut failed = page.event_listener::<EventLoadingFailed>().await?;
    let page = page.clone();

    tokio::spawn(async move {
        let mut pending: HashMap<RequestId, PendingResponse> = HashMap::new();
        loop {
            tokio::select! {
                Some(event) = responses.next() => {
                    let url = event.response.url.clone();
                    if url.contains(&config.api_host_marker) {
                        pending.insert(
                            event.request_id.clone(),
                            PendingResponse {
                                url,
                                mime_type: event.response.mime_type.clone(),
                            },
                        );
                    }
                }
                Some(event) = finished.next() => {
                    let Some(meta) = pending.remove(&event.request_id) else {
                        continue;
                    };
                    match response_body(&page, &event.request_id).await {
                        Ok(body) => {
                            apply(&buffer, &config, &meta, &body);
                        }
                        Err(e) => {
                            debug!(url = %meta.url, error = %e, "Response body unavailable");
                        }
                    }
                }
                Some(event) = failed.next() => {
                    if pending.remove(&event.request_id).is_some() {
                        debug!(error = %event.error_text, "Intercepted request failed to load");
                    }
                }
                else => break,
            }
        }
    });

    Ok(())
}

/// Classify one completed response and merge a capture into the buffer.
fn apply(buffer: &SharedBuffer, config: &ScrapeConfig, meta: &PendingResponse, body: &str) {
    match intercept::classify(config, &meta.url, &meta.mime_type, body) {
        Classification::Captured(payload) => {
            let mut guard = buffer.lock().unwrap_or_else(PoisonError::into_inner);
            intercept::record(&mut guard, payload);
        }
        Classification::NonMatching => {}
        Classification::ParseError(e) => {
            // Preflights and upstream error pages; not worth more than a debug line.
            debug!(
                url = %meta.url,
                error = %e,
                body_preview = %crate::utils::truncate_for_log(body, 200),
                "Ignoring unparsable camp response"
            );
        }
    }
}

/// Fetch a completed response's body, decoding it when CDP ships it base64.
async fn response_body(
    page: &Page,
    request_id: &RequestId,
) -> Result<String, Box<dyn Error + Send + Sync>> {
    let result = page
        .execute(GetResponseBodyParams::new(request_id.clone()))
        .await?
        .result;
    if result.base64_encoded {
        let bytes = BASE64.decode(result.body.as_bytes())?;
        Ok(String::from_utf8(bytes)?)
    } else {
        Ok(result.body)
    }
}

/// Navigate a page and wait out the portal's late API calls.
///
/// Navigation is bounded by `nav_timeout`; the subsequent load wait is
/// best-effort (single-page routes often never fire another load event), and
/// the settle delay afterwards is unconditional.
#[instrument(level = "debug", skip_all, fields(url = %url))]
pub async fn navigate_and_settle(
    page: &Page,
    url: &str,
    nav_timeout: Duration,
    settle: Duration,
) -> Result<(), Box<dyn Error>> {
    timeout(nav_timeout, page.goto(url)).await??;

    match timeout(nav_timeout, page.wait_for_navigation()).await {
        Ok(Ok(_)) => {}
        Ok(Err(e)) => debug!(error = %e, "Load wait reported an error; proceeding"),
        Err(_) => warn!("Load wait timed out; proceeding with whatever was captured"),
    }

    sleep(settle).await;
    Ok(())
}
