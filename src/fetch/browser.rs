//! `BrowserSession`: scripted-DOM fetch. Real headless-browser automation is
//! an external collaborator (out of scope); this module owns the interface
//! and two honest implementations — one that simply reports it has no
//! browser wired in, and a canned-response double used by tests and by the
//! router's own doctests.

use crate::fetch::error::FetchError;
use crate::fetch::types::{FetchOptions, ScrapeResult, ScraperType, unix_now};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Navigate, wait for load, serialize the full DOM. Status is always
    /// reported as 200 when content comes back — the real HTTP status
    /// (if any) is not exposed at this layer. Implementations must close
    /// the underlying session on every exit path, including errors.
    async fn fetch(&self, url: &str, opts: &FetchOptions) -> Result<ScrapeResult, FetchError>;
}

/// Default `BrowserSession` when no real headless-browser backend has been
/// configured. Fails loudly and immediately rather than pretending to
/// degrade to a static fetch, since that would silently violate the
/// contract callers rely on when they explicitly asked for a browser.
pub struct UnavailableBrowserSession;

#[async_trait]
impl BrowserSession for UnavailableBrowserSession {
    async fn fetch(&self, _url: &str, _opts: &FetchOptions) -> Result<ScrapeResult, FetchError> {
        Err(FetchError::BrowserUnavailable(
            "no browser automation backend is configured".to_string(),
        ))
    }
}

/// Canned-response double for tests: returns a fixed body per URL, or a
/// configured default body for anything not explicitly registered.
pub struct MockBrowserSession {
    responses: Mutex<HashMap<String, String>>,
    default_body: String,
}

impl MockBrowserSession {
    pub fn new(default_body: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            default_body: default_body.into(),
        }
    }

    pub fn with_response(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.into(), body.into());
        self
    }
}

#[async_trait]
impl BrowserSession for MockBrowserSession {
    async fn fetch(&self, url: &str, _opts: &FetchOptions) -> Result<ScrapeResult, FetchError> {
        let start = Instant::now();
        let body = self
            .responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| self.default_body.clone());

        Ok(ScrapeResult {
            url: url.to_string(),
            html: body,
            status: 200,
            scraper_type: ScraperType::Js,
            response_time: start.elapsed().as_secs_f64(),
            timestamp: unix_now(),
        })
    }
}
