//! Cheap-first fetch strategy: try a static HTTP fetch, detect a
//! JavaScript-shell response, and fall back to a scripted browser session
//! only when the cheap path can't produce usable content.

use crate::fetch::{BrowserSession, FetchError, FetchOptions, HttpFetcher, ScrapeResult};
use std::sync::Arc;

const JS_REQUIRED_PHRASES: &[&str] = &[
    "need to enable javascript",
    "javascript is required",
    "please enable javascript",
    "browser doesn't support javascript",
    "you need to enable javascript to run this app",
];

const SHELL_ROOT_SELECTORS: &[&str] = &["id=\"root\"", "id=\"app\"", "id=\"__next\""];

pub struct ScraperRouter {
    http: Arc<dyn HttpFetcher>,
    browser: Arc<dyn BrowserSession>,
}

impl ScraperRouter {
    pub fn new(http: Arc<dyn HttpFetcher>, browser: Arc<dyn BrowserSession>) -> Self {
        Self { http, browser }
    }

    /// Select a fetcher and return its result. At most one HTTP attempt and
    /// one browser attempt are made per call — the router never retries.
    pub async fn route(
        &self,
        url: &str,
        force_js: bool,
        opts: &FetchOptions,
    ) -> Result<ScrapeResult, FetchError> {
        if force_js {
            return self.browser.fetch(url, opts).await;
        }

        match self.http.fetch(url, opts).await {
            Ok(result) if looks_js_heavy(&result.html) => {
                tracing::debug!(url, "static body looks js-heavy, falling back to browser");
                self.browser.fetch(url, opts).await
            }
            Ok(result) => Ok(result),
            Err(err) => {
                tracing::debug!(url, %err, "http fetch failed, falling back to browser");
                self.browser.fetch(url, opts).await
            }
        }
    }
}

/// Heuristic over a static HTTP body deciding whether it's actually a
/// client-side-rendering shell rather than usable content.
pub fn looks_js_heavy(html: &str) -> bool {
    if html.is_empty() {
        return true;
    }

    let lower = html.to_lowercase();

    if JS_REQUIRED_PHRASES.iter().any(|phrase| lower.contains(phrase)) {
        return true;
    }

    if html.len() < 2000 && SHELL_ROOT_SELECTORS.iter().any(|sel| lower.contains(sel)) {
        return true;
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MockBrowserSession;
    use async_trait::async_trait;

    struct StubHttpFetcher {
        body: String,
    }

    #[async_trait]
    impl HttpFetcher for StubHttpFetcher {
        async fn fetch(&self, url: &str, _opts: &FetchOptions) -> Result<ScrapeResult, FetchError> {
            Ok(ScrapeResult {
                url: url.to_string(),
                html: self.body.clone(),
                status: 200,
                scraper_type: crate::fetch::ScraperType::Html,
                response_time: 0.0,
                timestamp: 0.0,
            })
        }
    }

    struct FailingHttpFetcher;

    #[async_trait]
    impl HttpFetcher for FailingHttpFetcher {
        async fn fetch(&self, _url: &str, _opts: &FetchOptions) -> Result<ScrapeResult, FetchError> {
            Err(FetchError::Transport("connection refused".to_string()))
        }
    }

    #[test]
    fn empty_body_looks_js_heavy() {
        assert!(looks_js_heavy(""));
    }

    #[test]
    fn explicit_js_required_phrase_is_detected() {
        assert!(looks_js_heavy("<html>You need to enable JavaScript to run this app.</html>"));
    }

    #[test]
    fn short_root_shell_is_detected() {
        assert!(looks_js_heavy(r#"<html><body><div id="root"></div></body></html>"#));
    }

    #[test]
    fn long_root_shell_is_not_flagged() {
        let padding = "x".repeat(2100);
        let html = format!(r#"<html><body><div id="root">{padding}</div></body></html>"#);
        assert!(!looks_js_heavy(&html));
    }

    #[test]
    fn ordinary_html_is_not_flagged() {
        assert!(!looks_js_heavy("<html><body><p>hello world</p></body></html>"));
    }

    #[tokio::test]
    async fn static_page_short_circuits_browser() {
        let http = Arc::new(StubHttpFetcher {
            body: "<html><body>plenty of real content here</body></html>".to_string(),
        });
        let browser = Arc::new(MockBrowserSession::new("should not be used"));
        let router = ScraperRouter::new(http, browser);

        let result = router
            .route("https://x.test", false, &FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(result.scraper_type, crate::fetch::ScraperType::Html);
    }

    #[tokio::test]
    async fn js_shell_falls_back_to_browser() {
        let http = Arc::new(StubHttpFetcher {
            body: r#"<html><body><div id="root"></div></body></html>"#.to_string(),
        });
        let browser = Arc::new(MockBrowserSession::new("rendered content"));
        let router = ScraperRouter::new(http, browser);

        let result = router
            .route("https://x.test", false, &FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(result.scraper_type, crate::fetch::ScraperType::Js);
        assert_eq!(result.html, "rendered content");
    }

    #[tokio::test]
    async fn transport_failure_falls_back_to_browser() {
        let http = Arc::new(FailingHttpFetcher);
        let browser = Arc::new(MockBrowserSession::new("rendered content"));
        let router = ScraperRouter::new(http, browser);

        let result = router
            .route("https://x.test", false, &FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(result.scraper_type, crate::fetch::ScraperType::Js);
    }

    #[tokio::test]
    async fn force_js_skips_http_entirely() {
        let http = Arc::new(FailingHttpFetcher);
        let browser = Arc::new(MockBrowserSession::new("rendered content"));
        let router = ScraperRouter::new(http, browser);

        let result = router
            .route("https://x.test", true, &FetchOptions::default())
            .await
            .unwrap();
        assert_eq!(result.html, "rendered content");
    }
}
