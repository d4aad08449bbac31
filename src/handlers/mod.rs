//! Maps a classifier result onto a pre-instantiated executor, and wraps
//! that table as the `Worker`'s job handler. Implemented as a small
//! immutable table built once at startup, not dynamic dispatch on a class
//! hierarchy (§9 Design Notes: "Global registries").

use crate::classifier::{Classification, classify};
use crate::scraper::ScraperExecutor;
use crate::worker::Handler;
use async_trait::async_trait;
use std::sync::Arc;

/// Maps `html`/`browser` classifications onto executor instances. Both
/// currently resolve to the same `ScraperExecutor` driven by the router —
/// the duality exists so a deployment can later swap in a dedicated
/// executor per strategy without touching the handler.
pub struct ExecutorRegistry {
    html: Arc<ScraperExecutor>,
    browser: Arc<ScraperExecutor>,
}

impl ExecutorRegistry {
    pub fn new(html: Arc<ScraperExecutor>, browser: Arc<ScraperExecutor>) -> Self {
        Self { html, browser }
    }

    /// A single shared executor registered for both classifications.
    pub fn shared(executor: Arc<ScraperExecutor>) -> Self {
        Self {
            html: executor.clone(),
            browser: executor,
        }
    }

    pub fn get(&self, classification: Classification) -> Option<&Arc<ScraperExecutor>> {
        match classification {
            Classification::Html => Some(&self.html),
            Classification::Browser => Some(&self.browser),
            Classification::Skip => None,
        }
    }
}

/// The `Worker`'s job handler: classify, then skip or dispatch to the
/// registered executor.
pub struct ClassifyingHandler {
    registry: ExecutorRegistry,
}

impl ClassifyingHandler {
    pub fn new(registry: ExecutorRegistry) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Handler for ClassifyingHandler {
    async fn handle(&self, payload: serde_json::Value) -> Result<(), String> {
        match classify(&payload) {
            Classification::Skip => Ok(()),
            classification => {
                let executor = self
                    .registry
                    .get(classification)
                    .expect("classify() never returns Skip here");
                executor.run(&payload).await.map_err(|e| e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{HttpFetcher, MockBrowserSession};
    use crate::fetch::{FetchOptions, FetchError, ScrapeResult, ScraperType};
    use crate::scraper::ScraperRouter;
    use crate::storage::ArtifactSink;
    use serde_json::json;

    struct StubHttpFetcher;

    #[async_trait]
    impl HttpFetcher for StubHttpFetcher {
        async fn fetch(&self, url: &str, _opts: &FetchOptions) -> Result<ScrapeResult, FetchError> {
            Ok(ScrapeResult {
                url: url.to_string(),
                html: "<html><body>content</body></html>".to_string(),
                status: 200,
                scraper_type: ScraperType::Html,
                response_time: 0.0,
                timestamp: 0.0,
            })
        }
    }

    fn test_handler() -> ClassifyingHandler {
        let router = Arc::new(ScraperRouter::new(
            Arc::new(StubHttpFetcher),
            Arc::new(MockBrowserSession::new("rendered")),
        ));
        let executor = Arc::new(ScraperExecutor::new(router, Arc::new(ArtifactSink::in_memory())));
        ClassifyingHandler::new(ExecutorRegistry::shared(executor))
    }

    #[tokio::test]
    async fn skip_classification_counts_as_success() {
        let handler = test_handler();
        assert!(handler.handle(json!({})).await.is_ok());
    }

    #[tokio::test]
    async fn html_classification_runs_the_executor() {
        let handler = test_handler();
        let result = handler
            .handle(json!({"url": "https://x.test", "job_id": "job-1"}))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn invalid_payload_propagates_as_error() {
        let handler = test_handler();
        let result = handler.handle(json!({"url": "https://x.test/file.exe"})).await;
        assert!(result.is_ok(), "skip classification never reaches the executor");
    }
}
