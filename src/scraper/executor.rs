//! Adapter turning a job payload into a fetch via the router, then
//! persisting raw + structured artifacts.

use crate::fetch::{FetchError, FetchOptions};
use crate::scraper::router::ScraperRouter;
use crate::storage::{ArtifactSink, StorageError};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("artifact write failed: {0}")]
    Storage(#[from] StorageError),
}

/// Structured sidecar record, fields serialized in this exact order.
#[derive(Serialize)]
struct StructuredRecord<'a> {
    id: &'a str,
    url: &'a str,
    scraper_type: String,
    status: u16,
    response_time: f64,
    timestamp: f64,
    raw_file: String,
}

pub struct ScraperExecutor {
    router: Arc<ScraperRouter>,
    sink: Arc<ArtifactSink>,
}

impl ScraperExecutor {
    pub fn new(router: Arc<ScraperRouter>, sink: Arc<ArtifactSink>) -> Self {
        Self { router, sink }
    }

    pub async fn run(&self, payload: &Value) -> Result<(), ExecutorError> {
        let url = payload
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| ExecutorError::InvalidPayload("missing `url`".to_string()))?;

        let job_id = payload
            .get("job_id")
            .or_else(|| payload.get("id"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::now_v7().to_string());

        let force_js = payload
            .get("force_js")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let timeout = payload
            .get("timeout")
            .and_then(Value::as_f64)
            .map(Duration::from_secs_f64);

        let headers = payload
            .get("headers")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        let opts = FetchOptions { timeout, headers };
        let result = self.router.route(url, force_js, &opts).await?;

        let raw_file = format!("raw/{job_id}.html");
        self.sink
            .write(&raw_file, result.html.as_bytes().to_vec())
            .await?;

        let record = StructuredRecord {
            id: &job_id,
            url,
            scraper_type: result.scraper_type.to_string(),
            status: result.status,
            response_time: result.response_time,
            timestamp: result.timestamp,
            raw_file: format!("{job_id}.html"),
        };
        let structured_file = format!("structured/{job_id}.json");
        let body = serde_json::to_vec_pretty(&record)
            .map_err(|e| ExecutorError::InvalidPayload(e.to_string()))?;
        self.sink.write(&structured_file, body).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{HttpFetcher, MockBrowserSession, ScrapeResult, ScraperType};
    use async_trait::async_trait;
    use serde_json::json;

    struct StubHttpFetcher;

    #[async_trait]
    impl HttpFetcher for StubHttpFetcher {
        async fn fetch(&self, url: &str, _opts: &FetchOptions) -> Result<ScrapeResult, FetchError> {
            Ok(ScrapeResult {
                url: url.to_string(),
                html: "<html><body>hello</body></html>".to_string(),
                status: 200,
                scraper_type: ScraperType::Html,
                response_time: 0.01,
                timestamp: 0.0,
            })
        }
    }

    fn test_executor() -> ScraperExecutor {
        let router = Arc::new(ScraperRouter::new(
            Arc::new(StubHttpFetcher),
            Arc::new(MockBrowserSession::new("unused")),
        ));
        let sink = Arc::new(ArtifactSink::in_memory());
        ScraperExecutor::new(router, sink)
    }

    #[tokio::test]
    async fn run_rejects_payload_without_url() {
        let executor = test_executor();
        let err = executor.run(&json!({})).await.unwrap_err();
        assert!(matches!(err, ExecutorError::InvalidPayload(_)));
    }

    #[tokio::test]
    async fn run_writes_raw_then_structured_artifacts() {
        let executor = test_executor();
        let payload = json!({"url": "https://x.test", "job_id": "job-1"});
        executor.run(&payload).await.unwrap();

        assert!(executor.sink.exists("raw/job-1.html").await.unwrap());
        assert!(executor.sink.exists("structured/job-1.json").await.unwrap());

        let structured = executor.sink.read("structured/job-1.json").await.unwrap();
        let text = String::from_utf8(structured).unwrap();
        assert!(text.contains("\"id\""));
        assert!(text.find("\"id\"").unwrap() < text.find("\"raw_file\"").unwrap());
    }

    #[tokio::test]
    async fn run_mints_a_job_id_when_absent() {
        let executor = test_executor();
        let payload = json!({"url": "https://x.test"});
        executor.run(&payload).await.unwrap();
    }
}
