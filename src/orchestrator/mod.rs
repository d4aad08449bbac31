//! Drives a single mission end-to-end: plan → discover → classify/execute.
//! §4.7 of the reference design. The orchestrator does not go through the
//! `Queue` — it calls `ScraperExecutor` directly; the `Queue`/`Worker` pair
//! is the alternative, long-lived-service consumption path, sharing the
//! same classifier and executor code the handler uses (§4.6).
//!
//! `Planner` and `LinkExtractor` are external collaborators specified only
//! at their interface boundary (the LLM planning client and the HTML→JSON
//! SERP parser are out of scope). This module ships minimal, honest
//! default implementations of both so a mission is exercisable end-to-end
//! without either real backend wired in.

use crate::classifier::{Classification, classify};
use crate::scraper::ScraperExecutor;
use crate::storage::{ArtifactSink, StorageError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("planner failed: {0}")]
    Planner(String),

    #[error("link extraction failed: {0}")]
    LinkExtraction(String),

    #[error("failed to archive discovered urls: {0}")]
    Storage(#[from] StorageError),

    #[error("failed to serialize discovered-url archive: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// `{interpretation, search_queries, target_description, force_js}` — see
/// GLOSSARY.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub interpretation: String,
    pub search_queries: Vec<String>,
    pub target_description: String,
    pub force_js: bool,
}

#[async_trait]
pub trait Planner: Send + Sync {
    async fn plan(&self, goal: &str) -> Result<Plan, OrchestratorError>;
}

#[async_trait]
pub trait LinkExtractor: Send + Sync {
    async fn extract(&self, query: &str) -> Result<Vec<String>, OrchestratorError>;
}

/// Treats the goal as its own single search query. Stands in for the real
/// LLM planning client, which is out of scope here.
pub struct SingleQueryPlanner;

#[async_trait]
impl Planner for SingleQueryPlanner {
    async fn plan(&self, goal: &str) -> Result<Plan, OrchestratorError> {
        Ok(Plan {
            interpretation: goal.to_string(),
            search_queries: vec![goal.to_string()],
            target_description: goal.to_string(),
            force_js: false,
        })
    }
}

/// Accepts literal URLs passed in as "queries" — i.e. each query IS a URL.
/// Stands in for the real HTML→JSON SERP parser, which is out of scope
/// here.
pub struct LiteralUrlExtractor;

#[async_trait]
impl LinkExtractor for LiteralUrlExtractor {
    async fn extract(&self, query: &str) -> Result<Vec<String>, OrchestratorError> {
        Ok(vec![query.to_string()])
    }
}

/// `{successful, failed, skipped}` counts, returned from `run_mission` and
/// also logged (§7 "User-visible behavior").
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MissionSummary {
    pub successful: u64,
    pub failed: u64,
    pub skipped: u64,
}

#[derive(Serialize)]
struct DiscoveredUrlsArchive<'a> {
    mission: &'a str,
    search_queries: &'a [String],
    discovered_at: String,
    total_urls: usize,
    urls: &'a [String],
}

pub struct Orchestrator {
    planner: Arc<dyn Planner>,
    link_extractor: Arc<dyn LinkExtractor>,
    executor: Arc<ScraperExecutor>,
    sink: Arc<ArtifactSink>,
}

impl Orchestrator {
    pub fn new(
        planner: Arc<dyn Planner>,
        link_extractor: Arc<dyn LinkExtractor>,
        executor: Arc<ScraperExecutor>,
        sink: Arc<ArtifactSink>,
    ) -> Self {
        Self {
            planner,
            link_extractor,
            executor,
            sink,
        }
    }

    /// An orchestrator wired with the default planner/extractor pair, for
    /// deployments that haven't substituted a real LLM/search backend yet.
    pub fn default_with(executor: Arc<ScraperExecutor>, sink: Arc<ArtifactSink>) -> Self {
        Self::new(Arc::new(SingleQueryPlanner), Arc::new(LiteralUrlExtractor), executor, sink)
    }

    pub async fn run_mission(
        &self,
        goal: &str,
        archive: bool,
    ) -> Result<MissionSummary, OrchestratorError> {
        let plan = self.planner.plan(goal).await?;

        let mut urls: BTreeSet<String> = BTreeSet::new();
        for query in &plan.search_queries {
            let found = self.link_extractor.extract(query).await?;
            urls.extend(found);
        }
        let urls: Vec<String> = urls.into_iter().collect();

        if archive {
            self.archive_discovered_urls(goal, &plan.search_queries, &urls).await?;
        }

        let mut summary = MissionSummary::default();
        for url in &urls {
            let payload = json!({
                "url": url,
                "render_js": plan.force_js,
                "force_js": plan.force_js,
            });
            let classification = classify(&payload);
            match classification {
                Classification::Skip => summary.skipped += 1,
                _ => {
                    let needs_js = matches!(classification, Classification::Browser) || plan.force_js;
                    let mut payload = payload;
                    payload["force_js"] = json!(needs_js);
                    match self.executor.run(&payload).await {
                        Ok(()) => summary.successful += 1,
                        Err(err) => {
                            error!(url, %err, "mission job failed");
                            summary.failed += 1;
                        }
                    }
                }
            }
        }

        info!(
            successful = summary.successful,
            failed = summary.failed,
            skipped = summary.skipped,
            "mission complete"
        );

        Ok(summary)
    }

    async fn archive_discovered_urls(
        &self,
        mission: &str,
        search_queries: &[String],
        urls: &[String],
    ) -> Result<(), OrchestratorError> {
        let now = OffsetDateTime::now_utc();
        let discovered_at = now
            .format(format_description!(
                "[year]-[month]-[day]T[hour]:[minute]:[second]Z"
            ))
            .unwrap_or_default();
        let ts = now
            .format(format_description!(
                "[year][month][day]_[hour][minute][second]"
            ))
            .unwrap_or_else(|_| "unknown".to_string());

        let archive = DiscoveredUrlsArchive {
            mission,
            search_queries,
            discovered_at,
            total_urls: urls.len(),
            urls,
        };
        let body = serde_json::to_vec_pretty(&archive)?;
        let key = format!("discovered_urls/urls_{ts}.json");
        self.sink.write(&key, body).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{FetchError, FetchOptions, HttpFetcher, MockBrowserSession, ScrapeResult, ScraperType};
    use crate::scraper::ScraperRouter;

    struct StubHttpFetcher;

    #[async_trait]
    impl HttpFetcher for StubHttpFetcher {
        async fn fetch(&self, url: &str, _opts: &FetchOptions) -> Result<ScrapeResult, FetchError> {
            Ok(ScrapeResult {
                url: url.to_string(),
                html: "<html><body>plenty of real content here</body></html>".to_string(),
                status: 200,
                scraper_type: ScraperType::Html,
                response_time: 0.0,
                timestamp: 0.0,
            })
        }
    }

    fn test_orchestrator() -> (Orchestrator, Arc<ArtifactSink>) {
        let router = Arc::new(ScraperRouter::new(
            Arc::new(StubHttpFetcher),
            Arc::new(MockBrowserSession::new("rendered")),
        ));
        let sink = Arc::new(ArtifactSink::in_memory());
        let executor = Arc::new(ScraperExecutor::new(router, sink.clone()));
        (Orchestrator::default_with(executor, sink.clone()), sink)
    }

    #[tokio::test]
    async fn mission_with_a_single_url_reports_one_success() {
        let (orchestrator, _sink) = test_orchestrator();
        let summary = orchestrator
            .run_mission("https://x.test", false)
            .await
            .unwrap();
        assert_eq!(summary.successful, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.skipped, 0);
    }

    #[tokio::test]
    async fn mission_archives_discovered_urls_when_asked() {
        let (orchestrator, sink) = test_orchestrator();
        orchestrator.run_mission("https://x.test", true).await.unwrap();

        let keys = sink.list_prefix("discovered_urls").await.unwrap();
        assert_eq!(keys.len(), 1);
    }

    #[tokio::test]
    async fn mission_without_archive_writes_no_discovery_record() {
        let (orchestrator, sink) = test_orchestrator();
        orchestrator.run_mission("https://x.test", false).await.unwrap();

        let keys = sink.list_prefix("discovered_urls").await.unwrap();
        assert!(keys.is_empty());
    }

    #[tokio::test]
    async fn mission_forces_the_browser_path_for_js_heavy_domains() {
        let (orchestrator, sink) = test_orchestrator();
        let summary = orchestrator
            .run_mission("https://twitter.com/someone", false)
            .await
            .unwrap();
        assert_eq!(summary.successful, 1);

        let keys = sink.list_prefix("structured").await.unwrap();
        assert_eq!(keys.len(), 1);
        let body = sink.read(&keys[0]).await.unwrap();
        let record: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            record["scraper_type"], "js",
            "browser-classified url must be dispatched with force_js so the router skips straight to the browser session"
        );
    }

    #[tokio::test]
    async fn mission_skips_urls_the_classifier_rejects() {
        let (orchestrator, _sink) = test_orchestrator();
        let summary = orchestrator
            .run_mission("https://x.test/file.pdf", false)
            .await
            .unwrap();
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.successful, 0);
    }
}
