use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

pub fn unix_now() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScraperType {
    Html,
    Js,
}

impl std::fmt::Display for ScraperType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScraperType::Html => f.write_str("html"),
            ScraperType::Js => f.write_str("js"),
        }
    }
}

/// Result of a single fetch attempt, regardless of which fetcher produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub url: String,
    pub html: String,
    pub status: u16,
    pub scraper_type: ScraperType,
    pub response_time: f64,
    pub timestamp: f64,
}

/// Per-call options passed down to a fetcher. `headers` is accepted for
/// contract symmetry between fetchers but an `HttpFetcher` is entitled to
/// ignore it entirely (see `ReqwestHttpFetcher`).
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub timeout: Option<Duration>,
    pub headers: BTreeMap<String, String>,
}
