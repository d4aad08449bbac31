//! Default `HttpFetcher`: a plain `reqwest`-based client. It satisfies the
//! contract (headers are controlled internally, caller-supplied headers are
//! discarded with a warning) but makes no claim to TLS fingerprint evasion —
//! that concern belongs to the external stealth client this interface
//! stands in for.

use crate::fetch::error::FetchError;
use crate::fetch::types::{FetchOptions, ScrapeResult, ScraperType, unix_now};
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};

#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn fetch(&self, url: &str, opts: &FetchOptions) -> Result<ScrapeResult, FetchError>;
}

#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
    pub max_body_bytes: u64,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            user_agent: "HarvestBox/0.1.0".to_string(),
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

pub struct ReqwestHttpFetcher {
    client: Client,
    config: HttpFetcherConfig,
}

impl ReqwestHttpFetcher {
    pub fn new(config: HttpFetcherConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(&config.user_agent)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestHttpFetcher {
    async fn fetch(&self, url: &str, opts: &FetchOptions) -> Result<ScrapeResult, FetchError> {
        if !opts.headers.is_empty() {
            tracing::warn!(
                url,
                count = opts.headers.len(),
                "caller-supplied headers discarded; fetcher controls its own fingerprint"
            );
        }

        let start = Instant::now();
        let mut request = self.client.get(url);
        if let Some(timeout) = opts.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Transport(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown")
            )));
        }

        let bytes = response.bytes().await?;
        let bytes = if bytes.len() as u64 > self.config.max_body_bytes {
            &bytes[..self.config.max_body_bytes as usize]
        } else {
            &bytes[..]
        };
        let html = String::from_utf8_lossy(bytes).into_owned();

        Ok(ScrapeResult {
            url: url.to_string(),
            html,
            status: status.as_u16(),
            scraper_type: ScraperType::Html,
            response_time: start.elapsed().as_secs_f64(),
            timestamp: unix_now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_are_conservative() {
        let config = HttpFetcherConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(config.max_body_bytes > 0);
    }
}
