//! Fetch strategies. Both `HttpFetcher` and `BrowserSession` are external
//! collaborators in the reference design — the anti-bot TLS client and the
//! headless-browser session are out of scope here. What this module owns is
//! the *interface* each is expected to satisfy, plus a working default
//! `HttpFetcher` (a plain HTTP client; it does not claim TLS fingerprint
//! evasion) and a `BrowserSession` seam with a safe unavailable-by-default
//! implementation that real deployments are expected to replace.

pub mod browser;
pub mod error;
pub mod http;
pub mod types;

pub use browser::{BrowserSession, MockBrowserSession, UnavailableBrowserSession};
pub use error::FetchError;
pub use http::{HttpFetcher, HttpFetcherConfig, ReqwestHttpFetcher};
pub use types::{FetchOptions, ScrapeResult, ScraperType};
