pub mod classifier;
pub mod config;
pub mod fetch;
pub mod handlers;
pub mod humanize;
pub mod orchestrator;
pub mod queue;
pub mod scraper;
pub mod server;
pub mod storage;
pub mod worker;
