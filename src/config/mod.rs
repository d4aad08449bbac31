//! Layered configuration: embedded defaults, an optional TOML file, then
//! environment variables, in that priority order.
//!
//! # Environment variables
//!
//! `HARVESTBOX__<SECTION>__<KEY>`, e.g. `HARVESTBOX__QUEUE__STALE_TIMEOUT_SECS=300`.
//!
//! # Configuration file
//!
//! Defaults to `config/harvestbox.toml`, overridable via `HARVESTBOX_CONFIG`.

mod models;
mod sources;
mod validation;

pub use crate::humanize::ByteSize;
pub use models::{Config, FetchConfig, QueueConfig, ServerConfig, StorageConfig};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("configuration validation failed: {0}")]
    Validation(#[from] ValidationError),
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}
