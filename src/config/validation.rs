use super::models::Config;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("queue.max_attempts must be at least 1")]
    MaxAttemptsTooLow,

    #[error("queue.poll_interval_ms must be positive")]
    PollIntervalNotPositive,

    #[error("queue.dequeue_wait_secs must be positive")]
    DequeueWaitNotPositive,

    #[error("queue.stale_timeout_secs must be positive")]
    StaleTimeoutNotPositive,

    #[error("fetch.max_body_bytes must be positive")]
    MaxBodyBytesNotPositive,

    #[error("storage.data_dir must not be empty")]
    DataDirEmpty,

    #[error("storage.data_dir {0:?} is not writable: {1}")]
    DataDirUnwritable(std::path::PathBuf, String),
}

pub fn validate(config: &Config) -> Result<(), ValidationError> {
    if config.queue.max_attempts < 1 {
        return Err(ValidationError::MaxAttemptsTooLow);
    }
    if config.queue.poll_interval_ms == 0 {
        return Err(ValidationError::PollIntervalNotPositive);
    }
    if config.queue.dequeue_wait_secs == 0 {
        return Err(ValidationError::DequeueWaitNotPositive);
    }
    if config.queue.stale_timeout_secs == 0 {
        return Err(ValidationError::StaleTimeoutNotPositive);
    }
    if config.fetch.max_body_bytes.as_u64() == 0 {
        return Err(ValidationError::MaxBodyBytesNotPositive);
    }
    if config.storage.data_dir.as_os_str().is_empty() {
        return Err(ValidationError::DataDirEmpty);
    }
    if let Err(err) = probe_writable(&config.storage.data_dir) {
        return Err(ValidationError::DataDirUnwritable(
            config.storage.data_dir.clone(),
            err.to_string(),
        ));
    }
    Ok(())
}

/// Creates `dir` (and its parents) if missing, then writes and removes a
/// throwaway probe file to confirm the process can actually write there —
/// catching a read-only mount or permission-denied directory at config load
/// time rather than deep inside the first `ArtifactSink::write` call.
fn probe_writable(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let probe = dir.join(".harvestbox-write-probe");
    std::fs::write(&probe, b"ok")?;
    std::fs::remove_file(&probe)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::models::{Config, QueueConfig};
    use tempfile::TempDir;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&Config {
            queue: QueueConfig::default(),
            storage: Default::default(),
            fetch: Default::default(),
            server: Default::default(),
        })
        .is_ok());
    }

    #[test]
    fn zero_max_attempts_is_rejected() {
        let mut config = Config {
            queue: QueueConfig::default(),
            storage: Default::default(),
            fetch: Default::default(),
            server: Default::default(),
        };
        config.queue.max_attempts = 0;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::MaxAttemptsTooLow)
        ));
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let mut config = Config {
            queue: QueueConfig::default(),
            storage: Default::default(),
            fetch: Default::default(),
            server: Default::default(),
        };
        config.queue.poll_interval_ms = 0;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::PollIntervalNotPositive)
        ));
    }

    #[test]
    fn writable_data_dir_is_accepted_and_created_if_missing() {
        let dir = TempDir::new().unwrap();
        let data_dir = dir.path().join("nested/data");
        let mut config = Config {
            queue: QueueConfig::default(),
            storage: Default::default(),
            fetch: Default::default(),
            server: Default::default(),
        };
        config.storage.data_dir = data_dir.clone();
        assert!(validate(&config).is_ok());
        assert!(data_dir.is_dir());
    }

    #[test]
    fn unwritable_data_dir_is_rejected() {
        let dir = TempDir::new().unwrap();
        // Occupy the path with a plain file so `create_dir_all` fails.
        let blocked = dir.path().join("blocked");
        std::fs::write(&blocked, b"occupied").unwrap();

        let mut config = Config {
            queue: QueueConfig::default(),
            storage: Default::default(),
            fetch: Default::default(),
            server: Default::default(),
        };
        config.storage.data_dir = blocked;
        assert!(matches!(
            validate(&config),
            Err(ValidationError::DataDirUnwritable(_, _))
        ));
    }
}
