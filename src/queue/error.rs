use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("store error: {0}")]
    Store(#[from] fjall::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("job not found: {0}")]
    JobNotFound(String),
}

pub type Result<T> = std::result::Result<T, QueueError>;
