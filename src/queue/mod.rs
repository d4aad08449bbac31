pub mod error;
pub mod model;
pub mod store;

pub use error::{QueueError, Result};
pub use model::{Job, fingerprint};
pub use store::{DEFAULT_DEQUEUE_WAIT, MAX_ATTEMPTS, POLL_INTERVAL, Queue, QueueStats};
