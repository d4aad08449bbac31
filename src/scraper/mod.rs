pub mod executor;
pub mod router;

pub use executor::{ExecutorError, ScraperExecutor};
pub use router::ScraperRouter;
