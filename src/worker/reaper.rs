//! Supervisory task that reclaims stale in-flight jobs on a fixed cadence,
//! external to the `Worker`'s own loop (§4.5, §5: "invoke periodically
//! (design target: every `timeout/4` seconds) from a reaper task").

use crate::queue::Queue;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{info, warn};

/// Runs `queue.requeue_stale(stale_timeout)` every `stale_timeout / 4`
/// until `shutdown` is set. Intended to run as a sibling tokio task to the
/// `Worker`'s own drain loop, sharing its shutdown flag.
pub async fn run(queue: Arc<Queue>, stale_timeout: Duration, shutdown: Arc<AtomicBool>) {
    let cadence = stale_timeout / 4;
    let cadence = if cadence.is_zero() {
        Duration::from_secs(1)
    } else {
        cadence
    };

    info!(?stale_timeout, ?cadence, "reaper starting");
    while !shutdown.load(Ordering::SeqCst) {
        tokio::time::sleep(cadence).await;
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        match queue.requeue_stale(stale_timeout).await {
            Ok(0) => {}
            Ok(reclaimed) => warn!(reclaimed, "reaper reclaimed stale jobs"),
            Err(err) => warn!(%err, "reaper failed to scan for stale jobs"),
        }
    }
    info!("reaper stopped");
}
