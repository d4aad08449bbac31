//! Generic drain loop: long-poll the queue, dispatch the job payload to a
//! `Handler`, and ack success or failure. §4.5 of the reference design.
//!
//! Stale in-flight jobs are not this loop's concern — that's the sibling
//! [`reaper`] task's job, run alongside the worker in the same process.

pub mod reaper;

use crate::queue::{Job, Queue};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// The job handler a `Worker` drives. `handle` must block (in the async
/// sense) until the job is fully done — the worker processes one job at a
/// time per instance, matching §5's "one job in flight per Worker" contract.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, payload: Value) -> Result<(), String>;
}

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// How long to sleep between dequeue attempts when the queue is empty.
    pub poll_interval: Duration,
    /// Per-iteration bound passed to `queue.dequeue`.
    pub dequeue_wait: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: crate::queue::POLL_INTERVAL,
            dequeue_wait: crate::queue::DEFAULT_DEQUEUE_WAIT,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct WorkerStats {
    pub succeeded: u64,
    pub failed: u64,
}

pub struct Worker {
    queue: Arc<Queue>,
    handler: Arc<dyn Handler>,
    config: WorkerConfig,
    shutdown: Arc<AtomicBool>,
}

impl Worker {
    pub fn new(queue: Arc<Queue>, handler: Arc<dyn Handler>, config: WorkerConfig) -> Self {
        Self {
            queue,
            handler,
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A handle a caller can use to request shutdown from outside, or to
    /// share the same flag with a sibling reaper/server task so one signal
    /// stops all of them together.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Run until `run_timeout` elapses (if given) or a stop signal arrives.
    /// The in-flight job, if any, is always allowed to finish.
    pub async fn start(&self, run_timeout: Option<Duration>) -> WorkerStats {
        self.install_signal_hooks();

        let deadline = run_timeout.map(|d| Instant::now() + d);
        let mut stats = WorkerStats::default();

        info!("worker starting");
        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }
            if deadline.is_some_and(|d| Instant::now() >= d) {
                break;
            }

            match self.queue.dequeue(self.config.dequeue_wait).await {
                Ok(Some(job)) => self.process_job(job, &mut stats).await,
                Ok(None) => tokio::time::sleep(self.config.poll_interval).await,
                Err(err) => {
                    warn!(%err, "queue store error, backing off");
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
            }
        }

        info!(succeeded = stats.succeeded, failed = stats.failed, "worker stopped");
        stats
    }

    fn install_signal_hooks(&self) {
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            let ctrl_c = async {
                let _ = tokio::signal::ctrl_c().await;
            };

            #[cfg(unix)]
            let terminate = async {
                use tokio::signal::unix::{SignalKind, signal};
                match signal(SignalKind::terminate()) {
                    Ok(mut sigterm) => {
                        sigterm.recv().await;
                    }
                    Err(_) => std::future::pending::<()>().await,
                }
            };
            #[cfg(not(unix))]
            let terminate = std::future::pending::<()>();

            tokio::select! {
                _ = ctrl_c => {},
                _ = terminate => {},
            }
            warn!("shutdown signal received, finishing in-flight job");
            shutdown.store(true, Ordering::SeqCst);
        });
    }

    async fn process_job(&self, job: Job, stats: &mut WorkerStats) {
        if job.id.is_empty() {
            error!("dequeued job missing id, dropping");
            return;
        }

        match self.handler.handle(job.payload.clone()).await {
            Ok(()) => {
                if let Err(err) = self.queue.ack_success(&job.id).await {
                    error!(job_id = %job.id, %err, "ack_success failed");
                }
                stats.succeeded += 1;
                info!(job_id = %job.id, "job succeeded");
            }
            Err(err) => {
                error!(job_id = %job.id, error = %err, "job handler failed");
                if let Err(ack_err) = self.queue.ack_failure(&job.id, err).await {
                    error!(job_id = %job.id, %ack_err, "ack_failure failed");
                }
                stats.failed += 1;
            }
        }
    }
}
