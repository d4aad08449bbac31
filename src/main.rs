mod cli;

use clap::Parser;
use cli::{Cli, Commands, EnqueueArgs, MissionArgs};
use harvestbox::config::Config;
use harvestbox::fetch::{HttpFetcherConfig, ReqwestHttpFetcher, UnavailableBrowserSession};
use harvestbox::handlers::{ClassifyingHandler, ExecutorRegistry};
use harvestbox::orchestrator::Orchestrator;
use harvestbox::queue::Queue;
use harvestbox::scraper::{ScraperExecutor, ScraperRouter};
use harvestbox::storage::ArtifactSink;
use harvestbox::worker::{Worker, WorkerConfig};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[tokio::main]
async fn main() -> Result<(), AnyError> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path.clone())?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Worker => run_worker(config).await?,
        Commands::Enqueue(args) => run_enqueue(config, args).await?,
        Commands::Stats => run_stats(config)?,
        Commands::Mission(args) => run_mission(config, args).await?,
    }

    Ok(())
}

fn build_router(config: &Config) -> Result<ScraperRouter, AnyError> {
    let http = ReqwestHttpFetcher::new(HttpFetcherConfig {
        connect_timeout: Duration::from_secs(config.fetch.connect_timeout_secs),
        request_timeout: Duration::from_secs(config.fetch.request_timeout_secs),
        user_agent: config.fetch.user_agent.clone(),
        max_body_bytes: config.fetch.max_body_bytes.as_u64(),
    })?;
    // No real headless-browser backend is wired in by default (§4.3's
    // BrowserSession is an external collaborator); operators that need the
    // browser fallback to actually succeed substitute their own
    // `BrowserSession` behind the same trait.
    Ok(ScraperRouter::new(Arc::new(http), Arc::new(UnavailableBrowserSession)))
}

async fn run_worker(config: Config) -> Result<(), AnyError> {
    let queue = Arc::new(Queue::open_with_max_attempts(
        &config.queue.path,
        config.queue.max_attempts,
    )?);
    let sink = Arc::new(ArtifactSink::local(&config.storage.data_dir)?);
    let router = Arc::new(build_router(&config)?);
    let executor = Arc::new(ScraperExecutor::new(router, sink));
    let handler = Arc::new(ClassifyingHandler::new(ExecutorRegistry::shared(executor)));

    let worker = Worker::new(
        queue.clone(),
        handler,
        WorkerConfig {
            poll_interval: config.queue.poll_interval(),
            dequeue_wait: config.queue.dequeue_wait(),
        },
    );
    let shutdown = worker.stop_handle();

    let reaper = tokio::spawn(harvestbox::worker::reaper::run(
        queue.clone(),
        config.queue.stale_timeout(),
        shutdown.clone(),
    ));

    let server = tokio::spawn(harvestbox::server::run(
        config.server.bind_addr,
        queue.clone(),
        shutdown.clone(),
    ));

    worker.start(None).await;
    shutdown.store(true, Ordering::SeqCst);

    let _ = reaper.await;
    if let Ok(Err(err)) = server.await {
        tracing::error!(%err, "observability server exited with an error");
    }
    queue.flush()?;
    Ok(())
}

async fn run_enqueue(config: Config, args: EnqueueArgs) -> Result<(), AnyError> {
    let queue = Queue::open_with_max_attempts(&config.queue.path, config.queue.max_attempts)?;
    let payload = json!({
        "url": args.url,
        "render_js": args.render_js,
        "force_js": args.force_js,
    });
    let enqueued = queue.enqueue(payload).await?;
    queue.flush()?;
    println!("{}", if enqueued { "enqueued" } else { "duplicate, skipped" });
    Ok(())
}

fn run_stats(config: Config) -> Result<(), AnyError> {
    let queue = Queue::open(&config.queue.path)?;
    let stats = queue.stats()?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

async fn run_mission(config: Config, args: MissionArgs) -> Result<(), AnyError> {
    let sink = Arc::new(ArtifactSink::local(&config.storage.data_dir)?);
    let router = Arc::new(build_router(&config)?);
    let executor = Arc::new(ScraperExecutor::new(router, sink.clone()));
    let orchestrator = Orchestrator::default_with(executor, sink);

    let summary = orchestrator.run_mission(&args.goal, !args.no_archive).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
