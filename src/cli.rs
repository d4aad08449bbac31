use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "harvestbox")]
#[command(
    about = "Autonomous web-harvesting pipeline: durable job queue, worker runtime, and fetch-strategy router",
    long_about = None
)]
pub struct Cli {
    /// Path to a TOML configuration file (defaults to config/harvestbox.toml, or $HARVESTBOX_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the long-lived worker: drains the queue, reclaims stale jobs,
    /// serves /health and /stats.
    Worker,

    /// Enqueue a single URL as a job.
    Enqueue(EnqueueArgs),

    /// Print queue cardinalities as JSON.
    Stats,

    /// Drive one mission end-to-end, bypassing the queue.
    Mission(MissionArgs),
}

#[derive(clap::Args, Debug)]
pub struct EnqueueArgs {
    /// URL to enqueue.
    pub url: String,

    /// Classifier hint: route straight to the browser strategy.
    #[arg(long)]
    pub render_js: bool,

    /// Force the router to skip the static attempt entirely.
    #[arg(long)]
    pub force_js: bool,
}

#[derive(clap::Args, Debug)]
pub struct MissionArgs {
    /// Natural-language goal, or a literal URL under the default
    /// link extractor.
    pub goal: String,

    /// Skip archiving the discovered-URL set to data/discovered_urls/.
    #[arg(long)]
    pub no_archive: bool,
}
