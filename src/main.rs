//! dotsync - mirror tracked files into a dotfiles tree
//!
//! Entry point for the dotsync daemon.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use dotsync::mirror::{FsCopier, MirrorPlan};
use dotsync::observability::init_tracing;
use dotsync::watcher::WatchCoordinator;
use dotsync::{Config, Result};

/// dotsync - mirror tracked files into a dotfiles tree
#[derive(Parser, Debug)]
#[command(name = "dotsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory the tracked paths are mirrored into [default: ~/Repos/dotfiles]
    #[arg(short, long, env = "DOTSYNC_MIRROR_ROOT")]
    mirror_root: Option<PathBuf>,

    /// Files or directories to track
    #[arg(short, long, env = "DOTSYNC_TRACK", value_delimiter = ',')]
    track: Vec<PathBuf>,

    /// JSON configuration file
    #[arg(short, long, env = "DOTSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "DOTSYNC_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging output
    #[arg(long, env = "DOTSYNC_LOG_JSON")]
    log_json: bool,

    /// Capacity of the event queue
    #[arg(long, env = "DOTSYNC_CHANNEL_CAPACITY")]
    channel_capacity: Option<usize>,

    /// Milliseconds to wait for an in-flight copy on shutdown
    #[arg(long, env = "DOTSYNC_DRAIN_TIMEOUT_MS")]
    drain_timeout_ms: Option<u64>,

    /// Build the mirror once and exit
    #[arg(long)]
    once: bool,
}

impl Cli {
    /// Layer CLI values over the config file.
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::new(),
        };

        config.tracked.extend(self.track);
        if let Some(root) = self.mirror_root {
            config.mirror_root = root;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        if let Some(capacity) = self.channel_capacity {
            config.channel_capacity = capacity;
        }
        if let Some(ms) = self.drain_timeout_ms {
            config.drain_timeout = Duration::from_millis(ms);
        }

        Ok(config.expand_home())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_json = cli.log_json;
    let once = cli.once;
    let config = cli.into_config()?;

    init_tracing(&config.log_level, log_json);

    tracing::info!("dotsync v{} starting...", env!("CARGO_PKG_VERSION"));
    tracing::debug!(?config, "Configuration loaded");

    config.validate()?;

    let plan = Arc::new(MirrorPlan::build(&config.mirror_root, &config.tracked)?);
    tracing::info!(
        mirror_root = %plan.mirror_root().display(),
        files = plan.files().len(),
        dirs = plan.dirs().len(),
        "Tracking paths"
    );

    let coordinator =
        WatchCoordinator::new(plan, FsCopier).with_drain_timeout(config.drain_timeout);

    if once {
        coordinator.initialize()?;
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    tokio::spawn(async move {
        match shutdown_signal().await {
            Ok(()) => token.cancel(),
            Err(e) => tracing::error!(error = %e, "Failed to install signal handlers"),
        }
    });

    coordinator.run(config.channel_capacity, &shutdown).await?;

    tracing::info!("dotsync shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C).
async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;

    #[cfg(unix)]
    let terminate = async move {
        terminate.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        result = signal::ctrl_c() => {
            result?;
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    Ok(())
}
