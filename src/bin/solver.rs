//! Solver Service
//!
//! Main service binary: subscribes to the node's event stream and runs the
//! matching loop over incoming intents.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin solver -- --config solver.toml
//! ```
//!
//! Or set the config path via environment variable:
//!
//! ```bash
//! SOLVER_CONFIG_PATH=solver.toml cargo run --bin solver
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use intent_solver::{EventFeed, NodeClient, Solver, SolverConfig};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Events buffered while a matching pass is in progress.
const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Parser, Debug)]
#[command(name = "solver")]
#[command(about = "Intent solver service - matches, composes and submits pending intents")]
struct Args {
    /// Path to solver configuration file (default: solver.toml or SOLVER_CONFIG_PATH env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments first (before initializing logging)
    let args = Args::parse();

    // Initialize structured logging
    tracing_subscriber::fmt::init();

    info!("Starting Intent Solver Service");

    // Load configuration
    // Priority: CLI arg > env var > default
    let config = if let Some(path) = args.config {
        info!("Loading configuration from: {}", path);
        SolverConfig::load_from_path(Some(&path))?
    } else {
        if let Ok(path) = std::env::var("SOLVER_CONFIG_PATH") {
            info!("Loading configuration from SOLVER_CONFIG_PATH: {}", path);
        } else {
            info!("Loading configuration from default location");
        }
        SolverConfig::load()?
    };

    info!("Configuration loaded successfully");
    info!("Node URL: {}", config.service.node_url);
    info!("Search strategy: {}", config.search.strategy);
    info!("Feed topic: {}", config.service.topic);

    let events_url = config.events_url()?;
    let node_url = config.service.node_url.clone();
    let timeout = config.request_timeout();
    let topic = config.service.topic.clone();

    // Register the subscription and report the node's current pool before
    // the stream opens
    let (client, pending) = tokio::task::spawn_blocking({
        let node_url = node_url.clone();
        move || -> Result<(NodeClient, usize)> {
            let client = NodeClient::with_timeout(&node_url, timeout);
            client
                .subscribe(&topic)
                .context("Failed to subscribe to event topic")?;
            let intents = client
                .list_intents()
                .context("Failed to list pending intents")?;
            Ok((client, intents.len()))
        }
    })
    .await
    .context("Failed to spawn blocking task")??;
    info!("Node reports {} pending intent(s)", pending);

    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

    let feed = EventFeed::new(events_url.clone(), config.reconnect_delay());
    info!("Event stream: {}", events_url);

    let solver = Solver::new(client, config.search.strategy);

    tokio::select! {
        // Event feed loop
        result = feed.run(event_tx) => {
            if let Err(e) = result {
                error!("Event feed error: {}", e);
            }
        }

        // Solver loop
        result = solver.run(event_rx) => {
            if let Err(e) = result {
                error!("Solver loop error: {}", e);
            }
        }

        // Graceful shutdown on Ctrl+C
        _ = signal::ctrl_c() => {
            info!("Received shutdown signal, stopping services...");
        }
    }

    info!("Solver service stopped");
    Ok(())
}
