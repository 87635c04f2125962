//! Intent Submission Utility
//!
//! Publishes a binary intent payload to the node's intent pool, optionally
//! verifying it against the node first.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin submit_intent -- --file intent.bin --verify
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use intent_solver::{NodeAck, NodeClient, SolverConfig};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "submit-intent")]
#[command(about = "Publish a binary intent payload to the node's intent pool")]
struct Args {
    /// Path to solver configuration file (default: solver.toml or SOLVER_CONFIG_PATH env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Path to the binary intent payload
    #[arg(short, long)]
    file: PathBuf,

    /// Verify the payload against the node before publishing
    #[arg(long)]
    verify: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt::init();

    let config = SolverConfig::load_from_path(args.config.as_deref())?;
    let client = NodeClient::with_timeout(&config.service.node_url, config.request_timeout());

    let payload = std::fs::read(&args.file)
        .with_context(|| format!("Failed to read intent file: {}", args.file.display()))?;
    info!("Read {} byte(s) from {}", payload.len(), args.file.display());

    if args.verify {
        let valid = client
            .verify(&payload)
            .context("Failed to verify intent payload")?;
        if !valid {
            anyhow::bail!("Node reports the intent payload as invalid");
        }
        info!("Intent payload verified");
    }

    match client
        .add_intent(&payload)
        .context("Failed to publish intent")?
    {
        NodeAck::Accepted { message } => {
            info!("Intent published: {}", message);
        }
        NodeAck::Rejected { error, reason } => {
            anyhow::bail!("Node rejected the intent: {} ({})", error, reason);
        }
    }

    Ok(())
}
