//! Spillover Graph - Command line
//!
//! Runs the analytics pipeline or the force layout over a spillover matrix
//! read from a JSON file.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use spillover_graph::graph::{compute_all, NetworkAnalytics, WeightMatrix};
use spillover_graph::layout::{
    build_layout_nodes, circular_positions, layout_edges, start_layout, ImmediateScheduler,
    LayoutSession, Position, PositionSnapshot,
};
use spillover_graph::Config;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "spillover")]
#[command(about = "Spillover network analytics and force layout")]
struct Cli {
    /// Path to config.yaml (defaults to ./config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute communities, centrality and the edge list
    Analyze {
        /// Input JSON with `codes`, `weights` and optional `positions`
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Run the force layout and print final positions
    Layout {
        /// Input JSON with `codes`, `weights` and optional `positions`
        #[arg(short, long)]
        input: PathBuf,

        /// Frame budget (overrides config.yaml)
        #[arg(long)]
        frames: Option<usize>,

        /// Step on the configured frame interval instead of back to back
        #[arg(long)]
        realtime: bool,
    },
}

/// Input file format
#[derive(Debug, Deserialize)]
struct NetworkInput {
    codes: Vec<String>,
    weights: WeightMatrix,
    #[serde(default)]
    positions: HashMap<String, Position>,
}

#[derive(Debug, Serialize)]
struct NodePosition<'a> {
    code: &'a str,
    x: f64,
    y: f64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,spillover_graph=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::from_yaml_and_env(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze { input } => {
            let input = read_input(&input)?;
            let analytics = compute_all(&input.weights, &input.codes, &config.analytics)?;
            println!("{}", serde_json::to_string_pretty(&analytics)?);
            Ok(())
        }
        Commands::Layout {
            input,
            frames,
            realtime,
        } => {
            if let Some(frames) = frames {
                config.total_frames = frames;
                config.validate()?;
            }
            let input = read_input(&input)?;
            run_layout(&config, &input, realtime).await
        }
    }
}

fn read_input(path: &Path) -> Result<NetworkInput> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let input: NetworkInput = serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    info!(
        "Loaded {} codes from {}",
        input.codes.len(),
        path.display()
    );
    Ok(input)
}

async fn run_layout(config: &Config, input: &NetworkInput, realtime: bool) -> Result<()> {
    let analytics: NetworkAnalytics =
        compute_all(&input.weights, &input.codes, &config.analytics)?;

    let positions = if input.positions.is_empty() && config.default_position.is_none() {
        debug!("No initial positions given, placing nodes on a circle");
        circular_positions(&input.codes, &config.layout.viewport)
    } else {
        input.positions.clone()
    };

    let nodes = build_layout_nodes(
        &input.codes,
        &positions,
        config.default_position,
        &analytics.degrees,
    )?;
    let session = LayoutSession::new(
        nodes,
        layout_edges(&analytics.edges),
        config.layout.clone(),
        config.total_frames,
    )?
    .with_publish_policy(config.publish_policy()?);

    let (tx, mut rx) = mpsc::unbounded_channel::<PositionSnapshot>();
    let run = if realtime {
        start_layout(session, &config.scheduler(), tx)
    } else {
        start_layout(session, &ImmediateScheduler, tx)
    };

    let mut last: Option<PositionSnapshot> = None;
    loop {
        tokio::select! {
            snapshot = rx.recv() => match snapshot {
                Some(snapshot) => {
                    debug!("Frame {} published", snapshot.frame);
                    last = Some(snapshot);
                }
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, stopping layout");
                run.cancel();
            }
        }
    }
    run.finished().await;

    let snapshot = last.context("Layout produced no positions")?;
    if !snapshot.finished {
        warn!("Layout stopped early at frame {}", snapshot.frame);
    }

    let output: Vec<NodePosition> = input
        .codes
        .iter()
        .zip(&snapshot.positions)
        .map(|(code, p)| NodePosition {
            code,
            x: p.x,
            y: p.y,
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
