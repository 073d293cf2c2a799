//! Annexure panel driver.
//!
//! Builds every configured panel over an in-memory store, optionally runs a
//! script of panel operations, and prints the resulting `annexures` JSON.
//!
//! Usage:
//!   # Stock categories, empty form
//!   cargo run -p annexure-cli
//!
//!   # Seeded form with a scripted session, deletes confirmed
//!   cargo run -p annexure-cli -- --config panels.ron --bootstrap seed.json --script ops.ron --yes

mod script;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use annexure_panel::{
    AlwaysConfirm, AnnexureManager, Bootstrap, ManagerConfig, MemoryStore, NeverConfirm,
    PanelHost, parse_bootstrap,
};

/// Drive report annexure panels against an in-memory store.
#[derive(Parser, Debug)]
#[command(name = "annexure")]
#[command(about = "Run annexure panel operations and print the resulting previews")]
struct Args {
    /// Panel configuration (RON). Defaults to the stock categories.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Existing assets per category (JSON), seeded into panels and store
    #[arg(short, long)]
    bootstrap: Option<PathBuf>,

    /// Steps to run (RON list)
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Answer yes to every delete/replace confirmation (default: decline)
    #[arg(short, long)]
    yes: bool,

    /// Print compact JSON
    #[arg(long)]
    compact: bool,
}

fn load_bootstrap(path: &Path) -> Result<Bootstrap> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading bootstrap {}", path.display()))?;
    parse_bootstrap(&text).with_context(|| format!("parsing bootstrap {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the JSON result
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ManagerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ManagerConfig::default(),
    };
    let bootstrap = match &args.bootstrap {
        Some(path) => load_bootstrap(path)?,
        None => Bootstrap::new(),
    };

    let store = Arc::new(MemoryStore::new());
    store.seed(&bootstrap);
    let host: Arc<dyn PanelHost> = if args.yes {
        Arc::new(AlwaysConfirm)
    } else {
        Arc::new(NeverConfirm)
    };

    let manager = AnnexureManager::new(config, store, host, bootstrap)?;
    tracing::info!(panels = manager.panels().count(), "panels ready");

    if let Some(path) = &args.script {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display()))?;
        let steps = script::parse_script(&text)
            .with_context(|| format!("parsing script {}", path.display()))?;
        let base = path.parent().unwrap_or(Path::new("."));
        for (n, step) in steps.into_iter().enumerate() {
            tracing::debug!(step = n, ?step, "running");
            script::run_step(&manager, step, base)
                .await
                .with_context(|| format!("script step {n}"))?;
        }
    }

    let readiness = manager.prepare_save().await;
    if !readiness.ready() {
        tracing::warn!(label = %readiness.control.label, "save is not ready");
    }

    let json = manager.annexures().to_json();
    let out = if args.compact {
        serde_json::to_string(&json)?
    } else {
        serde_json::to_string_pretty(&json)?
    };
    println!("{out}");
    Ok(())
}
