mod config;
mod protocol;
mod server;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nm_core::{ReasoningEngine, export_json, import_json, similarity, understand};
use tokio::io::BufReader;

use crate::config::NodeConfig;

#[derive(Parser)]
#[command(name = "nodemind", about = "NodeMind symbolic memory engine and protocol server")]
struct Cli {
    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the line-delimited JSON protocol on stdin/stdout
    Serve {
        /// TOML config file (defaults to $NODEMIND_CONFIG)
        #[arg(long)]
        config: Option<PathBuf>,

        /// JSON memory merged into the engine before serving
        #[arg(long)]
        memory: Option<PathBuf>,
    },

    /// Write the startup memory (config seeds plus --memory) to a JSON file
    Export {
        /// Output file path
        path: PathBuf,

        /// TOML config file (defaults to $NODEMIND_CONFIG)
        #[arg(long)]
        config: Option<PathBuf>,

        /// JSON memory merged in before export
        #[arg(long)]
        memory: Option<PathBuf>,
    },

    /// Extract intents from text and print them as JSON
    Understand {
        /// Free text to analyze
        text: String,
    },

    /// Print the similarity ratio between two strings
    Similarity { a: String, b: String },
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::filter::LevelFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .from_env_lossy()
    };

    // stdout carries protocol lines only
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Serve { config, memory } => {
            cmd_serve(config.as_deref(), memory.as_deref()).await
        }
        Commands::Export {
            path,
            config,
            memory,
        } => cmd_export(path, config.as_deref(), memory.as_deref()),
        Commands::Understand { text } => cmd_understand(text),
        Commands::Similarity { a, b } => {
            println!("{:.4}", similarity(a, b));
            Ok(())
        }
    }
}

/// Engine from the node config, with an optional JSON memory merged in.
fn load_engine(config: Option<&Path>, memory: Option<&Path>) -> Result<ReasoningEngine> {
    let config = NodeConfig::load(config).context("failed to load config")?;
    let mut engine = config.build_engine();
    tracing::debug!("engine thresholds: {:?}", engine.config());

    if let Some(path) = memory {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read memory {}", path.display()))?;
        let remote = import_json(&json)
            .with_context(|| format!("failed to parse memory {}", path.display()))?;
        let summary = engine.merge(remote);
        tracing::info!(
            "imported {} symbols from {} ({} reconciled)",
            summary.imported.len(),
            path.display(),
            summary.updated.len()
        );
    }
    Ok(engine)
}

async fn cmd_serve(config: Option<&Path>, memory: Option<&Path>) -> Result<()> {
    let mut engine = load_engine(config, memory)?;

    let stdin = BufReader::new(tokio::io::stdin());
    server::serve(&mut engine, stdin, tokio::io::stdout()).await
}

fn cmd_export(path: &Path, config: Option<&Path>, memory: Option<&Path>) -> Result<()> {
    let engine = load_engine(config, memory)?;
    let json = export_json(engine.store()).context("failed to serialize memory")?;
    std::fs::write(path, &json).with_context(|| format!("failed to write {}", path.display()))?;

    println!("exported {} symbols to {}", engine.store().len(), path.display());
    Ok(())
}

fn cmd_understand(text: &str) -> Result<()> {
    let result = understand(text);
    let json = serde_json::to_string_pretty(&result).context("failed to serialize result")?;
    println!("{json}");
    Ok(())
}
