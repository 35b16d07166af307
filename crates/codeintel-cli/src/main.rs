//! Codeintel CLI
//!
//! Repository ingestion into AST-aware chunks and a static code graph.

use anyhow::Result;
use clap::Parser;
use codeintel_core::error::{exit_codes, CodeIntelError};
use codeintel_core::Config;

mod app;
mod commands;
mod output;
mod progress;

use app::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(level.into())
                .from_env_lossy(),
        )
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<CodeIntelError>()
            .map(CodeIntelError::exit_code)
            .unwrap_or(exit_codes::GENERAL_ERROR);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    match cli.command {
        Commands::Ingest(args) => commands::ingest::run(args, config, cli.format).await,
        Commands::Chunks(args) => commands::chunks::run(args, &config, cli.format),
        Commands::Graph(args) => commands::graph::run(args, &config, cli.format),
        Commands::Classify(args) => commands::classify::run(args, &config, cli.format),
        Commands::Languages => commands::languages::run(&config, cli.format),
    }
}
