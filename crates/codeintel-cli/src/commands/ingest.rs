//! Ingest command

use crate::app::{IngestArgs, OutputFormat};
use crate::output;
use crate::progress::ProgressReporter;
use anyhow::Result;
use codeintel_core::{
    CodeIntelError, Config, Database, Orchestrator, SqliteStore, TaskStatus,
};
use std::sync::Arc;

pub async fn run(args: IngestArgs, config: Config, format: OutputFormat) -> Result<()> {
    let db_path = args.db.unwrap_or_else(Database::default_path);
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let store = SqliteStore::open(&db_path)?;
    tracing::info!(db = %db_path.display(), "Opened index");

    let orchestrator = Orchestrator::builder(Arc::new(store))
        .config(config)
        .build()?;
    let id = orchestrator.submit(&args.source, args.branch.as_deref())?;

    let mut progress = ProgressReporter::new(!args.quiet && format == OutputFormat::Cli);
    let mut updates = orchestrator.watch(&id)?;
    let view = loop {
        let view = updates.borrow_and_update().clone();
        progress.update(&view);
        if view.status.is_terminal() {
            break view;
        }
        if updates.changed().await.is_err() {
            break orchestrator.wait(&id).await?;
        }
    };
    progress.finish();
    orchestrator.shutdown().await;

    print!("{}", output::format_task(&view, format));

    if view.status == TaskStatus::Failed {
        let message = view.error.unwrap_or_else(|| "ingestion failed".to_string());
        return Err(CodeIntelError::Source(message).into());
    }
    Ok(())
}
