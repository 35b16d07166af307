//! Execution of one admitted task
//!
//! The runner enumerates the source, then feeds files to a pool of workers
//! one batch at a time. Workers report back over a channel and the runner
//! is the only writer of the task record.

use super::processor::{FileOutcome, FileProcessor, ParserCache, TaskContext};
use super::registry::TaskRegistry;
use crate::config::PipelineConfig;
use crate::events;
use crate::source::{FileRef, SourceProvider};
use crate::types::TaskStatus;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

pub(crate) const CANCELLED: &str = "cancelled";

/// An admitted task
pub(crate) struct QueuedTask {
    pub id: String,
    pub source_ref: String,
    pub branch: Option<String>,
    pub cancel: Arc<AtomicBool>,
}

/// Components every runner shares
pub(crate) struct RunnerContext {
    pub registry: Arc<TaskRegistry>,
    pub processor: Arc<FileProcessor>,
    pub source: Arc<dyn SourceProvider>,
    pub config: PipelineConfig,
}

enum WorkerReport {
    Started(String),
    Finished(FileOutcome),
}

pub(crate) async fn run_task(ctx: Arc<RunnerContext>, task: QueuedTask) {
    if !ctx
        .registry
        .transition(&task.id, TaskStatus::Processing, None)
    {
        return;
    }
    tracing::info!(task_id = %task.id, source = %task.source_ref, "Task started");

    let snapshot = match ctx
        .source
        .enumerate_files(&task.source_ref, task.branch.as_deref())
        .await
    {
        Ok(snapshot) => snapshot,
        Err(e) => {
            finish(&ctx, &task.id, Some(e.to_string()));
            return;
        }
    };

    ctx.registry.update(&task.id, |view| {
        view.total_files = snapshot.files.len();
    });
    tracing::info!(
        task_id = %task.id,
        files = snapshot.files.len(),
        commit = snapshot.commit_hash.as_deref().unwrap_or("-"),
        "Source enumerated"
    );

    let task_ctx = Arc::new(TaskContext {
        task_id: task.id.clone(),
        repository_root: snapshot.repository_root.clone(),
        commit_hash: snapshot.commit_hash.clone(),
        branch: snapshot.branch.clone(),
    });

    let batch_size = ctx.config.batch_size.max(1);
    let (file_tx, file_rx) = mpsc::channel::<FileRef>(batch_size);
    let file_rx = Arc::new(Mutex::new(file_rx));
    let (report_tx, mut report_rx) = mpsc::unbounded_channel::<WorkerReport>();

    let workers: Vec<_> = (0..ctx.config.file_workers.max(1))
        .map(|_| {
            tokio::spawn(worker_loop(
                Arc::clone(&ctx.processor),
                Arc::clone(&task_ctx),
                Arc::clone(&file_rx),
                report_tx.clone(),
                Arc::clone(&task.cancel),
            ))
        })
        .collect();
    drop(report_tx);

    for (index, batch) in snapshot.files.chunks(batch_size).enumerate() {
        if task.cancel.load(Ordering::SeqCst) {
            break;
        }
        tracing::debug!(task_id = %task.id, batch = index, files = batch.len(), "Dispatching batch");

        let mut sent = 0;
        for file in batch {
            if file_tx.send(file.clone()).await.is_err() {
                break;
            }
            sent += 1;
        }

        // next batch waits for every file of this one
        let mut remaining = sent;
        while remaining > 0 {
            match report_rx.recv().await {
                Some(WorkerReport::Started(path)) => {
                    ctx.registry
                        .update(&task.id, |view| view.current_file = Some(path));
                }
                Some(WorkerReport::Finished(outcome)) => {
                    remaining -= 1;
                    record(&ctx.registry, &task.id, &outcome);
                }
                None => break,
            }
        }
    }

    drop(file_tx);
    for worker in workers {
        if let Err(e) = worker.await {
            tracing::error!(task_id = %task.id, error = %e, "File worker aborted");
        }
    }

    let error = task
        .cancel
        .load(Ordering::SeqCst)
        .then(|| CANCELLED.to_string());
    finish(&ctx, &task.id, error);
    // snapshot (and any temporary checkout) is released here
    drop(snapshot);
}

async fn worker_loop(
    processor: Arc<FileProcessor>,
    task_ctx: Arc<TaskContext>,
    files: Arc<Mutex<mpsc::Receiver<FileRef>>>,
    reports: mpsc::UnboundedSender<WorkerReport>,
    cancel: Arc<AtomicBool>,
) {
    let mut parsers = ParserCache::new();
    loop {
        let next = files.lock().await.recv().await;
        let Some(file) = next else {
            break;
        };

        let outcome = if cancel.load(Ordering::SeqCst) {
            FileOutcome::Skipped {
                path: file.relative_path.clone(),
            }
        } else {
            let _ = reports.send(WorkerReport::Started(file.relative_path.clone()));
            processor.process(&task_ctx, &file, &mut parsers).await
        };

        if reports.send(WorkerReport::Finished(outcome)).is_err() {
            break;
        }
    }
}

fn record(registry: &TaskRegistry, task_id: &str, outcome: &FileOutcome) {
    registry.update(task_id, |view| match outcome {
        FileOutcome::Ingested {
            chunks, triples, ..
        } => {
            view.files_processed += 1;
            view.chunks_emitted += chunks;
            view.triples_emitted += triples;
        }
        FileOutcome::Failed { .. } => {
            view.files_processed += 1;
            view.files_failed += 1;
        }
        FileOutcome::Skipped { .. } => {}
    });
}

/// Move a task to its terminal state
pub(crate) fn finish(ctx: &RunnerContext, task_id: &str, error: Option<String>) {
    let status = if error.is_some() {
        TaskStatus::Failed
    } else {
        TaskStatus::Completed
    };
    if ctx.registry.transition(task_id, status, error) {
        announce(ctx, task_id);
    }
}

/// Emit the terminal event for a task and evict old records
pub(crate) fn announce(ctx: &RunnerContext, task_id: &str) {
    if let Some(view) = ctx.registry.get(task_id) {
        match view.status {
            TaskStatus::Completed => {
                tracing::info!(
                    task_id,
                    files = view.files_processed,
                    failed = view.files_failed,
                    chunks = view.chunks_emitted,
                    triples = view.triples_emitted,
                    "Task completed"
                );
                ctx.processor.emit(events::TASK_COMPLETED, json!(view));
            }
            _ => {
                tracing::error!(
                    task_id,
                    error = view.error.as_deref().unwrap_or(""),
                    files = view.files_processed,
                    "Task failed"
                );
                ctx.processor.emit(events::TASK_FAILED, json!(view));
            }
        }
    }

    let evicted = ctx.registry.evict(ctx.config.max_retained_tasks);
    if evicted > 0 {
        tracing::debug!(evicted, "Evicted finished tasks");
    }
}
