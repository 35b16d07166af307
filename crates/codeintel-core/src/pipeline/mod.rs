//! Ingestion task scheduling
//!
//! Tasks are admitted in FIFO order, at most `max_concurrent_tasks` at a
//! time. Each admitted task runs on its own worker pool; see [`runner`].

mod processor;
mod registry;
mod runner;

pub use processor::{FileOutcome, FileProcessor, ParserCache, TaskContext};
pub use registry::TaskRegistry;

use crate::chunk::ChunkBuilder;
use crate::classify::Classifier;
use crate::config::{Config, PipelineConfig};
use crate::error::{Error, Result};
use crate::events::{EventSink, LogEventSink};
use crate::parse::ParserRegistry;
use crate::source::{RepositorySource, SourceProvider};
use crate::store::IngestionStore;
use crate::types::{IngestionTaskView, TaskStatus};
use runner::{QueuedTask, RunnerContext, CANCELLED};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Notify, Semaphore};
use tokio::task::JoinHandle;

const SHUT_DOWN: &str = "orchestrator shut down before the task started";

/// Builder for [`Orchestrator`]
pub struct OrchestratorBuilder {
    config: Config,
    store: Arc<dyn IngestionStore>,
    events: Arc<dyn EventSink>,
    source: Option<Arc<dyn SourceProvider>>,
    parsers: Option<ParserRegistry>,
    classifier: Option<Classifier>,
}

impl OrchestratorBuilder {
    pub fn new(store: Arc<dyn IngestionStore>) -> Self {
        Self {
            config: Config::default(),
            store,
            events: Arc::new(LogEventSink),
            source: None,
            parsers: None,
            classifier: None,
        }
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn source(mut self, source: Arc<dyn SourceProvider>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn parsers(mut self, parsers: ParserRegistry) -> Self {
        self.parsers = Some(parsers);
        self
    }

    pub fn classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Validate configuration and start the dispatcher
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build(self) -> Result<Orchestrator> {
        self.config.validate()?;

        let classifier = match self.classifier {
            Some(classifier) => classifier,
            None => Classifier::new(&self.config.classifier.rules)?,
        };
        let parsers = self.parsers.unwrap_or_else(|| {
            ParserRegistry::with_defaults(Duration::from_millis(
                self.config.chunking.parse_timeout_ms,
            ))
        });
        let source = match self.source {
            Some(source) => source,
            None => Arc::new(RepositorySource::with_defaults(&self.config.source)),
        };

        let processor = Arc::new(FileProcessor::new(
            classifier,
            parsers,
            ChunkBuilder::from_config(&self.config.chunking),
            self.store,
            self.events,
        ));

        Ok(Orchestrator::start(
            self.config.pipeline,
            processor,
            source,
        ))
    }
}

/// Accepts ingestion requests and schedules them
pub struct Orchestrator {
    ctx: Arc<RunnerContext>,
    queue: mpsc::UnboundedSender<QueuedTask>,
    shutting_down: Arc<AtomicBool>,
    stop: Arc<Notify>,
    dispatcher: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl Orchestrator {
    pub fn builder(store: Arc<dyn IngestionStore>) -> OrchestratorBuilder {
        OrchestratorBuilder::new(store)
    }

    fn start(
        config: PipelineConfig,
        processor: Arc<FileProcessor>,
        source: Arc<dyn SourceProvider>,
    ) -> Self {
        let ctx = Arc::new(RunnerContext {
            registry: Arc::new(TaskRegistry::new()),
            processor,
            source,
            config,
        });
        let (queue, queue_rx) = mpsc::unbounded_channel();
        let shutting_down = Arc::new(AtomicBool::new(false));
        let stop = Arc::new(Notify::new());

        let dispatcher = tokio::spawn(dispatch(
            Arc::clone(&ctx),
            queue_rx,
            Arc::clone(&shutting_down),
            Arc::clone(&stop),
        ));

        tracing::info!(
            max_concurrent_tasks = ctx.config.max_concurrent_tasks,
            batch_size = ctx.config.batch_size,
            file_workers = ctx.config.file_workers,
            "Orchestrator started"
        );

        Self {
            ctx,
            queue,
            shutting_down,
            stop,
            dispatcher: std::sync::Mutex::new(Some(dispatcher)),
        }
    }

    /// Queue a repository for ingestion and return the task id
    pub fn submit(&self, source_ref: &str, branch: Option<&str>) -> Result<String> {
        self.enqueue(source_ref, branch.map(str::to_string), None)
    }

    fn enqueue(
        &self,
        source_ref: &str,
        branch: Option<String>,
        retry_of: Option<String>,
    ) -> Result<String> {
        if source_ref.trim().is_empty() {
            return Err(Error::InvalidInput("source reference is empty".to_string()));
        }
        if self.shutting_down.load(Ordering::SeqCst) {
            return Err(Error::InvalidTaskState(
                "orchestrator is shutting down".to_string(),
            ));
        }

        let pending = self.ctx.registry.count_with_status(TaskStatus::Pending);
        let max = self.ctx.config.max_queue_depth;
        if pending >= max {
            tracing::warn!(pending, max, "Rejecting submission: queue full");
            return Err(Error::Capacity { pending, max });
        }

        let id = uuid::Uuid::new_v4().to_string();
        let cancel = self
            .ctx
            .registry
            .insert(&id, source_ref, branch.clone(), retry_of.clone());

        let task = QueuedTask {
            id: id.clone(),
            source_ref: source_ref.to_string(),
            branch,
            cancel,
        };
        if self.queue.send(task).is_err() {
            runner::finish(&self.ctx, &id, Some(SHUT_DOWN.to_string()));
            return Err(Error::InvalidTaskState(
                "orchestrator is shutting down".to_string(),
            ));
        }

        tracing::info!(task_id = %id, source = %source_ref, retry_of = ?retry_of, "Task submitted");
        Ok(id)
    }

    /// Snapshot of one task
    pub fn status(&self, id: &str) -> Result<IngestionTaskView> {
        self.ctx
            .registry
            .get(id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))
    }

    /// All retained tasks in submission order
    pub fn list(&self) -> Vec<IngestionTaskView> {
        self.ctx.registry.list()
    }

    /// Request cancellation
    ///
    /// A PENDING task fails immediately; a PROCESSING task stops starting
    /// new files and fails once in-flight files finish.
    pub fn cancel(&self, id: &str) -> Result<IngestionTaskView> {
        let view = self.ctx.registry.request_cancel(id)?;
        tracing::info!(task_id = %id, status = %view.status, "Cancellation requested");
        if self.ctx.registry.fail_pending(id, CANCELLED) {
            runner::announce(&self.ctx, id);
        }
        Ok(self.ctx.registry.get(id).unwrap_or(view))
    }

    /// Resubmit a FAILED task under a new id
    pub fn retry(&self, id: &str) -> Result<String> {
        let view = self.status(id)?;
        if view.status != TaskStatus::Failed {
            return Err(Error::InvalidTaskState(format!(
                "only FAILED tasks can be retried; task {} is {}",
                id, view.status
            )));
        }
        self.enqueue(&view.source_ref, view.branch, Some(view.id))
    }

    /// Follow a task's record as it changes
    pub fn watch(&self, id: &str) -> Result<watch::Receiver<IngestionTaskView>> {
        self.ctx.registry.subscribe(id)
    }

    /// Wait until a task reaches a terminal state
    pub async fn wait(&self, id: &str) -> Result<IngestionTaskView> {
        let mut rx = self.ctx.registry.subscribe(id)?;
        let view = rx
            .wait_for(|view| view.status.is_terminal())
            .await
            .map_err(|_| Error::TaskNotFound(id.to_string()))?;
        Ok(view.clone())
    }

    /// Drop a terminal task from the registry
    pub fn forget(&self, id: &str) -> Result<IngestionTaskView> {
        self.ctx.registry.remove(id)
    }

    pub fn processor(&self) -> &Arc<FileProcessor> {
        &self.ctx.processor
    }

    /// Stop admitting tasks; queued ones fail, running ones finish
    pub async fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        self.stop.notify_one();

        let handle = self
            .dispatcher
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "Dispatcher aborted");
            }
        }
        tracing::info!("Orchestrator shut down");
    }
}

/// Admit queued tasks in order, holding a permit per running task
async fn dispatch(
    ctx: Arc<RunnerContext>,
    mut queue: mpsc::UnboundedReceiver<QueuedTask>,
    shutting_down: Arc<AtomicBool>,
    stop: Arc<Notify>,
) {
    let permits = Arc::new(Semaphore::new(ctx.config.max_concurrent_tasks.max(1)));
    let mut running = tokio::task::JoinSet::new();

    loop {
        let task = tokio::select! {
            biased;
            _ = stop.notified() => break,
            next = queue.recv() => match next {
                Some(task) => task,
                None => break,
            },
        };

        if task.cancel.load(Ordering::SeqCst) {
            runner::finish(&ctx, &task.id, Some(CANCELLED.to_string()));
            continue;
        }

        let permit = tokio::select! {
            biased;
            _ = stop.notified() => {
                runner::finish(&ctx, &task.id, Some(SHUT_DOWN.to_string()));
                break;
            }
            permit = Arc::clone(&permits).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
        };

        if task.cancel.load(Ordering::SeqCst) {
            drop(permit);
            runner::finish(&ctx, &task.id, Some(CANCELLED.to_string()));
            continue;
        }
        if shutting_down.load(Ordering::SeqCst) {
            drop(permit);
            runner::finish(&ctx, &task.id, Some(SHUT_DOWN.to_string()));
            continue;
        }

        let ctx = Arc::clone(&ctx);
        running.spawn(async move {
            runner::run_task(ctx, task).await;
            drop(permit);
        });

        // reap finished runners
        while let Some(result) = running.try_join_next() {
            if let Err(e) = result {
                tracing::error!(error = %e, "Task runner aborted");
            }
        }
    }

    // fail whatever is still queued
    queue.close();
    while let Some(task) = queue.recv().await {
        runner::finish(&ctx, &task.id, Some(SHUT_DOWN.to_string()));
    }

    while let Some(result) = running.join_next().await {
        if let Err(e) = result {
            tracing::error!(error = %e, "Task runner aborted");
        }
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        self.stop.notify_one();
    }
}
