//! Ingestion event notifications
//!
//! Emission is fire-and-forget: a failing sink is logged by the caller and
//! never affects ingestion.

use crate::error::{Error, Result};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;

pub const FILE_INGESTED: &str = "file.ingested";
pub const FILE_FAILED: &str = "file.failed";
pub const TASK_COMPLETED: &str = "task.completed";
pub const TASK_FAILED: &str = "task.failed";

/// One emitted event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub name: String,
    pub payload: Value,
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: &str, payload: Value) -> Result<()>;
}

/// Writes events to the log
#[derive(Debug, Clone, Default)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&self, event: &str, payload: Value) -> Result<()> {
        tracing::debug!(target: "codeintel::events", event, %payload, "Event");
        Ok(())
    }
}

/// Forwards events to an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelEventSink {
    tx: mpsc::UnboundedSender<Event>,
}

impl ChannelEventSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: &str, payload: Value) -> Result<()> {
        self.tx
            .send(Event {
                name: event.to_string(),
                payload,
            })
            .map_err(|_| Error::InvalidInput(format!("event receiver dropped before '{}'", event)))
    }
}
