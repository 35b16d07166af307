//! Task records and their lifecycle
//!
//! Each record lives in a `watch` channel so waiters observe the same state
//! the status queries read. Only the runner of a task mutates its record
//! after admission.

use crate::error::{Error, Result};
use crate::types::{IngestionTaskView, TaskStatus};
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

struct TaskEntry {
    state: watch::Sender<IngestionTaskView>,
    cancel: Arc<AtomicBool>,
}

#[derive(Default)]
struct Inner {
    tasks: HashMap<String, TaskEntry>,
    /// Submission order, oldest first
    order: VecDeque<String>,
}

#[derive(Default)]
pub struct TaskRegistry {
    inner: Mutex<Inner>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, Inner> {
        // Records stay consistent even if a holder panicked
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a new PENDING task and return its cancellation flag
    pub fn insert(
        &self,
        id: &str,
        source_ref: &str,
        branch: Option<String>,
        retry_of: Option<String>,
    ) -> Arc<AtomicBool> {
        let view = IngestionTaskView {
            id: id.to_string(),
            source_ref: source_ref.to_string(),
            branch,
            status: TaskStatus::Pending,
            files_processed: 0,
            total_files: 0,
            files_failed: 0,
            chunks_emitted: 0,
            triples_emitted: 0,
            current_file: None,
            error: None,
            retry_of,
            submitted_at: Utc::now(),
            started_at: None,
            finished_at: None,
        };
        let (state, _) = watch::channel(view);
        let cancel = Arc::new(AtomicBool::new(false));

        let mut inner = self.inner();
        inner.tasks.insert(
            id.to_string(),
            TaskEntry {
                state,
                cancel: Arc::clone(&cancel),
            },
        );
        inner.order.push_back(id.to_string());
        cancel
    }

    pub fn get(&self, id: &str) -> Option<IngestionTaskView> {
        self.inner()
            .tasks
            .get(id)
            .map(|entry| entry.state.borrow().clone())
    }

    /// All tasks in submission order
    pub fn list(&self) -> Vec<IngestionTaskView> {
        let inner = self.inner();
        inner
            .order
            .iter()
            .filter_map(|id| inner.tasks.get(id))
            .map(|entry| entry.state.borrow().clone())
            .collect()
    }

    pub fn count_with_status(&self, status: TaskStatus) -> usize {
        self.inner()
            .tasks
            .values()
            .filter(|entry| entry.state.borrow().status == status)
            .count()
    }

    pub fn subscribe(&self, id: &str) -> Result<watch::Receiver<IngestionTaskView>> {
        self.inner()
            .tasks
            .get(id)
            .map(|entry| entry.state.subscribe())
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))
    }

    /// Set the cancellation flag; terminal tasks are left untouched
    pub fn request_cancel(&self, id: &str) -> Result<IngestionTaskView> {
        let inner = self.inner();
        let entry = inner
            .tasks
            .get(id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        let view = entry.state.borrow().clone();
        if view.status.is_terminal() {
            return Err(Error::InvalidTaskState(format!(
                "cannot cancel task {} in state {}",
                id, view.status
            )));
        }
        entry.cancel.store(true, Ordering::SeqCst);
        Ok(view)
    }

    /// Apply an update to a task record
    pub fn update(&self, id: &str, apply: impl FnOnce(&mut IngestionTaskView)) {
        if let Some(entry) = self.inner().tasks.get(id) {
            entry.state.send_modify(apply);
        }
    }

    /// Move a task to a new status, rejecting illegal transitions
    pub fn transition(&self, id: &str, next: TaskStatus, error: Option<String>) -> bool {
        let inner = self.inner();
        let Some(entry) = inner.tasks.get(id) else {
            return false;
        };
        entry.state.send_if_modified(|view| {
            if !view.status.can_transition_to(next) {
                tracing::debug!(
                    task_id = %id,
                    from = %view.status,
                    to = %next,
                    "Ignoring illegal task transition"
                );
                return false;
            }
            let now = Utc::now();
            view.status = next;
            match next {
                TaskStatus::Processing => view.started_at = Some(now),
                TaskStatus::Completed | TaskStatus::Failed => {
                    view.finished_at = Some(now);
                    view.current_file = None;
                }
                TaskStatus::Pending => {}
            }
            if error.is_some() {
                view.error = error;
            }
            true
        })
    }

    /// Fail a task only if it has not been admitted yet
    pub fn fail_pending(&self, id: &str, error: &str) -> bool {
        let inner = self.inner();
        let Some(entry) = inner.tasks.get(id) else {
            return false;
        };
        entry.state.send_if_modified(|view| {
            if view.status != TaskStatus::Pending {
                return false;
            }
            view.status = TaskStatus::Failed;
            view.finished_at = Some(Utc::now());
            view.error = Some(error.to_string());
            true
        })
    }

    /// Remove a terminal task
    pub fn remove(&self, id: &str) -> Result<IngestionTaskView> {
        let mut inner = self.inner();
        let view = inner
            .tasks
            .get(id)
            .map(|entry| entry.state.borrow().clone())
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        if !view.status.is_terminal() {
            return Err(Error::InvalidTaskState(format!(
                "cannot forget task {} in state {}",
                id, view.status
            )));
        }
        inner.tasks.remove(id);
        inner.order.retain(|other| other != id);
        Ok(view)
    }

    /// Drop the oldest terminal tasks until at most `max_retained` remain
    pub fn evict(&self, max_retained: usize) -> usize {
        let mut inner = self.inner();
        let mut excess = inner.tasks.len().saturating_sub(max_retained);
        if excess == 0 {
            return 0;
        }

        let Inner { tasks, order } = &mut *inner;
        let mut evicted = 0;
        order.retain(|id| {
            if excess == 0 {
                return true;
            }
            let terminal = tasks
                .get(id)
                .map(|entry| entry.state.borrow().status.is_terminal())
                .unwrap_or(true);
            if terminal {
                tasks.remove(id);
                excess -= 1;
                evicted += 1;
                false
            } else {
                true
            }
        });
        evicted
    }

    pub fn len(&self) -> usize {
        self.inner().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_transitions() {
        let registry = TaskRegistry::new();
        registry.insert("a", "/repo", None, None);

        assert!(!registry.transition("a", TaskStatus::Completed, None));
        assert!(registry.transition("a", TaskStatus::Processing, None));
        assert!(registry.get("a").unwrap().started_at.is_some());
        assert!(registry.transition("a", TaskStatus::Failed, Some("boom".into())));

        let view = registry.get("a").unwrap();
        assert_eq!(view.status, TaskStatus::Failed);
        assert_eq!(view.error.as_deref(), Some("boom"));
        assert!(view.finished_at.is_some());

        // terminal states are final
        assert!(!registry.transition("a", TaskStatus::Processing, None));
    }

    #[test]
    fn test_cancel_and_forget_rules() {
        let registry = TaskRegistry::new();
        let flag = registry.insert("a", "/repo", None, None);

        assert!(registry.remove("a").is_err());
        registry.request_cancel("a").unwrap();
        assert!(flag.load(Ordering::SeqCst));

        registry.transition("a", TaskStatus::Failed, Some("cancelled".into()));
        assert!(registry.request_cancel("a").is_err());
        assert!(registry.remove("a").is_ok());
        assert!(matches!(registry.get("a"), None));
        assert!(matches!(
            registry.request_cancel("a"),
            Err(Error::TaskNotFound(_))
        ));
    }

    #[test]
    fn test_evict_keeps_active_tasks() {
        let registry = TaskRegistry::new();
        for id in ["a", "b", "c", "d"] {
            registry.insert(id, "/repo", None, None);
        }
        registry.transition("b", TaskStatus::Processing, None);
        registry.transition("b", TaskStatus::Completed, None);
        registry.transition("c", TaskStatus::Failed, None);

        assert_eq!(registry.evict(2), 2);
        let ids: Vec<String> = registry.list().into_iter().map(|v| v.id).collect();
        assert_eq!(ids, vec!["a", "d"]);

        // nothing terminal left to evict
        assert_eq!(registry.evict(0), 0);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_fail_pending_only_before_admission() {
        let registry = TaskRegistry::new();
        registry.insert("a", "/repo", None, None);
        registry.insert("b", "/repo", None, None);
        registry.transition("b", TaskStatus::Processing, None);

        assert!(registry.fail_pending("a", "cancelled"));
        assert!(!registry.fail_pending("b", "cancelled"));
        assert_eq!(registry.get("a").unwrap().status, TaskStatus::Failed);
        assert_eq!(registry.get("b").unwrap().status, TaskStatus::Processing);
    }

    #[test]
    fn test_counts_by_status() {
        let registry = TaskRegistry::new();
        registry.insert("a", "/repo", None, None);
        registry.insert("b", "/repo", None, None);
        registry.transition("a", TaskStatus::Processing, None);
        assert_eq!(registry.count_with_status(TaskStatus::Pending), 1);
        assert_eq!(registry.count_with_status(TaskStatus::Processing), 1);
    }
}
