//! Batch Scheduler: the entry point that turns a trigger into a bounded,
//! observable set of per-source pipelines.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use tokio::sync::{mpsc, Semaphore};

use crate::cancel::CancelSignal;
use crate::config::RuntimeConfig;
use crate::error::{Error, Result};
use crate::orchestrator::{Orchestrator, TaskOutcome};
use crate::types::{CrawlBatch, CrawlTask, MonitorSource, TriggerKind};

#[derive(Debug, Clone)]
pub enum ProgressEvent {
    TaskStarted { batch_id: String, task_id: String, source_id: u64 },
    TaskProgress { batch_id: String, task_id: String, source_id: u64, items_so_far: usize },
    TaskCompleted { batch_id: String, task_id: String, source_id: u64, status: crate::types::CrawlTaskStatus, items_found: usize },
}

pub struct TriggerRequest {
    pub sources: Vec<MonitorSource>,
    pub trigger_kind: TriggerKind,
}

/// Bounds cross-source concurrency and propagates per-batch cancellation.
pub struct BatchScheduler {
    orchestrator: Arc<Orchestrator>,
    config: Arc<RuntimeConfig>,
    active_batches: DashMap<String, CancelSignal>,
    /// Latest known snapshot of every task that has reached a terminal
    /// state, keyed by task id. The equivalent of the Trigger API's
    /// `GET /tasks`.
    task_snapshots: DashMap<String, CrawlTask>,
}

impl BatchScheduler {
    pub fn new(orchestrator: Arc<Orchestrator>, config: Arc<RuntimeConfig>) -> Self {
        Self {
            orchestrator,
            config,
            active_batches: DashMap::new(),
            task_snapshots: DashMap::new(),
        }
    }

    /// Run every source pipeline in `request`, bounded to
    /// `agent_max_concurrency` simultaneous pipelines, emitting
    /// `ProgressEvent`s on `progress` as tasks start and finish. Awaits
    /// completion of the whole batch; call `cancel` from another task to
    /// interrupt it early.
    pub async fn trigger(&self, request: TriggerRequest, progress: mpsc::UnboundedSender<ProgressEvent>) -> (CrawlBatch, Vec<TaskOutcome>) {
        let batch = CrawlBatch::new(request.trigger_kind, Utc::now());
        let cancel_signal = CancelSignal::new();
        self.active_batches.insert(batch.batch_id.clone(), cancel_signal.clone());

        let semaphore = Arc::new(Semaphore::new(self.config.agent_max_concurrency));

        let outcomes = stream::iter(request.sources.into_iter().map(|source| {
            let orchestrator = self.orchestrator.clone();
            let semaphore = semaphore.clone();
            let cancel_signal = cancel_signal.clone();
            let progress = progress.clone();
            let batch = batch.clone();
            async move {
                let _permit = semaphore.acquire().await.expect("semaphore never closed");

                let _ = progress.send(ProgressEvent::TaskStarted {
                    batch_id: batch.batch_id.clone(),
                    task_id: format!("pending_{}", source.id),
                    source_id: source.id,
                });

                let outcome = orchestrator.run_task(&batch, &source, &cancel_signal).await;

                let _ = progress.send(ProgressEvent::TaskCompleted {
                    batch_id: batch.batch_id.clone(),
                    task_id: outcome.task.id.clone(),
                    source_id: source.id,
                    status: outcome.task.status,
                    items_found: outcome.task.items_found,
                });

                outcome
            }
        }))
        .buffer_unordered(self.config.agent_max_concurrency)
        .collect::<Vec<TaskOutcome>>()
        .await;

        for outcome in &outcomes {
            self.task_snapshots.insert(outcome.task.id.clone(), outcome.task.clone());
        }

        self.active_batches.remove(&batch.batch_id);
        (batch, outcomes)
    }

    /// Snapshot of every task belonging to `batch_id` that has reached a
    /// terminal state so far.
    pub fn task_states(&self, batch_id: &str) -> Vec<CrawlTask> {
        self.task_snapshots
            .iter()
            .filter(|entry| entry.value().batch_id == batch_id)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Raise the cancellation signal for a batch still in flight. A no-op
    /// (returns an error) once the batch has already completed.
    pub fn cancel(&self, batch_id: &str) -> Result<()> {
        match self.active_batches.get(batch_id) {
            Some(signal) => {
                signal.cancel();
                Ok(())
            }
            None => Err(Error::internal(format!("no active batch '{batch_id}'"))),
        }
    }

    pub fn is_active(&self, batch_id: &str) -> bool {
        self.active_batches.contains_key(batch_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> BatchScheduler {
        let orchestrator = Arc::new(Orchestrator::new(
            Arc::new(crate::llm::LlmClient::new("http://localhost:1", "m", None, std::time::Duration::from_secs(1))),
            Arc::new(crate::browser::BrowserTool::new(1, std::time::Duration::from_millis(0), std::time::Duration::from_secs(1), 100)),
            Arc::new(RuntimeConfig::default()),
        ));
        BatchScheduler::new(orchestrator, Arc::new(RuntimeConfig::default()))
    }

    #[test]
    fn cancel_unknown_batch_returns_error() {
        assert!(scheduler().cancel("does_not_exist").is_err());
    }

    #[tokio::test]
    async fn trigger_with_no_sources_completes_with_no_tasks_and_deactivates() {
        let scheduler = scheduler();
        let (tx, _rx) = mpsc::unbounded_channel();
        let (batch, outcomes) = scheduler
            .trigger(
                TriggerRequest { sources: Vec::new(), trigger_kind: crate::types::TriggerKind::Manual },
                tx,
            )
            .await;
        assert!(outcomes.is_empty());
        assert!(!scheduler.is_active(&batch.batch_id));
        assert!(scheduler.task_states(&batch.batch_id).is_empty());
    }
}
