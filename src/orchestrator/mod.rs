//! Orchestrator: the per-source four-phase pipeline (homepage navigation →
//! section crawl → summarization → ranking). One `Orchestrator` instance is
//! shared process-wide; `run_task` is called once per `CrawlTask` by the
//! Batch Scheduler.

mod phase1;
mod phase2;
mod phase3;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use crate::agent::TerminationReason;
use crate::browser::BrowserTool;
use crate::cancel::CancelSignal;
use crate::config::RuntimeConfig;
use crate::llm::LlmClient;
use crate::types::{ArticleItem, CrawlBatch, CrawlTask, CrawlTaskStatus, MonitorSource, Report};

pub use phase1::Section;

/// Everything produced by running one task to completion (or to whatever
/// terminal state it reached).
pub struct TaskOutcome {
    pub task: CrawlTask,
    pub items: Vec<ArticleItem>,
    pub report: Option<Report>,
}

pub struct Orchestrator {
    llm: Arc<LlmClient>,
    browser: Arc<BrowserTool>,
    config: Arc<RuntimeConfig>,
}

impl Orchestrator {
    pub fn new(llm: Arc<LlmClient>, browser: Arc<BrowserTool>, config: Arc<RuntimeConfig>) -> Self {
        Self { llm, browser, config }
    }

    pub async fn run_task(&self, batch: &CrawlBatch, source: &MonitorSource, cancel_signal: &CancelSignal) -> TaskOutcome {
        let mut task = CrawlTask::new(&batch.batch_id, source.id);
        task.mark_running(Utc::now());

        log::info!(
            "phase=1a batch_id={} task_id={} source_id={}",
            batch.batch_id,
            task.id,
            source.id
        );

        let sections = match phase1::discover_sections(&self.browser, &self.llm, source, self.config.max_sections).await {
            Ok(sections) => sections,
            Err(err) => {
                task.record_error(&err, Utc::now());
                task.mark_terminal(CrawlTaskStatus::Failed, Utc::now());
                return TaskOutcome { task, items: Vec::new(), report: None };
            }
        };

        log::info!(
            "phase=1b batch_id={} task_id={} source_id={} sections={}",
            batch.batch_id,
            task.id,
            source.id,
            sections.len()
        );

        let window_start = source.window_start(batch.created_at);
        let mut existing_urls: HashSet<String> = HashSet::new();
        let mut items_all: Vec<ArticleItem> = Vec::new();
        let mut llm_failures = 0usize;
        let mut cancelled_mid_crawl = false;

        for section in &sections {
            if cancel_signal.is_cancelled() {
                cancelled_mid_crawl = true;
                break;
            }

            let noop_progress = |_turn: usize, _event: crate::agent::AgentEvent| {};
            let outcome = phase1::crawl_section(
                self.llm.clone(),
                self.browser.clone(),
                source,
                section,
                existing_urls.clone(),
                self.config.section_max_turns,
                self.config.section_hard_cap,
                window_start,
                cancel_signal,
                &noop_progress,
            )
            .await;

            match outcome {
                Ok((items, termination)) => {
                    for item in &items {
                        existing_urls.insert(item.canonical_url());
                    }
                    items_all.extend(items);
                    if termination == TerminationReason::LlmFailed {
                        llm_failures += 1;
                    }
                    if termination == TerminationReason::Cancelled {
                        cancelled_mid_crawl = true;
                        break;
                    }
                }
                Err(err) => {
                    task.record_error(&err, Utc::now());
                    llm_failures += 1;
                }
            }
        }

        if cancelled_mid_crawl || cancel_signal.is_cancelled() {
            task.items_found = items_all.len();
            task.mark_terminal(CrawlTaskStatus::Cancelled, Utc::now());
            return TaskOutcome { task, items: items_all, report: None };
        }

        if items_all.is_empty() && llm_failures == sections.len() && !sections.is_empty() {
            task.record_error(&crate::error::Error::internal("every section agent failed and no items were saved"), Utc::now());
            task.mark_terminal(CrawlTaskStatus::Failed, Utc::now());
            return TaskOutcome { task, items: Vec::new(), report: None };
        }

        log::info!(
            "phase=2 batch_id={} task_id={} source_id={} items={}",
            batch.batch_id,
            task.id,
            source.id,
            items_all.len()
        );

        let items_all = if items_all.is_empty() {
            items_all
        } else {
            phase2::summarize_items(
                self.llm.clone(),
                self.browser.clone(),
                items_all,
                self.config.llm_max_concurrency,
                cancel_signal.clone(),
            )
            .await
        };

        if cancel_signal.is_cancelled() {
            task.items_found = items_all.len();
            task.mark_terminal(CrawlTaskStatus::Cancelled, Utc::now());
            return TaskOutcome { task, items: items_all, report: None };
        }

        log::info!(
            "phase=3 batch_id={} task_id={} source_id={} items={}",
            batch.batch_id,
            task.id,
            source.id,
            items_all.len()
        );

        let ranked = if items_all.is_empty() {
            items_all
        } else {
            phase3::rank_items(&self.llm, items_all).await
        };

        let report = crate::report::render(&batch.batch_id, &source.name, ranked.clone(), Utc::now());

        task.items_found = ranked.len();
        task.mark_terminal(CrawlTaskStatus::Completed, Utc::now());

        TaskOutcome { task, items: ranked, report: Some(report) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContentKind, TriggerKind};

    fn source() -> MonitorSource {
        MonitorSource {
            id: 1,
            name: "Example".into(),
            root_url: "https://example.gov".into(),
            focus_areas: vec!["energy".into()],
            max_depth: 3,
            allowed_content_kinds: vec![ContentKind::Policy],
            time_window_days: 7,
            allow_cross_domain: false,
            owner_user_id: 1,
            user_agent_override: None,
            extra_headers: vec![],
        }
    }

    #[test]
    fn window_start_matches_source_time_window() {
        let batch = CrawlBatch::new(TriggerKind::Manual, Utc::now());
        let source = source();
        let window_start = source.window_start(batch.created_at);
        assert_eq!(window_start, (batch.created_at - chrono::Duration::days(7)).date_naive());
    }
}
