//! Core data model: the entities shared by the Orchestrator, Browser Tool,
//! and Batch Scheduler. See the specification's data model section for the
//! authoritative field list and invariants; this module is the Rust
//! encoding of that table.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of content a source may publish, and a monitor may opt into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    News,
    Policy,
    Notice,
    File,
}

/// Configuration of one site to crawl. Read-only to the core; owned and
/// edited by the (out-of-scope) management UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSource {
    pub id: u64,
    pub name: String,
    pub root_url: String,
    pub focus_areas: Vec<String>,
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
    pub allowed_content_kinds: Vec<ContentKind>,
    /// Recency filter, in days: an article's published date must fall
    /// within the last `time_window_days` days of the batch's creation time.
    pub time_window_days: u32,
    #[serde(default)]
    pub allow_cross_domain: bool,
    pub owner_user_id: u64,
    /// Ambient addition (SPEC_FULL §3): per-source user-agent override,
    /// consulted by the Browser Tool ahead of its default rotation.
    #[serde(default)]
    pub user_agent_override: Option<String>,
    #[serde(default)]
    pub extra_headers: Vec<(String, String)>,
}

fn default_max_depth() -> u32 {
    3
}

impl MonitorSource {
    /// The time window as an absolute cutoff relative to `now`.
    pub fn window_start(&self, now: DateTime<Utc>) -> NaiveDate {
        (now - chrono::Duration::days(self.time_window_days as i64)).date_naive()
    }

    pub fn accepts_kind(&self, kind: ContentKind) -> bool {
        self.allowed_content_kinds.is_empty() || self.allowed_content_kinds.contains(&kind)
    }
}

/// How a batch was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Manual,
    Scheduled,
}

/// One trigger's unit of work: a set of per-source tasks sharing a
/// correlation id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlBatch {
    pub batch_id: String,
    pub trigger_kind: TriggerKind,
    pub created_at: DateTime<Utc>,
}

impl CrawlBatch {
    pub fn new(trigger_kind: TriggerKind, created_at: DateTime<Utc>) -> Self {
        Self {
            batch_id: format!("batch_{}", Uuid::new_v4().simple()),
            trigger_kind,
            created_at,
        }
    }
}

/// Terminal and non-terminal states of a `CrawlTask`. Transitions
/// `Running -> {Completed, Failed, Cancelled}` are one-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlTaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl CrawlTaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CrawlTaskStatus::Completed | CrawlTaskStatus::Failed | CrawlTaskStatus::Cancelled
        )
    }
}

/// One entry in a `CrawlTask`'s error log. A `Vec` (rather than a single
/// string) so several non-fatal errors — e.g. a handful of `page_load`
/// failures during Phase 2 — don't clobber each other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub kind: String,
    pub message: String,
    pub at: DateTime<Utc>,
}

impl ErrorRecord {
    pub fn from_error(err: &crate::error::Error, at: DateTime<Utc>) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
            at,
        }
    }
}

/// Work for one source within a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlTask {
    pub id: String,
    pub batch_id: String,
    pub source_id: u64,
    pub status: CrawlTaskStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub items_found: usize,
    pub error_log: Vec<ErrorRecord>,
}

impl CrawlTask {
    pub fn new(batch_id: &str, source_id: u64) -> Self {
        Self {
            id: format!("task_{}", Uuid::new_v4().simple()),
            batch_id: batch_id.to_string(),
            source_id,
            status: CrawlTaskStatus::Pending,
            started_at: None,
            completed_at: None,
            items_found: 0,
            error_log: Vec::new(),
        }
    }

    pub fn mark_running(&mut self, at: DateTime<Utc>) {
        self.status = CrawlTaskStatus::Running;
        self.started_at = Some(at);
    }

    /// Transition to a terminal status. No-op (besides logging a warning)
    /// if already terminal, enforcing the one-way transition invariant.
    pub fn mark_terminal(&mut self, status: CrawlTaskStatus, at: DateTime<Utc>) {
        debug_assert!(status.is_terminal());
        if self.status.is_terminal() {
            log::warn!(
                "task {} already terminal ({:?}); ignoring transition to {:?}",
                self.id,
                self.status,
                status
            );
            return;
        }
        self.status = status;
        self.completed_at = Some(at);
    }

    pub fn record_error(&mut self, err: &crate::error::Error, at: DateTime<Utc>) {
        self.error_log.push(ErrorRecord::from_error(err, at));
    }
}

/// One discovered article. Materialized during Phase 1b, enriched in
/// Phases 2-3, persisted at end of task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleItem {
    /// Internal id for log correlation only; never used for dedup or
    /// equality — canonicalized URL is the sole dedup key.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub title: String,
    pub url: String,
    pub content_kind: ContentKind,
    pub published_date: Option<NaiveDate>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub importance_rank: Option<usize>,
}

impl ArticleItem {
    pub fn canonical_url(&self) -> String {
        crate::canonical::canonicalize(&self.url)
    }

    pub fn has_valid_summary(&self) -> bool {
        !self.summary.trim().is_empty()
            && self.summary.trim() != self.title.trim()
            && self.summary.trim().len() > 20
    }
}

/// Ordered `ArticleItem` list plus narrative header for one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub batch_id: String,
    pub title: String,
    pub html: String,
    pub plaintext: String,
    pub generated_at: DateTime<Utc>,
    pub items: Vec<ArticleItem>,
}

/// Outcome of a single `browse_page` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    Success,
    LoadFailed,
    Timeout,
}

/// A link discovered on a rendered page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkEntry {
    pub anchor_text: String,
    pub absolute_url: String,
}

/// A speculative article reference emitted by the browser tool, before any
/// LLM involvement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub title: String,
    pub url: String,
    pub date_guess: Option<NaiveDate>,
}

/// Structured result of rendering one URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageObservation {
    pub text: String,
    pub links: Vec<LinkEntry>,
    pub candidates: Vec<Candidate>,
    pub final_url: String,
    pub status: PageStatus,
    /// Present only when `status != Success`; a human-readable explanation.
    #[serde(default)]
    pub error: Option<String>,
}

impl PageObservation {
    pub fn load_failed(requested_url: &str, reason: impl Into<String>) -> Self {
        Self {
            text: String::new(),
            links: Vec::new(),
            candidates: Vec::new(),
            final_url: requested_url.to_string(),
            status: PageStatus::LoadFailed,
            error: Some(reason.into()),
        }
    }

    pub fn timeout(requested_url: &str) -> Self {
        Self {
            text: String::new(),
            links: Vec::new(),
            candidates: Vec::new(),
            final_url: requested_url.to_string(),
            status: PageStatus::Timeout,
            error: Some("timed out".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_transition_is_one_way() {
        let mut task = CrawlTask::new("batch_1", 1);
        let t0 = Utc::now();
        task.mark_running(t0);
        task.mark_terminal(CrawlTaskStatus::Completed, t0);
        assert_eq!(task.status, CrawlTaskStatus::Completed);

        // Attempting a second terminal transition is ignored.
        task.mark_terminal(CrawlTaskStatus::Failed, t0);
        assert_eq!(task.status, CrawlTaskStatus::Completed);
    }

    #[test]
    fn accepts_kind_empty_allowlist_means_all() {
        let source = MonitorSource {
            id: 1,
            name: "x".into(),
            root_url: "https://x.gov".into(),
            focus_areas: vec![],
            max_depth: 3,
            allowed_content_kinds: vec![],
            time_window_days: 7,
            allow_cross_domain: false,
            owner_user_id: 1,
            user_agent_override: None,
            extra_headers: vec![],
        };
        assert!(source.accepts_kind(ContentKind::Policy));
    }

    #[test]
    fn has_valid_summary_rejects_echoed_title() {
        let item = ArticleItem {
            id: Uuid::new_v4(),
            title: "Energy Policy Update".into(),
            url: "https://x.gov/a".into(),
            content_kind: ContentKind::Policy,
            published_date: None,
            summary: "Energy Policy Update".into(),
            tags: vec![],
            importance_rank: None,
        };
        assert!(!item.has_valid_summary());
    }
}
