//! # Policy Watch Core
//!
//! A multi-stage agent orchestration core for a policy-intelligence
//! crawl/summarize/rank pipeline over OpenAI-compatible local LLM servers
//! such as LM Studio, Ollama, llama.cpp, or vLLM.
//!
//! ## Overview
//!
//! Given a set of `MonitorSource`s (government or news websites to watch),
//! the pipeline:
//!
//! 1. Navigates each source's homepage and asks the LLM to identify
//!    relevant section/list pages (Phase 1a).
//! 2. Runs one research-agent loop per section, browsing pages and saving
//!    in-window candidate articles (Phase 1b).
//! 3. Summarizes, tags, and classifies every saved article (Phase 2).
//! 4. Ranks articles by strategic importance and renders a report
//!    (Phase 3).
//!
//! The `BatchScheduler` is the public entry point: it turns a trigger into
//! a bounded set of concurrent per-source pipelines, propagating a single
//! `CancelSignal` to every task in the batch.
//!
//! ```rust,no_run
//! use policy_watch_core::config::RuntimeConfig;
//! use policy_watch_core::{browser::BrowserTool, llm::LlmClient, orchestrator::Orchestrator};
//! use policy_watch_core::scheduler::{BatchScheduler, ProgressEvent, TriggerRequest};
//! use policy_watch_core::types::TriggerKind;
//! use std::sync::Arc;
//!
//! # async fn run(sources: Vec<policy_watch_core::types::MonitorSource>) -> anyhow::Result<()> {
//! let config = Arc::new(RuntimeConfig::from_env()?);
//! let llm = Arc::new(LlmClient::from_config(&config));
//! let browser = Arc::new(BrowserTool::new(
//!     config.agent_max_concurrency,
//!     config.per_host_pacing,
//!     config.browse_timeout,
//!     config.page_text_cap,
//! ));
//! let orchestrator = Arc::new(Orchestrator::new(llm, browser, config.clone()));
//! let scheduler = BatchScheduler::new(orchestrator, config);
//!
//! let (tx, _rx) = tokio::sync::mpsc::unbounded_channel::<ProgressEvent>();
//! let (_batch, _outcomes) = scheduler
//!     .trigger(TriggerRequest { sources, trigger_kind: TriggerKind::Manual }, tx)
//!     .await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **error**: the crate-wide `Error` enum and `Result<T>` alias, with a
//!   retriable/permanent classification consulted by `retry`.
//! - **retry**: exponential backoff with jitter, generic over any async
//!   operation returning `Result<T>`.
//! - **canonical**: URL canonicalization, the sole dedup key for articles.
//! - **types**: the core data model (`MonitorSource`, `CrawlBatch`,
//!   `CrawlTask`, `ArticleItem`, `PageObservation`, ...).
//! - **config**: `RuntimeConfig`, environment-variable driven with
//!   specification-matching defaults.
//! - **cancel**: `CancelSignal`, a cooperative cancellation primitive with
//!   no ambient singleton.
//! - **message** / **context**: chat message types and context-window
//!   management (token estimation, pruning).
//! - **llm**: the OpenAI-compatible chat-completions client.
//! - **hooks**: `PreToolUse`/`PostToolUse` lifecycle hooks around tool
//!   execution.
//! - **tools**: the tool registry and the concrete tools exposed to
//!   section agents (`browse_page`, `save_result`, `save_results_batch`,
//!   `finish`, plus the optional document tools).
//! - **browser**: the pooled Chrome-backed Browser Tool, DOM extraction,
//!   and date inference.
//! - **agent**: the Agent Runtime tool-calling loop.
//! - **orchestrator**: the four-phase per-source pipeline.
//! - **report**: HTML/plaintext report rendering.
//! - **scheduler**: the Batch Scheduler, the crate's public entry point.

pub mod agent;
pub mod browser;
pub mod cancel;
pub mod canonical;
pub mod config;
pub mod context;
pub mod error;
pub mod hooks;
pub mod llm;
pub mod message;
pub mod orchestrator;
pub mod report;
pub mod retry;
pub mod scheduler;
pub mod tools;
pub mod types;

pub use error::{Error, Result};

/// Convenience module for the most common entry points: configuration,
/// the scheduler, and the core data model.
pub mod prelude {
    pub use crate::cancel::CancelSignal;
    pub use crate::config::RuntimeConfig;
    pub use crate::error::{Error, Result};
    pub use crate::orchestrator::Orchestrator;
    pub use crate::scheduler::{BatchScheduler, ProgressEvent, TriggerRequest};
    pub use crate::types::{ArticleItem, CrawlBatch, CrawlTask, CrawlTaskStatus, MonitorSource, TriggerKind};
}
