//! # Error Types for the Policy Watch Core
//!
//! Defines the error taxonomy used across the crawl/summarize/rank pipeline,
//! along with the retry policy's classification of each kind as retriable or
//! permanent. Every variant carries a stable `kind()` string matching the
//! taxonomy table in the specification, so callers (and the LLM, via
//! `tool_usage` errors) get a consistent label regardless of which layer
//! raised the error.
//!
//! ## Design Philosophy
//!
//! - **Explicit Error Handling**: every fallible operation returns `Result<T>`.
//! - **No Silent Failures**: errors propagate explicitly; tool faults are
//!   converted into a `tool_usage` error and returned to the LLM rather than
//!   aborting the agent loop.
//! - **Rich Context**: each variant carries enough detail to populate a
//!   `CrawlTask::error_log` entry without further formatting.

use thiserror::Error;

/// Type alias for `Result<T, Error>` used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type covering every failure mode in the pipeline.
///
/// Variant names mirror the taxonomy in the specification's error handling
/// design: `transient_network`, `rate_limited`, `llm_contract`, `page_load`,
/// `tool_usage`, `limit_exhausted`, `cancelled`, `internal`.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed due to connection problems, DNS, TLS, or a 5xx
    /// status. Retriable.
    #[error("transient network error: {0}")]
    TransientNetwork(String),

    /// The LLM endpoint responded 429. Retriable with backoff + jitter.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The LLM returned non-JSON where JSON was required, or the JSON did
    /// not match the expected shape. One repair attempt, then degrade.
    #[error("llm contract violation: {0}")]
    LlmContract(String),

    /// Browser navigation timed out, or DNS/TLS failed for a page load.
    #[error("page load failed: {0}")]
    PageLoad(String),

    /// The agent invoked an unknown tool, or supplied malformed arguments.
    /// Converted into a tool-role error message and returned to the LLM;
    /// never aborts the runtime.
    #[error("tool usage error: {0}")]
    ToolUsage(String),

    /// `max_turns` was reached before the agent finished.
    #[error("turn budget exhausted after {0} turns")]
    LimitExhausted(usize),

    /// The operation observed a cancellation signal.
    #[error("cancelled")]
    Cancelled,

    /// HTTP transport failure from `reqwest`, not yet classified.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization failure from `serde_json`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration supplied to a builder.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Anything unexpected. Mapped to task status `failed` with a full
    /// trace recorded in `error_log`.
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Error::Internal(msg.into())
    }

    pub fn tool(msg: impl Into<String>) -> Self {
        Error::ToolUsage(msg.into())
    }

    pub fn page_load(msg: impl Into<String>) -> Self {
        Error::PageLoad(msg.into())
    }

    pub fn llm_contract(msg: impl Into<String>) -> Self {
        Error::LlmContract(msg.into())
    }

    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Error::RateLimited(msg.into())
    }

    pub fn transient_network(msg: impl Into<String>) -> Self {
        Error::TransientNetwork(msg.into())
    }

    pub fn limit_exhausted(turns: usize) -> Self {
        Error::LimitExhausted(turns)
    }

    /// Stable kind string matching the specification's error taxonomy table.
    /// Used as the `kind` field recorded in `ErrorRecord`.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::TransientNetwork(_) | Error::Http(_) => "transient_network",
            Error::RateLimited(_) => "rate_limited",
            Error::LlmContract(_) | Error::Json(_) => "llm_contract",
            Error::PageLoad(_) => "page_load",
            Error::ToolUsage(_) => "tool_usage",
            Error::LimitExhausted(_) => "limit_exhausted",
            Error::Cancelled => "cancelled",
            Error::Config(_) => "internal",
            Error::Internal(_) => "internal",
        }
    }

    /// Whether the retry helper (`crate::retry`) should retry this error.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Error::TransientNetwork(_) | Error::RateLimited(_) | Error::Http(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_taxonomy_table() {
        assert_eq!(Error::transient_network("x").kind(), "transient_network");
        assert_eq!(Error::rate_limited("x").kind(), "rate_limited");
        assert_eq!(Error::llm_contract("x").kind(), "llm_contract");
        assert_eq!(Error::page_load("x").kind(), "page_load");
        assert_eq!(Error::tool("x").kind(), "tool_usage");
        assert_eq!(Error::limit_exhausted(15).kind(), "limit_exhausted");
        assert_eq!(Error::Cancelled.kind(), "cancelled");
        assert_eq!(Error::internal("x").kind(), "internal");
    }

    #[test]
    fn retriable_classification() {
        assert!(Error::transient_network("x").is_retriable());
        assert!(Error::rate_limited("x").is_retriable());
        assert!(!Error::llm_contract("x").is_retriable());
        assert!(!Error::Cancelled.is_retriable());
    }

    #[test]
    fn display_messages() {
        assert_eq!(
            Error::config("base_url is required").to_string(),
            "invalid configuration: base_url is required"
        );
        assert_eq!(
            Error::limit_exhausted(15).to_string(),
            "turn budget exhausted after 15 turns"
        );
    }
}
