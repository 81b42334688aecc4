//! Runtime configuration: LLM endpoint, concurrency defaults, and timeouts.
//!
//! Generalizes the teacher SDK's `Provider`/`get_base_url`/`get_model`
//! precedence (environment variable > explicit override > default) into a
//! single `RuntimeConfig::from_env` entry point, so every numeric default
//! named in the specification's §4-§5 is overridable without code changes.

use std::env;
use std::time::Duration;

use crate::error::{Error, Result};

/// Centralizes every tunable named in the specification. Defaults match
/// the specification's numeric defaults exactly; all are overridable via
/// environment variables for deployment-time tuning.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// OpenAI-compatible `chat/completions` base URL, e.g.
    /// `http://localhost:1234/v1`. Required.
    pub llm_base_url: String,
    /// Optional bearer token for the LLM endpoint.
    pub llm_api_key: Option<String>,
    /// Model name passed in each request.
    pub llm_model: String,

    /// Default recency filter, in days, when a source doesn't specify one.
    pub default_time_window_days: u32,
    /// Default maximum exploration depth when a source doesn't specify one.
    pub default_max_depth: u32,

    /// Phase 1a: cap on distinct sections kept after dedup (`MAX_SECTIONS`).
    pub max_sections: usize,
    /// Phase 1b: hard turn budget per section agent.
    pub section_max_turns: usize,
    /// Phase 2: per-batch summarization concurrency (`LLM_MAX_CONCURRENCY`).
    pub llm_max_concurrency: usize,
    /// Batch Scheduler: simultaneous per-source pipelines (`AGENT_MAX_CONCURRENCY`).
    pub agent_max_concurrency: usize,
    /// Minimum inter-call delay enforced per originating host.
    pub per_host_pacing: Duration,

    /// Per LLM call timeout.
    pub llm_timeout: Duration,
    /// Per `browse_page` timeout (load + render).
    pub browse_timeout: Duration,
    /// Hard cap on a single section agent's walltime, regardless of
    /// `max_turns x (llm_timeout + browse_timeout)`.
    pub section_hard_cap: Duration,

    /// Character cap on `PageObservation::text` before truncation.
    pub page_text_cap: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            llm_base_url: "http://localhost:1234/v1".to_string(),
            llm_api_key: None,
            llm_model: "local-model".to_string(),
            default_time_window_days: 7,
            default_max_depth: 3,
            max_sections: 5,
            section_max_turns: 15,
            llm_max_concurrency: 3,
            agent_max_concurrency: 5,
            per_host_pacing: Duration::from_secs(2),
            llm_timeout: Duration::from_secs(60),
            browse_timeout: Duration::from_secs(30),
            section_hard_cap: Duration::from_secs(600),
            page_text_cap: 15_000,
        }
    }
}

impl RuntimeConfig {
    /// Build from environment variables, falling back to `Default` for
    /// anything unset. Mirrors the teacher's provider-resolution precedent:
    /// environment variable wins over the struct default.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();

        if let Ok(url) = env::var("POLICY_WATCH_LLM_BASE_URL") {
            cfg.llm_base_url = url;
        }
        if cfg.llm_base_url.is_empty() {
            return Err(Error::config("llm_base_url is required"));
        }
        if let Ok(key) = env::var("POLICY_WATCH_LLM_API_KEY") {
            cfg.llm_api_key = Some(key);
        }
        if let Ok(model) = env::var("POLICY_WATCH_LLM_MODEL") {
            cfg.llm_model = model;
        }

        if let Some(v) = env_usize("POLICY_WATCH_MAX_SECTIONS")? {
            cfg.max_sections = v;
        }
        if let Some(v) = env_usize("POLICY_WATCH_SECTION_MAX_TURNS")? {
            cfg.section_max_turns = v;
        }
        if let Some(v) = env_usize("POLICY_WATCH_LLM_MAX_CONCURRENCY")? {
            cfg.llm_max_concurrency = v;
        }
        if let Some(v) = env_usize("POLICY_WATCH_AGENT_MAX_CONCURRENCY")? {
            cfg.agent_max_concurrency = v;
        }
        if let Some(v) = env_u32("POLICY_WATCH_DEFAULT_TIME_WINDOW_DAYS")? {
            cfg.default_time_window_days = v;
        }
        if let Some(v) = env_u32("POLICY_WATCH_DEFAULT_MAX_DEPTH")? {
            cfg.default_max_depth = v;
        }

        Ok(cfg)
    }
}

fn env_usize(key: &str) -> Result<Option<usize>> {
    match env::var(key) {
        Ok(v) => v
            .parse::<usize>()
            .map(Some)
            .map_err(|_| Error::config(format!("{key} must be an integer, got {v:?}"))),
        Err(_) => Ok(None),
    }
}

fn env_u32(key: &str) -> Result<Option<u32>> {
    match env::var(key) {
        Ok(v) => v
            .parse::<u32>()
            .map(Some)
            .map_err(|_| Error::config(format!("{key} must be an integer, got {v:?}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_specification() {
        let cfg = RuntimeConfig::default();
        assert_eq!(cfg.max_sections, 5);
        assert_eq!(cfg.section_max_turns, 15);
        assert_eq!(cfg.llm_max_concurrency, 3);
        assert_eq!(cfg.agent_max_concurrency, 5);
        assert_eq!(cfg.per_host_pacing, Duration::from_secs(2));
        assert_eq!(cfg.llm_timeout, Duration::from_secs(60));
        assert_eq!(cfg.browse_timeout, Duration::from_secs(30));
        assert_eq!(cfg.section_hard_cap, Duration::from_secs(600));
    }

    #[test]
    fn rejects_non_integer_env_override() {
        // SAFETY: test-only, single-threaded access to this specific var.
        unsafe {
            env::set_var("POLICY_WATCH_MAX_SECTIONS", "not-a-number");
        }
        let result = RuntimeConfig::from_env();
        unsafe {
            env::remove_var("POLICY_WATCH_MAX_SECTIONS");
        }
        assert!(result.is_err());
    }
}
