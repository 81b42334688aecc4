//! Browser Tool: renders a URL and extracts text, links, and candidate
//! articles from it. One `BrowserTool` is shared by every section agent
//! within a task, backed by a single pooled Chrome instance.

pub mod date_extract;
pub mod dom;
pub mod pool;

use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};
use crate::types::PageObservation;
use pool::BrowserPool;

/// Rotated across requests so repeated `browse_page` calls from one agent
/// don't all present an identical fingerprint.
const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36",
];

pub struct BrowserTool {
    pool: Arc<BrowserPool>,
    timeout: Duration,
    page_text_cap: usize,
    ua_counter: std::sync::atomic::AtomicUsize,
}

impl BrowserTool {
    pub fn new(max_concurrent_pages: usize, per_host_pacing: Duration, timeout: Duration, page_text_cap: usize) -> Self {
        Self {
            pool: BrowserPool::new(max_concurrent_pages, per_host_pacing),
            timeout,
            page_text_cap,
            ua_counter: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    fn next_user_agent(&self, override_ua: Option<&str>) -> String {
        if let Some(ua) = override_ua {
            return ua.to_string();
        }
        let idx = self.ua_counter.fetch_add(1, std::sync::atomic::Ordering::Relaxed) % DEFAULT_USER_AGENTS.len();
        DEFAULT_USER_AGENTS[idx].to_string()
    }

    /// Render `url`, enforcing per-host pacing and the source's
    /// cross-domain policy. `root_host` is the source's registered domain;
    /// `allow_cross_domain` permits navigation off it.
    pub async fn render(
        &self,
        url: &str,
        root_host: &str,
        allow_cross_domain: bool,
        user_agent_override: Option<&str>,
    ) -> Result<PageObservation> {
        let parsed = Url::parse(url).map_err(|e| Error::tool(format!("invalid URL '{url}': {e}")))?;
        let host = parsed.host_str().unwrap_or_default().to_string();

        if !allow_cross_domain && host != root_host && !host.ends_with(&format!(".{root_host}")) {
            return Ok(PageObservation::load_failed(
                url,
                format!("cross-domain navigation to '{host}' blocked for this source"),
            ));
        }

        self.pool.pace(&host).await;

        let render = self.render_inner(url, root_host, allow_cross_domain, user_agent_override);
        match tokio::time::timeout(self.timeout, render).await {
            Ok(Ok(observation)) => Ok(observation),
            Ok(Err(err)) => Ok(PageObservation::load_failed(url, err.to_string())),
            Err(_) => Ok(PageObservation::timeout(url)),
        }
    }

    async fn render_inner(
        &self,
        url: &str,
        root_host: &str,
        allow_cross_domain: bool,
        user_agent_override: Option<&str>,
    ) -> Result<PageObservation> {
        let guard = self.pool.checkout_page().await?;
        let page = guard.page();

        let user_agent = self.next_user_agent(user_agent_override);
        page.set_user_agent(user_agent)
            .await
            .map_err(|e| Error::page_load(format!("failed to set user agent: {e}")))?;

        page.goto(url)
            .await
            .map_err(|e| Error::page_load(format!("navigation failed for '{url}': {e}")))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| Error::page_load(format!("page failed to finish loading: {e}")))?;

        let final_url = page
            .url()
            .await
            .map_err(|e| Error::page_load(format!("failed to read final URL: {e}")))?
            .unwrap_or_else(|| url.to_string());

        let html = page
            .content()
            .await
            .map_err(|e| Error::page_load(format!("failed to read page content: {e}")))?;

        let text = dom::extract_text(&html, self.page_text_cap);
        let links = dom::extract_links(&html, &final_url, root_host, allow_cross_domain);
        let candidates = dom::extract_candidates(&html, &final_url);

        Ok(PageObservation {
            text,
            links,
            candidates,
            final_url,
            status: crate::types::PageStatus::Success,
            error: None,
        })
    }

    pub async fn shutdown(&self) {
        self.pool.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_override_takes_precedence() {
        let tool = BrowserTool::new(2, Duration::from_millis(0), Duration::from_secs(5), 1000);
        assert_eq!(tool.next_user_agent(Some("custom-ua")), "custom-ua");
    }

    #[test]
    fn user_agent_rotates_without_override() {
        let tool = BrowserTool::new(2, Duration::from_millis(0), Duration::from_secs(5), 1000);
        let first = tool.next_user_agent(None);
        let second = tool.next_user_agent(None);
        assert!(DEFAULT_USER_AGENTS.contains(&first.as_str()));
        assert!(DEFAULT_USER_AGENTS.contains(&second.as_str()));
    }
}
