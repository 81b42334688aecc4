//! `browse_page`: the section agent's sole means of fetching and reading a
//! web page. Wraps the Browser Tool with the calling source's cross-domain
//! policy and user-agent override baked in at construction time.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::browser::BrowserTool;
use crate::error::Result;
use crate::tools::ToolExecutor;

#[derive(Debug, Deserialize)]
struct BrowsePageArgs {
    url: String,
}

pub struct BrowsePageTool {
    browser: Arc<BrowserTool>,
    root_host: String,
    allow_cross_domain: bool,
    user_agent_override: Option<String>,
}

impl BrowsePageTool {
    pub fn new(browser: Arc<BrowserTool>, root_host: String, allow_cross_domain: bool, user_agent_override: Option<String>) -> Self {
        Self {
            browser,
            root_host,
            allow_cross_domain,
            user_agent_override,
        }
    }
}

#[async_trait]
impl ToolExecutor for BrowsePageTool {
    fn name(&self) -> &'static str {
        "browse_page"
    }

    fn description(&self) -> &'static str {
        "Load a URL in a headless browser and return its visible text, outgoing links, and \
         candidate article references. Cross-domain navigation is blocked unless the source \
         allows it."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "required": ["url"],
            "properties": {
                "url": { "type": "string" }
            }
        })
    }

    async fn call(&self, args: serde_json::Value) -> Result<serde_json::Value> {
        let args: BrowsePageArgs = serde_json::from_value(args)?;
        let observation = self
            .browser
            .render(
                &args.url,
                &self.root_host,
                self.allow_cross_domain,
                self.user_agent_override.as_deref(),
            )
            .await?;
        Ok(serde_json::to_value(observation)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn rejects_malformed_args() {
        let browser = Arc::new(BrowserTool::new(1, Duration::from_millis(0), Duration::from_secs(5), 1000));
        let tool = BrowsePageTool::new(browser, "x.gov".to_string(), false, None);
        let result = tool.call(serde_json::json!({})).await;
        assert!(result.is_err());
    }
}
