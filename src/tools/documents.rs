//! `download_file` / `read_document`: optional tools for `ContentKind::File`
//! sources (circulars, gazettes) whose substance lives in a downloadable
//! file rather than the rendered page. Not registered in the default
//! Phase 1b tool set — the Orchestrator adds them only for sources that
//! declare `File` among their allowed content kinds.

use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::tools::ToolExecutor;

#[derive(Debug, Deserialize)]
struct UrlArgs {
    url: String,
}

pub struct DownloadFileTool {
    http: reqwest::Client,
    timeout: Duration,
    max_bytes: usize,
}

impl DownloadFileTool {
    pub fn new(timeout: Duration, max_bytes: usize) -> Self {
        Self {
            http: reqwest::Client::new(),
            timeout,
            max_bytes,
        }
    }
}

#[async_trait]
impl ToolExecutor for DownloadFileTool {
    fn name(&self) -> &'static str {
        "download_file"
    }

    fn description(&self) -> &'static str {
        "Download a file by URL and return its content-type, byte size, and base64-encoded bytes \
         (truncated past the configured cap)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "required": ["url"],
            "properties": { "url": { "type": "string" } }
        })
    }

    async fn call(&self, args: serde_json::Value) -> Result<serde_json::Value> {
        let args: UrlArgs = serde_json::from_value(args)?;
        let response = tokio::time::timeout(self.timeout, self.http.get(&args.url).send())
            .await
            .map_err(|_| Error::transient_network(format!("download timed out for '{}'", args.url)))?
            .map_err(|e| Error::transient_network(e.to_string()))?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        let bytes = response.bytes().await.map_err(|e| Error::transient_network(e.to_string()))?;
        let truncated = bytes.len() > self.max_bytes;
        let slice = &bytes[..bytes.len().min(self.max_bytes)];

        Ok(serde_json::json!({
            "content_type": content_type,
            "size": bytes.len(),
            "truncated": truncated,
            "bytes_base64": base64::engine::general_purpose::STANDARD.encode(slice),
        }))
    }
}

pub struct ReadDocumentTool {
    http: reqwest::Client,
    timeout: Duration,
    text_cap: usize,
}

impl ReadDocumentTool {
    pub fn new(timeout: Duration, text_cap: usize) -> Self {
        Self {
            http: reqwest::Client::new(),
            timeout,
            text_cap,
        }
    }
}

#[async_trait]
impl ToolExecutor for ReadDocumentTool {
    fn name(&self) -> &'static str {
        "read_document"
    }

    fn description(&self) -> &'static str {
        "Download a file by URL and return its best-effort plain-text content, capped at the \
         configured character limit. Non-text formats (PDF, DOCX) are returned as a lossy decode \
         of their raw bytes; the agent should treat garbled output as a signal to fall back to \
         the page's surrounding text instead."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "required": ["url"],
            "properties": { "url": { "type": "string" } }
        })
    }

    async fn call(&self, args: serde_json::Value) -> Result<serde_json::Value> {
        let args: UrlArgs = serde_json::from_value(args)?;
        let response = tokio::time::timeout(self.timeout, self.http.get(&args.url).send())
            .await
            .map_err(|_| Error::transient_network(format!("download timed out for '{}'", args.url)))?
            .map_err(|e| Error::transient_network(e.to_string()))?;

        let bytes = response.bytes().await.map_err(|e| Error::transient_network(e.to_string()))?;
        let text = String::from_utf8_lossy(&bytes);
        let capped: String = text.chars().take(self.text_cap).collect();

        Ok(serde_json::json!({ "text": capped }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tools_expose_expected_names() {
        let download = DownloadFileTool::new(Duration::from_secs(10), 1_000_000);
        let read = ReadDocumentTool::new(Duration::from_secs(10), 10_000);
        assert_eq!(download.name(), "download_file");
        assert_eq!(read.name(), "read_document");
    }
}
