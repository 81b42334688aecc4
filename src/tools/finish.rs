//! The `finish` sentinel tool: terminates the Agent Runtime loop after its
//! reply is appended. Writes a terminal marker the runtime checks for.

use async_trait::async_trait;

use crate::error::Result;
use crate::tools::{ToolExecutor, FINISH_TOOL};

#[derive(Clone, Default)]
pub struct FinishTool;

impl FinishTool {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ToolExecutor for FinishTool {
    fn name(&self) -> &'static str {
        FINISH_TOOL
    }

    fn description(&self) -> &'static str {
        "Call this when you are done exploring this section. Optionally include a brief summary."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "summary": { "type": "string" }
            }
        })
    }

    async fn call(&self, _args: serde_json::Value) -> Result<serde_json::Value> {
        Ok(serde_json::json!({}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn call_returns_empty_object() {
        let tool = FinishTool::new();
        let result = tool.call(serde_json::json!({})).await.unwrap();
        assert_eq!(result, serde_json::json!({}));
    }
}
