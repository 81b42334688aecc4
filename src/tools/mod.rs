//! Tool ABI: the registry and dispatch mechanism the Agent Runtime drives.
//!
//! Tools share the shape `(args_json) -> result_json` (design notes §9:
//! "polymorphism of tools" — model as a registry keyed by name with a
//! uniform dispatch signature, not a class hierarchy). Arguments arrive as
//! opaque JSON from the LLM; a shape mismatch becomes a structured
//! `tool_usage` error surfaced back to the LLM, never a hard failure.

pub mod browse_page;
pub mod documents;
pub mod finish;
pub mod save;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::message::ToolDefinition;

/// Sentinel tool name that terminates the Agent Runtime loop after its
/// reply is appended.
pub const FINISH_TOOL: &str = "finish";

#[async_trait]
pub trait ToolExecutor: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn parameters_schema(&self) -> serde_json::Value;
    async fn call(&self, args: serde_json::Value) -> Result<serde_json::Value>;
}

/// Outcome of dispatching one tool call. Always constructible regardless of
/// whether the underlying tool succeeded — the runtime never aborts on a
/// tool fault, it just appends an error-flagged tool message.
pub struct ToolOutcome {
    pub result_json: String,
    pub is_error: bool,
}

/// Registry of callable tools, keyed by name.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    executors: HashMap<&'static str, Arc<dyn ToolExecutor>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, executor: Arc<dyn ToolExecutor>) -> &mut Self {
        self.executors.insert(executor.name(), executor);
        self
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.executors
            .values()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters_schema: t.parameters_schema(),
            })
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.executors.contains_key(name)
    }

    /// Guarded dispatch: malformed JSON, an unknown tool name, and any
    /// error the tool itself returns are all converted into a `tool_usage`
    /// result rather than propagated — per the error handling design,
    /// "every tool executes in a guarded context... the runtime never
    /// aborts on tool faults."
    pub async fn dispatch(&self, name: &str, args_json: &str) -> ToolOutcome {
        let args: serde_json::Value = match serde_json::from_str(args_json) {
            Ok(v) => v,
            Err(e) => {
                return error_outcome(Error::tool(format!(
                    "malformed arguments for tool '{name}': {e}"
                )));
            }
        };

        let Some(executor) = self.executors.get(name) else {
            return error_outcome(Error::tool(format!("unknown tool '{name}'")));
        };

        match executor.call(args).await {
            Ok(value) => ToolOutcome {
                result_json: value.to_string(),
                is_error: false,
            },
            Err(e) => error_outcome(Error::tool(e.to_string())),
        }
    }
}

fn error_outcome(err: Error) -> ToolOutcome {
    let body = serde_json::json!({ "error": err.to_string(), "kind": err.kind() });
    ToolOutcome {
        result_json: body.to_string(),
        is_error: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finish::FinishTool;

    #[tokio::test]
    async fn dispatch_unknown_tool_is_tool_usage_error() {
        let registry = ToolRegistry::new();
        let outcome = registry.dispatch("does_not_exist", "{}").await;
        assert!(outcome.is_error);
        assert!(outcome.result_json.contains("tool_usage"));
    }

    #[tokio::test]
    async fn dispatch_malformed_json_is_error() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(FinishTool::new()));
        let outcome = registry.dispatch(FINISH_TOOL, "not json").await;
        assert!(outcome.is_error);
    }

    #[tokio::test]
    async fn dispatch_known_tool_succeeds() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(FinishTool::new()));
        let outcome = registry.dispatch(FINISH_TOOL, "{}").await;
        assert!(!outcome.is_error);
    }
}
