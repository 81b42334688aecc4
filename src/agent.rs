//! Agent Runtime: the generic LLM tool-calling loop shared by every Phase 1b
//! section agent. Drives `complete_with_tools`, dispatches tool calls
//! through a `ToolRegistry`, applies the pruning rule, and reports progress.

use std::sync::Arc;
use std::time::Duration;

use crate::cancel::CancelSignal;
use crate::context::prune_last_large_browse_result;
use crate::error::{Error, Result};
use crate::hooks::{HookDecision, Hooks, PostToolUseEvent, PreToolUseEvent};
use crate::llm::LlmClient;
use crate::message::{ChatMessage, ToolCallRequest};
use crate::tools::{ToolRegistry, FINISH_TOOL};

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    Finished,
    ExhaustedTurns,
    Cancelled,
    LlmFailed,
}

/// Progress events surfaced to the caller via `on_progress`.
#[derive(Debug, Clone)]
pub enum AgentEvent {
    TurnStarted,
    ToolInvoked { name: String, call_id: String },
    ToolCompleted { name: String, call_id: String, is_error: bool },
    Pruned,
    Finished { reason: TerminationReason },
}

pub struct AgentResult {
    pub turns_taken: usize,
    pub final_text: Option<String>,
    pub termination: TerminationReason,
    pub transcript: Vec<ChatMessage>,
}

pub struct AgentRuntimeConfig {
    pub system_prompt: String,
    pub seed_user_message: String,
    pub max_turns: usize,
    pub enable_pruning: bool,
    /// Hard wall-clock cap for the whole run, independent of `max_turns`.
    pub hard_cap: Duration,
}

/// Drives one tool-calling conversation to completion.
pub struct AgentRuntime {
    llm: Arc<LlmClient>,
    tools: ToolRegistry,
    hooks: Hooks,
}

impl AgentRuntime {
    pub fn new(llm: Arc<LlmClient>, tools: ToolRegistry, hooks: Hooks) -> Self {
        Self { llm, tools, hooks }
    }

    pub async fn run(
        &self,
        config: AgentRuntimeConfig,
        cancel_signal: &CancelSignal,
        on_progress: &(dyn Fn(usize, AgentEvent) + Send + Sync),
    ) -> Result<AgentResult> {
        let run = self.run_inner(&config, cancel_signal, on_progress);
        match tokio::time::timeout(config.hard_cap, run).await {
            Ok(result) => result,
            Err(_) => Err(Error::internal("section agent exceeded its hard walltime cap")),
        }
    }

    async fn run_inner(
        &self,
        config: &AgentRuntimeConfig,
        cancel_signal: &CancelSignal,
        on_progress: &(dyn Fn(usize, AgentEvent) + Send + Sync),
    ) -> Result<AgentResult> {
        let mut messages = vec![
            ChatMessage::system(&config.system_prompt),
            ChatMessage::user(&config.seed_user_message),
        ];
        let tool_definitions = self.tools.definitions();

        let mut turn = 0;
        loop {
            if cancel_signal.is_cancelled() {
                on_progress(turn, AgentEvent::Finished { reason: TerminationReason::Cancelled });
                return Ok(AgentResult {
                    turns_taken: turn,
                    final_text: None,
                    termination: TerminationReason::Cancelled,
                    transcript: messages,
                });
            }
            if turn >= config.max_turns {
                on_progress(turn, AgentEvent::Finished { reason: TerminationReason::ExhaustedTurns });
                return Ok(AgentResult {
                    turns_taken: turn,
                    final_text: None,
                    termination: TerminationReason::ExhaustedTurns,
                    transcript: messages,
                });
            }

            on_progress(turn, AgentEvent::TurnStarted);

            let turn_result = tokio::select! {
                biased;
                _ = cancel_signal.cancelled() => None,
                result = self.llm.complete_with_tools(&messages, &tool_definitions) => Some(result),
            };

            let Some(turn_result) = turn_result else {
                on_progress(turn, AgentEvent::Finished { reason: TerminationReason::Cancelled });
                return Ok(AgentResult {
                    turns_taken: turn,
                    final_text: None,
                    termination: TerminationReason::Cancelled,
                    transcript: messages,
                });
            };

            let assistant_turn = match turn_result {
                Ok(t) => t,
                Err(_) => {
                    on_progress(turn, AgentEvent::Finished { reason: TerminationReason::LlmFailed });
                    return Ok(AgentResult {
                        turns_taken: turn,
                        final_text: None,
                        termination: TerminationReason::LlmFailed,
                        transcript: messages,
                    });
                }
            };

            let final_text = assistant_turn.text.clone();
            let tool_calls = assistant_turn.tool_calls.clone();
            messages.push(assistant_turn.into_message());

            if tool_calls.is_empty() {
                if final_text.as_deref().is_some_and(|t| !t.trim().is_empty()) {
                    on_progress(turn, AgentEvent::Finished { reason: TerminationReason::Finished });
                    return Ok(AgentResult {
                        turns_taken: turn + 1,
                        final_text,
                        termination: TerminationReason::Finished,
                        transcript: messages,
                    });
                }
                turn += 1;
                continue;
            }

            let mut finished = false;
            let mut harvested_this_turn = 0usize;
            let mut save_tool_called_ok = false;

            for call in &tool_calls {
                if cancel_signal.is_cancelled() {
                    break;
                }

                let pre_event = PreToolUseEvent {
                    tool_name: &call.name,
                    arguments_json: &call.arguments_json,
                    call_id: &call.call_id,
                    history: &messages,
                };

                on_progress(
                    turn,
                    AgentEvent::ToolInvoked { name: call.name.clone(), call_id: call.call_id.clone() },
                );

                let (result_json, is_error) = match self.hooks.run_pre_tool_use(&pre_event) {
                    HookDecision::Block { reason } => {
                        let body = serde_json::json!({ "error": reason, "kind": "tool_usage" });
                        (body.to_string(), true)
                    }
                    HookDecision::Continue => {
                        let outcome = self.tools.dispatch(&call.name, &call.arguments_json).await;
                        (outcome.result_json, outcome.is_error)
                    }
                };

                if !is_error {
                    harvested_this_turn += count_accepted(&call.name, &result_json);
                    if matches!(call.name.as_str(), "save_result" | "save_results_batch") {
                        save_tool_called_ok = true;
                    }
                }

                messages.push(ChatMessage::tool_result(&call.call_id, &call.name, &result_json));

                let post_event = PostToolUseEvent {
                    tool_name: &call.name,
                    arguments_json: &call.arguments_json,
                    call_id: &call.call_id,
                    result_json: &result_json,
                    history: &messages,
                };
                self.hooks.run_post_tool_use(&post_event);

                on_progress(
                    turn,
                    AgentEvent::ToolCompleted { name: call.name.clone(), call_id: call.call_id.clone(), is_error },
                );

                if call.name == FINISH_TOOL {
                    finished = true;
                }
            }

            if config.enable_pruning && save_tool_called_ok {
                let pruned = prune_last_large_browse_result(&mut messages, harvested_this_turn);
                if pruned {
                    on_progress(turn, AgentEvent::Pruned);
                }
            }

            turn += 1;

            if finished {
                on_progress(turn, AgentEvent::Finished { reason: TerminationReason::Finished });
                return Ok(AgentResult {
                    turns_taken: turn,
                    final_text,
                    termination: TerminationReason::Finished,
                    transcript: messages,
                });
            }
        }
    }
}

/// How many new items a `save_result`/`save_results_batch` call accepted,
/// used to size the pruning placeholder's harvested-count note. Any other
/// tool contributes zero.
fn count_accepted(tool_name: &str, result_json: &str) -> usize {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(result_json) else {
        return 0;
    };
    match tool_name {
        "save_result" => value.get("accepted").and_then(|v| v.as_bool()).filter(|b| *b).map_or(0, |_| 1),
        "save_results_batch" => value.get("accepted_count").and_then(|v| v.as_u64()).unwrap_or(0) as usize,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::finish::FinishTool;

    fn noop_progress(_turn: usize, _event: AgentEvent) {}

    #[test]
    fn count_accepted_reads_save_result_flag() {
        assert_eq!(count_accepted("save_result", r#"{"accepted":true}"#), 1);
        assert_eq!(count_accepted("save_result", r#"{"accepted":false,"reason":"duplicate"}"#), 0);
    }

    #[test]
    fn count_accepted_reads_batch_count() {
        assert_eq!(count_accepted("save_results_batch", r#"{"accepted_count":3}"#), 3);
    }

    #[test]
    fn count_accepted_ignores_unrelated_tools() {
        assert_eq!(count_accepted("browse_page", r#"{"text":"x"}"#), 0);
    }

    #[tokio::test]
    async fn run_terminates_immediately_when_already_cancelled() {
        let llm = Arc::new(LlmClient::new("http://localhost:1", "m", None, Duration::from_secs(1)));
        let mut tools = ToolRegistry::new();
        tools.register(Arc::new(FinishTool::new()));
        let runtime = AgentRuntime::new(llm, tools, Hooks::new());

        let signal = CancelSignal::new();
        signal.cancel();

        let config = AgentRuntimeConfig {
            system_prompt: "sys".into(),
            seed_user_message: "seed".into(),
            max_turns: 5,
            enable_pruning: true,
            hard_cap: Duration::from_secs(5),
        };

        let result = runtime.run(config, &signal, &noop_progress).await.unwrap();
        assert_eq!(result.termination, TerminationReason::Cancelled);
        assert_eq!(result.turns_taken, 0);
    }
}
