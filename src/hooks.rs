//! Lifecycle hooks system for intercepting tool execution inside the Agent
//! Runtime.
//!
//! Generalizes the teacher SDK's `Hooks`/`HookDecision` mechanism: instead
//! of being wired to a fixed `Client`, hooks are installed per
//! `AgentRuntime` run so the Orchestrator can attach per-source audit or
//! rate-limit gating without touching the runtime loop itself.

use crate::message::ChatMessage;

pub const HOOK_PRE_TOOL_USE: &str = "PreToolUse";
pub const HOOK_POST_TOOL_USE: &str = "PostToolUse";

/// Decision returned by a hook. The first non-`Continue` decision from the
/// registered chain takes effect; hooks run in registration order.
#[derive(Debug, Clone)]
pub enum HookDecision {
    /// Proceed as normal.
    Continue,
    /// Veto the tool call. The runtime synthesizes a `tool_usage` error
    /// result for this call instead of invoking the executor.
    Block { reason: String },
}

/// Event data passed to `PreToolUse` hooks before tool execution.
#[derive(Debug, Clone)]
pub struct PreToolUseEvent<'a> {
    pub tool_name: &'a str,
    pub arguments_json: &'a str,
    pub call_id: &'a str,
    pub history: &'a [ChatMessage],
}

/// Event data passed to `PostToolUse` hooks after tool execution.
#[derive(Debug, Clone)]
pub struct PostToolUseEvent<'a> {
    pub tool_name: &'a str,
    pub arguments_json: &'a str,
    pub call_id: &'a str,
    pub result_json: &'a str,
    pub history: &'a [ChatMessage],
}

type PreHook = Box<dyn Fn(&PreToolUseEvent) -> HookDecision + Send + Sync>;
type PostHook = Box<dyn Fn(&PostToolUseEvent) + Send + Sync>;

/// Container for registering and managing lifecycle hooks. Hooks are
/// executed sequentially; for `PreToolUse`, the first non-`Continue`
/// decision short-circuits the remaining chain.
#[derive(Default)]
pub struct Hooks {
    pre_tool_use: Vec<PreHook>,
    post_tool_use: Vec<PostHook>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_pre_tool_use<F>(mut self, hook: F) -> Self
    where
        F: Fn(&PreToolUseEvent) -> HookDecision + Send + Sync + 'static,
    {
        self.pre_tool_use.push(Box::new(hook));
        self
    }

    pub fn on_post_tool_use<F>(mut self, hook: F) -> Self
    where
        F: Fn(&PostToolUseEvent) + Send + Sync + 'static,
    {
        self.post_tool_use.push(Box::new(hook));
        self
    }

    pub fn run_pre_tool_use(&self, event: &PreToolUseEvent) -> HookDecision {
        for hook in &self.pre_tool_use {
            if let HookDecision::Block { reason } = hook(event) {
                return HookDecision::Block { reason };
            }
        }
        HookDecision::Continue
    }

    pub fn run_post_tool_use(&self, event: &PostToolUseEvent) {
        for hook in &self.post_tool_use {
            hook(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocking_hook_short_circuits_chain() {
        let hooks = Hooks::new()
            .on_pre_tool_use(|_| HookDecision::Block {
                reason: "denied".into(),
            })
            .on_pre_tool_use(|_| panic!("should not run after a Block decision"));

        let event = PreToolUseEvent {
            tool_name: "browse_page",
            arguments_json: "{}",
            call_id: "call_1",
            history: &[],
        };

        assert!(matches!(
            hooks.run_pre_tool_use(&event),
            HookDecision::Block { .. }
        ));
    }

    #[test]
    fn continue_chain_runs_all_hooks() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let count = Arc::new(AtomicUsize::new(0));
        let c1 = count.clone();
        let c2 = count.clone();
        let hooks = Hooks::new()
            .on_pre_tool_use(move |_| {
                c1.fetch_add(1, Ordering::SeqCst);
                HookDecision::Continue
            })
            .on_pre_tool_use(move |_| {
                c2.fetch_add(1, Ordering::SeqCst);
                HookDecision::Continue
            });

        let event = PreToolUseEvent {
            tool_name: "finish",
            arguments_json: "{}",
            call_id: "call_2",
            history: &[],
        };
        hooks.run_pre_tool_use(&event);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}
