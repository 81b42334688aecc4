//! Context window management: token estimation, history truncation, and the
//! Agent Runtime's tool-result pruning rule.
//!
//! Generalizes the teacher SDK's `estimate_tokens`/`is_approaching_limit`/
//! `truncate_messages` trio (originally aimed at manual conversation
//! trimming) to also host the specification's pruning invariant: pruning
//! never alters the assistant message, never removes a message, and never
//! changes ordering — it edits only the textual content of past tool
//! results.

use crate::message::{ChatMessage, Role};

/// Approximate token count using the ~1-token-per-4-characters heuristic
/// (70-85% accurate across model families, per the teacher SDK).
pub fn estimate_tokens(messages: &[ChatMessage]) -> usize {
    messages.iter().map(|m| m.content.len() / 4).sum()
}

pub fn is_approaching_limit(messages: &[ChatMessage], limit: usize) -> bool {
    estimate_tokens(messages) as f64 > limit as f64 * 0.9
}

/// Keep only the most recent `keep_turns` messages, optionally preserving
/// the leading system message regardless of count.
pub fn truncate_messages(
    messages: &[ChatMessage],
    keep_turns: usize,
    preserve_system: bool,
) -> Vec<ChatMessage> {
    if messages.len() <= keep_turns {
        return messages.to_vec();
    }

    let system = if preserve_system {
        messages.first().filter(|m| m.role == Role::System).cloned()
    } else {
        None
    };

    let tail_start = messages.len().saturating_sub(keep_turns);
    let mut result = Vec::with_capacity(keep_turns + 1);
    if let Some(sys) = system {
        result.push(sys);
    }
    result.extend(messages[tail_start..].iter().cloned());
    result
}

/// Threshold above which a tool result is considered "large" and eligible
/// for pruning, per the specification's Phase 1b agent behavior.
pub const PRUNE_THRESHOLD_CHARS: usize = 2_000;

/// Replace the most recent oversized `browse_page` tool result with a short
/// placeholder noting how many items were harvested this turn. Leaves the
/// message's call id, role, and position untouched — only `content`
/// changes. Returns `true` if a message was pruned.
///
/// `is_browse_page_result` identifies candidate messages by tool name
/// (stored in `ChatMessage::name`) since a tool-role message doesn't carry
/// its raw arguments.
pub fn prune_last_large_browse_result(messages: &mut [ChatMessage], harvested_count: usize) -> bool {
    if let Some(msg) = messages
        .iter_mut()
        .rev()
        .find(|m| {
            m.role == Role::Tool
                && m.name.as_deref() == Some("browse_page")
                && m.content.len() > PRUNE_THRESHOLD_CHARS
        })
    {
        msg.content = format!(
            "[pruned: page content elided after harvesting {harvested_count} item(s) this turn]"
        );
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::ToolCallRequest;

    #[test]
    fn truncate_keeps_tail_and_system() {
        let mut messages = vec![ChatMessage::system("sys")];
        for i in 0..10 {
            messages.push(ChatMessage::user(format!("turn {i}")));
        }

        let truncated = truncate_messages(&messages, 3, true);
        assert_eq!(truncated.len(), 4);
        assert_eq!(truncated[0].role, Role::System);
        assert_eq!(truncated[1].content, "turn 7");
        assert_eq!(truncated[3].content, "turn 9");
    }

    #[test]
    fn prune_only_edits_content_of_most_recent_large_browse_result() {
        let mut messages = vec![
            ChatMessage::system("sys"),
            ChatMessage::user("seed"),
            ChatMessage::assistant(
                "",
                vec![ToolCallRequest {
                    call_id: "call_1".into(),
                    name: "browse_page".into(),
                    arguments_json: "{}".into(),
                }],
            ),
            ChatMessage::tool_result("call_1", "browse_page", "x".repeat(3000)),
            ChatMessage::assistant(
                "",
                vec![ToolCallRequest {
                    call_id: "call_2".into(),
                    name: "save_results_batch".into(),
                    arguments_json: "{}".into(),
                }],
            ),
            ChatMessage::tool_result("call_2", "save_results_batch", r#"{"accepted_count":2}"#),
        ];

        let before_len = messages.len();
        let before_roles: Vec<_> = messages.iter().map(|m| m.role).collect();
        let before_call_ids: Vec<_> = messages.iter().map(|m| m.tool_call_id.clone()).collect();

        let pruned = prune_last_large_browse_result(&mut messages, 2);

        assert!(pruned);
        assert_eq!(messages.len(), before_len, "pruning must not remove messages");
        let after_roles: Vec<_> = messages.iter().map(|m| m.role).collect();
        assert_eq!(before_roles, after_roles, "pruning must not reorder/retype messages");
        let after_call_ids: Vec<_> = messages.iter().map(|m| m.tool_call_id.clone()).collect();
        assert_eq!(before_call_ids, after_call_ids, "pruning must preserve call ids");

        assert!(messages[3].content.contains("pruned"));
        assert!(messages[3].content.len() < 3000);
        // Every other message's content is untouched.
        assert_eq!(messages[5].content, r#"{"accepted_count":2}"#);
    }

    #[test]
    fn prune_is_noop_when_no_large_result_exists() {
        let mut messages = vec![ChatMessage::tool_result("call_1", "browse_page", "short")];
        assert!(!prune_last_large_browse_result(&mut messages, 1));
        assert_eq!(messages[0].content, "short");
    }
}
