//! OpenAI-compatible `chat/completions` wire format.
//!
//! Kept separate from `message::ChatMessage` so the Agent Runtime's
//! conversation model doesn't leak provider-specific JSON shapes.

use serde::{Deserialize, Serialize};

use crate::message::{ChatMessage, Role, ToolCallRequest, ToolDefinition};

#[derive(Debug, Serialize)]
pub struct WireMessage {
    pub role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<WireToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WireToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub function: WireFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WireFunctionCall {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Serialize)]
pub struct WireTool {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub function: WireToolFunction,
}

#[derive(Debug, Serialize)]
pub struct WireToolFunction {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<WireTool>,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<WireToolCall>,
}

pub fn role_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

pub fn to_wire_message(msg: &ChatMessage) -> WireMessage {
    WireMessage {
        role: role_str(msg.role),
        content: Some(msg.content.clone()),
        tool_calls: msg
            .tool_calls
            .iter()
            .map(|tc| WireToolCall {
                id: tc.call_id.clone(),
                kind: "function".to_string(),
                function: WireFunctionCall {
                    name: tc.name.clone(),
                    arguments: tc.arguments_json.clone(),
                },
            })
            .collect(),
        tool_call_id: msg.tool_call_id.clone(),
        name: msg.name.clone(),
    }
}

pub fn to_wire_tool(def: &ToolDefinition) -> WireTool {
    WireTool {
        kind: "function",
        function: WireToolFunction {
            name: def.name.clone(),
            description: def.description.clone(),
            parameters: def.parameters_schema.clone(),
        },
    }
}

pub fn from_wire_tool_call(call: &WireToolCall) -> ToolCallRequest {
    ToolCallRequest {
        call_id: call.id.clone(),
        name: call.function.name.clone(),
        arguments_json: call.function.arguments.clone(),
    }
}
