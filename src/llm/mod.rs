//! LLM Client: a thin chat-completion client over an OpenAI-compatible
//! endpoint, supporting simple text completion and function-calling
//! responses. Applies retry and timeout per the specification's §4.2.

mod wire;

use std::time::Duration;

use crate::error::{Error, Result};
use crate::message::{AssistantTurn, ChatMessage, ToolDefinition};
use crate::retry::{retry_with_backoff, Backoff};

/// Thin wrapper over `reqwest` talking to a single OpenAI-compatible
/// `chat/completions` endpoint.
#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
    backoff: Backoff,
}

impl LlmClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
            model: model.into(),
            timeout,
            backoff: Backoff {
                max_attempts: 3,
                ..Backoff::default()
            },
        }
    }

    pub fn from_config(cfg: &crate::config::RuntimeConfig) -> Self {
        Self::new(
            cfg.llm_base_url.clone(),
            cfg.llm_model.clone(),
            cfg.llm_api_key.clone(),
            cfg.llm_timeout,
        )
    }

    async fn post_chat_completion(
        &self,
        request: &wire::ChatCompletionRequest,
    ) -> Result<wire::ChatCompletionResponse> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        retry_with_backoff(self.backoff, || async {
            let mut req = self.http.post(&url).json(request);
            if let Some(key) = &self.api_key {
                req = req.bearer_auth(key);
            }

            let sent = tokio::time::timeout(self.timeout, req.send())
                .await
                .map_err(|_| Error::transient_network("LLM request timed out"))?;

            let response = sent.map_err(classify_reqwest_error)?;
            let status = response.status();

            if status.as_u16() == 429 {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::rate_limited(format!("429 from LLM endpoint: {body}")));
            }
            if status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::transient_network(format!(
                    "{status} from LLM endpoint: {body}"
                )));
            }
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(Error::llm_contract(format!(
                    "{status} from LLM endpoint: {body}"
                )));
            }

            let parsed: wire::ChatCompletionResponse = response.json().await.map_err(classify_reqwest_error)?;
            Ok(parsed)
        })
        .await
    }

    /// Single-shot text completion, used by homepage navigation,
    /// summarization, and ranking.
    pub async fn complete_text(&self, system: &str, user: &str) -> Result<String> {
        let request = wire::ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                wire::to_wire_message(&ChatMessage::system(system)),
                wire::to_wire_message(&ChatMessage::user(user)),
            ],
            tools: Vec::new(),
        };

        let response = self.post_chat_completion(&request).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::llm_contract("empty choices array"))?;
        Ok(choice.message.content.unwrap_or_default())
    }

    /// A chat turn that may contain text and/or zero-or-more tool
    /// invocations.
    pub async fn complete_with_tools(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<AssistantTurn> {
        let request = wire::ChatCompletionRequest {
            model: self.model.clone(),
            messages: messages.iter().map(wire::to_wire_message).collect(),
            tools: tools.iter().map(wire::to_wire_tool).collect(),
        };

        let response = self.post_chat_completion(&request).await?;
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::llm_contract("empty choices array"))?;

        Ok(AssistantTurn {
            text: choice.message.content,
            tool_calls: choice
                .message
                .tool_calls
                .iter()
                .map(wire::from_wire_tool_call)
                .collect(),
        })
    }
}

fn classify_reqwest_error(err: reqwest::Error) -> Error {
    if err.is_timeout() || err.is_connect() {
        Error::transient_network(err.to_string())
    } else {
        Error::Http(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_builds_from_config_defaults() {
        let cfg = crate::config::RuntimeConfig::default();
        let client = LlmClient::from_config(&cfg);
        assert_eq!(client.base_url, cfg.llm_base_url);
        assert_eq!(client.model, cfg.llm_model);
    }
}
