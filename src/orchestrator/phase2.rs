//! Phase 2: bounded-parallel per-article summarization, tagging, and
//! content-kind normalization.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Deserialize;
use tokio::sync::Semaphore;

use crate::browser::BrowserTool;
use crate::cancel::CancelSignal;
use crate::llm::LlmClient;
use crate::types::{ArticleItem, ContentKind, PageStatus};

const SYSTEM_PROMPT: &str = "You are a policy analyst. Summarize the given article in 2-4 \
    sentences of plain prose, suitable for a policy digest. Then classify it.";

const PAGE_TEXT_BUDGET: usize = 6_000;

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    summary: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    content_kind: Option<ContentKind>,
}

/// Summarize every item lacking a valid summary, bounded to
/// `llm_max_concurrency` simultaneous in-flight calls. Cancellation stops
/// new summaries from starting; in-flight ones are allowed to finish.
pub async fn summarize_items(
    llm: Arc<LlmClient>,
    browser: Arc<BrowserTool>,
    items: Vec<ArticleItem>,
    llm_max_concurrency: usize,
    cancel_signal: CancelSignal,
) -> Vec<ArticleItem> {
    let semaphore = Arc::new(Semaphore::new(llm_max_concurrency));

    stream::iter(items.into_iter().map(|item| {
        let llm = llm.clone();
        let browser = browser.clone();
        let semaphore = semaphore.clone();
        let cancel_signal = cancel_signal.clone();
        async move {
            if item.has_valid_summary() {
                return item;
            }
            if cancel_signal.is_cancelled() {
                return item;
            }
            let _permit = semaphore.acquire().await.expect("semaphore never closed");
            summarize_one(&llm, &browser, item).await
        }
    }))
    .buffer_unordered(llm_max_concurrency)
    .collect()
    .await
}

async fn summarize_one(llm: &LlmClient, browser: &BrowserTool, mut item: ArticleItem) -> ArticleItem {
    let host = url::Url::parse(&item.url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_default();

    let observation = match browser.render(&item.url, &host, true, None).await {
        Ok(obs) if obs.status == PageStatus::Success => obs,
        _ => return item,
    };

    let page_excerpt: String = observation.text.chars().take(PAGE_TEXT_BUDGET).collect();

    for _attempt in 0..2 {
        let user = format!(
            "Title: {}\n\nPage text:\n{page_excerpt}\n\nRespond with a strict JSON object \
             {{\"summary\": string, \"tags\": string[] (max 5 short noun phrases), \
             \"content_kind\": one of \"news\"|\"policy\"|\"notice\"|\"file\"}}. JSON only.",
            item.title,
        );

        let Ok(response) = llm.complete_text(SYSTEM_PROMPT, &user).await else {
            continue;
        };

        if let Some(parsed) = parse_summary_response(&response) {
            item.summary = parsed.summary;
            item.tags = parsed.tags.into_iter().take(5).collect();
            if let Some(kind) = parsed.content_kind {
                item.content_kind = kind;
            }
        } else {
            item.summary = response.trim().to_string();
        }

        if item.has_valid_summary() {
            return item;
        }
    }

    item.summary = String::new();
    item
}

fn parse_summary_response(response: &str) -> Option<SummaryResponse> {
    let trimmed = response.trim();
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_summary_response_extracts_embedded_json() {
        let text = "Sure, here it is:\n{\"summary\":\"A clear summary of the policy change here.\",\"tags\":[\"energy\"],\"content_kind\":\"policy\"}";
        let parsed = parse_summary_response(text).unwrap();
        assert_eq!(parsed.tags, vec!["energy".to_string()]);
        assert!(matches!(parsed.content_kind, Some(ContentKind::Policy)));
    }

    #[test]
    fn parse_summary_response_returns_none_for_plain_prose() {
        assert!(parse_summary_response("just a sentence, no braces").is_none());
    }
}
