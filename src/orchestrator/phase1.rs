//! Phase 1a (homepage navigation) and Phase 1b (per-section crawl).

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::agent::{AgentRuntime, AgentRuntimeConfig, AgentEvent, TerminationReason};
use crate::browser::BrowserTool;
use crate::cancel::CancelSignal;
use crate::canonical::canonicalize;
use crate::error::{Error, Result};
use crate::hooks::Hooks;
use crate::llm::LlmClient;
use crate::tools::browse_page::BrowsePageTool;
use crate::tools::finish::FinishTool;
use crate::tools::save::{ArticleAccumulator, SaveResultTool, SaveResultsBatchTool};
use crate::tools::ToolRegistry;
use crate::types::{ArticleItem, MonitorSource, PageStatus};

#[derive(Debug, Clone)]
pub struct Section {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct RawSection {
    name: String,
    url: String,
}

/// Phase 1a: visit the source's homepage, ask the LLM which list-page URLs
/// are sections worth crawling, dedupe and cap the result. Degrades to a
/// single synthetic section when the LLM response can't be parsed.
pub async fn discover_sections(
    browser: &BrowserTool,
    llm: &LlmClient,
    source: &MonitorSource,
    max_sections: usize,
) -> Result<Vec<Section>> {
    let root_host = host_of(&source.root_url)?;

    let observation = browser
        .render(&source.root_url, &root_host, false, source.user_agent_override.as_deref())
        .await?;

    if observation.status != PageStatus::Success {
        return Err(Error::page_load(
            observation.error.unwrap_or_else(|| "homepage failed to load".to_string()),
        ));
    }

    let focus = if source.focus_areas.is_empty() {
        "(none specified — use general judgment)".to_string()
    } else {
        source.focus_areas.join(", ")
    };

    let system = "You identify section/list pages on a government or news website.";
    let user = format!(
        "Focus areas: {focus}\n\nPage content (truncated):\n{}\n\nLinks:\n{}\n\n\
         Return a strict JSON array of objects {{\"name\": string, \"url\": string}} naming the \
         list-page URLs of sections relevant to the focus areas. Do not return article URLs, only \
         section/category list pages. Return only the JSON array, no commentary.",
        observation.text,
        observation
            .links
            .iter()
            .take(200)
            .map(|l| format!("{} -> {}", l.anchor_text, l.absolute_url))
            .collect::<Vec<_>>()
            .join("\n"),
    );

    let degraded = || vec![Section { name: source.name.clone(), url: source.root_url.clone() }];

    let Ok(response) = llm.complete_text(system, &user).await else {
        return Ok(degraded());
    };

    let Some(raw_sections) = parse_sections(&response) else {
        return Ok(degraded());
    };

    let mut seen = HashSet::new();
    let mut sections = Vec::new();
    for raw in raw_sections {
        let Ok(absolute) = Url::parse(&observation.final_url).and_then(|base| base.join(&raw.url)) else {
            continue;
        };
        let key = canonicalize(absolute.as_str());
        if !seen.insert(key) {
            continue;
        }
        sections.push(Section { name: raw.name, url: absolute.to_string() });
        if sections.len() >= max_sections {
            break;
        }
    }

    if sections.is_empty() {
        Ok(degraded())
    } else {
        Ok(sections)
    }
}

fn parse_sections(response: &str) -> Option<Vec<RawSection>> {
    let trimmed = response.trim();
    let json_slice = extract_json_array(trimmed)?;
    serde_json::from_str(json_slice).ok()
}

/// LLMs routinely wrap JSON in prose or code fences; take the substring
/// between the first `[` and the matching last `]`.
fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

fn host_of(url: &str) -> Result<String> {
    Url::parse(url)
        .map_err(|e| Error::config(format!("invalid root_url '{url}': {e}")))?
        .host_str()
        .map(str::to_string)
        .ok_or_else(|| Error::config(format!("root_url '{url}' has no host")))
}

/// Phase 1b: run one section through the Agent Runtime, seeded with the
/// URLs already collected from earlier sections in this task.
pub async fn crawl_section(
    llm: Arc<LlmClient>,
    browser: Arc<BrowserTool>,
    source: &MonitorSource,
    section: &Section,
    existing_urls: HashSet<String>,
    max_turns: usize,
    section_hard_cap: Duration,
    window_start: chrono::NaiveDate,
    cancel_signal: &CancelSignal,
    on_progress: &(dyn Fn(usize, AgentEvent) + Send + Sync),
) -> Result<(Vec<ArticleItem>, TerminationReason)> {
    let root_host = host_of(&source.root_url)?;
    let accumulator = Arc::new(ArticleAccumulator::new(existing_urls, window_start, source.allowed_content_kinds.clone()));

    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(BrowsePageTool::new(
        browser,
        root_host,
        source.allow_cross_domain,
        source.user_agent_override.clone(),
    )));
    tools.register(Arc::new(SaveResultTool::new(accumulator.clone())));
    tools.register(Arc::new(SaveResultsBatchTool::new(accumulator.clone())));
    tools.register(Arc::new(FinishTool::new()));

    if source.accepts_kind(crate::types::ContentKind::File) {
        tools.register(Arc::new(crate::tools::documents::DownloadFileTool::new(section_hard_cap, 5_000_000)));
        tools.register(Arc::new(crate::tools::documents::ReadDocumentTool::new(section_hard_cap, 50_000)));
    }

    let runtime = AgentRuntime::new(llm, tools, Hooks::new());

    let system_prompt = if source.accepts_kind(crate::types::ContentKind::File) {
        "You are a research agent exploring a government or news website section. \
         Use browse_page to load pages, read the `candidates` it returns, filter them by the \
         requested time window and content kinds, and save in-window items with save_result or \
         save_results_batch. When a candidate links directly to a document (PDF, DOCX, etc.) \
         rather than an HTML page, use read_document or download_file to inspect it before \
         deciding whether to save it. Paginate if useful. Call finish once you believe the \
         section is exhausted."
    } else {
        "You are a research agent exploring a government or news website section. \
         Use browse_page to load pages, read the `candidates` it returns, filter them by the \
         requested time window and content kinds, and save in-window items with save_result or \
         save_results_batch. Paginate if useful. Call finish once you believe the section is \
         exhausted."
    };

    let seed_user_message = format!(
        "Section: \"{}\" at {}\nFocus areas: {}\nAllowed content kinds: {:?}\nDo not re-save URLs \
         already collected from other sections this run.",
        section.name,
        section.url,
        source.focus_areas.join(", "),
        source.allowed_content_kinds,
    );

    let config = AgentRuntimeConfig {
        system_prompt: system_prompt.to_string(),
        seed_user_message,
        max_turns,
        enable_pruning: true,
        hard_cap: section_hard_cap,
    };

    let result = runtime.run(config, cancel_signal, on_progress).await?;
    // Drop the runtime (and with it the tool registry's Arc<ArticleAccumulator>
    // clones) before reclaiming sole ownership of the accumulator.
    drop(runtime);
    let items = Arc::try_unwrap(accumulator)
        .map(ArticleAccumulator::into_items)
        .unwrap_or_default();

    Ok((items, result.termination))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_json_array_strips_surrounding_prose() {
        let text = "Here you go:\n[{\"name\":\"a\",\"url\":\"/a\"}]\nThanks!";
        assert_eq!(extract_json_array(text), Some(r#"[{"name":"a","url":"/a"}]"#));
    }

    #[test]
    fn parse_sections_rejects_non_array_json() {
        assert!(parse_sections(r#"{"name":"a"}"#).is_none());
    }

    #[test]
    fn parse_sections_accepts_well_formed_array() {
        let sections = parse_sections(r#"[{"name":"Policies","url":"/pol/"}]"#).unwrap();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].name, "Policies");
    }

    #[test]
    fn host_of_rejects_malformed_url() {
        assert!(host_of("not a url").is_err());
    }
}
