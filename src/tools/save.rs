//! `save_result` / `save_results_batch`: the tools a Phase 1b section agent
//! uses to persist discovered articles.
//!
//! Canonicalizes URLs, checks them against both the set of URLs already
//! collected from earlier sections (`existing_urls`, seeded by the
//! Orchestrator) and this agent's own accumulator, filters by the source's
//! time window and allowed content kinds, and resolves a missing
//! `published_date` from the URL when possible before dropping the item.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::browser::date_extract;
use crate::canonical::canonicalize;
use crate::error::Result;
use crate::tools::ToolExecutor;
use crate::types::{ArticleItem, ContentKind};

#[derive(Debug, Deserialize)]
pub struct SaveResultArgs {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content_kind: Option<ContentKind>,
    #[serde(default)]
    pub published_date: Option<NaiveDate>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveResultsBatchArgs {
    pub items: Vec<SaveResultArgs>,
}

struct AccumulatorState {
    seen: HashSet<String>,
    accepted: Vec<ArticleItem>,
}

/// Shared, thread-safe landing zone for one section agent's accepted
/// items. Constructed with the URLs already collected from earlier
/// sections so duplicates across sections within one task are rejected at
/// the source rather than at final persistence.
pub struct ArticleAccumulator {
    state: Mutex<AccumulatorState>,
    window_start: NaiveDate,
    allowed_kinds: Vec<ContentKind>,
}

pub struct SaveDecision {
    pub accepted: bool,
    pub reason: Option<&'static str>,
}

impl ArticleAccumulator {
    pub fn new(existing_urls: HashSet<String>, window_start: NaiveDate, allowed_kinds: Vec<ContentKind>) -> Self {
        Self {
            state: Mutex::new(AccumulatorState {
                seen: existing_urls,
                accepted: Vec::new(),
            }),
            window_start,
            allowed_kinds,
        }
    }

    fn accepts_kind(&self, kind: ContentKind) -> bool {
        self.allowed_kinds.is_empty() || self.allowed_kinds.contains(&kind)
    }

    /// Apply the dedup/window/kind filters to one candidate and, if
    /// accepted, add it to the accumulator.
    pub fn try_accept(&self, args: SaveResultArgs) -> SaveDecision {
        let canonical = canonicalize(&args.url);

        let kind = args.content_kind.unwrap_or(ContentKind::News);
        if !self.accepts_kind(kind) {
            return SaveDecision {
                accepted: false,
                reason: Some("content_kind_not_allowed"),
            };
        }

        let published_date = args
            .published_date
            .or_else(|| date_extract::infer_from_url(&args.url));

        let Some(published_date) = published_date else {
            return SaveDecision {
                accepted: false,
                reason: Some("no_resolvable_date"),
            };
        };

        if published_date < self.window_start {
            return SaveDecision {
                accepted: false,
                reason: Some("outside_time_window"),
            };
        }

        let mut state = self.state.lock().expect("accumulator mutex poisoned");
        if state.seen.contains(&canonical) {
            return SaveDecision {
                accepted: false,
                reason: Some("duplicate"),
            };
        }
        state.seen.insert(canonical.clone());

        state.accepted.push(ArticleItem {
            id: uuid::Uuid::new_v4(),
            title: args.title,
            url: canonical,
            content_kind: kind,
            published_date: Some(published_date),
            summary: args.summary.unwrap_or_default(),
            tags: args.tags.into_iter().take(5).collect(),
            importance_rank: None,
        });

        SaveDecision {
            accepted: true,
            reason: None,
        }
    }

    pub fn into_items(self) -> Vec<ArticleItem> {
        self.state.into_inner().expect("accumulator mutex poisoned").accepted
    }

    pub fn seen_urls(&self) -> HashSet<String> {
        self.state.lock().expect("accumulator mutex poisoned").seen.clone()
    }
}

pub struct SaveResultTool {
    accumulator: std::sync::Arc<ArticleAccumulator>,
}

impl SaveResultTool {
    pub fn new(accumulator: std::sync::Arc<ArticleAccumulator>) -> Self {
        Self { accumulator }
    }
}

#[async_trait]
impl ToolExecutor for SaveResultTool {
    fn name(&self) -> &'static str {
        "save_result"
    }

    fn description(&self) -> &'static str {
        "Save one discovered article. Returns {accepted, reason} — reason is set when rejected \
         (duplicate, outside_time_window, no_resolvable_date, content_kind_not_allowed)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "required": ["title", "url"],
            "properties": {
                "title": { "type": "string" },
                "url": { "type": "string" },
                "content_kind": { "type": "string", "enum": ["news", "policy", "notice", "file"] },
                "published_date": { "type": "string", "format": "date" },
                "summary": { "type": "string" },
                "tags": { "type": "array", "items": { "type": "string" } }
            }
        })
    }

    async fn call(&self, args: serde_json::Value) -> Result<serde_json::Value> {
        let args: SaveResultArgs = serde_json::from_value(args)?;
        let decision = self.accumulator.try_accept(args);
        Ok(serde_json::json!({ "accepted": decision.accepted, "reason": decision.reason }))
    }
}

pub struct SaveResultsBatchTool {
    accumulator: std::sync::Arc<ArticleAccumulator>,
}

impl SaveResultsBatchTool {
    pub fn new(accumulator: std::sync::Arc<ArticleAccumulator>) -> Self {
        Self { accumulator }
    }
}

#[async_trait]
impl ToolExecutor for SaveResultsBatchTool {
    fn name(&self) -> &'static str {
        "save_results_batch"
    }

    fn description(&self) -> &'static str {
        "Save an array of discovered articles in one call. Returns {accepted_count}."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "required": ["items"],
            "properties": {
                "items": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "required": ["title", "url"],
                        "properties": {
                            "title": { "type": "string" },
                            "url": { "type": "string" },
                            "content_kind": { "type": "string", "enum": ["news", "policy", "notice", "file"] },
                            "published_date": { "type": "string", "format": "date" },
                            "summary": { "type": "string" },
                            "tags": { "type": "array", "items": { "type": "string" } }
                        }
                    }
                }
            }
        })
    }

    async fn call(&self, args: serde_json::Value) -> Result<serde_json::Value> {
        let args: SaveResultsBatchArgs = serde_json::from_value(args)?;
        let accepted_count = args
            .items
            .into_iter()
            .filter(|_| true)
            .map(|item| self.accumulator.try_accept(item))
            .filter(|d| d.accepted)
            .count();
        Ok(serde_json::json!({ "accepted_count": accepted_count }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn window_start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
    }

    #[test]
    fn rejects_duplicate_within_same_accumulator() {
        let acc = ArticleAccumulator::new(HashSet::new(), window_start(), vec![]);
        let args = SaveResultArgs {
            title: "A".into(),
            url: "https://x.gov/a".into(),
            content_kind: Some(ContentKind::Policy),
            published_date: Some(NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()),
            summary: None,
            tags: vec![],
        };
        let first = acc.try_accept(args.clone_for_test());
        assert!(first.accepted);
        let second = acc.try_accept(args);
        assert!(!second.accepted);
        assert_eq!(second.reason, Some("duplicate"));
    }

    #[test]
    fn rejects_url_already_seen_from_earlier_section() {
        let mut seen = HashSet::new();
        seen.insert(canonicalize("https://x.gov/a"));
        let acc = ArticleAccumulator::new(seen, window_start(), vec![]);
        let decision = acc.try_accept(SaveResultArgs {
            title: "A".into(),
            url: "https://x.gov/a".into(),
            content_kind: Some(ContentKind::Policy),
            published_date: Some(NaiveDate::from_ymd_opt(2026, 1, 5).unwrap()),
            summary: None,
            tags: vec![],
        });
        assert!(!decision.accepted);
        assert_eq!(decision.reason, Some("duplicate"));
    }

    #[test]
    fn infers_date_from_url_when_missing() {
        let acc = ArticleAccumulator::new(HashSet::new(), window_start(), vec![]);
        let decision = acc.try_accept(SaveResultArgs {
            title: "A".into(),
            url: "https://x.gov.cn/art/2026/2/3/abc.html".into(),
            content_kind: Some(ContentKind::Policy),
            published_date: None,
            summary: None,
            tags: vec![],
        });
        assert!(decision.accepted);
        let items = acc.into_items();
        assert_eq!(
            items[0].published_date,
            Some(NaiveDate::from_ymd_opt(2026, 2, 3).unwrap())
        );
    }

    #[test]
    fn drops_item_with_no_resolvable_date() {
        let acc = ArticleAccumulator::new(HashSet::new(), window_start(), vec![]);
        let decision = acc.try_accept(SaveResultArgs {
            title: "A".into(),
            url: "https://x.gov/no-date-here".into(),
            content_kind: Some(ContentKind::Policy),
            published_date: None,
            summary: None,
            tags: vec![],
        });
        assert!(!decision.accepted);
        assert_eq!(decision.reason, Some("no_resolvable_date"));
    }

    #[test]
    fn rejects_outside_time_window() {
        let acc = ArticleAccumulator::new(HashSet::new(), window_start(), vec![]);
        let decision = acc.try_accept(SaveResultArgs {
            title: "A".into(),
            url: "https://x.gov/a".into(),
            content_kind: Some(ContentKind::Policy),
            published_date: Some(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
            summary: None,
            tags: vec![],
        });
        assert!(!decision.accepted);
        assert_eq!(decision.reason, Some("outside_time_window"));
    }

    #[test]
    fn batch_save_counts_only_accepted() {
        let acc = std::sync::Arc::new(ArticleAccumulator::new(HashSet::new(), window_start(), vec![]));
        let tool = SaveResultsBatchTool::new(acc);
        let args = serde_json::json!({
            "items": [
                {"title": "A", "url": "https://x.gov/a", "published_date": "2026-01-05"},
                {"title": "B", "url": "https://x.gov/b", "published_date": "2020-01-05"},
            ]
        });
        let result = futures::executor::block_on(tool.call(args)).unwrap();
        assert_eq!(result["accepted_count"], 1);
    }

    // Test-only helper: SaveResultArgs doesn't derive Clone in production
    // because tool arguments are consumed once per call; tests need two
    // independent attempts against the same URL.
    impl SaveResultArgs {
        fn clone_for_test(&self) -> Self {
            Self {
                title: self.title.clone(),
                url: self.url.clone(),
                content_kind: self.content_kind,
                published_date: self.published_date,
                summary: self.summary.clone(),
                tags: self.tags.clone(),
            }
        }
    }
}
