//! Phase 3: rank items by strategic importance via one LLM call, with a
//! deterministic date-descending fallback on any parse/validation failure.

use std::collections::HashSet;

use crate::llm::LlmClient;
use crate::types::ArticleItem;

const SYSTEM_PROMPT: &str = "You are a senior policy consultant ranking articles by strategic \
    importance for an executive briefing.";

/// Re-orders `items` in place by strategic importance and assigns
/// `importance_rank` to match the final order.
pub async fn rank_items(llm: &LlmClient, items: Vec<ArticleItem>) -> Vec<ArticleItem> {
    if items.is_empty() {
        return items;
    }

    let listing = build_listing(&items);
    let user = format!(
        "{listing}\n\nReturn a strict JSON array of integers that is a permutation of \
         [0..{}) ordering the items above by strategic importance: national/global policy > \
         sector policy/regulation > statistics/reports > local notices > daily operational items; \
         within equal rank, newer first. JSON array only.",
        items.len()
    );

    let permutation = match llm.complete_text(SYSTEM_PROMPT, &user).await {
        Ok(response) => parse_permutation(&response, items.len()),
        Err(_) => None,
    };

    let order = permutation.unwrap_or_else(|| date_desc_order(&items));
    apply_order(items, order)
}

fn build_listing(items: &[ArticleItem]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let date = item.published_date.map(|d| d.to_string()).unwrap_or_else(|| "????-??-??".to_string());
            let kind = serde_json::to_value(item.content_kind)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            let summary_excerpt: String = item.summary.chars().take(80).collect();
            format!("[{i}] [{kind}] {date} | {} — {summary_excerpt}", item.title)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse a JSON integer array, validating it is a permutation-compatible
/// subset of `[0..n)` (in-range, no duplicates). Any index missing from a
/// short response is appended in original order, per the specification's
/// repair rule.
fn parse_permutation(response: &str, n: usize) -> Option<Vec<usize>> {
    let trimmed = response.trim();
    let start = trimmed.find('[')?;
    let end = trimmed.rfind(']')?;
    if end < start {
        return None;
    }
    let raw: Vec<i64> = serde_json::from_str(&trimmed[start..=end]).ok()?;

    let mut seen = HashSet::new();
    let mut order = Vec::with_capacity(n);
    for idx in raw {
        if idx < 0 || idx as usize >= n {
            return None;
        }
        let idx = idx as usize;
        if !seen.insert(idx) {
            return None;
        }
        order.push(idx);
    }

    for i in 0..n {
        if !seen.contains(&i) {
            order.push(i);
        }
    }
    Some(order)
}

fn date_desc_order(items: &[ArticleItem]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| items[b].published_date.cmp(&items[a].published_date));
    order
}

fn apply_order(items: Vec<ArticleItem>, order: Vec<usize>) -> Vec<ArticleItem> {
    let mut slots: Vec<Option<ArticleItem>> = items.into_iter().map(Some).collect();
    order
        .into_iter()
        .enumerate()
        .map(|(rank, idx)| {
            let mut item = slots[idx].take().expect("permutation indices are unique");
            item.importance_rank = Some(rank);
            item
        })
        .collect()
}
