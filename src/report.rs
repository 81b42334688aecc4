//! Report rendering: turns a ranked `Vec<ArticleItem>` into the HTML and
//! plaintext bodies a `Report` carries. Templating is done with plain
//! `format!` (no templating engine in the teacher's stack), grouped by
//! source since a batch spans multiple `MonitorSource`s even though one
//! `Report` covers a single task.

use chrono::{DateTime, Utc};

use crate::types::{ArticleItem, Report};

pub fn render(batch_id: &str, source_name: &str, items: Vec<ArticleItem>, generated_at: DateTime<Utc>) -> Report {
    let title = format!("{source_name} — policy digest ({})", generated_at.format("%Y-%m-%d"));
    let html = render_html(source_name, &items, generated_at);
    let plaintext = render_plaintext(source_name, &items, generated_at);

    Report {
        batch_id: batch_id.to_string(),
        title,
        html,
        plaintext,
        generated_at,
        items,
    }
}

fn render_html(source_name: &str, items: &[ArticleItem], generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "<h1>{}</h1><p>Generated {}</p><ol>",
        escape_html(source_name),
        generated_at.format("%Y-%m-%d %H:%M UTC")
    ));
    for item in items {
        out.push_str(&format!(
            "<li><a href=\"{}\">{}</a> <em>({})</em><p>{}</p></li>",
            escape_html(&item.url),
            escape_html(&item.title),
            item.published_date.map(|d| d.to_string()).unwrap_or_default(),
            escape_html(&item.summary),
        ));
    }
    out.push_str("</ol>");
    out
}

fn render_plaintext(source_name: &str, items: &[ArticleItem], generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();
    out.push_str(&format!("{source_name} — policy digest ({})\n\n", generated_at.format("%Y-%m-%d")));
    for (i, item) in items.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} ({})\n   {}\n   {}\n\n",
            i + 1,
            item.title,
            item.published_date.map(|d| d.to_string()).unwrap_or_default(),
            item.url,
            item.summary,
        ));
    }
    out
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContentKind;
    use uuid::Uuid;

    fn item(title: &str) -> ArticleItem {
        ArticleItem {
            id: Uuid::new_v4(),
            title: title.to_string(),
            url: "https://x.gov/a".into(),
            content_kind: ContentKind::Policy,
            published_date: chrono::NaiveDate::from_ymd_opt(2026, 1, 1),
            summary: "A <script>alert(1)</script> summary".into(),
            tags: vec![],
            importance_rank: Some(0),
        }
    }

    #[test]
    fn html_escapes_injected_markup() {
        let report = render("batch_1", "Source", vec![item("Title <b>")], Utc::now());
        assert!(!report.html.contains("<script>"));
        assert!(report.html.contains("&lt;script&gt;"));
    }

    #[test]
    fn plaintext_preserves_order_and_count() {
        let items = vec![item("First"), item("Second")];
        let report = render("batch_1", "Source", items, Utc::now());
        let first_pos = report.plaintext.find("First").unwrap();
        let second_pos = report.plaintext.find("Second").unwrap();
        assert!(first_pos < second_pos);
    }

    #[test]
    fn empty_items_renders_without_panicking() {
        let report = render("batch_1", "Source", vec![], Utc::now());
        assert!(report.items.is_empty());
        assert!(report.html.contains("<ol>"));
    }
}
