//! DOM-side extraction: turns a rendered page's HTML into the plain-text,
//! link, and candidate-article shapes the Agent Runtime's tools hand back
//! to the LLM.

use ego_tree::NodeRef;
use scraper::{Html, Node, Selector};
use url::Url;

use crate::types::{Candidate, LinkEntry};

use super::date_extract;

fn text_selector() -> &'static Selector {
    static SEL: std::sync::OnceLock<Selector> = std::sync::OnceLock::new();
    SEL.get_or_init(|| Selector::parse("body").expect("static selector"))
}

fn link_selector() -> &'static Selector {
    static SEL: std::sync::OnceLock<Selector> = std::sync::OnceLock::new();
    SEL.get_or_init(|| Selector::parse("a[href]").expect("static selector"))
}

/// Flatten all text nodes under `<body>` into a single whitespace-collapsed
/// string, truncated to `cap` characters.
pub fn extract_text(html: &str, cap: usize) -> String {
    let doc = Html::parse_document(html);
    let mut out = String::new();
    if let Some(body) = doc.select(text_selector()).next() {
        collect_text(*body.id(), &doc, &mut out);
    } else {
        collect_text(doc.tree.root().id(), &doc, &mut out);
    }
    let collapsed: String = out.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.len() > cap {
        collapsed.chars().take(cap).collect()
    } else {
        collapsed
    }
}

fn collect_text(id: ego_tree::NodeId, doc: &Html, out: &mut String) {
    let Some(node) = doc.tree.get(id) else { return };
    visit(node, out);
}

fn visit(node: NodeRef<Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => {
            out.push_str(text);
            out.push(' ');
        }
        Node::Element(el) if matches!(el.name(), "script" | "style" | "noscript") => {}
        _ => {
            for child in node.children() {
                visit(child, out);
            }
        }
    }
}

/// Absolute-URL all anchors found on the page, relative to `base_url`,
/// deduplicated by absolute URL and cross-domain filtered against
/// `root_host` using the same suffix-match policy as page navigation.
pub fn extract_links(html: &str, base_url: &str, root_host: &str, allow_cross_domain: bool) -> Vec<LinkEntry> {
    let doc = Html::parse_document(html);
    let Ok(base) = Url::parse(base_url) else {
        return Vec::new();
    };

    let mut seen = std::collections::HashSet::new();
    doc.select(link_selector())
        .filter_map(|el| {
            let href = el.value().attr("href")?;
            let absolute = base.join(href).ok()?;
            if !allow_cross_domain {
                let host = absolute.host_str().unwrap_or_default();
                if host != root_host && !host.ends_with(&format!(".{root_host}")) {
                    return None;
                }
            }
            if !seen.insert(absolute.to_string()) {
                return None;
            }
            let anchor_text: String = el.text().collect::<Vec<_>>().join(" ").trim().to_string();
            Some(LinkEntry {
                anchor_text,
                absolute_url: absolute.to_string(),
            })
        })
        .collect()
}

/// Heuristic pass that turns anchors whose href or anchor text carries a
/// recognizable date into `Candidate` article references, ahead of any LLM
/// judgment call on which links look like articles.
pub fn extract_candidates(html: &str, base_url: &str) -> Vec<Candidate> {
    let doc = Html::parse_document(html);
    let Ok(base) = Url::parse(base_url) else {
        return Vec::new();
    };

    doc.select(link_selector())
        .filter_map(|el| {
            let href = el.value().attr("href")?;
            let absolute = base.join(href).ok()?;
            let anchor_text: String = el.text().collect::<Vec<_>>().join(" ").trim().to_string();
            if anchor_text.is_empty() {
                return None;
            }
            let date_guess = date_extract::extract(absolute.as_str()).or_else(|| date_extract::extract(&anchor_text));
            Some(Candidate {
                title: anchor_text,
                url: absolute.to_string(),
                date_guess,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
            <script>ignored();</script>
            <p>Ministry notice 2026-02-03: new guidance</p>
            <a href="/news/2026-02-03/a.html">Policy update for Q1</a>
            <a href="https://other.example/x">External</a>
            <a href="/about"></a>
        </body></html>
    "#;

    #[test]
    fn extract_text_strips_scripts_and_collapses_whitespace() {
        let text = extract_text(PAGE, 10_000);
        assert!(!text.contains("ignored()"));
        assert!(text.contains("Ministry notice"));
    }

    #[test]
    fn extract_text_respects_cap() {
        let text = extract_text(PAGE, 5);
        assert_eq!(text.chars().count(), 5);
    }

    #[test]
    fn extract_links_resolves_relative_and_drops_cross_domain() {
        let links = extract_links(PAGE, "https://x.gov/home", "x.gov", false);
        assert!(links.iter().any(|l| l.absolute_url == "https://x.gov/news/2026-02-03/a.html"));
        assert!(!links.iter().any(|l| l.absolute_url == "https://other.example/x"));
    }

    #[test]
    fn extract_links_keeps_cross_domain_when_allowed() {
        let links = extract_links(PAGE, "https://x.gov/home", "x.gov", true);
        assert!(links.iter().any(|l| l.absolute_url == "https://other.example/x"));
    }

    #[test]
    fn extract_links_keeps_subdomain_suffix_match() {
        let page = r#"<html><body><a href="https://news.x.gov/a">Sub</a></body></html>"#;
        let links = extract_links(page, "https://x.gov/home", "x.gov", false);
        assert!(links.iter().any(|l| l.absolute_url == "https://news.x.gov/a"));
    }

    #[test]
    fn extract_links_dedupes_repeated_absolute_url() {
        let page = r#"
            <html><body>
                <a href="/a">First</a>
                <a href="/a">Second</a>
            </body></html>
        "#;
        let links = extract_links(page, "https://x.gov/home", "x.gov", false);
        assert_eq!(links.iter().filter(|l| l.absolute_url == "https://x.gov/a").count(), 1);
    }

    #[test]
    fn extract_candidates_skips_anchors_with_empty_text() {
        let candidates = extract_candidates(PAGE, "https://x.gov/home");
        assert!(candidates.iter().all(|c| !c.title.is_empty()));
    }

    #[test]
    fn extract_candidates_picks_up_date_from_url() {
        let candidates = extract_candidates(PAGE, "https://x.gov/home");
        let found = candidates
            .iter()
            .find(|c| c.url == "https://x.gov/news/2026-02-03/a.html")
            .expect("candidate present");
        assert_eq!(found.date_guess, chrono::NaiveDate::from_ymd_opt(2026, 2, 3));
    }
}
