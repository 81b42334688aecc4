//! Date extraction from URLs and rendered page text.
//!
//! Government and policy sites rarely expose a clean `<time>` element, so
//! dates are recovered from whichever of a fixed, ordered set of patterns
//! first matches. Order matters: more specific separators are tried before
//! the bare 8-digit fallback, which would otherwise swallow unrelated
//! numeric path segments.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

struct Pattern {
    regex: &'static str,
    build: fn(&regex::Captures) -> Option<NaiveDate>,
}

fn ymd(caps: &regex::Captures) -> Option<NaiveDate> {
    let y: i32 = caps.get(1)?.as_str().parse().ok()?;
    let m: u32 = caps.get(2)?.as_str().parse().ok()?;
    let d: u32 = caps.get(3)?.as_str().parse().ok()?;
    NaiveDate::from_ymd_opt(y, m, d)
}

fn patterns() -> &'static [Pattern] {
    static PATTERNS: OnceLock<Vec<Pattern>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            Pattern { regex: r"(\d{4})-(\d{2})-(\d{2})", build: ymd },
            Pattern { regex: r"(\d{4})/(\d{2})/(\d{2})", build: ymd },
            Pattern { regex: r"(\d{4})\.(\d{2})\.(\d{2})", build: ymd },
            Pattern { regex: r"(\d{4})年(\d{1,2})月(\d{1,2})日", build: ymd },
            Pattern { regex: r"/(\d{4})-(\d{2})/(\d{2})/", build: ymd },
            Pattern { regex: r"/art/(\d{4})/(\d{1,2})/(\d{1,2})/", build: ymd },
            Pattern { regex: r"/(\d{6})/t(\d{4})(\d{2})(\d{2})_", build: |caps| {
                let y: i32 = caps.get(2)?.as_str().parse().ok()?;
                let m: u32 = caps.get(3)?.as_str().parse().ok()?;
                let d: u32 = caps.get(4)?.as_str().parse().ok()?;
                NaiveDate::from_ymd_opt(y, m, d)
            } },
            Pattern { regex: r"(?:^|[^0-9])(\d{4})(\d{2})(\d{2})(?:[^0-9]|$)", build: |caps| {
                let y: i32 = caps.get(1)?.as_str().parse().ok()?;
                let m: u32 = caps.get(2)?.as_str().parse().ok()?;
                let d: u32 = caps.get(3)?.as_str().parse().ok()?;
                NaiveDate::from_ymd_opt(y, m, d)
            } },
        ]
    })
}

fn compiled() -> &'static [(Regex, fn(&regex::Captures) -> Option<NaiveDate>)] {
    static COMPILED: OnceLock<Vec<(Regex, fn(&regex::Captures) -> Option<NaiveDate>)>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        patterns()
            .iter()
            .map(|p| (Regex::new(p.regex).expect("static date pattern is valid regex"), p.build))
            .collect()
    })
}

/// Try each pattern in order against `haystack`, returning the first valid
/// date. Used both on a URL and on rendered page text near a headline.
pub fn extract(haystack: &str) -> Option<NaiveDate> {
    for (regex, build) in compiled() {
        if let Some(caps) = regex.captures(haystack) {
            if let Some(date) = build(&caps) {
                return Some(date);
            }
        }
    }
    None
}

pub fn infer_from_url(url: &str) -> Option<NaiveDate> {
    extract(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_iso_dashes() {
        assert_eq!(extract("https://x.gov/news/2026-02-03/a.html"), NaiveDate::from_ymd_opt(2026, 2, 3));
    }

    #[test]
    fn matches_slash_separated() {
        assert_eq!(extract("https://x.gov/news/2026/02/03/a.html"), NaiveDate::from_ymd_opt(2026, 2, 3));
    }

    #[test]
    fn matches_dot_separated() {
        assert_eq!(extract("2026.02.03 policy update"), NaiveDate::from_ymd_opt(2026, 2, 3));
    }

    #[test]
    fn matches_chinese_date() {
        assert_eq!(extract("发布于2026年2月3日"), NaiveDate::from_ymd_opt(2026, 2, 3));
    }

    #[test]
    fn matches_art_path_form() {
        assert_eq!(
            extract("https://x.gov.cn/art/2026/2/3/abc.html"),
            NaiveDate::from_ymd_opt(2026, 2, 3)
        );
    }

    #[test]
    fn matches_tyyyymmdd_form() {
        assert_eq!(
            extract("https://x.gov.cn/202602/t20260203_123456.html"),
            NaiveDate::from_ymd_opt(2026, 2, 3)
        );
    }

    #[test]
    fn matches_bare_eight_digit_fallback() {
        assert_eq!(extract("https://x.gov/doc/20260203.pdf"), NaiveDate::from_ymd_opt(2026, 2, 3));
    }

    #[test]
    fn returns_none_when_no_pattern_matches() {
        assert_eq!(extract("https://x.gov/about-us"), None);
    }

    #[test]
    fn rejects_invalid_calendar_date() {
        assert_eq!(extract("https://x.gov/2026-13-40/a.html"), None);
    }
}
