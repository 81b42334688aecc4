//! URL canonicalization used as the sole deduplication key for `ArticleItem`s
//! within a `CrawlTask`.
//!
//! Canonicalization lower-cases the scheme and host, strips the fragment,
//! and removes a default port (`:80` for `http`, `:443` for `https`). Query
//! strings and paths are left untouched — policy/news sites often encode
//! meaningful article ids in the query string.

use url::Url;

/// Canonicalize a URL for deduplication purposes. Falls back to the input
/// string (with a lower-cased scheme/host prefix applied best-effort) if the
/// URL cannot be parsed, so callers never have to special-case malformed
/// input before calling `save_result`.
pub fn canonicalize(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return raw.trim().to_ascii_lowercase();
    };

    url.set_fragment(None);

    let is_default_port = matches!(
        (url.scheme(), url.port()),
        ("http", Some(80)) | ("https", Some(443))
    );
    if is_default_port {
        let _ = url.set_port(None);
    }

    if let Some(host) = url.host_str() {
        let lower = host.to_ascii_lowercase();
        let _ = url.set_host(Some(&lower));
    }

    let scheme_lower = url.scheme().to_ascii_lowercase();
    if scheme_lower != url.scheme() {
        let _ = url.set_scheme(&scheme_lower);
    }

    url.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_scheme_and_host() {
        assert_eq!(
            canonicalize("HTTPS://Example.GOV/Policy/1"),
            "https://example.gov/Policy/1"
        );
    }

    #[test]
    fn strips_fragment() {
        assert_eq!(
            canonicalize("https://example.gov/a#section-2"),
            "https://example.gov/a"
        );
    }

    #[test]
    fn strips_default_ports() {
        assert_eq!(canonicalize("http://example.gov:80/a"), "http://example.gov/a");
        assert_eq!(canonicalize("https://example.gov:443/a"), "https://example.gov/a");
    }

    #[test]
    fn keeps_non_default_port() {
        assert_eq!(
            canonicalize("https://example.gov:8443/a"),
            "https://example.gov:8443/a"
        );
    }

    #[test]
    fn is_idempotent() {
        let once = canonicalize("HTTPS://Example.GOV:443/a#frag");
        let twice = canonicalize(&once);
        assert_eq!(once, twice);
    }

    proptest::proptest! {
        #[test]
        fn idempotence_holds_for_arbitrary_https_paths(seg in "[a-zA-Z0-9]{1,12}") {
            let url = format!("https://Example.GOV/{seg}#frag");
            let once = canonicalize(&url);
            let twice = canonicalize(&once);
            proptest::prop_assert_eq!(once, twice);
        }
    }
}
