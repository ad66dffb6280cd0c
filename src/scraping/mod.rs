//! Link extraction subsystem
//!
//! Turns raw link lists produced by a browser into new records in the table.
//!
//! Key components:
//! - `is_valid_url`: syntactic gate for browser output
//! - `normalize_url`: strips configured query parameters for comparison
//! - `UrlDeduplicator` / `filter_new`: normalized-form deduplication
//! - `Browser`: the page-driving collaborator (`ChromeBrowser` for real runs)
//! - `ExtractionCoordinator`: fetch, validate, dedup, persist per source

pub mod browser;
pub mod coordinator;
pub mod dedup;

pub use browser::{Browser, ChromeBrowser, ExtractionError};
pub use coordinator::{ExtractionCoordinator, RunSummary, SourceOutcome};
pub use dedup::{filter_new, UrlDeduplicator};

use url::Url;

/// Schemes accepted for extracted links
const WEB_SCHEMES: &[&str] = &["http", "https"];

/// Check whether a string is an absolute web URL with a host.
///
/// Never panics; anything that fails to parse is simply invalid.
pub fn is_valid_url(candidate: &str) -> bool {
    parse_web_url(candidate).is_some()
}

fn parse_web_url(candidate: &str) -> Option<Url> {
    let url = Url::parse(candidate).ok()?;
    if !WEB_SCHEMES.contains(&url.scheme()) {
        return None;
    }
    match url.host_str() {
        Some(host) if !host.is_empty() => Some(url),
        _ => None,
    }
}

/// Normalize a URL for deduplication
///
/// - Removes every query parameter named in `params_to_remove`
/// - Keeps the remaining parameters in order, with their original encoding
/// - Drops the `?` when no parameter survives
///
/// Fragments and path casing are left alone. Returns `url` unchanged when
/// there is nothing to remove or the URL does not validate.
pub fn normalize_url(url: &str, params_to_remove: &[String]) -> String {
    if params_to_remove.is_empty() {
        return url.to_string();
    }
    let Some(mut parsed) = parse_web_url(url) else {
        return url.to_string();
    };

    if let Some(query) = parsed.query() {
        let kept: Vec<&str> = query
            .split('&')
            .filter(|pair| {
                let name = query_param_name(pair);
                !params_to_remove.iter().any(|p| *p == name)
            })
            .collect();

        if kept.is_empty() {
            parsed.set_query(None);
        } else {
            let joined = kept.join("&");
            parsed.set_query(Some(&joined));
        }
    }

    parsed.to_string()
}

/// Decoded name of a single `name=value` query pair
fn query_param_name(pair: &str) -> String {
    url::form_urlencoded::parse(pair.as_bytes())
        .next()
        .map(|(name, _)| name.into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_valid_urls() {
        assert!(is_valid_url("https://example.com"));
        assert!(is_valid_url("http://example.com/a/b?c=d#e"));
        assert!(is_valid_url("https://x/1?searchId=a"));
    }

    #[test]
    fn test_invalid_urls() {
        assert!(!is_valid_url(""));
        assert!(!is_valid_url("not a url"));
        assert!(!is_valid_url("/relative/path"));
        assert!(!is_valid_url("mailto:someone@example.com"));
        assert!(!is_valid_url("javascript:void(0)"));
        assert!(!is_valid_url("file:///etc/passwd"));
        assert!(!is_valid_url("https://"));
    }

    #[test]
    fn test_normalize_without_params_is_identity() {
        let urls = [
            "https://example.com",
            "https://Example.com/Path?b=2&a=1#Frag",
            "garbage",
        ];
        for u in urls {
            assert_eq!(normalize_url(u, &[]), u);
        }
    }

    #[test]
    fn test_normalize_strips_named_params() {
        let p = params(&["sid"]);
        assert_eq!(
            normalize_url("https://a.example/x?sid=1", &p),
            "https://a.example/x"
        );
        assert_eq!(
            normalize_url("https://a.example/x?q=rust&sid=1&page=2", &p),
            "https://a.example/x?q=rust&page=2"
        );
    }

    #[test]
    fn test_normalize_preserves_order_and_fragment() {
        let p = params(&["searchId"]);
        assert_eq!(
            normalize_url("https://x/1?z=1&searchId=a&b=2#Top", &p),
            "https://x/1?z=1&b=2#Top"
        );
    }

    #[test]
    fn test_normalize_matches_encoded_names() {
        let p = params(&["search id"]);
        assert_eq!(
            normalize_url("https://x/1?search%20id=a&keep=1", &p),
            "https://x/1?keep=1"
        );
    }

    #[test]
    fn test_normalize_keeps_path_case() {
        let p = params(&["sid"]);
        assert_eq!(
            normalize_url("https://x/Jobs/ABC?sid=1", &p),
            "https://x/Jobs/ABC"
        );
    }

    #[test]
    fn test_normalize_malformed_is_identity() {
        let p = params(&["sid"]);
        for s in ["", "::::", "not a url?sid=1", "/x?sid=1", "mailto:a@b?sid=1"] {
            assert_eq!(normalize_url(s, &p), s);
        }
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let p = params(&["sid", "utm_source"]);
        let urls = [
            "https://a.example/x?sid=1",
            "https://a.example/x?a=1&sid=2&utm_source=z&b",
            "https://a.example",
            "https://a.example/x?&&sid=3",
            "https://a.example/x?q=a+b&r=%2F#frag",
            "broken",
        ];
        for u in urls {
            let once = normalize_url(u, &p);
            assert_eq!(normalize_url(&once, &p), once, "not idempotent for {}", u);
        }
    }
}
