// src/utils/url.rs

//! URL normalization and record identity derivation.

use sha2::{Digest, Sha256};
use url::Url;

/// Query parameters that carry no identity (analytics/session tracking).
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "gclid",
    "fbclid",
    "ref",
    "session",
    "sid",
];

/// Normalize a record URL for identity comparison: lowercase the host,
/// drop tracking query parameters, the fragment, and any trailing slash.
pub fn normalize_url(raw: &str) -> Option<String> {
    let mut parsed = Url::parse(raw).ok()?;
    parsed.set_fragment(None);

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !TRACKING_PARAMS.contains(&k.to_lowercase().as_str()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        let query = kept
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        parsed.set_query(Some(&query));
    }

    let mut out = parsed.to_string();
    while out.ends_with('/') {
        out.pop();
    }
    Some(out)
}

/// Stable identity for a record: normalized URL when it parses, otherwise
/// a SHA-256 over normalized title + published date.
pub fn record_identity(url: &str, title: &str, published_date: &str) -> String {
    if let Some(normalized) = normalize_url(url) {
        return normalized;
    }
    title_date_identity(title, published_date)
}

/// Fallback identity when the URL is unstable or unparseable.
pub fn title_date_identity(title: &str, published_date: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.trim().to_lowercase().as_bytes());
    hasher.update(b"\x1f");
    hasher.update(published_date.trim().as_bytes());
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

/// Resolve a potentially relative URL against a base URL.
pub fn resolve(base: &str, href: &str) -> String {
    match Url::parse(base).and_then(|b| b.join(href)) {
        Ok(joined) => joined.to_string(),
        Err(_) => href.to_string(),
    }
}
