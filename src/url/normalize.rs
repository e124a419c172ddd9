use crate::url::ScopeFilter;
use percent_encoding::percent_decode_str;
use url::Url;

/// Schemes that never lead to a fetchable resource
const SKIPPED_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Resolves a raw reference against a base URL
///
/// # Steps
///
/// 1. Trim the reference; reject empty and non-fetchable schemes
/// 2. Join it with `base`; reject anything that is not http(s) afterwards
/// 3. Truncate at the first `#`, keeping the query string
/// 4. Percent-decode the result, except `%25`, which stays encoded
/// 5. Truncate again at a `#` produced by decoding
///
/// Malformed input yields `None`, never an error. Resolving an already
/// resolved URL against itself returns it unchanged.
///
/// # Examples
///
/// ```
/// use pixel_harvest::url::resolve;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/view/site/home").unwrap();
/// assert_eq!(
///     resolve("../other%20page?x=1#top", &base).as_deref(),
///     Some("https://example.com/view/other page?x=1")
/// );
/// ```
pub fn resolve(raw: &str, base: &Url) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('#') {
        return None;
    }

    let lowered = raw.to_ascii_lowercase();
    if SKIPPED_SCHEMES.iter().any(|s| lowered.starts_with(s)) {
        return None;
    }

    let joined = base.join(raw).ok()?;
    if joined.scheme() != "http" && joined.scheme() != "https" {
        return None;
    }

    let joined = joined.to_string();
    let mut decoded = decode_keeping_percent(strip_fragment(&joined));
    if let Some(idx) = decoded.find('#') {
        decoded.truncate(idx);
    }

    Some(decoded)
}

fn strip_fragment(url: &str) -> &str {
    url.split('#').next().unwrap_or(url)
}

/// Percent-decodes everything but `%25`, so a decoded `%` is never decoded twice
fn decode_keeping_percent(url: &str) -> String {
    url.split("%25")
        .map(|part| percent_decode_str(part).decode_utf8_lossy())
        .collect::<Vec<_>>()
        .join("%25")
}

/// Normalizes a page reference and applies the crawl scope
///
/// Returns `None` when resolution fails or the result is outside `scope`.
pub fn normalize_page_url(raw: &str, base: &Url, scope: &ScopeFilter) -> Option<String> {
    resolve(raw, base).filter(|url| scope.contains(url))
}

/// Normalizes a media reference
///
/// Media is not held to the page scope: images are commonly served from a CDN
/// host, so the "looks like an image" test acts as the media scope instead.
pub fn normalize_media_url(raw: &str, base: &Url) -> Option<String> {
    resolve(raw, base)
}

/// Strips query and fragment, used to compare pages against the entry page
pub fn strip_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}
