//! Thread URL handling: `.json` endpoint conversion and id extraction from permalinks.

use crate::error::FetchError;
use url::Url;

/// Parse and check a thread URL: http(s) with a host.
pub fn parse_thread_url(url: &str) -> Result<Url, FetchError> {
    let trimmed = url.trim();
    let parsed = Url::parse(trimmed)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(FetchError::InvalidUrl(format!("unsupported scheme in {trimmed}")));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(FetchError::InvalidUrl(format!("missing host in {trimmed}")));
    }
    Ok(parsed)
}

/// Convert a thread or comment permalink into its `.json` endpoint.
///
///   https://www.reddit.com/r/foo/comments/abc123/title/        -> .../title.json
///   https://www.reddit.com/r/foo/comments/abc123/title/?x=1#c  -> .../title.json
///   https://www.reddit.com/r/foo/comments/abc123/title.json    -> unchanged
pub fn json_endpoint(url: &str) -> Result<String, FetchError> {
    let mut u = parse_thread_url(url)?;
    u.set_query(None);
    u.set_fragment(None);

    let path = u.path().trim_end_matches('/').to_string();
    if !path.ends_with(".json") {
        u.set_path(&format!("{path}.json"));
    }
    Ok(u.to_string())
}

/// Path segments following `comments`, with any `.json` suffix dropped.
fn segments_after_comments(url: &str) -> Option<Vec<String>> {
    let u = Url::parse(url.trim()).ok()?;
    let segs: Vec<String> = u
        .path_segments()?
        .filter(|s| !s.is_empty())
        .map(|s| s.strip_suffix(".json").unwrap_or(s).to_string())
        .collect();
    let idx = segs.iter().position(|s| s == "comments")?;
    Some(segs[idx + 1..].to_vec())
}

#[inline]
fn looks_like_id(s: &str, min_len: usize) -> bool {
    s.len() >= min_len && s.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Post id of a thread permalink (`/comments/<post>/...`).
pub fn post_id(url: &str) -> Option<String> {
    let rest = segments_after_comments(url)?;
    rest.first().filter(|s| looks_like_id(s, 1)).cloned()
}

/// Comment id of a comment permalink, `None` for plain thread links.
///
///   /comments/<post>/<slug>/<comment>/
///   /comments/<post>/comment/<comment>/
///
/// Comment ids are alphanumeric and at least six characters.
pub fn comment_id(url: &str) -> Option<String> {
    let rest = segments_after_comments(url)?;
    rest.get(2).filter(|s| looks_like_id(s, 6)).cloned()
}
