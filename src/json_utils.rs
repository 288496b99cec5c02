//! Get-or-default accessors over loosely shaped `serde_json::Value` documents.
//! Nothing here assumes a key exists or has the expected type.

use crate::config::TimestampStyle;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Placeholder the platform uses for deleted accounts; also our default author.
pub const DELETED_AUTHOR: &str = "[deleted]";

/// Origin that site-relative permalinks are resolved against.
pub const SITE_ORIGIN: &str = "https://www.reddit.com";

/// Placeholders the platform substitutes for user text that is gone.
const GONE_SENTINELS: [&str; 2] = ["[deleted]", "[removed]"];

/// String field or `""`.
pub fn str_or_empty(v: &Value, key: &str) -> String {
    v.get(key)
        .and_then(|x| x.as_str())
        .map(|s| s.to_string())
        .unwrap_or_default()
}

/// Integer field or `0`. Floats are truncated; strings and other types give `0`.
pub fn i64_or_zero(v: &Value, key: &str) -> i64 {
    match v.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|u| u.min(i64::MAX as u64) as i64))
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .unwrap_or(0),
        _ => 0,
    }
}

/// Author field, with absence, blank strings and sentinels mapped to `"[deleted]"`.
/// Other names are returned exactly as given.
pub fn author_or_deleted(v: &Value) -> String {
    match v.get("author").and_then(|x| x.as_str()) {
        Some(a) if !a.trim().is_empty() && !is_gone_sentinel(a.trim()) => a.to_string(),
        _ => DELETED_AUTHOR.to_string(),
    }
}

/// Text field with sentinels mapped to `""`. Never returns the sentinel itself.
pub fn text_or_empty(v: &Value, key: &str) -> String {
    match v.get(key).and_then(|x| x.as_str()) {
        Some(s) if !is_gone_sentinel(s.trim()) => s.to_string(),
        _ => String::new(),
    }
}

#[inline]
pub fn is_gone_sentinel(s: &str) -> bool {
    GONE_SENTINELS.contains(&s)
}

/// Declared `kind` tag of a tree node, if it is a string.
#[inline]
pub fn kind_of(node: &Value) -> Option<&str> {
    node.get("kind").and_then(|k| k.as_str())
}

/// `data` member of a node when it is a mapping.
#[inline]
pub fn data_of(node: &Value) -> Option<&Value> {
    node.get("data").filter(|d| d.is_object())
}

/// `data.children` of a listing when it is a sequence.
/// A listing wrapped in a one-element array is unwrapped first.
pub fn listing_children(listing: &Value) -> Option<&Vec<Value>> {
    let listing = match listing {
        Value::Array(items) => items.first()?,
        other => other,
    };
    data_of(listing)
        .and_then(|d| d.get("children"))
        .and_then(|c| c.as_array())
}

/// Absolute thread URL built from a site-relative `permalink`.
/// Falls back to the `url` field when there is no permalink.
pub fn thread_url(post: &Value) -> String {
    let permalink = str_or_empty(post, "permalink");
    if permalink.starts_with("http://") || permalink.starts_with("https://") {
        permalink
    } else if permalink.starts_with('/') {
        format!("{SITE_ORIGIN}{permalink}")
    } else {
        str_or_empty(post, "url")
    }
}

/// Creation time field rendered as a string, `""` when absent or unusable.
///
/// Raw: integers as integers, whole floats without the `.0`, other floats in
/// shortest form, strings unchanged. Rfc3339: numeric epoch seconds as UTC.
pub fn timestamp_string(v: &Value, key: &str, style: TimestampStyle) -> String {
    let Some(raw) = v.get(key) else { return String::new() };
    match (raw, style) {
        (Value::String(s), _) => s.clone(),
        (Value::Number(n), TimestampStyle::Raw) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else {
                match n.as_f64() {
                    Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 => {
                        format!("{}", f as i64)
                    }
                    Some(f) if f.is_finite() => f.to_string(),
                    _ => String::new(),
                }
            }
        }
        (Value::Number(n), TimestampStyle::Rfc3339) => {
            let secs = n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64));
            secs.and_then(|s| OffsetDateTime::from_unix_timestamp(s).ok())
                .and_then(|dt| dt.format(&Rfc3339).ok())
                .unwrap_or_default()
        }
        _ => String::new(),
    }
}
