//! Tree normalizer: turns the raw `[post_listing, comment_listing]` document into a
//! `Thread` with a flat, depth-annotated, pre-order comment sequence.
//!
//! Only the top-level shape can fail. Every per-node problem (missing fields,
//! wrong types, unknown kinds) falls back to a default or skips the node.

use crate::config::TimestampStyle;
use crate::error::NormalizeError;
use crate::json_utils::{
    author_or_deleted, data_of, i64_or_zero, kind_of, listing_children, str_or_empty, text_or_empty,
    thread_url, timestamp_string,
};
use crate::model::{Comment, Thread};
use crate::node::NodeKind;
use serde_json::Value;

/// Normalize with raw (stringified) timestamps.
pub fn normalize(raw: &Value) -> Result<Thread, NormalizeError> {
    normalize_with(raw, TimestampStyle::Raw)
}

pub fn normalize_with(raw: &Value, timestamps: TimestampStyle) -> Result<Thread, NormalizeError> {
    let (post_listing, comment_listing) = match raw.as_array().map(Vec::as_slice) {
        Some([post, comments]) => (post, comments),
        Some(other) => {
            return Err(NormalizeError::MalformedDocument(format!(
                "expected 2 top-level listings, found {}",
                other.len()
            )))
        }
        None => {
            return Err(NormalizeError::MalformedDocument(
                "top-level value is not a sequence".to_string(),
            ))
        }
    };

    let post_node = listing_children(post_listing)
        .and_then(|children| children.first())
        .filter(|first| first.is_object())
        .ok_or_else(|| NormalizeError::MalformedDocument("post listing has no first entry".to_string()))?;

    let empty = Value::Null;
    let post = data_of(post_node).unwrap_or(&empty);

    let comments = match listing_children(comment_listing) {
        Some(roots) => flatten(roots, timestamps),
        None => Vec::new(),
    };

    let thread = Thread {
        url: thread_url(post),
        title: str_or_empty(post, "title"),
        author: author_or_deleted(post),
        subreddit: str_or_empty(post, "subreddit"),
        post_id: str_or_empty(post, "id"),
        permalink: str_or_empty(post, "permalink"),
        created: timestamp_string(post, "created_utc", timestamps),
        selftext: text_or_empty(post, "selftext"),
        score: i64_or_zero(post, "score"),
        num_comments: i64_or_zero(post, "num_comments"),
        comments,
    };

    tracing::debug!(
        post_id = %thread.post_id,
        flattened = thread.comments.len(),
        reported = thread.num_comments,
        "normalized thread"
    );
    Ok(thread)
}

/// Pre-order walk over `(node, depth)` pairs with an explicit stack.
/// Children are pushed in reverse so siblings pop in source order.
fn flatten(roots: &[Value], timestamps: TimestampStyle) -> Vec<Comment> {
    let mut out = Vec::new();
    let mut stack: Vec<(&Value, usize)> = roots.iter().rev().map(|n| (n, 0)).collect();

    while let Some((node, depth)) = stack.pop() {
        let data = match NodeKind::classify(node) {
            NodeKind::Comment(data) => data,
            NodeKind::More | NodeKind::Unrecognized => continue,
        };

        out.push(comment_from(data, depth, timestamps));

        if let Some(children) = replies_of(data) {
            stack.extend(children.iter().rev().map(|c| (c, depth + 1)));
        }
    }
    out
}

fn comment_from(data: &Value, depth: usize, timestamps: TimestampStyle) -> Comment {
    Comment {
        id: str_or_empty(data, "id"),
        parent_id: str_or_empty(data, "parent_id"),
        author: author_or_deleted(data),
        body: text_or_empty(data, "body"),
        score: i64_or_zero(data, "score"),
        depth,
        timestamp: timestamp_string(data, "created_utc", timestamps),
        permalink: str_or_empty(data, "permalink"),
    }
}

/// Nested reply nodes of a comment. `replies` is `""` on leaves, and a bare
/// `more` marker there means nothing is available locally.
fn replies_of(data: &Value) -> Option<&Vec<Value>> {
    let replies = data.get("replies").filter(|r| r.is_object())?;
    if kind_of(replies) == Some("more") {
        return None;
    }
    listing_children(replies)
}
