#![allow(dead_code)]

use rharvest::{Fetch, FetchError};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

/// A `Listing` wrapper around `children`, shaped like the platform's.
pub fn listing(children: Vec<Value>) -> Value {
    json!({ "kind": "Listing", "data": { "children": children } })
}

/// A `t1` comment node. `replies` empty renders as `""`, as the platform does for leaves.
pub fn comment(id: &str, parent: &str, author: &str, body: &str, score: i64, replies: Vec<Value>) -> Value {
    let replies = if replies.is_empty() { json!("") } else { listing(replies) };
    json!({
        "kind": "t1",
        "data": {
            "id": id,
            "parent_id": parent,
            "author": author,
            "body": body,
            "score": score,
            "created_utc": 1_700_000_000.0,
            "permalink": format!("/r/rust/comments/p1/t/{id}/"),
            "replies": replies
        }
    })
}

pub fn more(ids: &[&str]) -> Value {
    json!({ "kind": "more", "data": { "count": ids.len(), "children": ids } })
}

pub fn post(id: &str, title: &str, num_comments: i64) -> Value {
    listing(vec![json!({
        "kind": "t3",
        "data": {
            "id": id,
            "name": format!("t3_{id}"),
            "title": title,
            "author": "op",
            "subreddit": "rust",
            "score": 42,
            "num_comments": num_comments,
            "created_utc": 1_700_000_000,
            "permalink": format!("/r/rust/comments/{id}/t/"),
            "url": format!("https://www.reddit.com/r/rust/comments/{id}/t/"),
            "selftext": "post body"
        }
    })])
}

pub fn document(post: Value, comments: Vec<Value>) -> Value {
    json!([post, listing(comments)])
}

/// The worked example: one root comment with one reply, followed by a `more` marker.
pub fn scenario_document() -> Value {
    json!([
        [{"data": {"children": [{"data": {
            "title": "T", "author": "u1", "subreddit": "s", "id": "p1", "score": 5, "num_comments": 1
        }}]}}],
        [{"data": {"children": [
            {"kind": "t1", "data": {
                "author": "u2", "body": "hi", "score": 2, "created_utc": 100,
                "replies": {"data": {"children": [
                    {"kind": "t1", "data": {"author": "u3", "body": "reply", "score": 1, "created_utc": 101}}
                ]}}
            }},
            {"kind": "more", "data": {}}
        ]}}]
    ])
}

/// Normalizer's scenario input as spelled in the document above, but with the
/// listings as single objects (how the platform actually returns them).
pub fn scenario_document_objects() -> Value {
    let raw = scenario_document();
    json!([raw[0][0].clone(), raw[1][0].clone()])
}

/// A single reply chain `levels` deep: c0 <- c1 <- ... <- c{levels-1}.
pub fn deep_chain(levels: usize) -> Value {
    let mut node: Option<Value> = None;
    for i in (0..levels).rev() {
        let parent = if i == 0 { "t3_p1".to_string() } else { format!("t1_c{}", i - 1) };
        let replies = node.take().map(|n| vec![n]).unwrap_or_default();
        node = Some(comment(&format!("c{i}"), &parent, &format!("user{i}"), &format!("level {i}"), i as i64, replies));
    }
    document(post("p1", "deep", levels as i64), node.into_iter().collect())
}

/// A small mixed tree:
///
///   a (0)
///     b (1)
///       c (2)
///       [more]
///     [unknown kind]
///     d (1)
///   [more]
///   e (0)
///     f (1)
pub fn mixed_tree() -> Value {
    let c = comment("c", "t1_b", "carol", "deep reply", 3, vec![]);
    let b = comment("b", "t1_a", "bob", "reply", 2, vec![c, more(&["x1", "x2"])]);
    let odd = json!({ "kind": "t9", "data": { "id": "zz", "body": "should not appear" } });
    let d = comment("d", "t1_a", "dave", "second reply", 1, vec![]);
    let a = comment("a", "t3_p1", "alice", "root one", 10, vec![b, odd, d]);
    let f = comment("f", "t1_e", "frank", "under e", 0, vec![]);
    let e = comment("e", "t3_p1", "erin", "root two", 5, vec![f]);
    document(post("p1", "mixed", 12), vec![a, more(&["y1"]), e])
}

/// Canned responses for a given URL.
#[derive(Clone)]
pub enum Canned {
    Doc(Value),
    Status(u16),
}

/// In-memory fetcher keyed by the exact URL string it is asked for.
/// Unknown URLs answer 404. Every call is recorded.
#[derive(Default)]
pub struct ScriptedFetcher {
    responses: HashMap<String, Canned>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, response: Canned) -> Self {
        self.responses.insert(url.to_string(), response);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Fetch for ScriptedFetcher {
    fn fetch(&self, url: &str) -> Result<Value, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.responses.get(url) {
            Some(Canned::Doc(v)) => Ok(v.clone()),
            Some(Canned::Status(429)) => Err(FetchError::RateLimited),
            Some(Canned::Status(code)) => Err(FetchError::Status(*code)),
            None => Err(FetchError::Status(404)),
        }
    }
}

pub fn thread_url(id: &str) -> String {
    format!("https://www.reddit.com/r/rust/comments/{id}/t/")
}
