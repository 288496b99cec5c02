//! Normalized output records. Built once by the normalizer and read-only afterwards.

use serde::Serialize;

/// One content-bearing reply, annotated with its nesting depth.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub(crate) id: String,
    pub(crate) parent_id: String,
    pub(crate) author: String,
    pub(crate) body: String,
    pub(crate) score: i64,
    pub(crate) depth: usize,
    pub(crate) timestamp: String,
    pub(crate) permalink: String,
}

impl Comment {
    pub fn id(&self) -> &str { &self.id }
    /// Platform fullname of the parent (`t3_…` for top-level, `t1_…` otherwise).
    pub fn parent_id(&self) -> &str { &self.parent_id }
    pub fn author(&self) -> &str { &self.author }
    /// Empty when the platform reports the text as deleted or removed.
    pub fn body(&self) -> &str { &self.body }
    pub fn score(&self) -> i64 { self.score }
    /// 0 for direct replies to the post.
    pub fn depth(&self) -> usize { self.depth }
    pub fn timestamp(&self) -> &str { &self.timestamp }
    pub fn permalink(&self) -> &str { &self.permalink }
}

/// One post plus its comments, flattened in pre-order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Thread {
    pub(crate) url: String,
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) subreddit: String,
    pub(crate) post_id: String,
    pub(crate) permalink: String,
    pub(crate) created: String,
    pub(crate) selftext: String,
    pub(crate) score: i64,
    pub(crate) num_comments: i64,
    pub(crate) comments: Vec<Comment>,
}

impl Thread {
    pub fn url(&self) -> &str { &self.url }
    pub fn title(&self) -> &str { &self.title }
    pub fn author(&self) -> &str { &self.author }
    pub fn subreddit(&self) -> &str { &self.subreddit }
    pub fn post_id(&self) -> &str { &self.post_id }
    pub fn permalink(&self) -> &str { &self.permalink }
    pub fn created(&self) -> &str { &self.created }
    pub fn selftext(&self) -> &str { &self.selftext }
    pub fn score(&self) -> i64 { self.score }
    /// Platform-reported total; may exceed `comments().len()`.
    pub fn num_comments(&self) -> i64 { self.num_comments }
    pub fn comments(&self) -> &[Comment] { &self.comments }

    /// Copy of this thread keeping only the subtree rooted at `comment_id`.
    ///
    /// Pre-order places a comment's descendants directly after it, so the
    /// subtree is the run of following comments deeper than the root.
    /// Depths are rebased so the root is 0. Unknown ids give no comments.
    pub fn focused(&self, comment_id: &str) -> Thread {
        let mut comments = Vec::new();
        if let Some(start) = self.comments.iter().position(|c| c.id == comment_id) {
            let base = self.comments[start].depth;
            comments.push(Comment { depth: 0, ..self.comments[start].clone() });
            for c in self.comments[start + 1..].iter().take_while(|c| c.depth > base) {
                comments.push(Comment { depth: c.depth - base, ..c.clone() });
            }
        }
        Thread { comments, ..self.clone() }
    }
}
