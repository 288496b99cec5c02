use crate::json_utils::{data_of, kind_of};
use serde_json::Value;

/// Classification of a raw reply-tree node, decided once per node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind<'a> {
    /// A `t1` node with a `data` mapping; carries user content.
    Comment(&'a Value),
    /// "Load more replies" continuation marker; only further ids, no content.
    More,
    /// Missing or unexpected kind, or a `t1` without usable data.
    Unrecognized,
}

impl<'a> NodeKind<'a> {
    pub fn classify(node: &'a Value) -> Self {
        match kind_of(node) {
            Some("t1") => match data_of(node) {
                Some(data) => NodeKind::Comment(data),
                None => NodeKind::Unrecognized,
            },
            Some("more") => NodeKind::More,
            _ => NodeKind::Unrecognized,
        }
    }
}
