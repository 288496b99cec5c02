//! JSONL surface: one JSON object per comment, carrying the thread's
//! identifying fields alongside the comment's own.

use crate::model::{Comment, Thread};
use crate::util::{create_with_backoff, replace_file_atomic_backoff};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// One exported line.
#[derive(Debug, Serialize)]
pub struct JsonlRecord<'a> {
    pub thread_url: &'a str,
    pub thread_title: &'a str,
    pub thread_subreddit: &'a str,
    pub thread_post_id: &'a str,
    #[serde(flatten)]
    pub comment: &'a Comment,
}

impl<'a> JsonlRecord<'a> {
    pub fn new(thread: &'a Thread, comment: &'a Comment) -> Self {
        Self {
            thread_url: thread.url(),
            thread_title: thread.title(),
            thread_subreddit: thread.subreddit(),
            thread_post_id: thread.post_id(),
            comment,
        }
    }
}

/// Write one line per comment of `thread` to `w`. Returns the line count.
pub fn write_thread_jsonl<W: Write>(mut w: W, thread: &Thread) -> Result<usize> {
    for c in thread.comments() {
        serde_json::to_writer(&mut w, &JsonlRecord::new(thread, c))?;
        w.write_all(b"\n")?;
    }
    w.flush()?;
    Ok(thread.comments().len())
}

/// Buffered JSONL file writer on a temp location, promoted on finish.
pub struct JsonlWriter {
    tmp: PathBuf,
    w: Option<BufWriter<File>>,
    lines: usize,
}

impl JsonlWriter {
    pub fn create(final_path: &Path) -> Result<Self> {
        let mut s = final_path.as_os_str().to_os_string();
        s.push(".tmp");
        let tmp = PathBuf::from(s);
        let f = create_with_backoff(&tmp).with_context(|| format!("create {}", tmp.display()))?;
        Ok(Self { tmp, w: Some(BufWriter::with_capacity(256 * 1024, f)), lines: 0 })
    }

    pub fn write_thread(&mut self, thread: &Thread) -> Result<usize> {
        let Some(w) = &mut self.w else { return Ok(0) };
        let n = write_thread_jsonl(w, thread).with_context(|| format!("write {}", self.tmp.display()))?;
        self.lines += n;
        Ok(n)
    }

    /// Flushes and atomically promotes the temp file to `final_path`.
    pub fn finish_atomic(mut self, final_path: &Path) -> Result<usize> {
        if let Some(mut w) = self.w.take() {
            w.flush().with_context(|| format!("flush {}", self.tmp.display()))?;
        }
        replace_file_atomic_backoff(&self.tmp, final_path)?;
        tracing::info!("wrote {} lines to {}", self.lines, final_path.display());
        Ok(self.lines)
    }
}

/// Write `thread` as JSONL to `path` through a temp file.
pub fn write_thread_jsonl_to_path(path: &Path, thread: &Thread) -> Result<usize> {
    let mut w = JsonlWriter::create(path)?;
    w.write_thread(thread)?;
    w.finish_atomic(path)
}
