//! CSV surface: one row per comment with the post fields repeated, plus the
//! readers used by batch runs (input URL column, URLs already exported).

use crate::harvester::BatchFailure;
use crate::model::Thread;
use crate::util::{create_with_backoff, replace_file_atomic_backoff};
use ahash::AHashSet;
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Output column order.
pub const CSV_HEADER: [&str; 11] = [
    "url",
    "title",
    "subreddit",
    "post_id",
    "author",
    "post_score",
    "num_comments",
    "comment_author",
    "comment_body",
    "comment_score",
    "comment_depth",
];

/// One exported row. Field order matches `CSV_HEADER`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvRow<'a> {
    pub url: &'a str,
    pub title: &'a str,
    pub subreddit: &'a str,
    pub post_id: &'a str,
    pub author: &'a str,
    pub post_score: i64,
    pub num_comments: i64,
    pub comment_author: &'a str,
    pub comment_body: &'a str,
    pub comment_score: i64,
    pub comment_depth: usize,
}

/// Rows for one thread, in comment order. No comments, no rows.
pub fn thread_rows(thread: &Thread) -> Vec<CsvRow<'_>> {
    thread
        .comments()
        .iter()
        .map(|c| CsvRow {
            url: thread.url(),
            title: thread.title(),
            subreddit: thread.subreddit(),
            post_id: thread.post_id(),
            author: thread.author(),
            post_score: thread.score(),
            num_comments: thread.num_comments(),
            comment_author: c.author(),
            comment_body: c.body(),
            comment_score: c.score(),
            comment_depth: c.depth(),
        })
        .collect()
}

/// Write the header and every thread's rows to `w`. Returns the row count.
pub fn write_threads<W: Write>(w: W, threads: &[Thread]) -> Result<usize> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(w);
    wtr.write_record(CSV_HEADER)?;
    let mut rows = 0usize;
    for t in threads {
        for row in thread_rows(t) {
            wtr.serialize(row)?;
            rows += 1;
        }
    }
    wtr.flush()?;
    Ok(rows)
}

/// Write threads to `path` through a sibling temp file, then swap it into place.
pub fn write_threads_to_path(path: &Path, threads: &[Thread]) -> Result<usize> {
    let tmp = tmp_path_for(path);
    let rows = {
        let f = create_with_backoff(&tmp).with_context(|| format!("create {}", tmp.display()))?;
        let mut w = BufWriter::with_capacity(256 * 1024, f);
        let rows = write_threads(&mut w, threads)?;
        w.flush().with_context(|| format!("flush {}", tmp.display()))?;
        rows
    };
    replace_file_atomic_backoff(&tmp, path)?;
    tracing::info!("wrote {} rows to {}", rows, path.display());
    Ok(rows)
}

/// Append threads' rows to `path`, writing the header first if the file is new or empty.
/// Used for checkpoints: each call leaves a complete, readable CSV behind.
pub fn append_threads_to_path(path: &Path, threads: &[Thread]) -> Result<usize> {
    let fresh = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open {} for append", path.display()))?;

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(BufWriter::new(f));
    if fresh {
        wtr.write_record(CSV_HEADER)?;
    }
    let mut rows = 0usize;
    for t in threads {
        for row in thread_rows(t) {
            wtr.serialize(row)?;
            rows += 1;
        }
    }
    wtr.flush().with_context(|| format!("flush {}", path.display()))?;
    Ok(rows)
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(".tmp");
    PathBuf::from(s)
}

/// Non-blank values of `column` from a CSV with a header row, in file order.
pub fn read_url_column(path: &Path, column: &str) -> Result<Vec<String>> {
    Ok(read_url_rows(path, column)?.into_iter().map(|(_, url)| url).collect())
}

/// Like `read_url_column`, paired with each value's 0-based data row
/// (header excluded, blank rows still counted).
pub fn read_url_rows(path: &Path, column: &str) -> Result<Vec<(usize, String)>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("open {}", path.display()))?;

    let headers = rdr.headers()?.clone();
    let idx = headers.iter().position(|h| h.trim() == column).ok_or_else(|| {
        anyhow!(
            "column '{}' not found in {}. Columns: {:?}",
            column,
            path.display(),
            headers.iter().collect::<Vec<_>>()
        )
    })?;

    let mut urls = Vec::new();
    for (row, rec) in rdr.records().enumerate() {
        let rec = rec.with_context(|| format!("read {}", path.display()))?;
        if let Some(v) = rec.get(idx).map(str::trim) {
            if !v.is_empty() {
                urls.push((row, v.to_string()));
            }
        }
    }
    Ok(urls)
}

/// Columns of the failure log kept next to a CSV run's output.
pub const FAILURE_HEADER: [&str; 3] = ["url", "index", "error"];

/// Append failures to the log at `path`, header first when the file is new.
/// Nothing is touched when there is nothing to record.
pub fn append_failures_to_path<'a, I>(path: &Path, failures: I) -> Result<usize>
where
    I: IntoIterator<Item = &'a BatchFailure>,
{
    let mut failures = failures.into_iter().peekable();
    if failures.peek().is_none() {
        return Ok(0);
    }
    let fresh = std::fs::metadata(path).map(|m| m.len() == 0).unwrap_or(true);
    let f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open {} for append", path.display()))?;

    let mut wtr = csv::WriterBuilder::new().from_writer(BufWriter::new(f));
    if fresh {
        wtr.write_record(FAILURE_HEADER)?;
    }
    let mut n = 0usize;
    for fail in failures {
        let index = fail.index.to_string();
        wtr.write_record([fail.url.as_str(), index.as_str(), fail.error.as_str()])?;
        n += 1;
    }
    wtr.flush().with_context(|| format!("flush {}", path.display()))?;
    Ok(n)
}

/// Distinct `url` values of an earlier export. A missing or empty file gives an empty set.
pub fn read_done_urls(path: &Path) -> Result<AHashSet<String>> {
    match std::fs::metadata(path) {
        Ok(m) if m.len() > 0 => {}
        _ => return Ok(AHashSet::new()),
    }
    Ok(read_url_column(path, CSV_HEADER[0])?.into_iter().collect())
}
