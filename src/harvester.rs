//! Batch orchestration: single-URL scrapes, URL lists with skip-on-error, and
//! checkpointed CSV-to-CSV runs that resume after interruption.

use crate::concurrency::map_limited;
use crate::config::{HarvestOptions, TimestampStyle};
use crate::csv_export::{append_failures_to_path, append_threads_to_path, read_done_urls, read_url_rows};
use crate::error::{FetchError, NormalizeError};
use crate::fetch::{Fetch, HttpFetcher};
use crate::model::Thread;
use crate::normalize::normalize_with;
use crate::progress::maybe_count_progress;
use crate::urls::{comment_id, parse_thread_url};
use crate::util::{init_tracing_once, replace_file_atomic_backoff};
use ahash::AHashSet;
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use serde_json::Value;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

pub struct Harvester<F: Fetch = HttpFetcher> {
    pub(crate) opts: HarvestOptions,
    fetcher: F,
}

/// One URL that could not be turned into a thread.
#[derive(Clone, Debug)]
pub struct BatchFailure {
    /// 0-based position in the input: list position for `scrape_batch`,
    /// data row (header excluded) for `scrape_csv`.
    pub index: usize,
    pub url: String,
    pub error: String,
    /// Retrying will not help: a 4xx other than 429, an unusable URL or body,
    /// or a malformed document.
    pub permanent: bool,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    /// Scraped threads in input order. Left empty by CSV runs, which stream to disk.
    pub threads: Vec<Thread>,
    pub succeeded: usize,
    pub failures: Vec<BatchFailure>,
    /// Inputs not fetched: duplicates, already in the checkpoint, or logged
    /// as permanent failures by an earlier run.
    pub skipped: usize,
    pub rows_written: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded + self.failures.len() + self.skipped
    }

    pub fn summary(&self) -> String {
        let attempted = (self.succeeded + self.failures.len()).max(1);
        let pct = 100.0 * self.succeeded as f64 / attempted as f64;
        let mut s = String::new();
        let _ = writeln!(s, "Total URLs:    {}", self.total());
        let _ = writeln!(s, "Successful:    {} ({:.1}%)", self.succeeded, pct);
        let _ = writeln!(s, "Failed:        {}", self.failures.len());
        let _ = writeln!(s, "Skipped:       {}", self.skipped);
        let _ = writeln!(s, "Rows written:  {}", self.rows_written);
        if !self.failures.is_empty() {
            let _ = writeln!(s, "First errors:");
            for f in self.failures.iter().take(10) {
                let _ = writeln!(s, "  #{} {}: {}", f.index, f.url, f.error);
            }
        }
        s
    }

    fn absorb(&mut self, other: BatchReport) {
        self.succeeded += other.succeeded;
        self.rows_written += other.rows_written;
        self.threads.extend(other.threads);
        self.failures.extend(other.failures);
    }
}

impl Harvester<HttpFetcher> {
    /// Harvester over HTTP with default options.
    pub fn new() -> Result<Self> {
        Self::from_options(HarvestOptions::default())
    }

    /// Transport settings (timeout, delay, proxies) are fixed here.
    pub fn from_options(opts: HarvestOptions) -> Result<Self> {
        let fetcher = HttpFetcher::new(&opts).context("building HTTP client")?;
        Ok(Self { opts, fetcher })
    }
}

impl<F: Fetch> Harvester<F> {
    pub fn with_fetcher(opts: HarvestOptions, fetcher: F) -> Self {
        Self { opts, fetcher }
    }

    pub fn options(&self) -> &HarvestOptions { &self.opts }
    pub fn fetcher(&self) -> &F { &self.fetcher }

    // -------- Builder methods --------
    pub fn skip_errors(mut self, yes: bool) -> Self { self.opts = self.opts.with_skip_errors(yes); self }
    pub fn parallelism(mut self, threads: usize) -> Self { self.opts = self.opts.with_parallelism(threads); self }
    pub fn concurrency(mut self, n: usize) -> Self { self.opts = self.opts.with_concurrency(n); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }
    pub fn progress_label(mut self, label: impl Into<String>) -> Self { self.opts = self.opts.with_progress_label(label); self }
    pub fn url_column(mut self, column: impl Into<String>) -> Self { self.opts = self.opts.with_url_column(column); self }
    pub fn batch_size(mut self, n: usize) -> Self { self.opts = self.opts.with_batch_size(n); self }
    pub fn focus_comment_links(mut self, yes: bool) -> Self { self.opts = self.opts.with_focus_comment_links(yes); self }
    pub fn timestamps(mut self, style: TimestampStyle) -> Self { self.opts = self.opts.with_timestamps(style); self }

    // -------- Single thread --------

    /// Raw `[post_listing, comment_listing]` document for `url`.
    pub fn scrape_raw(&self, url: &str) -> Result<Value> {
        let url = url.trim();
        parse_thread_url(url)?;
        Ok(self.fetcher.fetch(url).with_context(|| format!("fetch {url}"))?)
    }

    /// Fetch and normalize one thread. The thread's `url` is the input URL.
    pub fn scrape(&self, url: &str) -> Result<Thread> {
        let url = url.trim();
        let raw = self.scrape_raw(url)?;
        let mut thread = normalize_with(&raw, self.opts.timestamps).with_context(|| format!("normalize {url}"))?;
        thread.url = url.to_string();

        if self.opts.focus_comment_links {
            if let Some(cid) = comment_id(url) {
                let focused = thread.focused(&cid);
                if focused.comments.is_empty() {
                    tracing::warn!("comment {} not present in {}", cid, url);
                }
                thread = focused;
            }
        }
        Ok(thread)
    }

    // -------- Batches --------

    /// Scrape every URL in order. Failures are recorded and skipped when
    /// `skip_errors` is on; otherwise the first failure aborts the batch.
    pub fn scrape_batch<S: AsRef<str>>(&self, urls: &[S]) -> Result<BatchReport> {
        self.init_runtime();
        let items: Vec<(usize, &str)> = urls.iter().map(AsRef::as_ref).enumerate().collect();
        let pb = maybe_count_progress(self.opts.progress, items.len() as u64, self.opts.progress_label.as_deref());
        let report = self.run_batch(&items, pb.as_ref());
        if let Some(pb) = pb {
            pb.finish_with_message("done");
        }
        report
    }

    /// Read URLs from the configured column of `input`, scrape them, and write
    /// comment rows to `output`.
    ///
    /// Progress is checkpointed to `<output>.partial` every `batch_size` URLs.
    /// A rerun picks up the checkpoint and skips URLs already in it; the
    /// checkpoint is promoted to `output` when the run completes.
    ///
    /// Permanent failures are logged to `<output>.errors.csv` and not retried
    /// by later runs; delete that file to retry them. Transient failures
    /// (timeouts, 429s, 5xx) are retried on every rerun.
    pub fn scrape_csv(&self, input: &Path, output: &Path) -> Result<BatchReport> {
        self.init_runtime();
        let rows = read_url_rows(input, &self.opts.url_column)?;
        let partial = partial_path_for(output);
        let errors = errors_path_for(output);

        // A finished output from an earlier run seeds the checkpoint.
        if !partial.exists() && output.exists() && output != input {
            std::fs::copy(output, &partial)
                .with_context(|| format!("copy {} -> {}", output.display(), partial.display()))?;
            tracing::info!("Found completed output: resuming from {}", output.display());
        }

        let mut done = read_done_urls(&partial)?;
        if done.is_empty() {
            tracing::info!("Starting fresh from: {}", input.display());
        } else {
            tracing::info!("Found checkpoint: resuming from {} ({} URLs done)", partial.display(), done.len());
        }
        let failed_before = read_done_urls(&errors)?;
        if !failed_before.is_empty() {
            tracing::info!("Skipping {} URLs logged as failed in {}", failed_before.len(), errors.display());
            done.extend(failed_before);
        }

        let mut seen: AHashSet<&str> = AHashSet::with_capacity(rows.len());
        let pending: Vec<(usize, &str)> = rows
            .iter()
            .map(|(row, url)| (*row, url.as_str()))
            .filter(|&(_, url)| !done.contains(url) && seen.insert(url))
            .collect();

        let mut report = BatchReport { skipped: rows.len() - pending.len(), ..Default::default() };
        append_threads_to_path(&partial, &[])?;

        let batches: Vec<&[(usize, &str)]> = pending.chunks(self.opts.batch_size.max(1)).collect();
        let total_batches = batches.len();
        tracing::info!("Found {} URLs, {} pending in {} batch(es)", rows.len(), pending.len(), total_batches);

        let pb = maybe_count_progress(self.opts.progress, pending.len() as u64, self.opts.progress_label.as_deref());
        for (n, batch) in batches.into_iter().enumerate() {
            let mut part = self.run_batch(batch, pb.as_ref())?;
            part.rows_written = append_threads_to_path(&partial, &part.threads)?;
            part.threads.clear();
            append_failures_to_path(&errors, part.failures.iter().filter(|f| f.permanent))?;
            tracing::info!(
                "[CHECKPOINT] Batch {}/{}: wrote {} rows to {}",
                n + 1,
                total_batches,
                part.rows_written,
                partial.display()
            );
            report.absorb(part);
        }
        if let Some(pb) = pb {
            pb.finish_with_message("done");
        }

        replace_file_atomic_backoff(&partial, output)?;
        tracing::info!("[DONE] Final output written to: {}", output.display());
        Ok(report)
    }

    fn init_runtime(&self) {
        init_tracing_once();
        if let Some(n) = self.opts.parallelism {
            if n > 0 {
                // The global pool can only be built once per process; later calls are no-ops.
                rayon::ThreadPoolBuilder::new().num_threads(n).build_global().ok();
            }
        }
    }

    /// Scrape `(input index, url)` pairs with at most `concurrency` in flight.
    fn run_batch(&self, items: &[(usize, &str)], pb: Option<&ProgressBar>) -> Result<BatchReport> {
        let results = map_limited(items, self.opts.concurrency.max(1), |&(_, url)| {
            let r = self.scrape(url);
            if let Some(pb) = pb { pb.inc(1); }
            r
        });

        let mut report = BatchReport::default();
        for (&(index, url), res) in items.iter().zip(results) {
            let url = url.trim();
            match res {
                Ok(thread) => {
                    tracing::info!("[OK] {}: {} comments", url, thread.comments.len());
                    report.succeeded += 1;
                    report.threads.push(thread);
                }
                Err(e) if self.opts.skip_errors => {
                    tracing::error!("[ERROR] #{} {}: {:#}", index, url, e);
                    report.failures.push(BatchFailure {
                        index,
                        url: url.to_string(),
                        error: format!("{e:#}"),
                        permanent: is_permanent(&e),
                    });
                }
                Err(e) => return Err(e.context(format!("URL #{index} failed; aborting batch"))),
            }
        }
        Ok(report)
    }
}

/// Fetch errors are permanent unless transient; a malformed document is
/// always permanent. Anything else is treated as worth retrying.
fn is_permanent(err: &anyhow::Error) -> bool {
    if let Some(fetch) = err.downcast_ref::<FetchError>() {
        return !fetch.is_transient();
    }
    err.downcast_ref::<NormalizeError>().is_some()
}

fn errors_path_for(output: &Path) -> PathBuf {
    let mut s = output.as_os_str().to_os_string();
    s.push(".errors.csv");
    PathBuf::from(s)
}

fn partial_path_for(output: &Path) -> PathBuf {
    let mut s = output.as_os_str().to_os_string();
    s.push(".partial");
    PathBuf::from(s)
}
