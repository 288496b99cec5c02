use std::time::Duration;

/// How comment and post creation times are rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TimestampStyle {
    /// The platform value, stringified (`1700000000.0` becomes `"1700000000"`).
    #[default]
    Raw,
    /// RFC 3339 UTC, e.g. `2023-11-14T22:13:20Z`.
    Rfc3339,
}

/// User-facing options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct HarvestOptions {
    pub timeout: Duration,
    pub delay: bool,                    // randomized spacing between requests
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub proxy_http: Option<String>,
    pub proxy_https: Option<String>,

    pub skip_errors: bool,              // record failing URLs and keep going
    pub parallelism: Option<usize>,     // Some(N) to set rayon threads, None to use default
    pub concurrency: usize,             // URLs in flight per step
    pub progress: bool,                 // show progress bar
    pub progress_label: Option<String>, // optional label for progress bar

    // CSV batch runs
    pub url_column: String,
    pub batch_size: usize,              // URLs between checkpoint writes

    pub focus_comment_links: bool,      // comment permalinks keep only that subtree
    pub timestamps: TimestampStyle,
}

impl Default for HarvestOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            delay: true,
            min_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(6),
            proxy_http: None,
            proxy_https: None,

            skip_errors: true,
            parallelism: None,
            concurrency: 1, // one request at a time keeps well under rate limits
            progress: true,
            progress_label: None,

            url_column: "URL".to_string(),
            batch_size: 50,

            focus_comment_links: false,
            timestamps: TimestampStyle::Raw,
        }
    }
}

impl HarvestOptions {
    /// Defaults, overridden by `RHARVEST_*` environment variables when set:
    /// - RHARVEST_TIMEOUT_SECS: request timeout in seconds
    /// - RHARVEST_NO_DELAY: any non-empty value other than `0` disables spacing
    /// - RHARVEST_HTTP_PROXY / RHARVEST_HTTPS_PROXY: proxy URLs
    pub fn from_env() -> Self {
        let mut opts = Self::default();
        if let Ok(s) = std::env::var("RHARVEST_TIMEOUT_SECS") {
            match s.trim().parse::<f64>() {
                Ok(secs) if secs.is_finite() && secs > 0.0 => opts.timeout = Duration::from_secs_f64(secs),
                _ => tracing::warn!("ignoring RHARVEST_TIMEOUT_SECS={s:?}: expected positive seconds"),
            }
        }
        if let Ok(s) = std::env::var("RHARVEST_NO_DELAY") {
            let s = s.trim();
            if !s.is_empty() && s != "0" {
                opts.delay = false;
            }
        }
        if let Ok(p) = std::env::var("RHARVEST_HTTP_PROXY") {
            if !p.trim().is_empty() { opts.proxy_http = Some(p.trim().to_string()); }
        }
        if let Ok(p) = std::env::var("RHARVEST_HTTPS_PROXY") {
            if !p.trim().is_empty() { opts.proxy_https = Some(p.trim().to_string()); }
        }
        opts
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
    pub fn with_delay(mut self, yes: bool) -> Self {
        self.delay = yes;
        self
    }
    /// Bounds for the randomized spacing; swapped if given in the wrong order.
    pub fn with_delay_range(mut self, min: Duration, max: Duration) -> Self {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        self.min_delay = lo;
        self.max_delay = hi;
        self
    }
    pub fn with_proxies(mut self, http: Option<String>, https: Option<String>) -> Self {
        self.proxy_http = http;
        self.proxy_https = https;
        self
    }
    pub fn with_skip_errors(mut self, yes: bool) -> Self {
        self.skip_errors = yes;
        self
    }
    pub fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads);
        self
    }
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_progress_label(mut self, label: impl Into<String>) -> Self {
        self.progress_label = Some(label.into());
        self
    }
    pub fn with_url_column(mut self, column: impl Into<String>) -> Self {
        self.url_column = column.into();
        self
    }
    pub fn with_batch_size(mut self, n: usize) -> Self {
        self.batch_size = n.max(1);
        self
    }
    pub fn with_focus_comment_links(mut self, yes: bool) -> Self {
        self.focus_comment_links = yes;
        self
    }
    pub fn with_timestamps(mut self, style: TimestampStyle) -> Self {
        self.timestamps = style;
        self
    }
}
