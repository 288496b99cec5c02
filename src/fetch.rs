//! Fetcher: thread URL in, raw `[post_listing, comment_listing]` JSON out.
//!
//! `HttpFetcher` keeps one pooled blocking client, rotates the user agent per
//! request and spaces requests by a randomized delay. The spacing lock is
//! shared by every thread using the same fetcher, so parallel batch runs
//! still go out one at a time.

use crate::config::HarvestOptions;
use crate::error::FetchError;
use crate::urls::json_endpoint;
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};

/// Source of raw thread documents.
pub trait Fetch: Sync {
    fn fetch(&self, url: &str) -> Result<Value, FetchError>;
}

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
];

const DEFAULT_HEADERS: &[(&str, &str)] = &[
    ("accept", "application/json,text/html;q=0.9,*/*;q=0.8"),
    ("accept-language", "en-US,en;q=0.9"),
    ("dnt", "1"),
    ("sec-fetch-dest", "document"),
    ("sec-fetch-mode", "navigate"),
    ("sec-fetch-site", "none"),
];

pub struct HttpFetcher {
    client: Client,
    delay: bool,
    min_delay: Duration,
    max_delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl HttpFetcher {
    pub fn new(opts: &HarvestOptions) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        for (k, v) in DEFAULT_HEADERS {
            headers.insert(HeaderName::from_static(*k), HeaderValue::from_static(*v));
        }

        let mut builder = Client::builder().timeout(opts.timeout).default_headers(headers);
        if let Some(p) = &opts.proxy_http {
            builder = builder.proxy(reqwest::Proxy::http(p)?);
        }
        if let Some(p) = &opts.proxy_https {
            builder = builder.proxy(reqwest::Proxy::https(p)?);
        }

        Ok(Self {
            client: builder.build()?,
            delay: opts.delay,
            min_delay: opts.min_delay,
            max_delay: opts.max_delay,
            last_request: Mutex::new(None),
        })
    }

    /// Wait until a freshly drawn delay has passed since the previous request.
    /// The lock is held while sleeping, which serializes concurrent callers.
    fn pace(&self) {
        let mut last = self.last_request.lock();
        if self.delay {
            if let Some(prev) = *last {
                let target = if self.max_delay > self.min_delay {
                    rand::thread_rng().gen_range(self.min_delay..=self.max_delay)
                } else {
                    self.min_delay
                };
                let elapsed = prev.elapsed();
                if elapsed < target {
                    let wait = target - elapsed;
                    tracing::trace!("pacing request for {:?}", wait);
                    std::thread::sleep(wait);
                }
            }
        }
        *last = Some(Instant::now());
    }

    fn pick_user_agent() -> &'static str {
        USER_AGENTS.choose(&mut rand::thread_rng()).copied().unwrap_or(USER_AGENTS[0])
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Value, FetchError> {
        let endpoint = json_endpoint(url)?;
        self.pace();

        tracing::debug!("GET {}", endpoint);
        let resp = self
            .client
            .get(&endpoint)
            .header(USER_AGENT, Self::pick_user_agent())
            .send()
            .map_err(|e| {
                tracing::warn!("GET {} failed: {}", endpoint, e);
                FetchError::from(e)
            })?;

        let status = resp.status();
        if status.as_u16() == 429 {
            tracing::warn!("GET {} rate limited", endpoint);
            return Err(FetchError::RateLimited);
        }
        if !status.is_success() {
            tracing::warn!("GET {} returned {}", endpoint, status);
            return Err(FetchError::Status(status.as_u16()));
        }

        let text = resp.text()?;
        decode_document(&text)
    }
}

/// Parse a response body into a JSON value.
///
/// Each reply level nests several JSON levels deep, so long reply chains
/// exceed serde_json's default recursion limit. The limit is lifted and
/// the parser grows its stack on the heap as needed.
pub fn decode_document(text: &str) -> Result<Value, FetchError> {
    let mut de = serde_json::Deserializer::from_str(text);
    de.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut de))
        .map_err(|e| FetchError::Decode(e.to_string()))?;
    de.end().map_err(|e| FetchError::Decode(e.to_string()))?;
    Ok(value)
}
