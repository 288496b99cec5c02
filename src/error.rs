//! Error types: the single whole-document normalizer failure, plus the
//! transport taxonomy reported by fetchers.

use std::fmt;

/// The only failure the normalizer raises.
/// Node-level problems are absorbed by defaults and never reach this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// Top-level shape is not `[post_listing, comment_listing]`, or the post
    /// listing carries no first entry.
    MalformedDocument(String),
}

impl fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizeError::MalformedDocument(why) => write!(f, "malformed thread document: {why}"),
        }
    }
}

impl std::error::Error for NormalizeError {}

/// Transport-level failure while fetching a thread document.
#[derive(Debug)]
pub enum FetchError {
    /// The request did not complete within the configured timeout.
    Timeout,
    /// Connection could not be established (DNS, TLS, refused, proxy).
    Connection(String),
    /// Server answered 429 Too Many Requests.
    RateLimited,
    /// Any other non-2xx status.
    Status(u16),
    /// Body was not valid JSON.
    Decode(String),
    /// The thread URL could not be turned into a fetchable endpoint.
    InvalidUrl(String),
}

impl FetchError {
    /// True for failures worth retrying later (timeouts, 429s, 5xx).
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout | FetchError::RateLimited | FetchError::Connection(_) => true,
            FetchError::Status(code) => *code >= 500,
            FetchError::Decode(_) | FetchError::InvalidUrl(_) => false,
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Timeout => write!(f, "request timed out"),
            FetchError::Connection(e) => write!(f, "connection failed: {e}"),
            FetchError::RateLimited => write!(f, "rate limited (HTTP 429)"),
            FetchError::Status(code) => write!(f, "unexpected HTTP status {code}"),
            FetchError::Decode(e) => write!(f, "response was not valid JSON: {e}"),
            FetchError::InvalidUrl(u) => write!(f, "invalid thread URL: {u}"),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            if status.as_u16() == 429 {
                FetchError::RateLimited
            } else {
                FetchError::Status(status.as_u16())
            }
        } else if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Connection(err.to_string())
        }
    }
}

impl From<url::ParseError> for FetchError {
    fn from(err: url::ParseError) -> Self {
        FetchError::InvalidUrl(err.to_string())
    }
}
