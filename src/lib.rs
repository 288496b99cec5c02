mod config;
mod error;
mod json_utils;
mod model;
mod node;
mod normalize;

mod urls;
mod fetch;
mod csv_export;
mod jsonl_export;

mod concurrency;
mod progress;
mod util;
mod harvester;

pub use crate::config::{HarvestOptions, TimestampStyle};
pub use crate::error::{FetchError, NormalizeError};
pub use crate::model::{Comment, Thread};
pub use crate::node::NodeKind;
pub use crate::normalize::{normalize, normalize_with};

// Sentinel handling, for callers post-processing raw documents themselves.
pub use crate::json_utils::{is_gone_sentinel, DELETED_AUTHOR};

// export URL helpers
pub use crate::urls::{comment_id, json_endpoint, parse_thread_url, post_id};

// export fetcher abstraction and the HTTP implementation
pub use crate::fetch::{decode_document, Fetch, HttpFetcher};

// export CSV surface
pub use crate::csv_export::{
    append_failures_to_path, append_threads_to_path, read_done_urls, read_url_column, read_url_rows, thread_rows,
    write_threads, write_threads_to_path, CsvRow, CSV_HEADER, FAILURE_HEADER,
};

// export JSONL surface
pub use crate::jsonl_export::{write_thread_jsonl, write_thread_jsonl_to_path, JsonlRecord, JsonlWriter};

pub use crate::harvester::{BatchFailure, BatchReport, Harvester};

pub use crate::util::init_tracing_once;
