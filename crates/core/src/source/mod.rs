//! Remote record source seam.
//!
//! The core never talks HTTP itself. Anything that can hand back one page of a
//! report as JSON implements [`RecordSource`]; the paginator in
//! [`pagination`] walks the pages and the shape sniffing lives in [`extract`].

pub mod extract;
pub mod pagination;

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use serde_json::{Map, Value};

pub use pagination::{PaginationOptions, fetch_all_pages};

/// A raw record as returned by the remote API.
pub type RawRecord = Map<String, Value>;

/// Request for a single page of a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Report (table) name on the remote side.
    pub report_name: String,
    /// 1-based page number within the current walk.
    pub page: usize,
    /// Page size cap.
    pub max_records: u32,
    /// Continuation cursor from the previous page, if any.
    pub cursor: Option<String>,
}

/// Errors from fetching pages off the remote record source.
///
/// `Clone` because a single in-flight sync hands its outcome to every waiter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// Page fetch exceeded the per-page timeout.
    #[error("FETCH_TIMEOUT: page {page} timed out")]
    Timeout { page: usize },

    /// Transport-level failure.
    #[error("FETCH_NETWORK: {0}")]
    Network(String),

    /// Non-success HTTP status.
    #[error("HTTP_ERROR: status {status}")]
    Http { status: u16 },

    /// Authentication rejected by the remote API.
    #[error("FETCH_AUTH: {0}")]
    Auth(String),

    /// Remote API rate limited the request.
    #[error("FETCH_RATE_LIMITED")]
    RateLimited,

    /// Response body could not be understood.
    #[error("FETCH_PARSE: {0}")]
    Parse(String),

    /// Source is not configured (e.g., missing base URL).
    #[error("FETCH_CONFIG: {0}")]
    Config(String),
}

/// A paginated record API keyed by report name.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch one page. The returned value is the raw response body; records
    /// and cursor are pulled out of it by [`extract`].
    async fn fetch_page(&self, request: &PageRequest) -> Result<Value, FetchError>;
}
