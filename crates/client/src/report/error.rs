//! Report API client error types.

use std::sync::Arc;

use fieldmap_core::FetchError;

/// Errors from the report API client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ReportError {
    /// No base URL configured.
    #[error("missing base URL: FIELDMAP_API_BASE_URL not set")]
    MissingBaseUrl,

    /// Base URL or report name does not form a valid URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid page request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication failed (missing or expired token).
    #[error("authentication failed: status {status}")]
    AuthError { status: u16 },

    /// Rate limited by the report API.
    #[error("rate limited: too many requests")]
    RateLimited,

    /// HTTP error response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ReportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { ReportError::Timeout } else { ReportError::Network(Arc::new(err)) }
    }
}

impl ReportError {
    /// Convert into the source-agnostic fetch error, tagging timeouts with
    /// the page they happened on.
    pub fn into_fetch_error(self, page: usize) -> FetchError {
        match self {
            ReportError::MissingBaseUrl | ReportError::InvalidUrl(_) | ReportError::InvalidRequest(_) => {
                FetchError::Config(self.to_string())
            }
            ReportError::AuthError { .. } => FetchError::Auth(self.to_string()),
            ReportError::RateLimited => FetchError::RateLimited,
            ReportError::HttpError { status } => FetchError::Http { status },
            ReportError::Timeout => FetchError::Timeout { page },
            ReportError::Network(e) => FetchError::Network(e.to_string()),
            ReportError::Parse(msg) => FetchError::Parse(msg),
        }
    }
}
