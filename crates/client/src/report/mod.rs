//! Report API client.
//!
//! Fetches single pages of a remote report as JSON and implements
//! [`RecordSource`] so the core paginator can drive it.
//!
//! ### Wire format
//!
//! - **Endpoint**: `GET {base_url}/report/{report_name}?max_records=N`
//! - **Authentication**: `Authorization: <scheme> <token>` when a token is set.
//! - **Pagination**: the cursor goes out in the `record_cursor` request header;
//!   a `record_cursor` response header is folded into the body.
//! - **Rate Limiting**: one request per configured interval, shared by every
//!   clone of the client.

pub mod error;
pub mod request;
pub mod response;

pub use error::ReportError;
pub use request::{CURSOR_HEADER, MAX_RECORDS_LIMIT};

use async_trait::async_trait;
use fieldmap_core::{AppConfig, FetchError, PageRequest, RecordSource};
use reqwest::header;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "fieldmap/0.1";

/// Default authorization scheme.
const DEFAULT_AUTH_SCHEME: &str = "Zoho-oauthtoken";

/// Minimum interval between requests.
const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(250);

/// Report client configuration.
#[derive(Clone)]
pub struct ReportConfig {
    /// API base URL, e.g. `https://host/api/v2/owner/app`.
    pub base_url: String,
    /// Access token; requests go out unauthenticated when `None`.
    pub token: Option<String>,
    /// Scheme placed before the token in the Authorization header.
    pub auth_scheme: String,
    /// Per-request timeout (default: 20s).
    pub timeout: Duration,
    /// User-agent string (default: fieldmap/0.x).
    pub user_agent: String,
    /// Minimum spacing between requests (default: 250ms).
    pub min_interval: Duration,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: None,
            auth_scheme: DEFAULT_AUTH_SCHEME.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            min_interval: MIN_REQUEST_INTERVAL,
        }
    }
}

impl fmt::Debug for ReportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("auth_scheme", &self.auth_scheme)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("min_interval", &self.min_interval)
            .finish()
    }
}

impl ReportConfig {
    /// Build from the application configuration.
    ///
    /// Returns `ReportError::MissingBaseUrl` if no base URL is configured.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ReportError> {
        let base_url = config.require_api_base_url().map_err(|_| ReportError::MissingBaseUrl)?;

        Ok(Self {
            base_url: base_url.to_string(),
            token: config.api_token.clone().filter(|t| !t.trim().is_empty()),
            auth_scheme: config.auth_scheme.clone(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
            ..Default::default()
        })
    }

    /// Authorization header value, if a token is configured.
    pub fn authorization(&self) -> Option<String> {
        let token = self.token.as_deref()?;
        match self.auth_scheme.as_str() {
            "" => Some(token.to_string()),
            scheme => Some(format!("{scheme} {token}")),
        }
    }
}

/// Rate limiter to enforce request intervals.
#[derive(Debug)]
struct RateLimiter {
    last_request: Mutex<Instant>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(Instant::now().checked_sub(min_interval).unwrap_or_else(Instant::now)),
            min_interval,
        }
    }

    /// Acquire permission to make a request, waiting if necessary.
    async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();
        if elapsed < self.min_interval {
            tokio::time::sleep(self.min_interval - elapsed).await;
        }
        *last = Instant::now();
    }
}

/// Report API client.
#[derive(Debug, Clone)]
pub struct ReportClient {
    http: reqwest::Client,
    config: ReportConfig,
    rate_limiter: Arc<RateLimiter>,
}

impl ReportClient {
    /// Create a new report client with the given configuration.
    pub fn new(config: ReportConfig) -> Result<Self, ReportError> {
        if config.base_url.trim().is_empty() {
            return Err(ReportError::MissingBaseUrl);
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| ReportError::Network(Arc::new(e)))?;

        let rate_limiter = Arc::new(RateLimiter::new(config.min_interval));
        Ok(Self { http, config, rate_limiter })
    }

    /// Create a new report client from the application configuration.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, ReportError> {
        Self::new(ReportConfig::from_app_config(config)?)
    }

    /// Fetch one page of a report.
    ///
    /// This method handles rate limiting, request validation and cursor
    /// folding. The returned body still has the remote shape; record and
    /// cursor extraction happen in the core paginator.
    pub async fn fetch_report_page(&self, req: &PageRequest) -> Result<Value, ReportError> {
        let url = request::report_url(&self.config.base_url, req)?;

        self.rate_limiter.acquire().await;

        let start = Instant::now();
        tracing::debug!(report = %req.report_name, page = req.page, "fetching report page");

        let mut builder = self
            .http
            .get(url)
            .header(header::ACCEPT, "application/json")
            .header(header::USER_AGENT, &self.config.user_agent);

        if let Some(authorization) = self.config.authorization() {
            builder = builder.header(header::AUTHORIZATION, authorization);
        }

        if let Some(cursor) = &req.cursor {
            builder = builder.header(CURSOR_HEADER, cursor);
        }

        let http_response = builder.send().await?;

        let status = http_response.status();
        let cursor = http_response
            .headers()
            .get(CURSOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        tracing::debug!("report API response status: {}", status);

        let bytes = http_response.bytes().await?;
        let page = response::decode_page(status, cursor.as_deref(), &bytes)?;

        tracing::debug!(
            report = %req.report_name,
            page = req.page,
            "page fetched in {:?}, {} bytes",
            start.elapsed(),
            bytes.len()
        );

        Ok(page)
    }
}

#[async_trait]
impl RecordSource for ReportClient {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Value, FetchError> {
        self.fetch_report_page(request)
            .await
            .map_err(|e| e.into_fetch_error(request.page))
    }
}
