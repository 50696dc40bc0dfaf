//! Cursor pagination over a [`RecordSource`].
//!
//! Pages are requested until one comes back empty, no cursor is found, or
//! the page cap is hit. Records from every page are accumulated and only
//! returned once the walk is complete; a failure on any page discards the lot.

use std::time::{Duration, Instant};

use super::extract::{extract_cursor, extract_records};
use super::{FetchError, PageRequest, RawRecord, RecordSource};

/// Default page size cap.
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

/// Default safety cap on the number of pages walked per fetch.
pub const DEFAULT_MAX_PAGES: usize = 50;

/// Default per-page timeout.
pub const DEFAULT_PAGE_TIMEOUT: Duration = Duration::from_secs(20);

/// Limits applied to a paginated fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationOptions {
    pub page_size: u32,
    pub max_pages: usize,
    pub page_timeout: Duration,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self { page_size: DEFAULT_PAGE_SIZE, max_pages: DEFAULT_MAX_PAGES, page_timeout: DEFAULT_PAGE_TIMEOUT }
    }
}

/// Fetch every page of a report.
///
/// # Errors
///
/// Returns the first page's [`FetchError`]; a page that times out yields
/// `FetchError::Timeout`, and a body with neither records nor a cursor yields
/// `FetchError::Parse`.
pub async fn fetch_all_pages(
    source: &dyn RecordSource, report_name: &str, options: &PaginationOptions,
) -> Result<Vec<RawRecord>, FetchError> {
    let start = Instant::now();
    let mut records = Vec::new();
    let mut cursor: Option<String> = None;
    let mut page = 0usize;

    loop {
        if page >= options.max_pages {
            tracing::warn!(
                report = report_name,
                max_pages = options.max_pages,
                "page cap reached, stopping pagination"
            );
            break;
        }
        page += 1;

        let request = PageRequest {
            report_name: report_name.to_string(),
            page,
            max_records: options.page_size,
            cursor: cursor.take(),
        };

        let body = tokio::time::timeout(options.page_timeout, source.fetch_page(&request))
            .await
            .map_err(|_| FetchError::Timeout { page })??;

        let next_cursor = extract_cursor(&body);
        let page_records = match extract_records(&body) {
            Some(found) => found,
            None if next_cursor.is_some() => Vec::new(),
            None => {
                return Err(FetchError::Parse(format!(
                    "page {page} of {report_name} has no record array"
                )));
            }
        };

        tracing::debug!(
            report = report_name,
            page,
            count = page_records.len(),
            has_cursor = next_cursor.is_some(),
            "fetched page"
        );

        if page_records.is_empty() {
            break;
        }
        records.extend(page_records);

        match next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    tracing::debug!(
        report = report_name,
        pages = page,
        total = records.len(),
        "pagination complete in {:?}",
        start.elapsed()
    );

    Ok(records)
}
