//! Report page request validation and URL building.

use fieldmap_core::PageRequest;
use url::Url;

use super::ReportError;

/// Largest page the report API serves.
pub const MAX_RECORDS_LIMIT: u32 = 1000;

/// Header carrying the continuation cursor, in both directions.
pub const CURSOR_HEADER: &str = "record_cursor";

/// Validate a page request before it goes on the wire.
///
/// Returns an error if the report name is empty or would escape its path
/// segment, or if `max_records` is outside 1-1000.
pub fn validate(request: &PageRequest) -> Result<(), ReportError> {
    let name = request.report_name.trim();

    if name.is_empty() {
        return Err(ReportError::InvalidRequest("report name cannot be empty".to_string()));
    }

    if name.contains(['/', '?', '#']) {
        return Err(ReportError::InvalidRequest(format!("report name contains reserved characters: {name}")));
    }

    if !(1..=MAX_RECORDS_LIMIT).contains(&request.max_records) {
        return Err(ReportError::InvalidRequest(format!(
            "max_records must be 1-{MAX_RECORDS_LIMIT}, got {}",
            request.max_records
        )));
    }

    Ok(())
}

/// Build `{base_url}/report/{report_name}?max_records=N`.
///
/// The cursor is not part of the URL; it travels in [`CURSOR_HEADER`].
pub fn report_url(base_url: &str, request: &PageRequest) -> Result<Url, ReportError> {
    validate(request)?;

    let mut url = Url::parse(base_url).map_err(|e| ReportError::InvalidUrl(format!("{base_url}: {e}")))?;

    url.path_segments_mut()
        .map_err(|_| ReportError::InvalidUrl(format!("{base_url}: cannot be a base URL")))?
        .pop_if_empty()
        .push("report")
        .push(request.report_name.trim());

    url.query_pairs_mut()
        .append_pair("max_records", &request.max_records.to_string());

    Ok(url)
}
