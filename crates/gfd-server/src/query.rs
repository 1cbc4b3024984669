//! Query-string parameter types.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::Deserialize;

use gfd_config::GeneralConfig;
use gfd_core::paging::{PageRequest, SortDirection};
use gfd_db::repos::statistics::MAX_RANGE_DAYS;

use crate::error::ApiError;

/// `page`, `size`, `sortBy`, `sortDir`. Pages are zero-based.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

impl PageParams {
    /// Build a page request, defaulting the size and capping it at the configured maximum.
    #[must_use]
    pub fn to_request(&self, default_size: u32, general: &GeneralConfig) -> PageRequest {
        let request = PageRequest::new(
            self.page.unwrap_or(0),
            self.size.unwrap_or(default_size),
        )
        .capped(general.max_page_size);
        match self.sort_by.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(sort_by) => request.sorted(
                sort_by,
                self.sort_dir
                    .as_deref()
                    .map_or(SortDirection::Asc, SortDirection::parse_lenient),
            ),
            None => request,
        }
    }
}

/// `days` window for statistics endpoints.
#[derive(Debug, Deserialize)]
pub struct DaysParam {
    pub days: Option<u32>,
}

impl DaysParam {
    /// The requested window, clamped into `1..=MAX_RANGE_DAYS`.
    #[must_use]
    pub fn days_or(&self, default: u32) -> u32 {
        self.days.unwrap_or(default).clamp(1, MAX_RANGE_DAYS)
    }
}

/// Parse a date filter bound.
///
/// Accepts RFC 3339, a local `YYYY-MM-DDTHH:MM[:SS]` (read as UTC), or a bare
/// date. A bare date covers the whole day: the start for lower bounds, the
/// last millisecond for upper bounds.
///
/// # Errors
///
/// Returns `ApiError::BadRequest` for anything else.
pub fn parse_date_bound(value: &str, end_of_day: bool) -> Result<DateTime<Utc>, ApiError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ApiError::bad_request(format!("Invalid date: {value}")))?;
    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    }
    .ok_or_else(|| ApiError::bad_request(format!("Invalid date: {value}")))?;
    Ok(Utc.from_utc_datetime(&date.and_time(time)))
}

/// Parse an optional bound, treating blank values as absent.
///
/// # Errors
///
/// Returns `ApiError::BadRequest` for an unparseable value.
pub fn parse_optional_bound(
    value: Option<&str>,
    end_of_day: bool,
) -> Result<Option<DateTime<Utc>>, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| parse_date_bound(v, end_of_day))
        .transpose()
}
