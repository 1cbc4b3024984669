//! Row-to-entity parsing helpers.
//!
//! Every repo converts `libsql::Row` (column-indexed) into typed entity
//! structs. Timestamps are written with [`fmt_datetime`] and read back with
//! [`parse_datetime`], which also accepts `SQLite`'s `datetime('now')` format.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::DatabaseError;

/// Canonical TEXT form for timestamps: RFC 3339, UTC, milliseconds, `Z` suffix.
///
/// Fixed width, so lexicographic order equals chronological order.
#[must_use]
pub fn fmt_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string cannot be parsed as either format.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::Query(format!("Failed to parse datetime '{s}': {e}")))
}

/// Parse an optional TEXT column as `Option<DateTime<Utc>>`.
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a non-empty string cannot be parsed.
pub fn parse_optional_datetime(s: Option<&str>) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => Ok(Some(parse_datetime(s)?)),
        _ => Ok(None),
    }
}

/// Parse a TEXT column into a serde-deserializable enum.
///
/// Works with all gfd-core enums (`SCREAMING_SNAKE_CASE`).
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the string does not match any enum variant.
pub fn parse_enum<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| DatabaseError::Query(format!("Failed to parse enum from '{s}': {e}")))
}

/// Read a nullable TEXT column. Returns `None` for both SQL NULL and empty string.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    match row.get::<Option<String>>(idx)? {
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// Read an INTEGER column that holds a small value (coordinates, levels).
///
/// # Errors
///
/// Returns `DatabaseError::Query` if the value does not fit in `i32`.
pub fn get_i32(row: &libsql::Row, idx: i32) -> Result<i32, DatabaseError> {
    let value = row.get::<i64>(idx)?;
    i32::try_from(value)
        .map_err(|_| DatabaseError::Query(format!("column {idx} out of range: {value}")))
}

/// Nullable variant of [`get_i32`].
///
/// # Errors
///
/// Returns `DatabaseError::Query` if a present value does not fit in `i32`.
pub fn get_opt_i32(row: &libsql::Row, idx: i32) -> Result<Option<i32>, DatabaseError> {
    row.get::<Option<i64>>(idx)?
        .map(|value| {
            i32::try_from(value)
                .map_err(|_| DatabaseError::Query(format!("column {idx} out of range: {value}")))
        })
        .transpose()
}

/// Read a 0/1 INTEGER column as `bool`.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_bool(row: &libsql::Row, idx: i32) -> Result<bool, DatabaseError> {
    Ok(row.get::<i64>(idx)? != 0)
}

/// Read a `COUNT(*)`-style column as `u64`. Negative values (never produced by
/// SQL counts) clamp to zero.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_count(row: &libsql::Row, idx: i32) -> Result<u64, DatabaseError> {
    Ok(u64::try_from(row.get::<Option<i64>>(idx)?.unwrap_or(0)).unwrap_or(0))
}

/// Read an aggregate `AVG(...)` column; `NULL` (no rows) becomes `0.0`.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_avg(row: &libsql::Row, idx: i32) -> Result<f64, DatabaseError> {
    Ok(row.get::<Option<f64>>(idx)?.unwrap_or(0.0))
}

/// Escape `%`, `_` and `\` for a `LIKE ... ESCAPE '\'` pattern and wrap in `%`.
#[must_use]
pub fn like_contains(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}
