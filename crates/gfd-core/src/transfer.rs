//! Track export/import document.

use chrono::{DateTime, NaiveDateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::entities::Track;
use crate::enums::Direction;
use crate::errors::CoreError;

pub const EXPORT_VERSION: &str = "1.0";

fn default_export_version() -> String {
    EXPORT_VERSION.to_string()
}

const fn default_difficulty() -> i32 {
    1
}

/// Accepts RFC 3339 as well as offset-less local timestamps, which are read as UTC.
fn lenient_export_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(parsed.with_timezone(&Utc)));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&raw, format).ok())
        .map(|naive| Some(naive.and_utc()))
        .ok_or_else(|| serde::de::Error::custom(format!("invalid exportDate '{raw}'")))
}

/// Portable representation of a track, free of ids and audit columns.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrackExport {
    pub name: String,
    pub grid_config: String,
    pub start_x: i32,
    pub start_y: i32,
    pub start_direction: Direction,
    #[serde(default = "default_difficulty")]
    pub difficulty_level: i32,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_export_version")]
    pub export_version: String,
    #[serde(default, deserialize_with = "lenient_export_date")]
    #[schemars(with = "Option<DateTime<Utc>>")]
    pub export_date: Option<DateTime<Utc>>,
}

impl TrackExport {
    #[must_use]
    pub fn from_track(track: &Track, exported_at: DateTime<Utc>) -> Self {
        Self {
            name: track.name.clone(),
            grid_config: track.grid_config.clone(),
            start_x: track.start_x,
            start_y: track.start_y,
            start_direction: track.start_direction,
            difficulty_level: track.difficulty_level,
            description: track.description.clone(),
            export_version: EXPORT_VERSION.to_string(),
            export_date: Some(exported_at),
        }
    }

    /// # Errors
    ///
    /// Returns `CoreError::Validation` for a document written by an unknown format version.
    pub fn check_version(&self) -> Result<(), CoreError> {
        if self.export_version == EXPORT_VERSION {
            Ok(())
        } else {
            Err(CoreError::validation(format!(
                "Unsupported export version '{}'",
                self.export_version
            )))
        }
    }
}

/// Name to use when importing `base` and some names are already taken.
///
/// Returns `base` when free, otherwise `base (n)` with the smallest free `n >= 1`.
#[must_use]
pub fn dedupe_name(base: &str, is_taken: impl Fn(&str) -> bool) -> String {
    if !is_taken(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{base} ({n})"))
        .find(|candidate| !is_taken(candidate))
        .unwrap_or_else(|| base.to_string())
}
