use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::Direction;
use crate::errors::CoreError;
use crate::grid::TrackGrid;

pub const MAX_TRACK_NAME_LEN: usize = 100;
pub const MIN_DIFFICULTY: i32 = 1;
pub const MAX_DIFFICULTY: i32 = 5;

/// A puzzle level: a grid, a start cell and a start heading.
///
/// Tracks are soft-deleted (`is_active = false`); names are unique among
/// active tracks only.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: i64,
    pub name: String,
    pub grid_config: String,
    pub start_x: i32,
    pub start_y: i32,
    pub start_direction: Direction,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: Option<String>,
    pub is_active: bool,
    pub difficulty_level: i32,
    pub description: Option<String>,
}

impl Track {
    /// Parse the stored grid.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if the stored JSON is not a valid grid.
    pub fn grid(&self) -> Result<TrackGrid, CoreError> {
        TrackGrid::parse(&self.grid_config)
    }
}

/// Trim and check a track name.
///
/// # Errors
///
/// Returns `CoreError::Validation` if the name is blank or too long.
pub fn validate_track_name(name: &str) -> Result<String, CoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CoreError::validation("Track name is required"));
    }
    if name.chars().count() > MAX_TRACK_NAME_LEN {
        return Err(CoreError::validation(format!(
            "Track name cannot exceed {MAX_TRACK_NAME_LEN} characters"
        )));
    }
    Ok(name.to_string())
}

/// # Errors
///
/// Returns `CoreError::Validation` if `level` is outside 1..=5.
pub fn validate_difficulty(level: i32) -> Result<i32, CoreError> {
    if (MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&level) {
        Ok(level)
    } else {
        Err(CoreError::validation(format!(
            "Difficulty level must be between {MIN_DIFFICULTY} and {MAX_DIFFICULTY}"
        )))
    }
}

/// # Errors
///
/// Returns `CoreError::Validation` if the start cell is not a path cell.
pub fn validate_start(grid: &TrackGrid, x: i32, y: i32) -> Result<(), CoreError> {
    if grid.is_path(x, y) {
        Ok(())
    } else {
        Err(CoreError::validation(
            "Start position must be on a path cell",
        ))
    }
}
