//! Game session progress update.
//!
//! Deserialized straight from the client's `PUT /api/game/session/{id}` body.

use serde::{Deserialize, Serialize};
use gfd_core::enums::GameStatus;

use crate::error::DatabaseError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSessionUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moves_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub moves_sequence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cells_visited: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempts_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screen_resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<GameStatus>,
    /// Applied only when the status becomes SUCCESS or FAILED.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time_ms: Option<i64>,
    /// Applied only when the status becomes FAILED.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_position_x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_position_y: Option<i32>,
}

impl GameSessionUpdate {
    /// Counters and timings must not be negative.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` naming the first negative field.
    pub fn validate(&self) -> Result<(), DatabaseError> {
        let counters = [
            ("movesCount", self.moves_count),
            ("cellsVisited", self.cells_visited),
            ("attemptsCount", self.attempts_count),
            ("executionTimeMs", self.execution_time_ms),
        ];
        for (field, value) in counters {
            if value.is_some_and(|v| v < 0) {
                return Err(DatabaseError::Validation(format!(
                    "{field} must not be negative"
                )));
            }
        }
        Ok(())
    }
}
