//! Track grid parsing and validation.
//!
//! A grid is stored as JSON text (`[[0,1,1,0,0], ...]`): 4 rows of 5 cells,
//! each `0` (wall) or `1` (path). `x` is the column, `y` is the row.

use std::fmt;

use crate::errors::CoreError;

pub const GRID_ROWS: usize = 4;
pub const GRID_COLS: usize = 5;

/// A validated 4x5 track grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackGrid {
    cells: [[bool; GRID_COLS]; GRID_ROWS],
}

impl TrackGrid {
    /// Parse and validate grid JSON.
    ///
    /// Checks run in a fixed order so the first problem found is the one reported:
    /// JSON shape, row count, column count per row, cell values, at least one path cell.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` describing the first violated rule.
    pub fn parse(json: &str) -> Result<Self, CoreError> {
        let rows: Vec<Vec<i64>> = serde_json::from_str(json).map_err(|_| {
            CoreError::validation("Invalid grid format: must be a valid JSON array")
        })?;
        Self::from_rows(&rows)
    }

    /// Validate already-decoded rows.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` describing the first violated rule.
    pub fn from_rows(rows: &[Vec<i64>]) -> Result<Self, CoreError> {
        if rows.len() != GRID_ROWS {
            return Err(CoreError::validation(format!(
                "Grid must have exactly {GRID_ROWS} rows"
            )));
        }
        if let Some(pos) = rows.iter().position(|row| row.len() != GRID_COLS) {
            return Err(CoreError::validation(format!(
                "Row {} must have exactly {GRID_COLS} columns",
                pos + 1
            )));
        }

        let mut cells = [[false; GRID_COLS]; GRID_ROWS];
        for (y, row) in rows.iter().enumerate() {
            for (x, &value) in row.iter().enumerate() {
                cells[y][x] = match value {
                    0 => false,
                    1 => true,
                    _ => return Err(CoreError::validation("Grid cells must be 0 or 1")),
                };
            }
        }

        let grid = Self { cells };
        if grid.path_cell_count() == 0 {
            return Err(CoreError::validation(
                "Grid must contain at least one path cell",
            ));
        }
        Ok(grid)
    }

    /// Number of path (`1`) cells.
    #[must_use]
    pub fn path_cell_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| **c).count()
    }

    /// Whether `(x, y)` is inside the grid and a path cell.
    #[must_use]
    pub fn is_path(&self, x: i32, y: i32) -> bool {
        let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
            return false;
        };
        self.cells
            .get(y)
            .and_then(|row| row.get(x))
            .copied()
            .unwrap_or(false)
    }

    /// Canonical JSON text (`[[0,1,...],...]`, no whitespace).
    #[must_use]
    pub fn to_json(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TrackGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (y, row) in self.cells.iter().enumerate() {
            if y > 0 {
                f.write_str(",")?;
            }
            f.write_str("[")?;
            for (x, cell) in row.iter().enumerate() {
                if x > 0 {
                    f.write_str(",")?;
                }
                f.write_str(if *cell { "1" } else { "0" })?;
            }
            f.write_str("]")?;
        }
        f.write_str("]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const L_SHAPE: &str = "[[1,1,1,0,0],[0,0,1,0,0],[0,0,1,1,1],[0,0,0,0,0]]";

    #[test]
    fn parses_valid_grid() {
        let grid = TrackGrid::parse(L_SHAPE).unwrap();
        assert_eq!(grid.path_cell_count(), 7);
        assert!(grid.is_path(0, 0));
        assert!(grid.is_path(2, 1));
        assert!(!grid.is_path(3, 1));
    }

    #[test]
    fn canonical_json_roundtrips() {
        let spaced = "[ [1,1,1,0,0], [0,0,1,0,0], [0,0,1,1,1], [0,0,0,0,0] ]";
        let grid = TrackGrid::parse(spaced).unwrap();
        assert_eq!(grid.to_json(), L_SHAPE);
        assert_eq!(TrackGrid::parse(&grid.to_json()).unwrap(), grid);
    }

    #[test]
    fn out_of_bounds_is_not_path() {
        let grid = TrackGrid::parse(L_SHAPE).unwrap();
        assert!(!grid.is_path(-1, 0));
        assert!(!grid.is_path(0, -1));
        assert!(!grid.is_path(5, 0));
        assert!(!grid.is_path(0, 4));
    }

    #[rstest]
    #[case("not json", "Invalid grid format: must be a valid JSON array")]
    #[case("{\"a\":1}", "Invalid grid format: must be a valid JSON array")]
    #[case("[[1.5,0,0,0,0]]", "Invalid grid format: must be a valid JSON array")]
    #[case("[[1,0,0,0,0],[0,0,0,0,0],[0,0,0,0,0]]", "Grid must have exactly 4 rows")]
    #[case(
        "[[1,0,0,0,0],[0,0,0,0],[0,0,0,0,0],[0,0,0,0,0]]",
        "Row 2 must have exactly 5 columns"
    )]
    #[case(
        "[[1,0,0,0,0],[0,2,0,0,0],[0,0,0,0,0],[0,0,0,0,0]]",
        "Grid cells must be 0 or 1"
    )]
    #[case(
        "[[0,0,0,0,0],[0,0,0,0,0],[0,0,0,0,0],[0,0,0,0,0]]",
        "Grid must contain at least one path cell"
    )]
    fn rejects_invalid_grids(#[case] json: &str, #[case] message: &str) {
        let err = TrackGrid::parse(json).unwrap_err();
        assert_eq!(err.to_string(), message);
    }
}
