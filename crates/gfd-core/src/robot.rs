//! Robot program simulation.
//!
//! Executes a move program on a [`TrackGrid`] with the same rules the browser
//! game uses, so results reported by a client can be checked on the server.

use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::Direction;
use crate::errors::CoreError;
use crate::grid::TrackGrid;

/// Upper bound on program length accepted for simulation.
pub const MAX_PROGRAM_MOVES: usize = 200;

pub const INVALID_MOVE_MESSAGE: &str = "Invalid move: the robot cannot move to that position";

/// A single instruction in a robot program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Move {
    Forward,
    Left,
    Right,
    LoopStart,
    LoopEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[must_use]
    const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx, self.y + dy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// Every path cell was visited.
    Success,
    /// The program ran to the end without covering the whole path.
    Incomplete,
    /// A forward move hit a wall or left the grid.
    Failed,
}

/// Result of running a program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
    pub status: RunStatus,
    pub position: Position,
    pub direction: Direction,
    pub cells_visited: usize,
    pub total_cells_required: usize,
    pub moves_executed: usize,
    pub error_position: Option<Position>,
    pub error_message: Option<String>,
}

struct Robot<'a> {
    grid: &'a TrackGrid,
    position: Position,
    direction: Direction,
    visited: HashSet<Position>,
    executed: usize,
}

impl Robot<'_> {
    fn run(&mut self, moves: &[Move]) -> Result<(), Position> {
        let mut i = 0;
        while i < moves.len() {
            match moves[i] {
                Move::LoopStart => {
                    if let Some(end) = matching_loop_end(moves, i) {
                        self.run(&moves[i + 1..end])?;
                        i = end;
                    }
                }
                Move::LoopEnd => {}
                Move::Forward => {
                    self.executed += 1;
                    let target = self.position.step(self.direction);
                    if !self.grid.is_path(target.x, target.y) {
                        return Err(target);
                    }
                    self.position = target;
                    self.visited.insert(target);
                }
                Move::Left => {
                    self.executed += 1;
                    self.direction = self.direction.turn_left();
                }
                Move::Right => {
                    self.executed += 1;
                    self.direction = self.direction.turn_right();
                }
            }
            i += 1;
        }
        Ok(())
    }
}

/// Index of the `LOOP_END` closing the `LOOP_START` at `start`, honoring nesting.
fn matching_loop_end(moves: &[Move], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, mv) in moves[start..].iter().enumerate() {
        match mv {
            Move::LoopStart => depth += 1,
            Move::LoopEnd => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Run `moves` from `start` facing `direction`.
///
/// A loop body executes once. Unmatched loop markers are ignored.
///
/// # Errors
///
/// Returns `CoreError::Validation` if the program is longer than
/// [`MAX_PROGRAM_MOVES`] or the start cell is not a path cell.
pub fn simulate(
    grid: &TrackGrid,
    start: Position,
    direction: Direction,
    moves: &[Move],
) -> Result<RunOutcome, CoreError> {
    if moves.len() > MAX_PROGRAM_MOVES {
        return Err(CoreError::validation(format!(
            "Program exceeds {MAX_PROGRAM_MOVES} moves"
        )));
    }
    if !grid.is_path(start.x, start.y) {
        return Err(CoreError::validation(
            "Start position must be on a path cell",
        ));
    }

    let mut robot = Robot {
        grid,
        position: start,
        direction,
        visited: HashSet::from([start]),
        executed: 0,
    };
    let result = robot.run(moves);
    let total = grid.path_cell_count();

    let (status, error_position, error_message) = match result {
        Err(target) => (
            RunStatus::Failed,
            Some(target),
            Some(INVALID_MOVE_MESSAGE.to_string()),
        ),
        Ok(()) if robot.visited.len() >= total => (RunStatus::Success, None, None),
        Ok(()) => (RunStatus::Incomplete, None, None),
    };

    Ok(RunOutcome {
        status,
        position: robot.position,
        direction: robot.direction,
        cells_visited: robot.visited.len(),
        total_cells_required: total,
        moves_executed: robot.executed,
        error_position,
        error_message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use Move::{Forward, Left, LoopEnd, LoopStart, Right};

    // 1 1 1 0 0
    // 0 0 1 0 0
    // 0 0 1 1 1
    // 0 0 0 0 0
    fn l_track() -> TrackGrid {
        TrackGrid::parse("[[1,1,1,0,0],[0,0,1,0,0],[0,0,1,1,1],[0,0,0,0,0]]").unwrap()
    }

    #[test]
    fn full_path_succeeds() {
        let program = [Forward, Forward, Right, Forward, Forward, Left, Forward, Forward];
        let out = simulate(&l_track(), Position::new(0, 0), Direction::East, &program).unwrap();
        assert_eq!(out.status, RunStatus::Success);
        assert_eq!(out.position, Position::new(4, 2));
        assert_eq!(out.direction, Direction::East);
        assert_eq!(out.cells_visited, 7);
        assert_eq!(out.moves_executed, 8);
        assert_eq!(out.error_position, None);
    }

    #[test]
    fn short_program_is_incomplete() {
        let out = simulate(&l_track(), Position::new(0, 0), Direction::East, &[Forward]).unwrap();
        assert_eq!(out.status, RunStatus::Incomplete);
        assert_eq!(out.cells_visited, 2);
        assert_eq!(out.total_cells_required, 7);
    }

    #[test]
    fn hitting_a_wall_fails_at_target_cell() {
        let out = simulate(
            &l_track(),
            Position::new(0, 0),
            Direction::East,
            &[Forward, Right, Forward],
        )
        .unwrap();
        assert_eq!(out.status, RunStatus::Failed);
        assert_eq!(out.error_position, Some(Position::new(1, 1)));
        assert_eq!(out.position, Position::new(1, 0));
        assert_eq!(out.error_message.as_deref(), Some(INVALID_MOVE_MESSAGE));
    }

    #[test]
    fn leaving_the_grid_fails() {
        let out =
            simulate(&l_track(), Position::new(0, 0), Direction::North, &[Forward]).unwrap();
        assert_eq!(out.status, RunStatus::Failed);
        assert_eq!(out.error_position, Some(Position::new(0, -1)));
    }

    #[test]
    fn loop_body_runs_once() {
        let program = [LoopStart, Forward, LoopEnd, Forward];
        let out = simulate(&l_track(), Position::new(0, 0), Direction::East, &program).unwrap();
        assert_eq!(out.position, Position::new(2, 0));
        assert_eq!(out.moves_executed, 2);
    }

    #[test]
    fn nested_loops_match_outer_end() {
        let program = [LoopStart, Forward, LoopStart, Forward, LoopEnd, LoopEnd, Right];
        let out = simulate(&l_track(), Position::new(0, 0), Direction::East, &program).unwrap();
        assert_eq!(out.position, Position::new(2, 0));
        assert_eq!(out.direction, Direction::South);
    }

    #[test]
    fn unmatched_loop_markers_are_ignored() {
        let program = [LoopEnd, LoopStart, Forward];
        let out = simulate(&l_track(), Position::new(0, 0), Direction::East, &program).unwrap();
        assert_eq!(out.position, Position::new(1, 0));
        assert_eq!(out.moves_executed, 1);
    }

    #[test]
    fn revisiting_cells_does_not_double_count() {
        let program = [Forward, Left, Left, Forward, Left, Left, Forward];
        let out = simulate(&l_track(), Position::new(0, 0), Direction::East, &program).unwrap();
        assert_eq!(out.cells_visited, 2);
    }

    #[test]
    fn start_off_path_is_rejected() {
        let err = simulate(&l_track(), Position::new(4, 0), Direction::East, &[]).unwrap_err();
        assert_eq!(err.to_string(), "Start position must be on a path cell");
    }

    #[test]
    fn oversized_program_is_rejected() {
        let program = vec![Left; MAX_PROGRAM_MOVES + 1];
        assert!(simulate(&l_track(), Position::new(0, 0), Direction::East, &program).is_err());
    }
}
