use thiserror::Error;

use crate::constants::MAX_BOARD_SIDE;
use crate::types::{Cell, RobotColor};

/// Reasons a puzzle definition is rejected at load time.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PuzzleError {
    #[error("board must be at least 1x1, got {width}x{height}")]
    EmptyBoard { width: i32, height: i32 },
    #[error("board {width}x{height} exceeds the {max}x{max} limit", max = MAX_BOARD_SIDE)]
    BoardTooLarge { width: i32, height: i32 },
    #[error("wall at {cell} blocks no edge")]
    EdgelessWall { cell: Cell },
    #[error("wall at {cell} lies outside the board")]
    WallOutOfBounds { cell: Cell },
    #[error("puzzle has no robots")]
    NoRobots,
    #[error("{color} robot at {cell} lies outside the board")]
    RobotOutOfBounds { color: RobotColor, cell: Cell },
    #[error("robot color {color} appears more than once")]
    DuplicateRobotColor { color: RobotColor },
    #[error("two robots start on {cell}")]
    SharedStartCell { cell: Cell },
    #[error("goal {cell} lies outside the board")]
    GoalOutOfBounds { cell: Cell },
    #[error("no {color} robot for the goal")]
    MissingGoalRobot { color: RobotColor },
    #[error("{color} robot already starts on the goal")]
    GoalAlreadySolved { color: RobotColor },
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("unknown puzzle id {0}")]
    UnknownPuzzle(u32),
    #[error("catalog is empty")]
    Empty,
    #[error("unsupported catalog version {0}")]
    UnsupportedVersion(u8),
    #[error("puzzle id {0} is defined more than once")]
    DuplicateId(u32),
    #[error("puzzle {id} is invalid: {source}")]
    InvalidPuzzle {
        id: u32,
        #[source]
        source: PuzzleError,
    },
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("move '{0}' is not of the form color:direction")]
    Malformed(String),
    #[error("unknown robot color '{0}'")]
    UnknownColor(String),
    #[error("unknown direction '{0}'")]
    UnknownDirection(String),
}
