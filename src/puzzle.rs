use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::board::Wall;
use crate::constants::MAX_BOARD_SIDE;
use crate::error::PuzzleError;
use crate::robot::RobotStart;
use crate::types::{Board, Cell, RobotColor};

/// A puzzle as authored: interior walls only, border walls are derived per load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
    pub board: Board,
    #[serde(default)]
    pub walls: Vec<Wall>,
    pub robots: Vec<RobotStart>,
    pub goal: Cell,
    #[serde(rename = "goalColor")]
    pub goal_color: RobotColor,
    #[serde(rename = "minimumMoves")]
    pub minimum_moves: u32,
}

impl Puzzle {
    pub fn validate(&self) -> Result<(), PuzzleError> {
        let board = self.board;
        if board.width < 1 || board.height < 1 {
            return Err(PuzzleError::EmptyBoard {
                width: board.width,
                height: board.height,
            });
        }
        if board.width > MAX_BOARD_SIDE || board.height > MAX_BOARD_SIDE {
            return Err(PuzzleError::BoardTooLarge {
                width: board.width,
                height: board.height,
            });
        }

        for wall in &self.walls {
            if wall.edges.is_empty() {
                return Err(PuzzleError::EdgelessWall { cell: wall.cell() });
            }
            if !board.contains(wall.cell()) {
                return Err(PuzzleError::WallOutOfBounds { cell: wall.cell() });
            }
        }

        if self.robots.is_empty() {
            return Err(PuzzleError::NoRobots);
        }
        let mut colors = HashSet::new();
        let mut cells = HashSet::new();
        for start in &self.robots {
            if !board.contains(start.cell()) {
                return Err(PuzzleError::RobotOutOfBounds {
                    color: start.color,
                    cell: start.cell(),
                });
            }
            if !colors.insert(start.color) {
                return Err(PuzzleError::DuplicateRobotColor { color: start.color });
            }
            if !cells.insert(start.cell()) {
                return Err(PuzzleError::SharedStartCell { cell: start.cell() });
            }
        }

        if !board.contains(self.goal) {
            return Err(PuzzleError::GoalOutOfBounds { cell: self.goal });
        }
        let Some(goal_robot) = self
            .robots
            .iter()
            .find(|start| start.color == self.goal_color)
        else {
            return Err(PuzzleError::MissingGoalRobot {
                color: self.goal_color,
            });
        };
        if goal_robot.cell() == self.goal {
            return Err(PuzzleError::GoalAlreadySolved {
                color: self.goal_color,
            });
        }
        Ok(())
    }
}
