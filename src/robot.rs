use serde::{Deserialize, Serialize};

use crate::types::{Cell, Direction, RobotColor};

/// Starting placement of a robot as stored in a puzzle definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotStart {
    pub color: RobotColor,
    pub x: i32,
    pub y: i32,
}

impl RobotStart {
    pub fn cell(&self) -> Cell {
        Cell::new(self.x, self.y)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Robot {
    color: RobotColor,
    #[serde(flatten)]
    position: Cell,
    dir: Direction,
    tag: String,
}

impl Robot {
    pub fn new(color: RobotColor, position: Cell) -> Self {
        Self {
            color,
            position,
            dir: Direction::None,
            tag: format!("robot-{color}"),
        }
    }

    pub fn from_start(start: &RobotStart) -> Self {
        Self::new(start.color, start.cell())
    }

    pub fn color(&self) -> RobotColor {
        self.color
    }

    pub fn position(&self) -> Cell {
        self.position
    }

    pub fn direction(&self) -> Direction {
        self.dir
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn is_sliding(&self) -> bool {
        !self.dir.is_none()
    }

    pub fn set_direction(&mut self, dir: Direction) {
        self.dir = dir;
    }

    pub fn stop(&mut self) {
        self.dir = Direction::None;
    }

    pub(crate) fn move_to(&mut self, cell: Cell) {
        self.position = cell;
    }
}
