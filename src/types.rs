use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::Wall;
use crate::robot::Robot;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn is_none(self) -> bool {
        self == Self::None
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::None => Self::None,
        }
    }

    /// The cell edge crossed when leaving a cell in this direction.
    pub fn edge(self) -> Option<Edge> {
        match self {
            Self::Up => Some(Edge::Top),
            Self::Down => Some(Edge::Bottom),
            Self::Left => Some(Edge::Left),
            Self::Right => Some(Edge::Right),
            Self::None => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub width: i32,
    pub height: i32,
}

impl Board {
    pub fn contains(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.width && cell.y < self.height
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotColor {
    Red,
    Green,
    Blue,
    Yellow,
}

impl RobotColor {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "red" => Some(Self::Red),
            "green" => Some(Self::Green),
            "blue" => Some(Self::Blue),
            "yellow" => Some(Self::Yellow),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Yellow => "yellow",
        }
    }
}

impl fmt::Display for RobotColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Two disjoint pairs of robots; directional input only reaches the active one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivePair {
    YellowBlue,
    RedGreen,
}

impl ActivePair {
    pub fn colors(self) -> [RobotColor; 2] {
        match self {
            Self::YellowBlue => [RobotColor::Yellow, RobotColor::Blue],
            Self::RedGreen => [RobotColor::Red, RobotColor::Green],
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::YellowBlue => Self::RedGreen,
            Self::RedGreen => Self::YellowBlue,
        }
    }

    pub fn containing(color: RobotColor) -> Self {
        match color {
            RobotColor::Yellow | RobotColor::Blue => Self::YellowBlue,
            RobotColor::Red | RobotColor::Green => Self::RedGreen,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Idle,
    Active,
    Won,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ControlsView {
    pub pair: ActivePair,
    pub addressed: RobotColor,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuntimeEvent {
    PuzzleInitialized {
        #[serde(rename = "puzzleId")]
        puzzle_id: u32,
        #[serde(rename = "minimumMoves")]
        minimum_moves: u32,
    },
    RobotStopped {
        color: RobotColor,
        moved: bool,
    },
    MoveCompleted {
        moves: u32,
    },
    Victory {
        #[serde(rename = "puzzleId")]
        puzzle_id: u32,
        moves: u32,
        #[serde(rename = "minimumMoves")]
        minimum_moves: u32,
    },
    ControlsChanged {
        controls: ControlsView,
    },
    MuteRequested,
}

/// Static part of a loaded puzzle, sent once per load.
#[derive(Clone, Debug, Serialize)]
pub struct PuzzleInit {
    #[serde(rename = "puzzleId")]
    pub puzzle_id: u32,
    pub board: Board,
    pub walls: Vec<Wall>,
    pub goal: Cell,
    #[serde(rename = "goalColor")]
    pub goal_color: RobotColor,
    #[serde(rename = "minimumMoves")]
    pub minimum_moves: u32,
    pub robots: Vec<Robot>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub phase: SessionPhase,
    #[serde(rename = "puzzleId")]
    pub puzzle_id: Option<u32>,
    pub moves: u32,
    #[serde(rename = "minimumMoves")]
    pub minimum_moves: u32,
    pub robots: Vec<Robot>,
    pub controls: ControlsView,
    pub events: Vec<RuntimeEvent>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SolveRecordEntry {
    #[serde(rename = "puzzleId")]
    pub puzzle_id: u32,
    pub solves: u64,
    #[serde(rename = "bestMoves")]
    pub best_moves: u32,
    #[serde(rename = "minimumMoves")]
    pub minimum_moves: u32,
    #[serde(rename = "reachedPar")]
    pub reached_par: bool,
    #[serde(rename = "updatedAtMs")]
    pub updated_at_ms: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct RecordsResponse {
    #[serde(rename = "generatedAtIso")]
    pub generated_at_iso: String,
    pub entries: Vec<SolveRecordEntry>,
}
