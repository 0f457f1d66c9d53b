use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{Board, Cell, Direction, Edge};

fn is_false(value: &bool) -> bool {
    !*value
}

/// Blocked sides of one cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallEdges {
    #[serde(default, skip_serializing_if = "is_false")]
    pub top: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub bottom: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub left: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub right: bool,
}

impl WallEdges {
    pub fn single(edge: Edge) -> Self {
        let mut edges = Self::default();
        edges.set(edge);
        edges
    }

    pub fn set(&mut self, edge: Edge) {
        match edge {
            Edge::Top => self.top = true,
            Edge::Bottom => self.bottom = true,
            Edge::Left => self.left = true,
            Edge::Right => self.right = true,
        }
    }

    pub fn has(&self, edge: Edge) -> bool {
        match edge {
            Edge::Top => self.top,
            Edge::Bottom => self.bottom,
            Edge::Left => self.left,
            Edge::Right => self.right,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.top || self.bottom || self.left || self.right)
    }

    pub fn merge(&mut self, other: WallEdges) {
        self.top |= other.top;
        self.bottom |= other.bottom;
        self.left |= other.left;
        self.right |= other.right;
    }
}

/// A directional obstacle attached to a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wall {
    pub x: i32,
    pub y: i32,
    #[serde(flatten)]
    pub edges: WallEdges,
}

impl Wall {
    pub fn single(cell: Cell, edge: Edge) -> Self {
        Self {
            x: cell.x,
            y: cell.y,
            edges: WallEdges::single(edge),
        }
    }

    pub fn cell(&self) -> Cell {
        Cell::new(self.x, self.y)
    }
}

/// Outward walls around the whole board: top row, bottom row, left column, right column.
pub fn border_walls(board: Board) -> Vec<Wall> {
    let mut walls = Vec::with_capacity((board.width.max(0) * 2 + board.height.max(0) * 2) as usize);
    for x in 0..board.width {
        walls.push(Wall::single(Cell::new(x, 0), Edge::Top));
    }
    for x in 0..board.width {
        walls.push(Wall::single(Cell::new(x, board.height - 1), Edge::Bottom));
    }
    for y in 0..board.height {
        walls.push(Wall::single(Cell::new(0, y), Edge::Left));
    }
    for y in 0..board.height {
        walls.push(Wall::single(Cell::new(board.width - 1, y), Edge::Right));
    }
    walls
}

/// Cell -> blocked edges, accumulated over every wall record of a puzzle.
#[derive(Clone, Debug, Default)]
pub struct WallMap {
    edges: HashMap<Cell, WallEdges>,
}

impl WallMap {
    pub fn from_walls(walls: &[Wall]) -> Self {
        let mut edges: HashMap<Cell, WallEdges> = HashMap::new();
        for wall in walls {
            edges.entry(wall.cell()).or_default().merge(wall.edges);
        }
        Self { edges }
    }

    pub fn edges_at(&self, cell: Cell) -> WallEdges {
        self.edges.get(&cell).copied().unwrap_or_default()
    }

    /// Leaving `cell` towards `dir` crosses a blocked edge of `cell`.
    pub fn blocks_exit(&self, cell: Cell, dir: Direction) -> bool {
        dir.edge()
            .map(|edge| self.edges_at(cell).has(edge))
            .unwrap_or(false)
    }

    /// Entering `cell` while travelling `dir` crosses its edge facing back where we came from.
    pub fn blocks_entry(&self, cell: Cell, dir: Direction) -> bool {
        dir.opposite()
            .edge()
            .map(|edge| self.edges_at(cell).has(edge))
            .unwrap_or(false)
    }
}
