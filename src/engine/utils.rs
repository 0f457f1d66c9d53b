use std::time::{SystemTime, UNIX_EPOCH};

use crate::types::{Cell, Direction};

pub fn now_ms() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    now as u64
}

pub fn offset(cell: Cell, dir: Direction) -> Cell {
    match dir {
        Direction::Up => Cell::new(cell.x, cell.y - 1),
        Direction::Down => Cell::new(cell.x, cell.y + 1),
        Direction::Left => Cell::new(cell.x - 1, cell.y),
        Direction::Right => Cell::new(cell.x + 1, cell.y),
        Direction::None => cell,
    }
}
