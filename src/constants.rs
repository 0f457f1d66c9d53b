use crate::types::{ActivePair, Board};

pub const TICK_RATE: u32 = 30;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

/// Ticking keeps running this long after the last accepted input, even when every robot is idle.
pub const QUIESCENCE_MS: u64 = 1_000;

pub const DEFAULT_ACTIVE_PAIR: ActivePair = ActivePair::YellowBlue;

/// Board shown behind the splash screen before any puzzle is loaded.
pub const SPLASH_BOARD: Board = Board {
    width: 20,
    height: 10,
};

/// Largest accepted board width or height.
pub const MAX_BOARD_SIDE: i32 = 64;

pub const CATALOG_VERSION: u8 = 1;
pub const RECORDS_VERSION: u8 = 1;

/// Upper bound on ticks a single slide may take in the headless simulator.
pub fn max_slide_ticks(board: Board) -> u64 {
    (board.width.max(board.height).max(1) as u64) + 2
}
