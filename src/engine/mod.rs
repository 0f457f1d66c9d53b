use std::collections::HashSet;

use crate::board::WallMap;
use crate::robot::Robot;
use crate::types::{Board, Cell, Direction};

mod utils;

pub use self::utils::{now_ms, offset};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    OutOfBounds,
    ExitWall,
    EntryWall,
    Occupied,
}

/// What happened to one robot during a single engine pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RobotStep {
    Idle,
    Advanced { from: Cell, to: Cell },
    Stopped { at: Cell, reason: StopReason },
}

impl RobotStep {
    pub fn just_stopped(&self) -> bool {
        matches!(self, Self::Stopped { .. })
    }
}

/// Why motion from `from` towards `dir` is illegal, if it is.
///
/// `occupied` holds robot positions as they were before the current pass.
pub fn blocking_reason(
    board: Board,
    walls: &WallMap,
    occupied: &HashSet<Cell>,
    from: Cell,
    dir: Direction,
) -> Option<StopReason> {
    if walls.blocks_exit(from, dir) {
        return Some(StopReason::ExitWall);
    }
    let to = offset(from, dir);
    if !board.contains(to) {
        return Some(StopReason::OutOfBounds);
    }
    if walls.blocks_entry(to, dir) {
        return Some(StopReason::EntryWall);
    }
    if occupied.contains(&to) {
        return Some(StopReason::Occupied);
    }
    None
}

/// Advances every sliding robot by one cell or stops it.
///
/// Every decision is made against the positions held before the pass; nothing is
/// committed until all robots are planned. Two robots aiming at the same free cell
/// resolve in list order: the earlier one moves, the later one stops as occupied.
pub fn step_robots(robots: &mut [Robot], walls: &WallMap, board: Board) -> Vec<RobotStep> {
    let occupied: HashSet<Cell> = robots.iter().map(|robot| robot.position()).collect();
    let mut claimed: HashSet<Cell> = HashSet::new();
    let mut plan = Vec::with_capacity(robots.len());

    for robot in robots.iter() {
        let dir = robot.direction();
        let from = robot.position();
        if dir.is_none() {
            plan.push(RobotStep::Idle);
            continue;
        }
        if let Some(reason) = blocking_reason(board, walls, &occupied, from, dir) {
            plan.push(RobotStep::Stopped { at: from, reason });
            continue;
        }
        let to = offset(from, dir);
        if !claimed.insert(to) {
            plan.push(RobotStep::Stopped {
                at: from,
                reason: StopReason::Occupied,
            });
            continue;
        }
        plan.push(RobotStep::Advanced { from, to });
    }

    for (robot, step) in robots.iter_mut().zip(plan.iter()) {
        match *step {
            RobotStep::Advanced { to, .. } => robot.move_to(to),
            RobotStep::Stopped { .. } => robot.stop(),
            RobotStep::Idle => {}
        }
    }

    debug_assert!(
        positions_are_distinct(robots),
        "two robots share a cell after an engine pass"
    );
    plan
}

pub fn positions_are_distinct(robots: &[Robot]) -> bool {
    let mut seen = HashSet::with_capacity(robots.len());
    robots.iter().all(|robot| seen.insert(robot.position()))
}
