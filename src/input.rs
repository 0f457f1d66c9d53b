use crate::constants::DEFAULT_ACTIVE_PAIR;
use crate::robot::Robot;
use crate::types::{ActivePair, ControlsView, Direction, RobotColor};

pub const KEY_TAB: u32 = 9;
pub const KEY_SPACE: u32 = 32;
pub const KEY_LEFT: u32 = 37;
pub const KEY_UP: u32 = 38;
pub const KEY_RIGHT: u32 = 39;
pub const KEY_DOWN: u32 = 40;
pub const KEY_ONE: u32 = 49;
pub const KEY_TWO: u32 = 50;
pub const KEY_THREE: u32 = 51;
pub const KEY_FOUR: u32 = 52;
pub const KEY_A: u32 = 65;
pub const KEY_D: u32 = 68;
pub const KEY_E: u32 = 69;
pub const KEY_M: u32 = 77;
pub const KEY_R: u32 = 82;
pub const KEY_S: u32 = 83;
pub const KEY_W: u32 = 87;
pub const KEY_NUMPAD_ONE: u32 = 97;
pub const KEY_NUMPAD_TWO: u32 = 98;
pub const KEY_NUMPAD_THREE: u32 = 99;
pub const KEY_NUMPAD_FOUR: u32 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlAction {
    SelectRobot(RobotColor),
    TogglePair,
    Start,
    NewPuzzle,
    Restart,
    Mute,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputAction {
    Move(Direction),
    Control(ControlAction),
    Noop,
}

/// Total key table; anything unlisted is a no-op.
pub fn map_key(code: u32) -> InputAction {
    match code {
        KEY_UP | KEY_W => InputAction::Move(Direction::Up),
        KEY_DOWN | KEY_S => InputAction::Move(Direction::Down),
        KEY_LEFT | KEY_A => InputAction::Move(Direction::Left),
        KEY_RIGHT | KEY_D => InputAction::Move(Direction::Right),
        KEY_ONE | KEY_NUMPAD_ONE => {
            InputAction::Control(ControlAction::SelectRobot(RobotColor::Red))
        }
        KEY_TWO | KEY_NUMPAD_TWO => {
            InputAction::Control(ControlAction::SelectRobot(RobotColor::Green))
        }
        KEY_THREE | KEY_NUMPAD_THREE => {
            InputAction::Control(ControlAction::SelectRobot(RobotColor::Blue))
        }
        KEY_FOUR | KEY_NUMPAD_FOUR => {
            InputAction::Control(ControlAction::SelectRobot(RobotColor::Yellow))
        }
        KEY_TAB => InputAction::Control(ControlAction::TogglePair),
        KEY_SPACE => InputAction::Control(ControlAction::Start),
        KEY_E => InputAction::Control(ControlAction::NewPuzzle),
        KEY_R => InputAction::Control(ControlAction::Restart),
        KEY_M => InputAction::Control(ControlAction::Mute),
        _ => InputAction::Noop,
    }
}

/// Which pair is active and which of its two robots directional input drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Controls {
    pair: ActivePair,
    slot: usize,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            pair: DEFAULT_ACTIVE_PAIR,
            slot: 0,
        }
    }
}

impl Controls {
    pub fn pair(&self) -> ActivePair {
        self.pair
    }

    pub fn addressed(&self) -> RobotColor {
        self.pair.colors()[self.slot]
    }

    /// Addresses `color`, switching to the pair that contains it.
    pub fn select(&mut self, color: RobotColor) {
        self.pair = ActivePair::containing(color);
        self.slot = self
            .pair
            .colors()
            .iter()
            .position(|candidate| *candidate == color)
            .unwrap_or(0);
    }

    pub fn toggle_pair(&mut self) {
        self.pair = self.pair.toggled();
        self.slot = 0;
    }

    pub fn view(&self) -> ControlsView {
        ControlsView {
            pair: self.pair,
            addressed: self.addressed(),
        }
    }
}

/// Starts a slide of the addressed robot. Returns the robot index when accepted.
///
/// Rejected without side effects when the direction is `None`, the addressed robot is
/// missing from the puzzle, or it is still sliding.
pub fn apply_direction(dir: Direction, robots: &mut [Robot], controls: &Controls) -> Option<usize> {
    if dir.is_none() {
        return None;
    }
    let color = controls.addressed();
    let idx = robots.iter().position(|robot| robot.color() == color)?;
    if robots[idx].is_sliding() {
        return None;
    }
    robots[idx].set_direction(dir);
    Some(idx)
}
