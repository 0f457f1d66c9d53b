use std::path::PathBuf;

use crate::error::ScriptError;
use crate::types::{Direction, RobotColor};

pub const DEFAULT_PORT: u16 = 8080;

pub fn parse_port(raw: Option<&str>) -> u16 {
    raw.and_then(|value| value.trim().parse::<u16>().ok())
        .filter(|port| *port != 0)
        .unwrap_or(DEFAULT_PORT)
}

/// First directory holding an `index.html`: the explicit override, then the usual build outputs.
pub fn resolve_static_dir(override_dir: Option<&str>) -> Option<PathBuf> {
    let explicit = override_dir.map(PathBuf::from);
    explicit
        .into_iter()
        .chain([PathBuf::from("web"), PathBuf::from("dist/client")])
        .find(|path| path.join("index.html").is_file())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScriptedMove {
    pub color: RobotColor,
    pub dir: Direction,
}

/// Parses `red:right,blue:up`. Blank entries are skipped.
pub fn parse_move_script(raw: &str) -> Result<Vec<ScriptedMove>, ScriptError> {
    let mut moves = Vec::new();
    let entries = raw.split(',').map(str::trim);
    for entry in entries.filter(|entry| !entry.is_empty()) {
        let Some((color, dir)) = entry.split_once(':') else {
            return Err(ScriptError::Malformed(entry.to_string()));
        };
        let color = RobotColor::parse(color)
            .ok_or_else(|| ScriptError::UnknownColor(color.trim().to_string()))?;
        let normalized = dir.trim().to_ascii_lowercase();
        let dir = match Direction::parse_move(&normalized) {
            Some(dir) if !dir.is_none() => dir,
            _ => return Err(ScriptError::UnknownDirection(dir.trim().to_string())),
        };
        moves.push(ScriptedMove { color, dir });
    }
    Ok(moves)
}
