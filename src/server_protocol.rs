use serde_json::Value;

use crate::types::{Direction, RobotColor};

#[derive(Debug)]
pub enum ParsedClientMessage {
    Key { code: u32 },
    Direction { dir: Direction },
    SelectRobot { color: RobotColor },
    TogglePair,
    Start,
    NewPuzzle { puzzle_id: Option<u32> },
    Restart,
    Ping { t: f64 },
}

pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "key" => {
            let code = parse_optional_u32(object.get("code"))??;
            Some(ParsedClientMessage::Key { code })
        }
        "direction" => {
            let dir = Direction::parse_move(object.get("dir")?.as_str()?)?;
            Some(ParsedClientMessage::Direction { dir })
        }
        "select_robot" => {
            let color = RobotColor::parse(object.get("color")?.as_str()?)?;
            Some(ParsedClientMessage::SelectRobot { color })
        }
        "toggle_pair" => Some(ParsedClientMessage::TogglePair),
        "start" => Some(ParsedClientMessage::Start),
        "new_puzzle" => {
            let puzzle_id = parse_optional_u32(object.get("puzzleId"))?;
            Some(ParsedClientMessage::NewPuzzle { puzzle_id })
        }
        "restart" => Some(ParsedClientMessage::Restart),
        "ping" => {
            let t = object.get("t")?.as_f64()?;
            if !t.is_finite() {
                return None;
            }
            Some(ParsedClientMessage::Ping { t })
        }
        _ => None,
    }
}

/// `Some(None)` when absent, `None` when present but not a non-negative integer in range.
/// Floats are floored.
fn parse_optional_u32(value: Option<&Value>) -> Option<Option<u32>> {
    let Some(value) = value else {
        return Some(None);
    };
    if value.is_null() {
        return Some(None);
    }
    if let Some(number) = value.as_u64() {
        return u32::try_from(number).ok().map(Some);
    }
    if let Some(number) = value.as_f64() {
        if number.is_finite() {
            let floored = number.floor();
            if floored < 0.0 || floored > u32::MAX as f64 {
                return None;
            }
            return Some(Some(floored as u32));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_key_message() {
        let parsed = parse_client_message(r#"{"type":"key","code":39}"#);
        assert!(matches!(parsed, Some(ParsedClientMessage::Key { code: 39 })));
    }

    #[test]
    fn parse_key_requires_a_code() {
        assert!(parse_client_message(r#"{"type":"key"}"#).is_none());
        assert!(parse_client_message(r#"{"type":"key","code":-1}"#).is_none());
        assert!(parse_client_message(r#"{"type":"key","code":"39"}"#).is_none());
        assert!(parse_client_message(r#"{"type":"key","code":4294967296}"#).is_none());
    }

    #[test]
    fn parse_direction_rejects_invalid_direction() {
        let parsed = parse_client_message(r#"{"type":"direction","dir":"invalid"}"#);
        assert!(parsed.is_none());
    }

    #[test]
    fn parse_direction_accepts_none_direction() {
        let parsed = parse_client_message(r#"{"type":"direction","dir":"none"}"#);
        assert!(matches!(
            parsed,
            Some(ParsedClientMessage::Direction {
                dir: Direction::None
            })
        ));
    }

    #[test]
    fn parse_select_robot_is_case_insensitive() {
        let parsed = parse_client_message(r#"{"type":"select_robot","color":" Green "}"#);
        assert!(matches!(
            parsed,
            Some(ParsedClientMessage::SelectRobot {
                color: RobotColor::Green
            })
        ));
        assert!(parse_client_message(r#"{"type":"select_robot","color":"purple"}"#).is_none());
    }

    #[test]
    fn parse_new_puzzle_with_and_without_id() {
        let parsed = parse_client_message(r#"{"type":"new_puzzle","puzzleId":4}"#);
        assert!(matches!(
            parsed,
            Some(ParsedClientMessage::NewPuzzle { puzzle_id: Some(4) })
        ));

        let parsed = parse_client_message(r#"{"type":"new_puzzle"}"#);
        assert!(matches!(
            parsed,
            Some(ParsedClientMessage::NewPuzzle { puzzle_id: None })
        ));

        let parsed = parse_client_message(r#"{"type":"new_puzzle","puzzleId":2.7}"#);
        assert!(matches!(
            parsed,
            Some(ParsedClientMessage::NewPuzzle { puzzle_id: Some(2) })
        ));

        assert!(parse_client_message(r#"{"type":"new_puzzle","puzzleId":"x"}"#).is_none());
        assert!(parse_client_message(r#"{"type":"new_puzzle","puzzleId":1e100}"#).is_none());
    }

    #[test]
    fn parse_unit_messages() {
        assert!(matches!(
            parse_client_message(r#"{"type":"toggle_pair"}"#),
            Some(ParsedClientMessage::TogglePair)
        ));
        assert!(matches!(
            parse_client_message(r#"{"type":"start"}"#),
            Some(ParsedClientMessage::Start)
        ));
        assert!(matches!(
            parse_client_message(r#"{"type":"restart"}"#),
            Some(ParsedClientMessage::Restart)
        ));
        assert!(parse_client_message(r#"{"type":"lobby_start"}"#).is_none());
        assert!(parse_client_message(r#"["start"]"#).is_none());
    }

    #[test]
    fn parse_ping_requires_finite_number() {
        let parsed = parse_client_message(r#"{"type":"ping","t":12.5}"#);
        assert!(matches!(parsed, Some(ParsedClientMessage::Ping { .. })));
        assert!(parse_client_message(r#"{"type":"ping","t":"soon"}"#).is_none());
    }
}
