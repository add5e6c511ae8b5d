use serde::Serialize;
use serde_json::Value;

use crate::types::{Direction, Frame, HeldDirections};

#[derive(Debug, PartialEq, Eq)]
pub enum ParsedClientMessage {
    Start,
    Input { held: HeldDirections },
}

pub fn parse_client_message(raw: &str) -> Option<ParsedClientMessage> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;
    let message_type = object.get("type")?.as_str()?;

    match message_type {
        "start" => Some(ParsedClientMessage::Start),
        "input" => {
            let held = match object.get("held") {
                None => HeldDirections::none(),
                Some(value) => parse_held(value)?,
            };
            Some(ParsedClientMessage::Input { held })
        }
        _ => None,
    }
}

fn parse_held(value: &Value) -> Option<HeldDirections> {
    let mut held = HeldDirections::none();
    for entry in value.as_array()? {
        let dir = Direction::parse_move(entry.as_str()?)?;
        held.set(dir, true);
    }
    Some(held)
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome { seed: u32, width: i32, height: i32 },
    Frame { frame: Frame },
    Error { message: String },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
