use serde::Serialize;
use serde_json::Value;

use super::errors::{ProtocolError, Result};
use crate::game::{
    GameEvent,
    entities::{Action, ActionChoice, Chips, PlayerId},
    events::{ActionNotice, PotAward, ShowdownReveal, TurnPrompt},
    view::TableView,
};

/// A decoded command from a player.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ClientMessage {
    SetName { name: String },
    PlayerAction { action: Action },
}

impl ClientMessage {
    /// Decode one text frame.
    pub fn decode(text: &str) -> Result<Self> {
        let frame: Value = serde_json::from_str(text).map_err(|_| ProtocolError::InvalidJson)?;
        let kind = frame.get("type").and_then(Value::as_str);
        let payload = frame.get("payload").filter(|payload| !payload.is_null());
        let (Some(kind), Some(payload)) = (kind, payload) else {
            return Err(ProtocolError::InvalidFormat);
        };

        match kind {
            "set_name" => {
                let name = payload
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or(ProtocolError::InvalidFormat)?;
                Ok(Self::SetName {
                    name: name.to_string(),
                })
            }
            "player_action" => {
                let amount = parse_amount(payload.get("amount"))?;
                let action = payload
                    .get("action")
                    .and_then(Value::as_str)
                    .ok_or(ProtocolError::InvalidFormat)?;
                let choice: ActionChoice = action.parse().map_err(ProtocolError::UnknownAction)?;
                Ok(Self::PlayerAction {
                    action: choice.with_amount(amount),
                })
            }
            other => Err(ProtocolError::UnknownType(other.to_string())),
        }
    }
}

/// Accepts a non-negative integer, a whole-number float, or a numeric string.
/// Fractional amounts are rejected.
fn parse_amount(amount: Option<&Value>) -> Result<Option<Chips>> {
    let amount = match amount {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(number)) => match number.as_u64() {
            Some(whole) => whole,
            None => number
                .as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
                .map(|f| f as u64)
                .ok_or(ProtocolError::InvalidAmount)?,
        },
        Some(Value::String(text)) => text
            .trim()
            .parse::<u64>()
            .map_err(|_| ProtocolError::InvalidAmount)?,
        Some(_) => return Err(ProtocolError::InvalidAmount),
    };
    Chips::try_from(amount)
        .map(Some)
        .map_err(|_| ProtocolError::InvalidAmount)
}

/// Who an outbound message is for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Recipient {
    All,
    Player(PlayerId),
}

/// Messages sent to players.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    #[serde(rename_all = "camelCase")]
    AssignId { player_id: PlayerId },
    GameState(TableView),
    GameMessage { message: String },
    PlayerTurn(TurnPrompt),
    PlayerAction(ActionNotice),
    Showdown(ShowdownReveal),
    PotAwarded(PotAward),
    Error { message: String },
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Translate a table event into the message players see, if any.
    pub fn from_event(event: GameEvent) -> Option<(Recipient, Self)> {
        if event.is_announcement() {
            return Some((
                Recipient::All,
                Self::GameMessage {
                    message: event.to_string(),
                },
            ));
        }
        let routed = match event {
            GameEvent::TurnStarted(prompt) => (Recipient::Player(prompt.player_id), Self::PlayerTurn(prompt)),
            GameEvent::ActionTaken(notice) => (Recipient::All, Self::PlayerAction(notice)),
            GameEvent::Rejected { player_id, error } => {
                (Recipient::Player(player_id), Self::error(error.to_string()))
            }
            GameEvent::Showdown(reveal) => (Recipient::All, Self::Showdown(reveal)),
            GameEvent::PotAwarded(award) => (Recipient::All, Self::PotAwarded(award)),
            _ => return None,
        };
        Some(routed)
    }
}
