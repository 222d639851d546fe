//! Table actor message types.

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::{
    game::{
        UserError,
        entities::{Action, Chips, PlayerId, Stage},
        view::TableView,
    },
    net::messages::ServerMessage,
};

/// Messages that can be sent to a TableActor
#[derive(Debug)]
pub enum TableMessage {
    /// A new connection. Everything for this player is pushed to `outbound`.
    Register {
        outbound: mpsc::Sender<ServerMessage>,
        response: oneshot::Sender<Result<PlayerId, UserError>>,
    },

    /// Connection closed
    Unregister { player_id: PlayerId },

    /// Set display name (first call wins)
    SetName { player_id: PlayerId, name: String },

    /// Player action (fold, check, call, bet, raise)
    TakeAction { player_id: PlayerId, action: Action },

    /// Get the table as a specific player sees it
    GetView {
        player_id: Option<PlayerId>,
        response: oneshot::Sender<TableView>,
    },

    /// Get a public summary of the table
    GetSummary {
        response: oneshot::Sender<TableSummary>,
    },

    /// Stop the actor
    Close,
}

/// The actor is gone and can't take messages.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("Table is closed")]
pub struct TableClosed;

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum RegisterError {
    #[error(transparent)]
    Rejected(#[from] UserError),
    #[error(transparent)]
    Closed(#[from] TableClosed),
}

/// Public table state, without any hole cards
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    /// Table name
    pub table_name: String,

    /// Connected players
    pub player_count: usize,

    /// Players who have picked a name
    pub named_count: usize,

    /// Maximum players
    pub max_players: usize,

    /// Small blind
    pub small_blind: Chips,

    /// Big blind
    pub big_blind: Chips,

    /// Current pot size
    pub pot_size: Chips,

    /// Current stage
    pub stage: Stage,

    /// Hands started since the table opened
    pub hand_number: u64,
}
