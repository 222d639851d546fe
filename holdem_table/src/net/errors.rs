//! Protocol error types for inbound frames.

use thiserror::Error;

/// A frame that couldn't be turned into a command. The display string is
/// sent back to the sender.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ProtocolError {
    #[error("Invalid JSON format.")]
    InvalidJson,
    #[error("Invalid message format (missing type or payload).")]
    InvalidFormat,
    #[error("Invalid action amount provided.")]
    InvalidAmount,
    #[error("Unknown action type received: {0}")]
    UnknownAction(String),
    #[error("Unknown message type received: {0}")]
    UnknownType(String),
}

/// Result type for decoding operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
