//! Wire protocol between players and the table.
//!
//! Frames are JSON objects of the form `{"type": ..., "payload": ...}`.
//! Inbound frames are decoded into typed commands before they reach the
//! table; outbound messages are built from table events and views.

/// Decoding failures reported back to the sender.
pub mod errors;

/// Inbound commands and outbound messages.
pub mod messages;
