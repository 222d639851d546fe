//! WebSocket server hosting a single Texas Hold'em table.
//!
//! The binary wires these modules together; they are exposed as a library so
//! integration tests can build the router against an in-process table.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
