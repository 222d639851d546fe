//! Table module running the shared table as an async actor.
//!
//! This module implements:
//! - TableActor: Async actor owning the only copy of the [`Table`](crate::game::Table)
//! - TableHandle: Cloneable sender used by connections
//! - Table configuration and lifecycle management
//!
//! ## Architecture
//!
//! The table runs in its own Tokio task with an mpsc message inbox. Every
//! command, timeout, and next-hand start is handled one at a time by that
//! task, so no two mutations ever overlap. After each mutation the actor
//! drives the hand forward, arms the next deadline, and pushes events and
//! per-player views to each connection's outbound queue without waiting.
//!
//! ## Example
//!
//! ```no_run
//! use holdem_table::table::{TableActor, TableConfig};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let (actor, handle) = TableActor::new(TableConfig::default());
//!     tokio::spawn(actor.run());
//!
//!     let (outbound, mut inbox) = mpsc::channel(64);
//!     let player_id = handle.register(outbound).await.unwrap();
//!     handle.set_name(player_id, "ann".to_string()).await.unwrap();
//!     while let Some(message) = inbox.recv().await {
//!         println!("{}", message.to_json().unwrap());
//!     }
//! }
//! ```

pub mod actor;
pub mod config;
pub mod messages;

pub use actor::{TableActor, TableHandle};
pub use config::{SEAT_LIMIT, TableConfig};
pub use messages::{RegisterError, TableClosed, TableMessage, TableSummary};
