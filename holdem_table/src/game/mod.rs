//! Poker game engine: cards, hand evaluation, pots, and the betting state
//! machine for a single table.
//!
//! [`Table`] owns all mutable state. Its methods are synchronous and queue
//! [`GameEvent`]s describing what happened; the caller drains them after
//! each mutation and fans them out.

pub mod constants;
pub mod entities;
pub mod errors;
pub mod eval;
pub mod events;
pub mod pot;
pub mod table;
pub mod view;

mod betting;
mod hand;

pub use errors::{TableError, UserError};
pub use events::GameEvent;
pub use table::{GameSettings, Progress, Table, Turn};
