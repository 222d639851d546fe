//! # Holdem Table
//!
//! A single-table, real-time Texas Hold'em engine.
//!
//! The crate is split in three layers:
//!
//! - [`game`]: cards, hand evaluation, side pots, and the betting-round
//!   state machine. Everything here is synchronous and deterministic given
//!   a seed or a preset deck.
//! - [`net`]: the JSON wire protocol. Inbound frames decode into typed
//!   commands; outbound messages are built from table events and views.
//! - [`table`]: an async actor that owns the table, serializes every
//!   mutation, runs the action and next-hand timers, and fans messages out
//!   to connected players.
//!
//! ## Example
//!
//! ```
//! use holdem_table::{GameSettings, Table, entities::Action};
//!
//! let mut table = Table::with_seed(GameSettings::default(), 7);
//! let ann = table.register().unwrap();
//! let bob = table.register().unwrap();
//! table.set_name(ann, "ann").unwrap();
//! table.set_name(bob, "bob").unwrap();
//! table.start_hand().unwrap();
//! table.drive();
//!
//! let first = table.current_player().unwrap();
//! table.take_action(first, Action::Fold).unwrap();
//! table.drive();
//! assert_eq!(table.chips_in_play(), 2000);
//! ```

/// Core game logic, entities, and the betting state machine.
pub mod game;
pub use game::{
    GameEvent, GameSettings, Progress, Table, TableError, Turn, UserError,
    constants::{self, MAX_PLAYERS},
    entities, eval, pot,
};

/// Wire protocol between players and the table.
pub mod net;
pub use net::messages::{ClientMessage, Recipient, ServerMessage};

/// Async table actor.
pub mod table;
pub use table::{TableActor, TableConfig, TableHandle};
