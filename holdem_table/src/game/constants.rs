//! Table-wide defaults.

use super::entities::Chips;

/// Most players that can sit at the table at once.
pub const MAX_PLAYERS: usize = 8;

pub const DEFAULT_STARTING_STACK: Chips = 1000;
pub const DEFAULT_SMALL_BLIND: Chips = 10;
pub const DEFAULT_BIG_BLIND: Chips = 20;

/// Display names are trimmed and then cut to this many characters.
pub const MAX_NAME_LENGTH: usize = 15;

/// Seconds a player has to act before being folded.
pub const DEFAULT_ACTION_TIMEOUT_SECS: u64 = 60;

/// Seconds between the end of one hand and the start of the next.
pub const DEFAULT_HAND_END_DELAY_SECS: u64 = 5;

/// Hole cards dealt to each player.
pub const HOLE_CARDS: usize = 2;
