//! Table configuration models.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::game::{
    GameSettings,
    constants::{
        DEFAULT_ACTION_TIMEOUT_SECS, DEFAULT_BIG_BLIND, DEFAULT_HAND_END_DELAY_SECS,
        DEFAULT_SMALL_BLIND, DEFAULT_STARTING_STACK, MAX_NAME_LENGTH, MAX_PLAYERS,
    },
    entities::Chips,
};

/// Hard seat limit: 22 players use 44 hole cards, leaving 8 for the board
/// and burns.
pub const SEAT_LIMIT: usize = 22;

/// Table configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Table name
    pub name: String,

    /// Maximum number of seated players (default: 8)
    pub max_players: usize,

    /// Chips each new player sits down with
    pub starting_stack: Chips,

    /// Small blind amount
    pub small_blind: Chips,

    /// Big blind amount
    pub big_blind: Chips,

    /// Seconds a player has to act before being folded
    pub action_timeout_secs: u64,

    /// Pause between hands, in seconds
    pub hand_end_delay_secs: u64,

    /// Longest accepted display name
    pub max_name_length: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            name: "Main Table".to_string(),
            max_players: MAX_PLAYERS,
            starting_stack: DEFAULT_STARTING_STACK,
            small_blind: DEFAULT_SMALL_BLIND,
            big_blind: DEFAULT_BIG_BLIND,
            action_timeout_secs: DEFAULT_ACTION_TIMEOUT_SECS,
            hand_end_delay_secs: DEFAULT_HAND_END_DELAY_SECS,
            max_name_length: MAX_NAME_LENGTH,
        }
    }
}

impl TableConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.small_blind == 0 {
            return Err("Small blind must be positive".to_string());
        }

        if self.big_blind <= self.small_blind {
            return Err("Big blind must be greater than small blind".to_string());
        }

        if self.starting_stack < self.big_blind {
            return Err("Starting stack must cover the big blind".to_string());
        }

        if self.max_players < 2 || self.max_players > SEAT_LIMIT {
            return Err(format!("Max players must be between 2 and {SEAT_LIMIT}"));
        }

        if self.action_timeout_secs == 0 {
            return Err("Action timeout must be at least one second".to_string());
        }

        if self.max_name_length == 0 {
            return Err("Max name length must be positive".to_string());
        }

        Ok(())
    }

    pub fn action_timeout(&self) -> Duration {
        Duration::from_secs(self.action_timeout_secs)
    }

    pub fn hand_end_delay(&self) -> Duration {
        Duration::from_secs(self.hand_end_delay_secs)
    }

    pub fn game_settings(&self) -> GameSettings {
        GameSettings {
            max_players: self.max_players,
            starting_stack: self.starting_stack,
            small_blind: self.small_blind,
            big_blind: self.big_blind,
            max_name_length: self.max_name_length,
        }
    }
}
