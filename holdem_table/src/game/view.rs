//! Perspective-filtered snapshots of the table.

use serde::Serialize;
use std::collections::BTreeMap;

use super::entities::{Card, Chips, LastAction, PlayerId, PlayerStatus, Stage};

/// Placeholder for a card the viewer may not see.
pub const HIDDEN_CARD: &str = "??";

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub stack: Chips,
    pub hand: Vec<String>,
    pub current_bet: Chips,
    pub status: PlayerStatus,
    pub is_dealer: bool,
    pub last_action: Option<LastAction>,
    pub last_hand_rank: Option<String>,
    pub total_bet_this_hand: Chips,
}

/// Everything a single player is allowed to know about the table.
///
/// Maps are ordered so that serializing the same state twice yields the
/// same bytes.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct TableView {
    pub players: BTreeMap<PlayerId, PlayerView>,
    pub community_cards: Vec<Card>,
    pub pot: Chips,
    pub current_player_id: Option<PlayerId>,
    pub dealer_id: Option<PlayerId>,
    pub game_stage: Stage,
    #[serde(rename = "bigBlind")]
    pub big_blind: Chips,
}

impl TableView {
    pub fn player(&self, id: PlayerId) -> Option<&PlayerView> {
        self.players.get(&id)
    }
}
