use serde::Serialize;
use std::{collections::BTreeMap, fmt};

use super::{
    entities::{ActionChoice, BlindKind, Card, Chips, PlayerId, Stage},
    errors::UserError,
};

/// What the acting player may do, sent only to them.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnPrompt {
    pub player_id: PlayerId,
    pub actions: Vec<ActionChoice>,
    pub call_amount: Chips,
    /// Smallest legal bet or raise-to total. Zero when neither is legal.
    pub min_raise: Chips,
    /// Largest legal bet or raise-to total (the player's all-in).
    pub max_raise: Chips,
    pub current_bet: Chips,
    pub stack: Chips,
    pub big_blind: Chips,
}

/// A resolved action. `amount` is the player's street total afterwards
/// for calls, bets and raises, and zero otherwise.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionNotice {
    pub player_id: PlayerId,
    pub action: ActionChoice,
    pub amount: Chips,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowdownReveal {
    pub all_hands: BTreeMap<PlayerId, Vec<Card>>,
    pub hand_ranks: BTreeMap<PlayerId, String>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WinnerSummary {
    pub player_id: PlayerId,
    pub player_name: String,
    pub amount: Chips,
    pub hand_rank: Option<String>,
    pub winning_hand: Vec<Card>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PotAward {
    pub winners: Vec<WinnerSummary>,
    pub is_uncontested: bool,
}

/// Things that happened at the table, queued until the owner drains them.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GameEvent {
    HandStarted { hand_number: u64, dealer: String },
    BlindPosted {
        player: String,
        blind: BlindKind,
        amount: Chips,
        all_in: bool,
    },
    StreetDealt { stage: Stage, cards: Vec<Card> },
    TurnStarted(TurnPrompt),
    ActionTaken(ActionNotice),
    TimedOut { player: String },
    Rejected { player_id: PlayerId, error: UserError },
    Showdown(ShowdownReveal),
    PotAwarded(PotAward),
    PlayerLeft { player: String },
    NextHand { delay_secs: u64 },
    HandCancelled,
    GamePaused,
    DeckExhausted,
}

impl GameEvent {
    /// Events shown to everyone as a narrative line.
    pub fn is_announcement(&self) -> bool {
        matches!(
            self,
            Self::HandStarted { .. }
                | Self::BlindPosted { .. }
                | Self::TimedOut { .. }
                | Self::PlayerLeft { .. }
                | Self::NextHand { .. }
                | Self::HandCancelled
                | Self::GamePaused
                | Self::DeckExhausted
        )
    }
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HandStarted { dealer, .. } => {
                write!(f, "--- Starting New Hand --- Dealer: {dealer}")
            }
            Self::BlindPosted {
                player,
                blind,
                amount,
                all_in,
            } => {
                write!(f, "{player} posts {blind} ${amount}")?;
                if *all_in {
                    write!(f, " (All-in)")?;
                }
                Ok(())
            }
            Self::StreetDealt { stage, cards } => {
                write!(f, "{stage}:")?;
                for card in cards {
                    write!(f, " {card}")?;
                }
                Ok(())
            }
            Self::TurnStarted(prompt) => write!(f, "player {} to act", prompt.player_id),
            Self::ActionTaken(notice) => write!(
                f,
                "player {} {} (${})",
                notice.player_id, notice.action, notice.amount
            ),
            Self::TimedOut { player } => write!(f, "{player} timed out and folds."),
            Self::Rejected { player_id, error } => write!(f, "player {player_id}: {error}"),
            Self::Showdown(reveal) => write!(f, "showdown with {} hands", reveal.all_hands.len()),
            Self::PotAwarded(award) => {
                let total: Chips = award.winners.iter().map(|w| w.amount).sum();
                write!(f, "${total} awarded to {} player(s)", award.winners.len())
            }
            Self::PlayerLeft { player } => write!(f, "{player} left the table."),
            Self::NextHand { delay_secs } => {
                write!(f, "--- Next hand starting in {delay_secs}s ---")
            }
            Self::HandCancelled => write!(f, "Not enough players to continue. Waiting..."),
            Self::GamePaused => write!(f, "Game paused. Waiting for players..."),
            Self::DeckExhausted => write!(f, "Error: Deck ran out of cards!"),
        }
    }
}
