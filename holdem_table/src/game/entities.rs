use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// Type alias for table chips. Stacks, bets, and pots are whole chips.
pub type Chips = u32;

/// Stable id assigned to a connection for its whole lifetime.
pub type PlayerId = u32;

/// Index into the active-order of the current hand.
pub type SeatIndex = usize;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Suit {
    Spade,
    Heart,
    Diamond,
    Club,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Spade, Suit::Heart, Suit::Diamond, Suit::Club];

    fn symbol(self) -> char {
        match self {
            Self::Spade => '♠',
            Self::Heart => '♥',
            Self::Diamond => '♦',
            Self::Club => '♣',
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c {
            '♠' | 's' | 'S' => Some(Self::Spade),
            '♥' | 'h' | 'H' => Some(Self::Heart),
            '♦' | 'd' | 'D' => Some(Self::Diamond),
            '♣' | 'c' | 'C' => Some(Self::Club),
            _ => None,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Card rank value. Two is 2 and ace is 14.
pub type Value = u8;

pub const ACE: Value = 14;
pub const VALUE_CHARS: &str = "23456789TJQKA";

/// Rank character for a card value, `?` if out of range.
pub fn value_char(value: Value) -> char {
    value
        .checked_sub(2)
        .and_then(|idx| VALUE_CHARS.chars().nth(usize::from(idx)))
        .unwrap_or('?')
}

/// A card is a tuple of a value (two=2u8 ... ace=14u8) and a suit.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Card(pub Value, pub Suit);

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", value_char(self.0), self.1)
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
#[error("invalid card `{0}`")]
pub struct CardParseError(String);

impl FromStr for Card {
    type Err = CardParseError;

    /// Parses `A♠`, `As`, `Td` or `10d`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || CardParseError(s.to_string());
        let trimmed = s.trim();
        let suit_char = trimmed.chars().last().ok_or_else(err)?;
        let suit = Suit::from_char(suit_char).ok_or_else(err)?;
        let rank = &trimmed[..trimmed.len() - suit_char.len_utf8()];
        let value = match rank {
            "10" => 10,
            r if r.chars().count() == 1 => {
                let c = r.chars().next().ok_or_else(err)?.to_ascii_uppercase();
                let idx = VALUE_CHARS.find(c).ok_or_else(err)?;
                idx as Value + 2
            }
            _ => return Err(err()),
        };
        Ok(Card(value, suit))
    }
}

impl Serialize for Card {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Card {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = String::deserialize(deserializer)?;
        repr.parse().map_err(serde::de::Error::custom)
    }
}

/// Ordered cards consumed from the front.
#[derive(Clone, Debug)]
pub struct Deck {
    cards: Vec<Card>,
    deck_idx: usize,
}

impl Deck {
    /// A shuffled standard 52-card deck.
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::default();
        deck.cards.shuffle(rng);
        deck
    }

    /// A deck dealt in exactly the given order.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards, deck_idx: 0 }
    }

    pub fn deal_card(&mut self) -> Option<Card> {
        let card = self.cards.get(self.deck_idx).copied()?;
        self.deck_idx += 1;
        Some(card)
    }

    pub fn remaining(&self) -> usize {
        self.cards.len() - self.deck_idx
    }
}

impl Default for Deck {
    fn default() -> Self {
        let cards = (2..=ACE)
            .flat_map(|value| Suit::ALL.into_iter().map(move |suit| Card(value, suit)))
            .collect();
        Self { cards, deck_idx: 0 }
    }
}

/// A player's decision on their turn. Bet and raise amounts are the
/// street total the player wants to have in front of them.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Action {
    Fold,
    Check,
    Call,
    Bet(Option<Chips>),
    Raise(Option<Chips>),
}

impl Action {
    pub fn choice(&self) -> ActionChoice {
        match self {
            Self::Fold => ActionChoice::Fold,
            Self::Check => ActionChoice::Check,
            Self::Call => ActionChoice::Call,
            Self::Bet(_) => ActionChoice::Bet,
            Self::Raise(_) => ActionChoice::Raise,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fold => write!(f, "fold"),
            Self::Check => write!(f, "check"),
            Self::Call => write!(f, "call"),
            Self::Bet(Some(amount)) => write!(f, "bet ${amount}"),
            Self::Raise(Some(amount)) => write!(f, "raise to ${amount}"),
            Self::Bet(None) => write!(f, "bet"),
            Self::Raise(None) => write!(f, "raise"),
        }
    }
}

/// Kind of action, without an amount. Used to advertise legal moves.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionChoice {
    Fold,
    Check,
    Call,
    Bet,
    Raise,
}

impl ActionChoice {
    pub fn with_amount(self, amount: Option<Chips>) -> Action {
        match self {
            Self::Fold => Action::Fold,
            Self::Check => Action::Check,
            Self::Call => Action::Call,
            Self::Bet => Action::Bet(amount),
            Self::Raise => Action::Raise(amount),
        }
    }
}

impl fmt::Display for ActionChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Fold => "fold",
            Self::Check => "check",
            Self::Call => "call",
            Self::Bet => "bet",
            Self::Raise => "raise",
        };
        write!(f, "{repr}")
    }
}

impl FromStr for ActionChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fold" => Ok(Self::Fold),
            "check" => Ok(Self::Check),
            "call" => Ok(Self::Call),
            "bet" => Ok(Self::Bet),
            "raise" => Ok(Self::Raise),
            _ => Err(s.to_string()),
        }
    }
}

/// Last thing a player did on the current street.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LastAction {
    Blind,
    Fold,
    Check,
    Call,
    Bet,
    Raise,
}

impl From<ActionChoice> for LastAction {
    fn from(choice: ActionChoice) -> Self {
        match choice {
            ActionChoice::Fold => Self::Fold,
            ActionChoice::Check => Self::Check,
            ActionChoice::Call => Self::Call,
            ActionChoice::Bet => Self::Bet,
            ActionChoice::Raise => Self::Raise,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    /// Seated but not dealt into the current hand.
    Waiting,
    Active,
    Folded,
    #[serde(rename = "all-in")]
    AllIn,
}

impl fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Waiting => "waiting",
            Self::Active => "active",
            Self::Folded => "folded",
            Self::AllIn => "all-in",
        };
        write!(f, "{repr}")
    }
}

/// Where the table is in the hand lifecycle.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    Starting,
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
    HandOver,
}

impl Stage {
    /// Streets where players are asked to act.
    pub fn is_betting(self) -> bool {
        matches!(self, Self::Preflop | Self::Flop | Self::Turn | Self::River)
    }

    /// The stage that follows a completed betting street.
    pub fn next_street(self) -> Option<Self> {
        match self {
            Self::Preflop => Some(Self::Flop),
            Self::Flop => Some(Self::Turn),
            Self::Turn => Some(Self::River),
            Self::River => Some(Self::Showdown),
            _ => None,
        }
    }

    /// Community cards dealt when entering this stage.
    pub fn cards_dealt(self) -> usize {
        match self {
            Self::Flop => 3,
            Self::Turn | Self::River => 1,
            _ => 0,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Idle => "idle",
            Self::Starting => "starting",
            Self::Preflop => "preflop",
            Self::Flop => "flop",
            Self::Turn => "turn",
            Self::River => "river",
            Self::Showdown => "showdown",
            Self::HandOver => "hand_over",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BlindKind {
    Small,
    Big,
}

impl fmt::Display for BlindKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Small => write!(f, "Small Blind"),
            Self::Big => write!(f, "Big Blind"),
        }
    }
}

/// Seat indices into the active-order for the current hand.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PlayPositions {
    pub dealer: SeatIndex,
    pub small_blind: SeatIndex,
    pub big_blind: SeatIndex,
}

impl PlayPositions {
    /// Heads-up the dealer posts the small blind.
    pub fn from_dealer(dealer: SeatIndex, num_players: usize) -> Self {
        if num_players == 2 {
            Self {
                dealer,
                small_blind: dealer,
                big_blind: (dealer + 1) % num_players,
            }
        } else {
            Self {
                dealer,
                small_blind: (dealer + 1) % num_players,
                big_blind: (dealer + 2) % num_players,
            }
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: Option<String>,
    pub stack: Chips,
    pub hand: Vec<Card>,
    /// Chips put in on the current street.
    pub current_bet: Chips,
    /// Chips put in over the whole hand.
    pub total_bet: Chips,
    pub status: PlayerStatus,
    pub is_dealer: bool,
    pub last_action: Option<LastAction>,
    pub last_hand_rank: Option<String>,
    /// Connection is gone; the seat is removed once the hand allows it.
    pub(crate) disconnected: bool,
}

impl Player {
    pub fn new(id: PlayerId, stack: Chips) -> Self {
        Self {
            id,
            name: None,
            stack,
            hand: Vec::new(),
            current_bet: 0,
            total_bet: 0,
            status: PlayerStatus::Waiting,
            is_dealer: false,
            last_action: None,
            last_hand_rank: None,
            disconnected: false,
        }
    }

    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("Player {}", self.id))
    }

    /// Counts toward keeping the game running.
    pub fn is_named(&self) -> bool {
        self.name.is_some() && !self.disconnected
    }

    pub fn can_act(&self) -> bool {
        self.status == PlayerStatus::Active && self.stack > 0
    }

    /// Still contending for the pot.
    pub fn in_hand(&self) -> bool {
        matches!(self.status, PlayerStatus::Active | PlayerStatus::AllIn)
    }

    /// Move up to `amount` chips from the stack into the pot, returning
    /// the chips actually moved.
    pub fn commit(&mut self, amount: Chips) -> Chips {
        let moved = amount.min(self.stack);
        self.stack -= moved;
        self.current_bet += moved;
        self.total_bet += moved;
        if self.stack == 0 && self.status == PlayerStatus::Active {
            self.status = PlayerStatus::AllIn;
        }
        moved
    }

    pub fn fold(&mut self) {
        self.status = PlayerStatus::Folded;
        self.hand.clear();
        self.last_action = Some(LastAction::Fold);
    }

    pub fn reset_for_hand(&mut self, dealt_in: bool) {
        self.hand.clear();
        self.current_bet = 0;
        self.total_bet = 0;
        self.is_dealer = false;
        self.last_action = None;
        self.last_hand_rank = None;
        self.status = if dealt_in {
            PlayerStatus::Active
        } else {
            PlayerStatus::Waiting
        };
    }
}
