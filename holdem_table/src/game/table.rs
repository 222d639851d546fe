use log::{info, warn};
use rand::{SeedableRng, rngs::StdRng};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use super::{
    constants::{
        DEFAULT_BIG_BLIND, DEFAULT_SMALL_BLIND, DEFAULT_STARTING_STACK, MAX_NAME_LENGTH,
        MAX_PLAYERS,
    },
    entities::{Card, Chips, Deck, PlayPositions, Player, PlayerId, PlayerStatus, Stage},
    errors::UserError,
    events::GameEvent,
    view::{HIDDEN_CARD, PlayerView, TableView},
};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GameSettings {
    pub max_players: usize,
    pub starting_stack: Chips,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub max_name_length: usize,
}

impl GameSettings {
    pub fn new(max_players: usize, starting_stack: Chips, small_blind: Chips, big_blind: Chips) -> Self {
        Self {
            max_players,
            starting_stack,
            small_blind,
            big_blind,
            max_name_length: MAX_NAME_LENGTH,
        }
    }
}

impl Default for GameSettings {
    fn default() -> Self {
        Self::new(
            MAX_PLAYERS,
            DEFAULT_STARTING_STACK,
            DEFAULT_SMALL_BLIND,
            DEFAULT_BIG_BLIND,
        )
    }
}

/// A prompt that is waiting on one player. Sequence numbers never repeat,
/// so a stale timeout can't fold someone on a later turn.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Turn {
    pub player_id: PlayerId,
    pub seq: u64,
}

/// Where the table stopped after [`Table::drive`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Progress {
    /// No hand is running.
    Idle,
    /// The hand is blocked on this player's decision.
    AwaitingAction(Turn),
    /// The pot has been paid out; the next hand may start.
    HandOver,
}

/// State of the single shared table.
///
/// The betting controller lives in `betting.rs` and the hand sequencing in
/// `hand.rs`; both extend this type.
#[derive(Debug)]
pub struct Table {
    pub(super) settings: GameSettings,
    pub(super) players: BTreeMap<PlayerId, Player>,
    next_player_id: PlayerId,
    /// Seats dealt into the current hand, fixed until the next setup.
    pub(super) active_order: Vec<PlayerId>,
    pub(super) deck: Deck,
    pub(super) preset_deck: Option<Vec<Card>>,
    pub(super) community: Vec<Card>,
    pub(super) pot: Chips,
    /// Street total every player must match.
    pub(super) current_bet: Chips,
    /// Size of the last full bet or raise on this street.
    pub(super) last_raise_size: Chips,
    /// Last player whose bet or raise reopened the action.
    pub(super) last_raiser: Option<PlayerId>,
    pub(super) current_player: Option<PlayerId>,
    pub(super) positions: PlayPositions,
    pub(super) button: Option<usize>,
    pub(super) stage: Stage,
    /// Set once this hand's contenders have been shown down.
    pub(super) hands_revealed: bool,
    /// Players who acted since the street started or since the last full raise.
    pub(super) acted: BTreeSet<PlayerId>,
    pub(super) pending_turn: Option<Turn>,
    pub(super) turn_seq: u64,
    pub(super) hand_number: u64,
    events: VecDeque<GameEvent>,
    pub(super) rng: StdRng,
}

impl Table {
    pub fn new(settings: GameSettings) -> Self {
        Self::with_rng(settings, StdRng::from_os_rng())
    }

    /// A table whose shuffles and button placement are reproducible.
    pub fn with_seed(settings: GameSettings, seed: u64) -> Self {
        Self::with_rng(settings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(settings: GameSettings, rng: StdRng) -> Self {
        Self {
            settings,
            players: BTreeMap::new(),
            next_player_id: 1,
            active_order: Vec::new(),
            deck: Deck::default(),
            preset_deck: None,
            community: Vec::new(),
            pot: 0,
            current_bet: 0,
            last_raise_size: 0,
            last_raiser: None,
            current_player: None,
            positions: PlayPositions::default(),
            button: None,
            stage: Stage::Idle,
            hands_revealed: false,
            acted: BTreeSet::new(),
            pending_turn: None,
            turn_seq: 0,
            hand_number: 0,
            events: VecDeque::new(),
            rng,
        }
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn pot(&self) -> Chips {
        self.pot
    }

    pub fn current_bet(&self) -> Chips {
        self.current_bet
    }

    pub fn current_player(&self) -> Option<PlayerId> {
        self.current_player
    }

    pub fn pending_turn(&self) -> Option<Turn> {
        self.pending_turn
    }

    pub fn last_raiser(&self) -> Option<PlayerId> {
        self.last_raiser
    }

    pub fn community_cards(&self) -> &[Card] {
        &self.community
    }

    pub fn active_order(&self) -> &[PlayerId] {
        &self.active_order
    }

    pub fn positions(&self) -> PlayPositions {
        self.positions
    }

    pub fn hand_number(&self) -> u64 {
        self.hand_number
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn dealer_id(&self) -> Option<PlayerId> {
        self.players
            .values()
            .find(|p| p.is_dealer && !p.disconnected)
            .map(|p| p.id)
    }

    /// Connected players, named or not.
    pub fn num_players(&self) -> usize {
        self.players.values().filter(|p| !p.disconnected).count()
    }

    /// Connected players who have picked a name.
    pub fn num_named(&self) -> usize {
        self.players.values().filter(|p| p.is_named()).count()
    }

    /// Chips held in stacks plus the pot.
    pub fn chips_in_play(&self) -> Chips {
        self.players.values().map(|p| p.stack).sum::<Chips>() + self.pot
    }

    pub fn ready_to_start(&self) -> bool {
        self.stage == Stage::Idle && self.num_named() >= 2
    }

    /// Deal the next hand from exactly these cards instead of a shuffle.
    pub fn preset_deck(&mut self, cards: Vec<Card>) {
        self.preset_deck = Some(cards);
    }

    pub fn drain_events(&mut self) -> VecDeque<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub(super) fn push_event(&mut self, event: GameEvent) {
        self.events.push_back(event);
    }

    /// Seat a new connection. Ids start at 1 and are never reused.
    pub fn register(&mut self) -> Result<PlayerId, UserError> {
        if self.num_players() >= self.settings.max_players {
            return Err(UserError::CapacityReached);
        }
        let id = self.next_player_id;
        self.next_player_id += 1;
        self.players
            .insert(id, Player::new(id, self.settings.starting_stack));
        info!("player {id} connected ({} seated)", self.num_players());
        Ok(id)
    }

    /// First call wins. Returns whether the name was stored.
    pub fn set_name(&mut self, id: PlayerId, name: &str) -> Result<bool, UserError> {
        let max_len = self.settings.max_name_length;
        let Some(player) = self.players.get_mut(&id) else {
            return Err(UserError::UserDoesNotExist);
        };
        if let Some(existing) = &player.name {
            warn!("player {id} tried to rename from {existing}");
            return Ok(false);
        }
        let name: String = name.trim().chars().take(max_len).collect();
        if name.is_empty() {
            let error = UserError::EmptyName;
            self.push_event(GameEvent::Rejected {
                player_id: id,
                error: error.clone(),
            });
            return Err(error);
        }
        info!("player {id} is now {name}");
        player.name = Some(name);
        Ok(true)
    }

    /// Drop a connection. A player still in a hand is folded and kept out
    /// of sight until the hand is over. Returns whether the id was known.
    pub fn unregister(&mut self, id: PlayerId) -> bool {
        let in_current_hand = self.stage.is_betting() && self.active_order.contains(&id);
        let Some(player) = self.players.get_mut(&id) else {
            return false;
        };
        let name = player.display_name();

        if !in_current_hand {
            self.players.remove(&id);
            info!("{name} left the table");
            self.push_event(GameEvent::PlayerLeft { player: name });
            return true;
        }

        player.disconnected = true;
        let was_contending = player.in_hand();
        if was_contending {
            player.fold();
        }
        info!("{name} left mid-hand");
        self.push_event(GameEvent::PlayerLeft { player: name });
        if was_contending {
            if self.pending_turn.is_some_and(|turn| turn.player_id == id) {
                self.pending_turn = None;
            }
            self.resolve_after(id);
        }
        true
    }

    pub(super) fn purge_disconnected(&mut self) {
        self.players.retain(|_, player| !player.disconnected);
    }

    pub(super) fn can_act(&self, id: PlayerId) -> bool {
        self.players.get(&id).is_some_and(Player::can_act)
    }

    /// Contenders in seat order.
    pub(super) fn contenders(&self) -> Vec<PlayerId> {
        self.active_order
            .iter()
            .copied()
            .filter(|id| self.players.get(id).is_some_and(Player::in_hand))
            .collect()
    }

    /// Snapshot as seen by `viewer`. `None` sees no hole cards until showdown.
    pub fn view_for(&self, viewer: Option<PlayerId>) -> TableView {
        let players = self
            .players
            .values()
            .filter(|p| !p.disconnected)
            .map(|p| (p.id, self.player_view(p, viewer)))
            .collect();
        TableView {
            players,
            community_cards: self.community.clone(),
            pot: self.pot,
            current_player_id: self.current_player,
            dealer_id: self.dealer_id(),
            game_stage: self.stage,
            big_blind: self.settings.big_blind,
        }
    }

    fn player_view(&self, player: &Player, viewer: Option<PlayerId>) -> PlayerView {
        let shown = viewer == Some(player.id) || self.hands_revealed;
        let hand = if player.status == PlayerStatus::Folded {
            Vec::new()
        } else if shown {
            player.hand.iter().map(Card::to_string).collect()
        } else {
            vec![HIDDEN_CARD.to_string(); player.hand.len()]
        };
        PlayerView {
            id: player.id,
            name: player.display_name(),
            stack: player.stack,
            hand,
            current_bet: player.current_bet,
            status: player.status,
            is_dealer: player.is_dealer,
            last_action: player.last_action,
            last_hand_rank: player.last_hand_rank.clone(),
            total_bet_this_hand: player.total_bet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_named(names: &[&str]) -> (Table, Vec<PlayerId>) {
        let mut table = Table::with_seed(GameSettings::default(), 1);
        let ids = names
            .iter()
            .map(|name| {
                let id = table.register().unwrap();
                table.set_name(id, name).unwrap();
                id
            })
            .collect();
        (table, ids)
    }

    // === Registration Tests ===

    #[test]
    fn test_register_assigns_increasing_ids() {
        let mut table = Table::new(GameSettings::default());
        assert_eq!(table.register(), Ok(1));
        assert_eq!(table.register(), Ok(2));
        assert_eq!(table.player(2).unwrap().stack, 1000);
    }

    #[test]
    fn test_register_rejects_when_full() {
        let mut table = Table::new(GameSettings::new(2, 1000, 10, 20));
        table.register().unwrap();
        table.register().unwrap();
        assert_eq!(table.register(), Err(UserError::CapacityReached));
    }

    #[test]
    fn test_set_name_trims_truncates_and_keeps_first() {
        let mut table = Table::new(GameSettings::default());
        let id = table.register().unwrap();
        assert_eq!(table.set_name(id, "   a-very-long-player-name  "), Ok(true));
        assert_eq!(table.player(id).unwrap().name.as_deref(), Some("a-very-long-pla"));
        assert_eq!(table.set_name(id, "other"), Ok(false));
        assert_eq!(table.player(id).unwrap().name.as_deref(), Some("a-very-long-pla"));
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let mut table = Table::new(GameSettings::default());
        let id = table.register().unwrap();
        assert_eq!(table.set_name(id, "   "), Err(UserError::EmptyName));
        assert_eq!(table.num_named(), 0);
        assert!(matches!(
            table.drain_events().pop_front(),
            Some(GameEvent::Rejected { player_id, .. }) if player_id == id
        ));
    }

    #[test]
    fn test_unregister_while_idle_removes_player() {
        let (mut table, ids) = table_with_named(&["ann", "bob"]);
        assert!(table.unregister(ids[0]));
        assert!(table.player(ids[0]).is_none());
        assert!(!table.unregister(ids[0]));
        assert_eq!(table.num_named(), 1);
    }

    // === View Tests ===

    #[test]
    fn test_idle_view() {
        let (table, ids) = table_with_named(&["ann", "bob"]);
        let view = table.view_for(Some(ids[0]));
        assert_eq!(view.game_stage, Stage::Idle);
        assert_eq!(view.players.len(), 2);
        assert_eq!(view.big_blind, 20);
        assert!(view.player(ids[1]).unwrap().hand.is_empty());
    }

    #[test]
    fn test_view_json_keys() {
        let (table, ids) = table_with_named(&["ann", "bob"]);
        let json = serde_json::to_value(table.view_for(Some(ids[0]))).unwrap();
        assert_eq!(json["bigBlind"], 20);
        assert_eq!(json["game_stage"], "idle");
        assert!(json["current_player_id"].is_null());
        assert_eq!(json["players"]["1"]["name"], "ann");
        assert_eq!(json["players"]["1"]["status"], "waiting");
        assert_eq!(json["players"]["1"]["total_bet_this_hand"], 0);
    }
}
