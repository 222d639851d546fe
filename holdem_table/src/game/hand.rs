//! Hand orchestration: setup, street dealing, showdown and payout.

use log::{error, info, warn};
use rand::Rng;
use std::collections::BTreeMap;

use super::{
    constants::HOLE_CARDS,
    entities::{BlindKind, Chips, Deck, LastAction, PlayPositions, PlayerId, PlayerStatus, Stage},
    errors::TableError,
    eval::evaluate,
    events::{GameEvent, PotAward, ShowdownReveal, WinnerSummary},
    pot,
    table::{Progress, Table},
};

impl Table {
    /// Shuffle, seat, deal hole cards, and post blinds.
    ///
    /// On [`TableError::NotEnoughPlayers`] the table is back to idle. On
    /// [`TableError::DeckExhausted`] the hand has been ended as `hand_over`.
    pub fn start_hand(&mut self) -> Result<(), TableError> {
        if !matches!(self.stage, Stage::Idle | Stage::HandOver) {
            return Err(TableError::HandInProgress { stage: self.stage });
        }
        self.purge_disconnected();
        self.reset_hand_state();
        self.stage = Stage::Starting;

        let eligible: Vec<PlayerId> = self
            .players
            .values()
            .filter(|p| p.is_named() && p.stack > 0)
            .map(|p| p.id)
            .collect();
        for player in self.players.values_mut() {
            let dealt_in = eligible.contains(&player.id);
            player.reset_for_hand(dealt_in);
        }
        if eligible.len() < 2 {
            self.active_order.clear();
            self.stage = Stage::Idle;
            return Err(TableError::NotEnoughPlayers);
        }

        let num_players = eligible.len();
        self.active_order = eligible;
        let dealer = match self.button {
            Some(previous) => (previous + 1) % num_players,
            None => self.rng.random_range(0..num_players),
        };
        self.button = Some(dealer);
        self.positions = PlayPositions::from_dealer(dealer, num_players);
        self.deck = match self.preset_deck.take() {
            Some(cards) => Deck::from_cards(cards),
            None => Deck::shuffled(&mut self.rng),
        };
        self.hand_number += 1;

        let dealer_id = self.active_order[dealer];
        let mut dealer_name = String::new();
        if let Some(player) = self.players.get_mut(&dealer_id) {
            player.is_dealer = true;
            dealer_name = player.display_name();
        }
        info!(
            "hand #{} starting with {num_players} players, dealer {dealer_name}",
            self.hand_number
        );
        self.push_event(GameEvent::HandStarted {
            hand_number: self.hand_number,
            dealer: dealer_name,
        });

        if let Err(err) = self.deal_hole_cards() {
            self.abort_hand(&err);
            return Err(err);
        }

        let small = self.post_blind(BlindKind::Small);
        let big = self.post_blind(BlindKind::Big);
        self.current_bet = small.max(big);
        self.last_raise_size = self.settings.big_blind;
        self.last_raiser = self.active_order.get(self.positions.big_blind).copied();
        self.stage = Stage::Preflop;
        self.current_player = self.next_actor_after(self.positions.big_blind);
        Ok(())
    }

    fn reset_hand_state(&mut self) {
        self.community.clear();
        self.pot = 0;
        self.current_bet = 0;
        self.last_raise_size = 0;
        self.last_raiser = None;
        self.current_player = None;
        self.pending_turn = None;
        self.acted.clear();
        self.hands_revealed = false;
    }

    /// One card at a time, starting left of the dealer.
    fn deal_hole_cards(&mut self) -> Result<(), TableError> {
        let num_players = self.active_order.len();
        for _ in 0..HOLE_CARDS {
            for offset in 1..=num_players {
                let id = self.active_order[(self.positions.dealer + offset) % num_players];
                let card = self.deck.deal_card().ok_or(TableError::DeckExhausted {
                    stage: Stage::Starting,
                })?;
                if let Some(player) = self.players.get_mut(&id) {
                    player.hand.push(card);
                }
            }
        }
        Ok(())
    }

    /// Post a blind, short if the stack can't cover it. Returns the
    /// poster's street total.
    fn post_blind(&mut self, kind: BlindKind) -> Chips {
        let (seat, amount) = match kind {
            BlindKind::Small => (self.positions.small_blind, self.settings.small_blind),
            BlindKind::Big => (self.positions.big_blind, self.settings.big_blind),
        };
        let Some(player) = self
            .active_order
            .get(seat)
            .and_then(|id| self.players.get_mut(id))
        else {
            return 0;
        };
        let posted = player.commit(amount);
        player.last_action = Some(LastAction::Blind);
        let total = player.current_bet;
        let event = GameEvent::BlindPosted {
            player: player.display_name(),
            blind: kind,
            amount: posted,
            all_in: player.stack == 0,
        };
        self.pot += posted;
        self.push_event(event);
        total
    }

    /// Run the hand forward until a player must act or the hand is over.
    pub fn drive(&mut self) -> Progress {
        loop {
            match self.stage {
                Stage::Idle | Stage::Starting => return Progress::Idle,
                Stage::Showdown | Stage::HandOver => return Progress::HandOver,
                Stage::Preflop | Stage::Flop | Stage::Turn | Stage::River => {}
            }
            if self.award_if_uncontested() {
                return Progress::HandOver;
            }
            if self.is_round_complete() {
                self.finish_street();
                continue;
            }
            match self.current_player.filter(|&id| self.can_act(id)) {
                Some(player_id) => return Progress::AwaitingAction(self.prompt(player_id)),
                None => self.advance_turn(),
            }
        }
    }

    fn finish_street(&mut self) {
        match self.stage.next_street() {
            Some(Stage::Showdown) => self.showdown(),
            Some(next) => {
                if let Err(err) = self.deal_street(next) {
                    self.abort_hand(&err);
                }
            }
            None => {}
        }
    }

    /// Burn one card, then deal the street's community cards.
    fn deal_street(&mut self, stage: Stage) -> Result<(), TableError> {
        let exhausted = TableError::DeckExhausted { stage };
        self.deck.deal_card().ok_or_else(|| exhausted.clone())?;
        let mut cards = Vec::with_capacity(stage.cards_dealt());
        for _ in 0..stage.cards_dealt() {
            cards.push(self.deck.deal_card().ok_or_else(|| exhausted.clone())?);
        }
        self.community.extend_from_slice(&cards);
        self.stage = stage;
        self.begin_street();
        info!("hand #{} {stage} dealt, pot ${}", self.hand_number, self.pot);
        self.push_event(GameEvent::StreetDealt { stage, cards });
        Ok(())
    }

    /// End the hand if at most one player is still contending, paying them
    /// the whole pot.
    pub(super) fn award_if_uncontested(&mut self) -> bool {
        if !self.stage.is_betting() {
            return false;
        }
        let contenders = self.contenders();
        if contenders.len() > 1 {
            return false;
        }
        self.stage = Stage::HandOver;
        self.current_player = None;
        self.pending_turn = None;

        let Some(winner) = contenders.first().and_then(|id| self.players.get_mut(id)) else {
            warn!("hand #{} ended with nobody contending", self.hand_number);
            self.refund_contributions();
            return true;
        };
        let amount = std::mem::take(&mut self.pot);
        winner.stack += amount;
        info!("{} wins ${amount} uncontested", winner.display_name());
        let summary = WinnerSummary {
            player_id: winner.id,
            player_name: winner.display_name(),
            amount,
            hand_rank: None,
            winning_hand: Vec::new(),
        };
        self.push_event(GameEvent::PotAwarded(PotAward {
            winners: vec![summary],
            is_uncontested: true,
        }));
        true
    }

    fn showdown(&mut self) {
        self.stage = Stage::Showdown;
        self.hands_revealed = true;
        self.current_player = None;
        self.pending_turn = None;

        let mut scores = BTreeMap::new();
        let mut reveal = ShowdownReveal {
            all_hands: BTreeMap::new(),
            hand_ranks: BTreeMap::new(),
        };
        for id in self.contenders() {
            let Some(player) = self.players.get_mut(&id) else {
                continue;
            };
            let score = evaluate(&player.hand, &self.community);
            player.last_hand_rank = Some(score.label.clone());
            reveal.all_hands.insert(id, player.hand.clone());
            reveal.hand_ranks.insert(id, score.label.clone());
            scores.insert(id, score);
        }

        let contributions: BTreeMap<PlayerId, Chips> = self
            .players
            .values()
            .filter(|p| p.total_bet > 0)
            .map(|p| (p.id, p.total_bet))
            .collect();
        let settlement = pot::settle(&contributions, &scores, self.pot);
        self.pot = 0;

        let mut winners = Vec::with_capacity(settlement.payouts.len());
        for (&id, &amount) in &settlement.payouts {
            let Some(player) = self.players.get_mut(&id) else {
                continue;
            };
            player.stack += amount;
            let score = scores.get(&id);
            info!(
                "{} wins ${amount} with {}",
                player.display_name(),
                score.map_or("?", |s| s.label.as_str())
            );
            winners.push(WinnerSummary {
                player_id: id,
                player_name: player.display_name(),
                amount,
                hand_rank: score.map(|s| s.label.clone()),
                winning_hand: score.map(|s| s.best_five.clone()).unwrap_or_default(),
            });
        }

        self.push_event(GameEvent::Showdown(reveal));
        self.push_event(GameEvent::PotAwarded(PotAward {
            winners,
            is_uncontested: false,
        }));
        self.stage = Stage::HandOver;
    }

    /// Give every remaining player back what they put in this hand.
    fn refund_contributions(&mut self) {
        for player in self.players.values_mut().filter(|p| !p.disconnected) {
            let refund = player.total_bet.min(self.pot);
            player.stack += refund;
            self.pot -= refund;
            player.total_bet = 0;
            player.current_bet = 0;
        }
        if self.pot > 0 {
            warn!("${} contributed by departed players is discarded", self.pot);
            self.pot = 0;
        }
    }

    fn abort_hand(&mut self, err: &TableError) {
        error!("hand #{} aborted: {err}", self.hand_number);
        self.refund_contributions();
        self.stage = Stage::HandOver;
        self.current_player = None;
        self.pending_turn = None;
        self.push_event(GameEvent::DeckExhausted);
    }

    /// Stop the hand because too few players remain, returning unsettled
    /// chips to their owners.
    pub fn cancel_hand(&mut self) {
        if self.stage == Stage::Idle {
            return;
        }
        if self.pot > 0 {
            warn!(
                "hand #{} cancelled with ${} in the pot; refunding",
                self.hand_number, self.pot
            );
            self.refund_contributions();
        }
        self.to_idle();
        info!("hand #{} cancelled, waiting for players", self.hand_number);
        self.push_event(GameEvent::HandCancelled);
    }

    /// Go idle between hands when a new hand can't start.
    pub fn pause(&mut self) {
        self.to_idle();
        self.push_event(GameEvent::GamePaused);
    }

    fn to_idle(&mut self) {
        self.reset_hand_state();
        self.stage = Stage::Idle;
        self.active_order.clear();
        self.purge_disconnected();
        for player in self.players.values_mut() {
            player.hand.clear();
            player.current_bet = 0;
            player.status = PlayerStatus::Waiting;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{
        entities::{Action, Card},
        table::GameSettings,
    };

    fn cards(repr: &str) -> Vec<Card> {
        repr.split_whitespace().map(|c| c.parse().unwrap()).collect()
    }

    fn seated(n: usize) -> (Table, Vec<PlayerId>) {
        let mut table = Table::with_seed(GameSettings::default(), 11);
        let ids = (0..n)
            .map(|i| {
                let id = table.register().unwrap();
                table.set_name(id, &format!("p{i}")).unwrap();
                id
            })
            .collect();
        (table, ids)
    }

    #[test]
    fn test_needs_two_named_players() {
        let mut table = Table::new(GameSettings::default());
        let id = table.register().unwrap();
        table.register().unwrap();
        table.set_name(id, "solo").unwrap();
        assert_eq!(table.start_hand(), Err(TableError::NotEnoughPlayers));
        assert_eq!(table.stage(), Stage::Idle);
    }

    #[test]
    fn test_setup_deals_and_posts_blinds() {
        let (mut table, ids) = seated(3);
        table.button = Some(2);
        table.start_hand().unwrap();

        assert_eq!(table.stage(), Stage::Preflop);
        assert_eq!(table.dealer_id(), Some(ids[0]));
        assert_eq!(table.pot(), 30);
        assert_eq!(table.current_bet(), 20);
        assert_eq!(table.last_raiser(), Some(ids[2]));
        assert_eq!(table.current_player(), Some(ids[0]));
        assert_eq!(table.player(ids[1]).unwrap().stack, 990);
        assert_eq!(table.player(ids[2]).unwrap().stack, 980);
        for id in &ids {
            assert_eq!(table.player(*id).unwrap().hand.len(), 2);
        }

        let messages: Vec<String> = table
            .drain_events()
            .iter()
            .filter(|e| e.is_announcement())
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            messages,
            vec![
                "--- Starting New Hand --- Dealer: p0",
                "p1 posts Small Blind $10",
                "p2 posts Big Blind $20",
            ]
        );
    }

    #[test]
    fn test_button_rotates() {
        let (mut table, ids) = seated(3);
        table.button = Some(0);
        table.start_hand().unwrap();
        assert_eq!(table.dealer_id(), Some(ids[1]));
        let first = table.current_player().unwrap();
        table.take_action(first, Action::Fold).unwrap();
        let second = table.current_player().unwrap();
        table.take_action(second, Action::Fold).unwrap();
        assert_eq!(table.stage(), Stage::HandOver);

        table.start_hand().unwrap();
        assert_eq!(table.dealer_id(), Some(ids[2]));
    }

    #[test]
    fn test_short_blind_goes_all_in() {
        let (mut table, ids) = seated(2);
        table.players.get_mut(&ids[1]).unwrap().stack = 15;
        table.button = Some(1);
        table.start_hand().unwrap();
        let big_blind = table.player(ids[1]).unwrap();
        assert_eq!(big_blind.status, PlayerStatus::AllIn);
        assert_eq!(big_blind.current_bet, 15);
        assert!(
            table
                .drain_events()
                .iter()
                .any(|e| e.to_string() == "p1 posts Big Blind $15 (All-in)")
        );
    }

    #[test]
    fn test_deck_exhaustion_ends_hand_and_refunds() {
        let (mut table, ids) = seated(2);
        table.button = Some(1);
        // Enough for hole cards and the flop, nothing for the turn.
        table.preset_deck(cards("2c 3c 4c 5c 6d 7d 8d 9d"));
        table.start_hand().unwrap();
        table.take_action(ids[0], Action::Call).unwrap();
        table.take_action(ids[1], Action::Check).unwrap();
        assert!(matches!(table.drive(), Progress::AwaitingAction(_)));
        assert_eq!(table.stage(), Stage::Flop);

        table.take_action(ids[1], Action::Bet(Some(40))).unwrap();
        table.take_action(ids[0], Action::Call).unwrap();
        assert_eq!(table.drive(), Progress::HandOver);
        assert_eq!(table.player(ids[0]).unwrap().stack, 1000);
        assert_eq!(table.player(ids[1]).unwrap().stack, 1000);
        assert_eq!(table.pot(), 0);
        assert!(table.drain_events().contains(&GameEvent::DeckExhausted));
    }

    #[test]
    fn test_cancel_refunds_pot() {
        let (mut table, ids) = seated(3);
        table.button = Some(2);
        table.start_hand().unwrap();
        table.take_action(ids[0], Action::Raise(Some(100))).unwrap();
        table.cancel_hand();
        assert_eq!(table.stage(), Stage::Idle);
        assert_eq!(table.pot(), 0);
        assert_eq!(table.chips_in_play(), 3000);
        assert_eq!(table.player(ids[0]).unwrap().stack, 1000);
        assert!(table.drain_events().contains(&GameEvent::HandCancelled));
    }

    #[test]
    fn test_departed_player_purged_next_hand() {
        let (mut table, ids) = seated(3);
        table.button = Some(2);
        table.start_hand().unwrap();
        table.unregister(ids[1]);
        assert!(table.player(ids[1]).is_some());
        let first = table.current_player().unwrap();
        table.take_action(first, Action::Fold).unwrap();
        assert_eq!(table.stage(), Stage::HandOver);

        table.start_hand().unwrap();
        assert!(table.player(ids[1]).is_none());
        assert_eq!(table.active_order().len(), 2);
    }
}
