//! Betting round controller.
//!
//! One street runs as: the first player able to act is prompted, each valid
//! action is applied and the round-complete test is re-run, and the turn moves
//! clockwise to the next player able to act until the street closes.

use log::{debug, info};

use super::{
    entities::{Action, ActionChoice, Chips, LastAction, Player, PlayerId, SeatIndex, Stage},
    errors::UserError,
    events::{ActionNotice, GameEvent, TurnPrompt},
    table::{Table, Turn},
};

/// A validated action, ready to apply.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Resolved {
    choice: ActionChoice,
    /// The player's street total after the action.
    total: Chips,
    /// Whether a bet or raise was big enough to reopen the action.
    reopens: bool,
}

impl Table {
    /// Reset street bets and pick the first player left of the dealer.
    pub(super) fn begin_street(&mut self) {
        for id in &self.active_order {
            if let Some(player) = self.players.get_mut(id) {
                if player.in_hand() {
                    player.current_bet = 0;
                    player.last_action = None;
                }
            }
        }
        self.current_bet = 0;
        self.last_raise_size = 0;
        self.last_raiser = None;
        self.acted.clear();
        self.pending_turn = None;
        self.current_player = self.next_actor_after(self.positions.dealer);
    }

    /// First player after `seat`, wrapping around to `seat` itself, who can act.
    pub(super) fn next_actor_after(&self, seat: SeatIndex) -> Option<PlayerId> {
        let n = self.active_order.len();
        (1..=n)
            .map(|offset| self.active_order[(seat + offset) % n])
            .find(|&id| self.can_act(id))
    }

    /// Move the turn clockwise from the current player. With no current
    /// player the scan starts at the first seat.
    pub(super) fn advance_turn(&mut self) {
        let n = self.active_order.len();
        if n == 0 {
            self.current_player = None;
            return;
        }
        let seat = self
            .current_player
            .and_then(|id| self.active_order.iter().position(|&p| p == id))
            .unwrap_or(n - 1);
        self.current_player = self.next_actor_after(seat);
    }

    /// Smallest legal raise-to total on this street.
    pub fn min_raise_total(&self) -> Chips {
        self.current_bet + self.last_raise_size.max(self.settings.big_blind)
    }

    /// Preflop, the big blind has only posted and may still check or raise.
    fn big_blind_option_pending(&self) -> bool {
        if self.stage != Stage::Preflop {
            return false;
        }
        let Some(&big_blind) = self.active_order.get(self.positions.big_blind) else {
            return false;
        };
        self.current_player == Some(big_blind)
            && self.last_raiser == Some(big_blind)
            && self.players.get(&big_blind).is_some_and(|p| {
                p.can_act() && p.last_action == Some(LastAction::Blind)
            })
    }

    /// Whether the current street is finished.
    pub fn is_round_complete(&self) -> bool {
        let actionable: Vec<&Player> = self
            .active_order
            .iter()
            .filter_map(|id| self.players.get(id))
            .filter(|p| p.can_act())
            .collect();

        if actionable.is_empty() {
            return true;
        }
        if actionable.iter().any(|p| p.current_bet < self.current_bet) {
            return false;
        }
        // Nobody left to respond to a lone player who has matched.
        if actionable.len() == 1 {
            return true;
        }
        if self.big_blind_option_pending() {
            return false;
        }
        match self.last_raiser {
            Some(aggressor) if self.can_act(aggressor) => self.current_player == Some(aggressor),
            _ => actionable.iter().all(|p| self.acted.contains(&p.id)),
        }
    }

    /// Legal actions and amounts for `id` right now.
    pub fn turn_prompt(&self, id: PlayerId) -> Option<TurnPrompt> {
        let player = self.players.get(&id)?;
        let to_call = self.current_bet.saturating_sub(player.current_bet);
        let all_in_total = player.current_bet + player.stack;

        let mut actions = vec![ActionChoice::Fold];
        if to_call == 0 {
            actions.push(ActionChoice::Check);
        } else if player.stack > 0 {
            actions.push(ActionChoice::Call);
        }

        let (min_raise, max_raise) = if self.current_bet == 0 && player.stack > 0 {
            actions.push(ActionChoice::Bet);
            (self.settings.big_blind.min(all_in_total), all_in_total)
        } else if self.current_bet > 0 && all_in_total > self.current_bet {
            actions.push(ActionChoice::Raise);
            (self.min_raise_total().min(all_in_total), all_in_total)
        } else {
            (0, 0)
        };

        Some(TurnPrompt {
            player_id: id,
            actions,
            call_amount: to_call.min(player.stack),
            min_raise,
            max_raise,
            current_bet: self.current_bet,
            stack: player.stack,
            big_blind: self.settings.big_blind,
        })
    }

    /// Prompt `player_id` unless they already hold the pending turn.
    pub(super) fn prompt(&mut self, player_id: PlayerId) -> Turn {
        if let Some(turn) = self.pending_turn.filter(|t| t.player_id == player_id) {
            return turn;
        }
        self.turn_seq += 1;
        let turn = Turn {
            player_id,
            seq: self.turn_seq,
        };
        self.pending_turn = Some(turn);
        if let Some(prompt) = self.turn_prompt(player_id) {
            debug!("turn {} for player {player_id}: {:?}", turn.seq, prompt.actions);
            self.push_event(GameEvent::TurnStarted(prompt));
        }
        turn
    }

    /// Apply a player's command. Rule violations are reported to the player,
    /// who is prompted again; nothing else changes.
    pub fn take_action(&mut self, id: PlayerId, action: Action) -> Result<(), UserError> {
        if !self.stage.is_betting() {
            return self.reject(id, UserError::NoBettingRound);
        }
        if self.current_player != Some(id) {
            return self.reject(id, UserError::OutOfTurnAction);
        }
        let Some(player) = self.players.get(&id) else {
            return Err(UserError::UserDoesNotExist);
        };
        if !player.can_act() {
            let status = player.status;
            return self.reject(id, UserError::CannotAct { status });
        }

        match self.validate(player, action) {
            Ok(resolved) => {
                self.apply(id, resolved);
                Ok(())
            }
            Err(error) => self.reject(id, error),
        }
    }

    /// Fold the player holding turn `seq` if that turn is still pending.
    pub fn timeout_turn(&mut self, seq: u64) -> bool {
        let Some(turn) = self.pending_turn.filter(|t| t.seq == seq) else {
            return false;
        };
        if !self.stage.is_betting() || self.current_player != Some(turn.player_id) {
            self.pending_turn = None;
            return false;
        }
        let Some(player) = self.players.get(&turn.player_id) else {
            return false;
        };
        let name = player.display_name();
        info!("{name} timed out on turn {seq}");
        let total = player.current_bet;
        self.push_event(GameEvent::TimedOut { player: name });
        self.apply(
            turn.player_id,
            Resolved {
                choice: ActionChoice::Fold,
                total,
                reopens: false,
            },
        );
        true
    }

    fn reject(&mut self, id: PlayerId, error: UserError) -> Result<(), UserError> {
        debug!("rejected action from player {id}: {error}");
        self.push_event(GameEvent::Rejected {
            player_id: id,
            error: error.clone(),
        });
        if error.reprompts() {
            if let Some(prompt) = self.turn_prompt(id) {
                self.push_event(GameEvent::TurnStarted(prompt));
            }
        }
        Err(error)
    }

    fn validate(&self, player: &Player, action: Action) -> Result<Resolved, UserError> {
        let to_call = self.current_bet.saturating_sub(player.current_bet);
        let resolved = |choice, total, reopens| Resolved {
            choice,
            total,
            reopens,
        };

        match action {
            Action::Fold => Ok(resolved(ActionChoice::Fold, player.current_bet, false)),
            Action::Check if to_call > 0 => Err(UserError::CannotCheck {
                to_match: self.current_bet,
            }),
            Action::Check => Ok(resolved(ActionChoice::Check, player.current_bet, false)),
            Action::Call if to_call == 0 || player.stack == 0 => Err(UserError::NothingToCall),
            Action::Call => Ok(resolved(
                ActionChoice::Call,
                player.current_bet + to_call.min(player.stack),
                false,
            )),
            Action::Bet(amount) | Action::Raise(amount) => {
                let choice = action.choice();
                let amount = amount.ok_or(UserError::MissingAmount)?;
                if amount <= player.current_bet {
                    return Err(UserError::NotAnIncrease {
                        amount,
                        current: player.current_bet,
                    });
                }
                let increase = amount - player.current_bet;
                if increase > player.stack {
                    return Err(UserError::InsufficientStack {
                        stack: player.stack,
                        increase,
                        total: amount,
                    });
                }
                let all_in = increase == player.stack;

                let minimum = if choice == ActionChoice::Bet {
                    if self.current_bet > 0 {
                        return Err(UserError::BetFacingBet {
                            to_match: self.current_bet,
                        });
                    }
                    self.settings.big_blind
                } else {
                    if self.current_bet == 0 {
                        return Err(UserError::RaiseWithoutBet);
                    }
                    self.min_raise_total()
                };

                // A short all-in is accepted but doesn't reopen the action.
                let too_small = amount < minimum && !all_in;
                if too_small || amount <= self.current_bet {
                    return Err(UserError::BelowMinimum {
                        action: choice,
                        minimum,
                    });
                }
                Ok(resolved(choice, amount, amount >= minimum))
            }
        }
    }

    fn apply(&mut self, id: PlayerId, resolved: Resolved) {
        let Some(player) = self.players.get_mut(&id) else {
            return;
        };
        match resolved.choice {
            ActionChoice::Fold => player.fold(),
            ActionChoice::Check => player.last_action = Some(LastAction::Check),
            choice => {
                let moved = player.commit(resolved.total.saturating_sub(player.current_bet));
                player.last_action = Some(choice.into());
                self.pot += moved;
            }
        }
        let street_total = player.current_bet;
        let amount = match resolved.choice {
            ActionChoice::Fold | ActionChoice::Check => 0,
            _ => street_total,
        };

        if matches!(resolved.choice, ActionChoice::Bet | ActionChoice::Raise) {
            if resolved.reopens {
                self.last_raise_size = street_total - self.current_bet;
                self.last_raiser = Some(id);
                self.acted.clear();
            }
            self.current_bet = self.current_bet.max(street_total);
        }
        self.acted.insert(id);
        self.pending_turn = None;

        debug!(
            "player {id} {} (street total ${street_total}, pot ${})",
            resolved.choice, self.pot
        );
        self.push_event(GameEvent::ActionTaken(ActionNotice {
            player_id: id,
            action: resolved.choice,
            amount,
        }));
        self.resolve_after(id);
    }

    /// After `id` is done: settle an uncontested hand, or pass the turn on
    /// if `id` held it and the street is still open.
    pub(super) fn resolve_after(&mut self, id: PlayerId) {
        if self.award_if_uncontested() {
            return;
        }
        if !self.is_round_complete() && self.current_player == Some(id) {
            self.advance_turn();
        }
    }
}
