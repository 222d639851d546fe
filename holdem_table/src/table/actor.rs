//! Table actor implementation with async message handling.

use std::collections::BTreeMap;

use tokio::{
    sync::{mpsc, oneshot},
    time::{Instant, sleep_until},
};

use super::{
    config::TableConfig,
    messages::{RegisterError, TableClosed, TableMessage, TableSummary},
};
use crate::{
    game::{
        GameEvent, Progress, Table, TableError, Turn, UserError,
        entities::{Action, PlayerId, Stage},
        view::TableView,
    },
    net::messages::{Recipient, ServerMessage},
};

/// Inbox capacity for the actor.
const INBOX_CAPACITY: usize = 100;

/// Table actor handle for sending messages
#[derive(Clone, Debug)]
pub struct TableHandle {
    sender: mpsc::Sender<TableMessage>,
}

impl TableHandle {
    /// Send a message to the table
    pub async fn send(&self, message: TableMessage) -> Result<(), TableClosed> {
        self.sender.send(message).await.map_err(|_| TableClosed)
    }

    /// Seat a connection. `outbound` receives every message for this player,
    /// starting with `assign_id`.
    pub async fn register(
        &self,
        outbound: mpsc::Sender<ServerMessage>,
    ) -> Result<PlayerId, RegisterError> {
        let (response, rx) = oneshot::channel();
        self.send(TableMessage::Register { outbound, response })
            .await?;
        Ok(rx.await.map_err(|_| TableClosed)??)
    }

    pub async fn unregister(&self, player_id: PlayerId) -> Result<(), TableClosed> {
        self.send(TableMessage::Unregister { player_id }).await
    }

    pub async fn set_name(&self, player_id: PlayerId, name: String) -> Result<(), TableClosed> {
        self.send(TableMessage::SetName { player_id, name }).await
    }

    pub async fn take_action(&self, player_id: PlayerId, action: Action) -> Result<(), TableClosed> {
        self.send(TableMessage::TakeAction { player_id, action })
            .await
    }

    pub async fn view(&self, player_id: Option<PlayerId>) -> Result<TableView, TableClosed> {
        let (response, rx) = oneshot::channel();
        self.send(TableMessage::GetView {
            player_id,
            response,
        })
        .await?;
        rx.await.map_err(|_| TableClosed)
    }

    pub async fn summary(&self) -> Result<TableSummary, TableClosed> {
        let (response, rx) = oneshot::channel();
        self.send(TableMessage::GetSummary { response }).await?;
        rx.await.map_err(|_| TableClosed)
    }

    pub async fn close(&self) -> Result<(), TableClosed> {
        self.send(TableMessage::Close).await
    }
}

/// Deadline for the single outstanding turn.
#[derive(Clone, Copy, Debug)]
struct TurnTimer {
    turn: Turn,
    deadline: Instant,
}

/// Table actor owning the only copy of the table state
pub struct TableActor {
    /// Table configuration
    config: TableConfig,

    /// Game state
    table: Table,

    /// Message inbox
    inbox: mpsc::Receiver<TableMessage>,

    /// Outbound queue for each connected player
    connections: BTreeMap<PlayerId, mpsc::Sender<ServerMessage>>,

    /// Pending action deadline
    turn_timer: Option<TurnTimer>,

    /// When the next hand is dealt
    next_hand_at: Option<Instant>,

    /// Is table closed
    is_closed: bool,
}

impl TableActor {
    /// Create a new table actor
    ///
    /// # Returns
    ///
    /// * `(TableActor, TableHandle)` - Actor and handle for sending messages
    pub fn new(config: TableConfig) -> (Self, TableHandle) {
        let table = Table::new(config.game_settings());
        Self::with_table(config, table)
    }

    /// Create an actor around an existing table, e.g. one with a fixed seed.
    pub fn with_table(config: TableConfig, table: Table) -> (Self, TableHandle) {
        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);
        let actor = Self {
            config,
            table,
            inbox,
            connections: BTreeMap::new(),
            turn_timer: None,
            next_hand_at: None,
            is_closed: false,
        };
        (actor, TableHandle { sender })
    }

    /// Run the table actor event loop
    pub async fn run(mut self) {
        log::info!("Table '{}' starting", self.config.name);

        while !self.is_closed {
            let deadline = self.next_deadline();
            tokio::select! {
                message = self.inbox.recv() => match message {
                    Some(message) => self.handle_message(message),
                    None => break,
                },
                () = wait_until(deadline) => self.handle_deadline(),
            }
        }

        log::info!("Table '{}' closed", self.config.name);
    }

    fn next_deadline(&self) -> Option<Instant> {
        let turn = self.turn_timer.map(|timer| timer.deadline);
        match (turn, self.next_hand_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Handle a table message
    fn handle_message(&mut self, message: TableMessage) {
        match message {
            TableMessage::Register { outbound, response } => {
                let result = self.handle_register(outbound);
                let _ = response.send(result);
            }

            TableMessage::Unregister { player_id } => self.handle_unregister(player_id),

            TableMessage::SetName { player_id, name } => {
                match self.table.set_name(player_id, &name) {
                    Ok(true) if self.table.ready_to_start() => self.start_hand_if_ready(),
                    Ok(_) => {}
                    Err(e) => log::debug!("Table: set_name from {player_id} rejected: {e}"),
                }
                self.settle();
            }

            TableMessage::TakeAction { player_id, action } => {
                if let Err(e) = self.table.take_action(player_id, action) {
                    log::debug!("Table: {action} from {player_id} rejected: {e}");
                }
                self.settle();
            }

            TableMessage::GetView {
                player_id,
                response,
            } => {
                let _ = response.send(self.table.view_for(player_id));
            }

            TableMessage::GetSummary { response } => {
                let _ = response.send(self.summary());
            }

            TableMessage::Close => {
                self.is_closed = true;
            }
        }
    }

    fn handle_register(
        &mut self,
        outbound: mpsc::Sender<ServerMessage>,
    ) -> Result<PlayerId, UserError> {
        let player_id = self.table.register()?;
        if outbound
            .try_send(ServerMessage::AssignId { player_id })
            .is_err()
        {
            log::warn!("Table: could not deliver id to player {player_id}");
        }
        self.connections.insert(player_id, outbound);
        self.settle();
        Ok(player_id)
    }

    fn handle_unregister(&mut self, player_id: PlayerId) {
        self.connections.remove(&player_id);
        if !self.table.unregister(player_id) {
            return;
        }
        if self.table.stage() != Stage::Idle && self.table.num_named() < 2 {
            log::info!("Table '{}': not enough players, cancelling hand", self.config.name);
            self.table.cancel_hand();
        }
        self.settle();
    }

    fn handle_deadline(&mut self) {
        let now = Instant::now();
        if let Some(timer) = self.turn_timer.filter(|timer| timer.deadline <= now) {
            self.turn_timer = None;
            if self.table.timeout_turn(timer.turn.seq) {
                log::info!(
                    "Table: player {} folded on timeout",
                    timer.turn.player_id
                );
            }
            self.settle();
        }
        if self.next_hand_at.is_some_and(|at| at <= now) {
            self.next_hand_at = None;
            self.start_hand_if_ready();
            self.settle();
        }
    }

    /// Deal a hand if the table is between hands with enough named players,
    /// otherwise drop back to idle.
    fn start_hand_if_ready(&mut self) {
        if self.table.num_named() < 2 {
            if self.table.stage() != Stage::Idle {
                self.table.pause();
            }
            return;
        }
        match self.table.start_hand() {
            Ok(()) => log::info!("Table '{}': hand #{} dealt", self.config.name, self.table.hand_number()),
            Err(TableError::NotEnoughPlayers) => self.table.pause(),
            Err(TableError::DeckExhausted { .. }) => {}
            Err(e @ TableError::HandInProgress { .. }) => log::debug!("Table: {e}"),
        }
    }

    /// Advance the hand as far as it goes, arm the right timer, and push
    /// everything that happened to the players.
    fn settle(&mut self) {
        match self.table.drive() {
            Progress::AwaitingAction(turn) => {
                if self.turn_timer.is_none_or(|timer| timer.turn != turn) {
                    self.turn_timer = Some(TurnTimer {
                        turn,
                        deadline: Instant::now() + self.config.action_timeout(),
                    });
                }
                self.next_hand_at = None;
            }
            Progress::HandOver => {
                self.turn_timer = None;
                if self.next_hand_at.is_none() {
                    self.next_hand_at = Some(Instant::now() + self.config.hand_end_delay());
                    self.flush_events();
                    self.route(GameEvent::NextHand {
                        delay_secs: self.config.hand_end_delay_secs,
                    });
                }
            }
            Progress::Idle => {
                self.turn_timer = None;
                self.next_hand_at = None;
            }
        }
        self.flush_events();
        self.broadcast_state();
    }

    fn flush_events(&mut self) {
        for event in self.table.drain_events() {
            self.route(event);
        }
    }

    fn route(&mut self, event: GameEvent) {
        log::debug!("Table: {event}");
        let Some((recipient, message)) = ServerMessage::from_event(event) else {
            return;
        };
        match recipient {
            Recipient::All => {
                self.connections
                    .retain(|&player_id, sender| deliver(player_id, sender, message.clone()));
            }
            Recipient::Player(player_id) => {
                let keep = self
                    .connections
                    .get(&player_id)
                    .is_some_and(|sender| deliver(player_id, sender, message));
                if !keep {
                    self.connections.remove(&player_id);
                }
            }
        }
    }

    /// Send every connection its own view of the settled state.
    fn broadcast_state(&mut self) {
        let table = &self.table;
        self.connections.retain(|&player_id, sender| {
            let view = table.view_for(Some(player_id));
            deliver(player_id, sender, ServerMessage::GameState(view))
        });
    }

    fn summary(&self) -> TableSummary {
        TableSummary {
            table_name: self.config.name.clone(),
            player_count: self.table.num_players(),
            named_count: self.table.num_named(),
            max_players: self.config.max_players,
            small_blind: self.config.small_blind,
            big_blind: self.config.big_blind,
            pot_size: self.table.pot(),
            stage: self.table.stage(),
            hand_number: self.table.hand_number(),
        }
    }
}

/// Queue `message` without waiting. Returns false once the receiver is gone.
fn deliver(player_id: PlayerId, sender: &mpsc::Sender<ServerMessage>, message: ServerMessage) -> bool {
    match sender.try_send(message) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(_)) => {
            log::warn!("Player {player_id} outbound queue full, dropping message");
            true
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            log::debug!("Player {player_id} disconnected, removing sender");
            false
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
