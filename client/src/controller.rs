// The per-session controller: owns the API client, the message channel
// and the store, and is the single place deciding what the local player
// may do. Built per session and torn down on exit; nothing here is
// global, so two sessions never share handlers or state.

use std::time::{Duration, Instant};

use battleship_engine::{
    Board, CellState, ChatMessage, MoveRecord, Phase, PlayerId, Position, Session, Ship,
    ShipKind, NUM_SHIPS,
};
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

use crate::api::GameApi;
use crate::channel::MessageChannel;
use crate::error::ClientError;
use crate::events::{ChannelEvent, OutboundEvent};
use crate::store::SessionStore;

/// How long a user-facing error message stays up before expiring.
const ERROR_TTL: Duration = Duration::from_secs(3);

pub struct SessionController<A: GameApi> {
    api: A,
    channel: MessageChannel,
    events: mpsc::UnboundedReceiver<ChannelEvent>,
    store: SessionStore,
    phase: Phase,
    error: Option<(String, Instant)>,
    error_ttl: Duration,
}

impl<A: GameApi> SessionController<A> {
    pub fn new(api: A, channel: MessageChannel, local: PlayerId) -> Self {
        let events = forward_events(&channel);
        Self {
            api,
            channel,
            events,
            store: SessionStore::new(local),
            phase: Phase::Lobby,
            error: None,
            error_ttl: ERROR_TTL,
        }
    }

    /// Shorten the transient-error lifetime, for tests.
    pub fn with_error_ttl(mut self, ttl: Duration) -> Self {
        self.error_ttl = ttl;
        self
    }

    /// Swap in a fresh channel, tearing the old one down first so events
    /// are never delivered twice.
    pub fn replace_channel(&mut self, channel: MessageChannel) {
        self.channel.disconnect();
        self.events = forward_events(&channel);
        self.channel = channel;
    }

    pub fn channel(&self) -> &MessageChannel {
        &self.channel
    }

    /// Initial load: session record, move history and chat history are
    /// fetched concurrently and joined. Sunk ships are fetched separately
    /// and tolerated on failure so a flaky endpoint cannot block the game.
    pub async fn load(&mut self, session_id: Uuid) -> Result<(), ClientError> {
        let (session, moves, chat) = tokio::join!(
            self.api.fetch_session(session_id),
            self.api.fetch_moves(session_id),
            self.api.fetch_chat(session_id),
        );
        self.store.replace_session(session?);
        for mv in moves? {
            self.store.record_move(mv);
        }
        for msg in chat? {
            self.store.record_chat(msg);
        }
        match self.api.fetch_sunk_ships(session_id).await {
            Ok(sunk) => self.store.set_sunk_ships(sunk),
            Err(err) => warn!(error = %err, "failed to load sunk ships"),
        }
        self.evaluate_phase().await;
        Ok(())
    }

    /// Drain every queued channel event and apply it. Call this from the
    /// presentation layer's tick before reading phase or boards.
    pub async fn pump(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event).await;
        }
    }

    async fn handle_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::GameUpdate { .. } => {
                self.refresh().await;
                self.evaluate_phase().await;
            }
            ChannelEvent::ShipPlacementUpdate { .. } => {
                self.evaluate_phase().await;
            }
            ChannelEvent::Move { data, .. } => {
                self.store.record_move(data);
            }
            ChannelEvent::Chat { data, .. } => {
                self.store.record_chat(data);
            }
        }
    }

    /// Re-fetch the session record and the authoritative collections.
    async fn refresh(&mut self) {
        let Some(session_id) = self.store.session_id() else { return };
        let (session, moves) = tokio::join!(
            self.api.fetch_session(session_id),
            self.api.fetch_moves(session_id),
        );
        match session {
            Ok(session) => self.store.replace_session(session),
            Err(err) => warn!(error = %err, "failed to refresh session"),
        }
        match moves {
            Ok(moves) => {
                for mv in moves {
                    self.store.record_move(mv);
                }
            }
            Err(err) => warn!(error = %err, "failed to refresh moves"),
        }
        match self.api.fetch_sunk_ships(session_id).await {
            Ok(sunk) => self.store.set_sunk_ships(sunk),
            Err(err) => warn!(error = %err, "failed to refresh sunk ships"),
        }
    }

    /// Re-evaluate the session phase. Runs on initial load, on every
    /// game/placement update and after a local ship submission. The
    /// placement count is always re-fetched from the authority; a cached
    /// flag goes stale when placement is confirmed out of band (e.g. an
    /// idempotent retry answered "already placed").
    pub async fn evaluate_phase(&mut self) {
        if self.phase == Phase::Finished {
            return; // absorbing
        }
        let Some(session) = self.store.session().cloned() else { return };
        if session.status.is_terminal() {
            self.phase = Phase::Finished;
            return;
        }
        if !session.has_opponent() {
            self.phase = Phase::Lobby;
            return;
        }

        let ready = match self.api.readiness(session.id).await {
            Ok(ready) => ready,
            Err(err) => {
                warn!(error = %err, "readiness check failed");
                false
            }
        };
        let placed = match self.api.fetch_ships(session.id).await {
            Ok(ships) => {
                let placed = ships.len();
                if placed > 0 {
                    self.store.set_ships(ships);
                }
                placed
            }
            Err(err) => {
                warn!(error = %err, "failed to fetch own ships");
                self.store.ships().len()
            }
        };
        self.phase = Phase::resolve(&session, placed, ready);
    }

    /// Submit the local fleet. Validated locally before any network call;
    /// an "already placed" answer is success-equivalent and proceeds to
    /// the readiness re-check instead of failing the flow.
    pub async fn submit_ships(&mut self, ships: Vec<Ship>) -> Result<(), ClientError> {
        let session_id = self.require_session()?;
        if let Err(err) = validate_fleet(&ships) {
            self.set_error("invalid ship placement");
            return Err(err);
        }

        match self.api.submit_ships(session_id, ships.clone()).await {
            Ok(()) => {
                self.store.set_ships(ships.clone());
                self.channel
                    .send(OutboundEvent::ShipPlacement { session_id, data: ships });
                self.evaluate_phase().await;
                Ok(())
            }
            Err(ClientError::AlreadyPlaced) => {
                // The authority already holds our fleet (e.g. a retried
                // submission); re-check readiness as if we just placed.
                self.evaluate_phase().await;
                Ok(())
            }
            Err(err) => {
                self.set_error("failed to place ships");
                Err(err)
            }
        }
    }

    /// Attack one cell. Coordinates, phase and turn are validated locally
    /// before any network call; a confirmed move is appended and echoed
    /// on the channel as an advisory event.
    pub async fn submit_move(&mut self, pos: Position) -> Result<MoveRecord, ClientError> {
        if !pos.in_bounds() {
            self.set_error("invalid move coordinates");
            return Err(ClientError::InvalidCoordinates { x: pos.x, y: pos.y });
        }
        if !self.can_act() {
            self.set_error("not your turn");
            return Err(ClientError::NotYourTurn);
        }
        let session_id = self.require_session()?;

        match self.api.submit_move(session_id, pos).await {
            Ok(record) => {
                self.store.record_move(record.clone());
                self.channel.send(OutboundEvent::Move { session_id, data: pos });
                Ok(record)
            }
            Err(err) => {
                self.set_error(format!("move failed: {err}"));
                Err(err)
            }
        }
    }

    /// Send a chat message. The local collection grows only via the
    /// channel echo, de-duplicated by id, so the message is never listed
    /// twice.
    pub async fn send_chat(&mut self, text: impl Into<String>) -> Result<(), ClientError> {
        let session_id = self.require_session()?;
        match self.api.send_chat(session_id, text.into()).await {
            Ok(_) => Ok(()),
            Err(err) => {
                self.set_error("failed to send message");
                Err(err)
            }
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn session(&self) -> Option<&Session> {
        self.store.session()
    }

    pub fn local_player(&self) -> PlayerId {
        self.store.local_player()
    }

    /// Both derived grids (own, opponent), recomputed if stale.
    pub fn boards(&mut self) -> (&Board, &Board) {
        self.store.boards()
    }

    pub fn chat(&self) -> &[ChatMessage] {
        self.store.chat()
    }

    pub fn moves(&self) -> &[MoveRecord] {
        self.store.moves()
    }

    /// Whether the local player may act right now: combat phase and the
    /// authority says it is their turn.
    pub fn can_act(&self) -> bool {
        self.phase == Phase::Active
            && self
                .store
                .session()
                .is_some_and(|s| s.is_turn_of(self.store.local_player()))
    }

    /// Remove and return the transient error, expired or not.
    pub fn take_error(&mut self) -> Option<String> {
        self.error.take().map(|(msg, _)| msg)
    }

    /// The transient user-facing error, if it has not expired yet.
    pub fn error(&mut self) -> Option<&str> {
        if let Some((_, deadline)) = &self.error {
            if Instant::now() >= *deadline {
                self.error = None;
            }
        }
        self.error.as_ref().map(|(msg, _)| msg.as_str())
    }

    fn set_error(&mut self, msg: impl Into<String>) {
        self.error = Some((msg.into(), Instant::now() + self.error_ttl));
    }

    fn require_session(&self) -> Result<Uuid, ClientError> {
        self.store
            .session_id()
            .ok_or_else(|| ClientError::Rejected("no session loaded".into()))
    }
}

fn forward_events(channel: &MessageChannel) -> mpsc::UnboundedReceiver<ChannelEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    channel.on_any(move |event| {
        let _ = tx.send(event.clone());
    });
    rx
}

/// Local fleet validation: exactly the canonical five ships, each kind
/// once, all within bounds and non-overlapping.
fn validate_fleet(ships: &[Ship]) -> Result<(), ClientError> {
    if ships.len() != NUM_SHIPS {
        return Err(ClientError::InvalidPlacement);
    }
    for kind in ShipKind::FLEET {
        if ships.iter().filter(|s| s.kind == kind).count() != 1 {
            return Err(ClientError::InvalidPlacement);
        }
    }
    let mut board = Board::new();
    for ship in ships {
        if !board.can_place(ship.origin, ship.kind.length(), ship.orientation) {
            return Err(ClientError::InvalidPlacement);
        }
        for pos in ship.coordinates() {
            board.set(pos, CellState::Ship);
        }
    }
    Ok(())
}
