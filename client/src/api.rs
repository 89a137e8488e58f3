// Request/response boundary to the remote authority. Implementations are
// thin I/O wrappers with no state machine of their own; the session
// controller only depends on this trait, so tests drive it with an
// in-memory double.

use std::future::Future;

use battleship_engine::{ChatMessage, MoveRecord, Position, Session, Ship};
use uuid::Uuid;

use crate::error::ClientError;

type ApiResult<T> = Result<T, ClientError>;

pub trait GameApi: Send + Sync {
    fn create_session(&self) -> impl Future<Output = ApiResult<Session>> + Send;

    fn join_session(&self, session: Uuid) -> impl Future<Output = ApiResult<Session>> + Send;

    fn fetch_session(&self, session: Uuid) -> impl Future<Output = ApiResult<Session>> + Send;

    /// Submit the full fleet (exactly 5 ships). Idempotent: a repeat
    /// submission for an already-placed player yields
    /// [`ClientError::AlreadyPlaced`], which callers treat as success.
    fn submit_ships(
        &self,
        session: Uuid,
        ships: Vec<Ship>,
    ) -> impl Future<Output = ApiResult<()>> + Send;

    /// Whether both players have completed placement.
    fn readiness(&self, session: Uuid) -> impl Future<Output = ApiResult<bool>> + Send;

    /// The local player's own placed ships.
    fn fetch_ships(&self, session: Uuid) -> impl Future<Output = ApiResult<Vec<Ship>>> + Send;

    /// Sunk-ship records for the session, both players'.
    fn fetch_sunk_ships(&self, session: Uuid)
        -> impl Future<Output = ApiResult<Vec<Ship>>> + Send;

    /// Attack one cell; returns the confirmed move or a rejection
    /// (not-your-turn, already-targeted, ...).
    fn submit_move(
        &self,
        session: Uuid,
        pos: Position,
    ) -> impl Future<Output = ApiResult<MoveRecord>> + Send;

    fn fetch_moves(&self, session: Uuid)
        -> impl Future<Output = ApiResult<Vec<MoveRecord>>> + Send;

    fn fetch_chat(&self, session: Uuid)
        -> impl Future<Output = ApiResult<Vec<ChatMessage>>> + Send;

    /// Persist a chat message. The local chat collection grows via the
    /// channel echo, not from this call's response.
    fn send_chat(
        &self,
        session: Uuid,
        text: String,
    ) -> impl Future<Output = ApiResult<ChatMessage>> + Send;
}
