// Error taxonomy for the session engine.
//
// Transport faults are recovered inside the channel (reconnect, silent
// frame drop) and never reach the user until retries are exhausted.
// Everything here is a condition the flow must recognize: validation
// faults are rejected locally before any network call, rejections surface
// as a transient user-facing message with state unchanged, and the
// idempotent placement conflict is treated as success-equivalent.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Coordinates outside the 10x10 board, caught before any network call.
    #[error("invalid move coordinates ({x}, {y})")]
    InvalidCoordinates { x: u32, y: u32 },

    /// Fleet fails local validation (count, bounds or overlap).
    #[error("invalid ship placement")]
    InvalidPlacement,

    /// Acting outside the active phase or out of turn.
    #[error("not your turn")]
    NotYourTurn,

    /// The authority already holds a fleet for this player. Callers treat
    /// this as success and proceed to the readiness re-check.
    #[error("ships already placed")]
    AlreadyPlaced,

    /// The remote authority rejected the request (not-your-turn,
    /// already-targeted, ...).
    #[error("rejected by server: {0}")]
    Rejected(String),

    /// Underlying I/O failure of the request/response layer.
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}
