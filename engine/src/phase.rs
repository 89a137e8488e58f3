// Client-local phase of a session, distinct from the session's remote
// `status`. The phase decides what the local player may do right now.

use serde::{Deserialize, Serialize};

use crate::session::Session;
use crate::NUM_SHIPS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No second player has joined yet.
    Lobby,
    /// Opponent present, the local player has not submitted a full fleet.
    Placing,
    /// Local fleet submitted, opponent not ready yet.
    AwaitingOpponent,
    /// Both sides placed; combat.
    Active,
    /// Terminal. Absorbing: the controller never transitions out of it.
    Finished,
}

impl Phase {
    /// Resolve the phase from the session record, the local placement
    /// count and the remote readiness answer.
    ///
    /// `placed_ships` must come from a fresh fetch, not a cached flag:
    /// placement can be confirmed out of band (idempotent retry after an
    /// "already placed" rejection).
    pub fn resolve(session: &Session, placed_ships: usize, opponent_ready: bool) -> Phase {
        if session.status.is_terminal() {
            Phase::Finished
        } else if !session.has_opponent() {
            Phase::Lobby
        } else if opponent_ready {
            Phase::Active
        } else if placed_ships >= NUM_SHIPS {
            Phase::AwaitingOpponent
        } else {
            Phase::Placing
        }
    }
}
