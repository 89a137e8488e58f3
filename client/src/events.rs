// Typed events crossing the duplex channel. JSON frames tagged by `type`,
// one frame per line. Inbound and outbound payloads differ for the same
// tag (an outbound move carries only coordinates, the confirmed inbound
// record carries the full move), so the two directions are separate enums.

use battleship_engine::{ChatMessage, MoveRecord, Position, Ship};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events pushed by the remote authority.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelEvent {
    /// The session record changed; triggers a re-fetch and phase
    /// re-evaluation.
    GameUpdate { session_id: Uuid },
    /// A player finished placing; triggers a readiness re-check.
    ShipPlacementUpdate { session_id: Uuid },
    /// A confirmed move to append to the move collection.
    Move { session_id: Uuid, data: MoveRecord },
    /// A chat message, possibly the sender's own broadcast echo.
    Chat { session_id: Uuid, data: ChatMessage },
}

impl ChannelEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ChannelEvent::GameUpdate { .. } => EventKind::GameUpdate,
            ChannelEvent::ShipPlacementUpdate { .. } => EventKind::ShipPlacementUpdate,
            ChannelEvent::Move { .. } => EventKind::Move,
            ChannelEvent::Chat { .. } => EventKind::Chat,
        }
    }

    pub fn session_id(&self) -> Uuid {
        match self {
            ChannelEvent::GameUpdate { session_id }
            | ChannelEvent::ShipPlacementUpdate { session_id }
            | ChannelEvent::Move { session_id, .. }
            | ChannelEvent::Chat { session_id, .. } => *session_id,
        }
    }
}

/// Events emitted by this client. The `move`, `chat` and `ship_placement`
/// emissions are advisory; the authoritative writes go through the
/// request/response API first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundEvent {
    JoinGame { session_id: Uuid },
    Move { session_id: Uuid, data: Position },
    Chat { session_id: Uuid, data: String },
    ShipPlacement { session_id: Uuid, data: Vec<Ship> },
}

/// Dispatch key for handler registration. `Any` receives every inbound
/// event in addition to its exact-kind handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    GameUpdate,
    ShipPlacementUpdate,
    Move,
    Chat,
    Any,
}
