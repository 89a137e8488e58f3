// engine: deterministic battleship domain logic for the client session
// engine.
//
// Everything in this crate is a pure function of its inputs: geometry,
// placement validation, phase resolution and board reconciliation. The
// remote authority owns the rules; this crate only derives views from the
// records it serves, so the types here mirror the wire records and keep
// fixed-size representations where possible.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod board;
pub mod phase;
pub mod placement;
pub mod session;

pub use board::{reconcile, Board, CellState};
pub use phase::Phase;
pub use placement::PlacementPlanner;
pub use session::{ChatMessage, MoveRecord, Session, SessionStatus};

/// Board dimensions. Fixed-size board simplifies bounds reasoning and
/// keeps the reconciliation passes allocation-free.
pub const BOARD_SIZE: usize = 10;

/// Number of ships in the canonical fleet.
pub const NUM_SHIPS: usize = 5;

/// Canonical ship lengths in placement order: Carrier, Battleship,
/// Cruiser, Submarine, Destroyer.
pub const SHIP_SIZES: [u8; NUM_SHIPS] = [5, 4, 3, 3, 2];

/// Stable identifier for a player, assigned by the remote authority.
pub type PlayerId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

// ============================================================================
// Position: a safe, fixed-size coordinate type
//
// u32 for x/y avoids accidental underflow during arithmetic while keeping
// serialization deterministic. All bounds checks go through `in_bounds()`.
// ============================================================================
#[derive(Copy, Clone, Debug, Deserialize, Eq, PartialEq, Serialize, Hash)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl Position {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    pub fn step(self, orientation: Orientation, dist: u32) -> Self {
        match orientation {
            Orientation::Vertical => Self { x: self.x, y: self.y + dist },
            Orientation::Horizontal => Self { x: self.x + dist, y: self.y },
        }
    }

    pub fn in_bounds(&self) -> bool {
        self.x < BOARD_SIZE as u32 && self.y < BOARD_SIZE as u32
    }
}

impl From<(u32, u32)> for Position {
    fn from(value: (u32, u32)) -> Self {
        Self::new(value.0, value.1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShipKind {
    Carrier,    // length 5
    Battleship, // length 4
    Cruiser,    // length 3
    Submarine,  // length 3
    Destroyer,  // length 2
}

impl ShipKind {
    /// Canonical placement order for the fleet.
    pub const FLEET: [ShipKind; NUM_SHIPS] = [
        ShipKind::Carrier,
        ShipKind::Battleship,
        ShipKind::Cruiser,
        ShipKind::Submarine,
        ShipKind::Destroyer,
    ];

    pub fn length(&self) -> u8 {
        match self {
            ShipKind::Carrier => 5,
            ShipKind::Battleship => 4,
            ShipKind::Cruiser => 3,
            ShipKind::Submarine => 3,
            ShipKind::Destroyer => 2,
        }
    }
}

/// A placed vessel. Immutable once placed; only `sunk` may transition
/// false -> true, and only because the remote authority reported it via a
/// sunk-ship record. Sinking is never inferred from move data locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ship {
    pub kind: ShipKind,
    pub origin: Position,
    pub orientation: Orientation,
    #[serde(default)]
    pub owner: Option<PlayerId>,
    #[serde(default)]
    pub sunk: bool,
}

impl Ship {
    pub fn new(kind: ShipKind, origin: impl Into<Position>, orientation: Orientation) -> Self {
        Self { kind, origin: origin.into(), orientation, owner: None, sunk: false }
    }

    pub fn with_owner(mut self, owner: PlayerId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Last cell covered by this ship.
    pub fn end(&self) -> Position {
        self.origin.step(self.orientation, (self.kind.length() - 1) as u32)
    }

    /// All cells this ship occupies, origin first.
    pub fn coordinates(&self) -> Vec<Position> {
        let length = self.kind.length();
        let mut coords = Vec::with_capacity(length as usize);
        for offset in 0..length {
            coords.push(self.origin.step(self.orientation, offset as u32));
        }
        coords
    }
}
