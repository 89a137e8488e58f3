// Board derivation. Grids are never stored or mutated incrementally:
// `reconcile` rebuilds both views from blank grids on every call, so the
// result is a pure function of the three event collections and recomputing
// from the same inputs yields the same grids.

use serde::{Deserialize, Serialize};

use crate::session::MoveRecord;
use crate::{Orientation, PlayerId, Position, Ship, BOARD_SIZE};

/// Derived state of one grid cell. Never serialized to the authority;
/// `Preview` and `Invalid` exist only for the local placement UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellState {
    Empty,
    Ship,
    Preview,
    Invalid,
    Hit,
    Miss,
    Sunk,
}

/// A 10x10 grid of derived cell states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [[CellState; BOARD_SIZE]; BOARD_SIZE],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self { cells: [[CellState::Empty; BOARD_SIZE]; BOARD_SIZE] }
    }

    pub fn get(&self, pos: Position) -> CellState {
        self.cells[pos.y as usize][pos.x as usize]
    }

    pub fn set(&mut self, pos: Position, state: CellState) {
        self.cells[pos.y as usize][pos.x as usize] = state;
    }

    /// Iterate over all cells with their coordinates, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (Position, CellState)> + '_ {
        self.cells.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .map(move |(x, &cell)| (Position::new(x as u32, y as u32), cell))
        })
    }

    /// Remove hover marks. Only `Preview` and `Invalid` are cleared; real
    /// placements and shot results stay untouched.
    pub fn clear_marks(&mut self) {
        for row in self.cells.iter_mut() {
            for cell in row.iter_mut() {
                if matches!(cell, CellState::Preview | CellState::Invalid) {
                    *cell = CellState::Empty;
                }
            }
        }
    }

    /// Check whether a ship of `length` can start at `origin` facing
    /// `orientation`: every covered cell must be in bounds and empty.
    pub fn can_place(&self, origin: Position, length: u8, orientation: Orientation) -> bool {
        if !origin.in_bounds() {
            return false;
        }
        let end = origin.step(orientation, (length - 1) as u32);
        if !end.in_bounds() {
            return false;
        }
        (0..length)
            .map(|offset| origin.step(orientation, offset as u32))
            .all(|pos| self.get(pos) == CellState::Empty)
    }

    fn stamp_ship(&mut self, ship: &Ship, state: CellState) {
        for pos in ship.coordinates() {
            if pos.in_bounds() {
                self.set(pos, state);
            }
        }
    }
}

/// Rebuild the local player's two views from scratch.
///
/// Layering order, always on fresh blank grids:
/// 1. the local player's own ships, stamped `Sunk` or `Ship`;
/// 2. the opponent's sunk-ship records, stamped `Sunk` on the opponent grid;
/// 3. every move in collection order: the local player's moves mark the
///    opponent grid `Hit`/`Miss`, the opponent's moves mark the own grid,
///    and neither ever overwrites a cell already marked `Sunk`.
///
/// Sinking is authoritative, so the sunk passes run before moves and win
/// over them. Collection order only matters within the move list.
pub fn reconcile(
    own_ships: &[Ship],
    sunk_ships: &[Ship],
    moves: &[MoveRecord],
    local: PlayerId,
) -> (Board, Board) {
    let mut own = Board::new();
    let mut opponent = Board::new();

    for ship in own_ships {
        let state = if ship.sunk { CellState::Sunk } else { CellState::Ship };
        own.stamp_ship(ship, state);
    }

    for ship in sunk_ships {
        if ship.owner != Some(local) {
            opponent.stamp_ship(ship, CellState::Sunk);
        }
    }

    for mv in moves {
        if !mv.pos.in_bounds() {
            continue;
        }
        let result = if mv.hit { CellState::Hit } else { CellState::Miss };
        let target = if mv.actor == local { &mut opponent } else { &mut own };
        if target.get(mv.pos) != CellState::Sunk {
            target.set(mv.pos, result);
        }
    }

    (own, opponent)
}
