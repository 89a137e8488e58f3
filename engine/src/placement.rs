// Interactive fleet placement. The planner walks the canonical fleet in
// order, validating each placement against its scratch board, and paints a
// hover preview that is fully cleared before every recomputation so marks
// never accumulate between hovers.

use crate::board::{Board, CellState};
use crate::{Orientation, Position, Ship, ShipKind, NUM_SHIPS};

#[cfg(feature = "rand")]
use rand::{seq::SliceRandom, Rng};

#[derive(Debug, Clone)]
pub struct PlacementPlanner {
    board: Board,
    ships: Vec<Ship>,
    next: usize,
    orientation: Orientation,
}

impl Default for PlacementPlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl PlacementPlanner {
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            ships: Vec::with_capacity(NUM_SHIPS),
            next: 0,
            orientation: Orientation::Horizontal,
        }
    }

    /// The ship to be placed next, or `None` once the fleet is complete.
    pub fn current_kind(&self) -> Option<ShipKind> {
        ShipKind::FLEET.get(self.next).copied()
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
    }

    pub fn is_complete(&self) -> bool {
        self.next >= NUM_SHIPS
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Paint the hover preview for placing the current ship at `origin`.
    /// Prior preview/invalid marks are cleared first; a legal hypothetical
    /// placement paints `Preview`, an illegal one paints `Invalid` on the
    /// in-bounds cells it would cover.
    pub fn preview(&mut self, origin: Position) {
        self.board.clear_marks();
        let Some(kind) = self.current_kind() else { return };
        let legal = self.board.can_place(origin, kind.length(), self.orientation);
        let mark = if legal { CellState::Preview } else { CellState::Invalid };
        for offset in 0..kind.length() {
            let pos = origin.step(self.orientation, offset as u32);
            if pos.in_bounds() && self.board.get(pos) == CellState::Empty {
                self.board.set(pos, mark);
            }
        }
    }

    /// Drop any hover marks, e.g. when the pointer leaves the grid.
    pub fn clear_preview(&mut self) {
        self.board.clear_marks();
    }

    /// Commit the current ship at `origin`. Returns false and changes
    /// nothing if the placement is out of bounds or overlaps.
    pub fn place(&mut self, origin: Position) -> bool {
        self.board.clear_marks();
        let Some(kind) = self.current_kind() else { return false };
        if !self.board.can_place(origin, kind.length(), self.orientation) {
            return false;
        }
        let ship = Ship::new(kind, origin, self.orientation);
        for pos in ship.coordinates() {
            self.board.set(pos, CellState::Ship);
        }
        self.ships.push(ship);
        self.next += 1;
        true
    }

    /// Start over with an empty board.
    pub fn reset(&mut self) {
        self.board = Board::new();
        self.ships.clear();
        self.next = 0;
    }
}

/// Place the whole fleet at random. Returns `None` if no legal layout was
/// found from the shuffled candidate origins, which is practically
/// unreachable on an empty 10x10 board.
#[cfg(feature = "rand")]
pub fn random_fleet<R: Rng + ?Sized>(rng: &mut R) -> Option<Vec<Ship>> {
    let mut origins: Vec<Position> = (0..crate::BOARD_SIZE as u32)
        .flat_map(|x| (0..crate::BOARD_SIZE as u32).map(move |y| Position::new(x, y)))
        .collect();
    origins.shuffle(rng);

    let mut planner = PlacementPlanner::new();
    'fleet: while !planner.is_complete() {
        for &origin in &origins {
            for orientation in [Orientation::Horizontal, Orientation::Vertical] {
                planner.set_orientation(orientation);
                if planner.place(origin) {
                    continue 'fleet;
                }
            }
        }
        return None;
    }
    Some(planner.ships().to_vec())
}
