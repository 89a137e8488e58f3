// Single source of truth for one session's state. The session record is
// replaced wholesale on every fetch; move and chat collections only grow,
// with duplicate ids rejected at ingestion. Boards are never mutated in
// place: any change to the source collections marks them dirty, and the
// next read recomputes both grids from scratch through the engine.

use battleship_engine::{reconcile, Board, ChatMessage, MoveRecord, PlayerId, Session, Ship};
use uuid::Uuid;

pub struct SessionStore {
    local: PlayerId,
    session: Option<Session>,
    ships: Vec<Ship>,
    sunk_ships: Vec<Ship>,
    moves: Vec<MoveRecord>,
    chat: Vec<ChatMessage>,
    own_board: Board,
    opponent_board: Board,
    dirty: bool,
}

impl SessionStore {
    pub fn new(local: PlayerId) -> Self {
        Self {
            local,
            session: None,
            ships: Vec::new(),
            sunk_ships: Vec::new(),
            moves: Vec::new(),
            chat: Vec::new(),
            own_board: Board::new(),
            opponent_board: Board::new(),
            dirty: false,
        }
    }

    pub fn local_player(&self) -> PlayerId {
        self.local
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session.as_ref().map(|s| s.id)
    }

    /// Replace the session record wholesale. Field-patching under
    /// concurrent channel and poll updates diverges; whole records cannot.
    pub fn replace_session(&mut self, session: Session) {
        self.session = Some(session);
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    pub fn set_ships(&mut self, ships: Vec<Ship>) {
        self.ships = ships;
        self.dirty = true;
    }

    pub fn set_sunk_ships(&mut self, sunk: Vec<Ship>) {
        self.sunk_ships = sunk;
        self.dirty = true;
    }

    pub fn moves(&self) -> &[MoveRecord] {
        &self.moves
    }

    pub fn chat(&self) -> &[ChatMessage] {
        &self.chat
    }

    /// Append a confirmed move. Duplicates (same id) are rejected, so
    /// replaying the history after a reconnect is harmless.
    pub fn record_move(&mut self, mv: MoveRecord) -> bool {
        if self.moves.iter().any(|m| m.id == mv.id) {
            return false;
        }
        self.moves.push(mv);
        self.dirty = true;
        true
    }

    /// Append a chat message, de-duplicated by id. The channel may echo
    /// the sender's own message back; this keeps the collection single-entry.
    pub fn record_chat(&mut self, msg: ChatMessage) -> bool {
        if self.chat.iter().any(|m| m.id == msg.id) {
            return false;
        }
        self.chat.push(msg);
        true
    }

    /// Force recomputation on the next board read.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Both derived grids (own, opponent). Recomputes from the source
    /// collections if anything changed since the last read.
    pub fn boards(&mut self) -> (&Board, &Board) {
        if self.dirty {
            let (own, opponent) =
                reconcile(&self.ships, &self.sunk_ships, &self.moves, self.local);
            self.own_board = own;
            self.opponent_board = opponent;
            self.dirty = false;
        }
        (&self.own_board, &self.opponent_board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use battleship_engine::{CellState, Orientation, Position, ShipKind};
    use chrono::Utc;

    fn mv(actor: PlayerId, id: Uuid, x: u32, y: u32, hit: bool) -> MoveRecord {
        MoveRecord {
            id,
            session_id: Uuid::new_v4(),
            actor,
            pos: Position::new(x, y),
            hit,
            ship: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn duplicate_moves_are_rejected() {
        let me = Uuid::new_v4();
        let mut store = SessionStore::new(me);
        let id = Uuid::new_v4();
        assert!(store.record_move(mv(me, id, 1, 1, true)));
        assert!(!store.record_move(mv(me, id, 1, 1, true)));
        assert_eq!(store.moves().len(), 1);
    }

    #[test]
    fn duplicate_chat_does_not_grow_collection() {
        let me = Uuid::new_v4();
        let mut store = SessionStore::new(me);
        let msg = ChatMessage {
            id: Uuid::new_v4(),
            session_id: Uuid::new_v4(),
            author: me,
            text: "gl hf".into(),
            created_at: Utc::now(),
        };
        assert!(store.record_chat(msg.clone()));
        assert!(!store.record_chat(msg));
        assert_eq!(store.chat().len(), 1);
    }

    #[test]
    fn boards_recompute_only_when_dirty() {
        let me = Uuid::new_v4();
        let mut store = SessionStore::new(me);
        store.set_ships(vec![Ship::new(ShipKind::Destroyer, (0, 0), Orientation::Horizontal)]);
        {
            let (own, _) = store.boards();
            assert_eq!(own.get(Position::new(0, 0)), CellState::Ship);
        }
        // new move re-dirties; the next read reflects it
        store.record_move(mv(me, Uuid::new_v4(), 5, 5, false));
        let (_, opponent) = store.boards();
        assert_eq!(opponent.get(Position::new(5, 5)), CellState::Miss);
    }

    #[test]
    fn rereading_boards_is_stable() {
        let me = Uuid::new_v4();
        let mut store = SessionStore::new(me);
        store.record_move(mv(me, Uuid::new_v4(), 2, 2, true));
        let first = store.boards().1.clone();
        let second = store.boards().1.clone();
        assert_eq!(first, second);
    }
}
