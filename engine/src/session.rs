// Records served by the remote authority. These deliberately mirror the
// wire shapes: the session record is replaced wholesale on every fetch
// (field-patching under concurrent channel+poll updates is a proven source
// of divergence), and the move/chat collections are append-only with
// id-based de-duplication at ingestion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{PlayerId, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Waiting,
    Active,
    Finished,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Finished)
    }
}

/// One two-player match as the remote authority sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub host: PlayerId,
    #[serde(default)]
    pub guest: Option<PlayerId>,
    pub status: SessionStatus,
    #[serde(default)]
    pub current_turn: Option<PlayerId>,
    #[serde(default)]
    pub winner: Option<PlayerId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// The other party, if a second player has joined.
    pub fn opponent_of(&self, player: PlayerId) -> Option<PlayerId> {
        if self.host == player {
            self.guest
        } else if self.guest == Some(player) {
            Some(self.host)
        } else {
            None
        }
    }

    pub fn has_opponent(&self) -> bool {
        self.guest.is_some()
    }

    pub fn is_turn_of(&self, player: PlayerId) -> bool {
        self.status == SessionStatus::Active && self.current_turn == Some(player)
    }
}

/// One cell attack, as confirmed by the remote authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub id: Uuid,
    pub session_id: Uuid,
    pub actor: PlayerId,
    pub pos: Position,
    pub hit: bool,
    #[serde(default)]
    pub ship: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    pub author: PlayerId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(host: PlayerId, guest: Option<PlayerId>) -> Session {
        let now = Utc::now();
        Session {
            id: Uuid::new_v4(),
            host,
            guest,
            status: SessionStatus::Waiting,
            current_turn: None,
            winner: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn opponent_lookup_is_symmetric() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let s = session(a, Some(b));
        assert_eq!(s.opponent_of(a), Some(b));
        assert_eq!(s.opponent_of(b), Some(a));
        // a stranger has no opponent in this session
        assert_eq!(s.opponent_of(Uuid::new_v4()), None);
    }

    #[test]
    fn no_turn_outside_active_status() {
        let a = Uuid::new_v4();
        let mut s = session(a, None);
        s.current_turn = Some(a);
        assert!(!s.is_turn_of(a));
        s.status = SessionStatus::Active;
        assert!(s.is_turn_of(a));
        s.status = SessionStatus::Finished;
        assert!(!s.is_turn_of(a));
    }
}
