//! Connected session directory.
//!
//! Tracks which sessions are at the table and their roles. The authority
//! election reads this list; it is never persisted.

use std::collections::HashMap;

use duelcard_domain::SessionId;
use tokio::sync::RwLock;

use crate::infrastructure::ports::SessionInfo;

pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, SessionInfo>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Register (or re-register) a connected session.
    pub async fn connect(&self, info: SessionInfo) {
        tracing::info!(
            session_id = %info.session_id,
            user = %info.user_name,
            role = ?info.role,
            "Session connected"
        );
        self.sessions.write().await.insert(info.session_id, info);
    }

    pub async fn disconnect(&self, session_id: SessionId) {
        if self.sessions.write().await.remove(&session_id).is_some() {
            tracing::info!(session_id = %session_id, "Session disconnected");
        }
    }

    pub async fn get(&self, session_id: SessionId) -> Option<SessionInfo> {
        self.sessions.read().await.get(&session_id).cloned()
    }

    /// Every connected session, ordered by id so callers see a stable list.
    pub async fn connected(&self) -> Vec<SessionInfo> {
        let mut sessions: Vec<SessionInfo> = self.sessions.read().await.values().cloned().collect();
        sessions.sort_by_key(|s| s.session_id);
        sessions
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
