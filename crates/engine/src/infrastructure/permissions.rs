//! Permission oracle backed by the session directory and an ownership table.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use duelcard_domain::{ActorId, SessionId};

use crate::infrastructure::ports::PermissionPort;
use crate::stores::SessionStore;

pub struct SessionPermissions {
    sessions: Arc<SessionStore>,
    owners: DashMap<ActorId, DashSet<SessionId>>,
}

impl SessionPermissions {
    pub fn new(sessions: Arc<SessionStore>) -> Self {
        Self {
            sessions,
            owners: DashMap::new(),
        }
    }

    pub fn grant_ownership(&self, session: SessionId, actor: ActorId) {
        self.owners.entry(actor).or_default().insert(session);
    }

    pub fn revoke_ownership(&self, session: SessionId, actor: ActorId) {
        if let Some(owners) = self.owners.get(&actor) {
            owners.remove(&session);
        }
    }
}

#[async_trait]
impl PermissionPort for SessionPermissions {
    async fn is_elevated(&self, session: SessionId) -> bool {
        self.sessions
            .get(session)
            .await
            .is_some_and(|info| info.is_elevated())
    }

    async fn is_owner(&self, session: SessionId, actor: ActorId) -> bool {
        self.owners
            .get(&actor)
            .is_some_and(|owners| owners.contains(&session))
    }
}
