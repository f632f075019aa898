//! Per-session preference operations.

use std::sync::Arc;

use duelcard_domain::{ActorId, CapabilityId, Declaration, SessionId};

use crate::infrastructure::ports::{PreferencesRepo, RepoError, UserPreferences};

pub struct Preferences {
    repo: Arc<dyn PreferencesRepo>,
}

impl Preferences {
    pub fn new(repo: Arc<dyn PreferencesRepo>) -> Self {
        Self { repo }
    }

    pub async fn get(&self, session: SessionId) -> Result<UserPreferences, RepoError> {
        self.repo.get(session).await
    }

    pub async fn save(
        &self,
        session: SessionId,
        preferences: &UserPreferences,
    ) -> Result<(), RepoError> {
        self.repo.save(session, preferences).await
    }

    pub async fn set_quick_path(&self, session: SessionId, enabled: bool) -> Result<(), RepoError> {
        let mut prefs = self.repo.get(session).await?;
        prefs.quick_path_enabled = enabled;
        self.repo.save(session, &prefs).await
    }

    /// Remember the values of a commit as this session's new defaults.
    pub async fn remember(
        &self,
        session: SessionId,
        actor: ActorId,
        capability: Option<CapabilityId>,
        declaration: &Declaration,
    ) -> Result<(), RepoError> {
        let mut prefs = self.repo.get(session).await?;
        prefs.remember(actor, capability, declaration);
        self.repo.save(session, &prefs).await
    }
}
