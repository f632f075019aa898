//! External collaborator ports: actor data and the permission oracle.

use async_trait::async_trait;
use duelcard_domain::{ActorId, ActorSnapshot, SessionId, TokenId, TokenSnapshot};

use super::error::RepoError;

/// Read-only access to actors and tokens. The opposed test core never writes these.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ActorDataPort: Send + Sync {
    async fn get_actor(&self, id: ActorId) -> Result<Option<ActorSnapshot>, RepoError>;
    async fn get_token(&self, id: TokenId) -> Result<Option<TokenSnapshot>, RepoError>;
}

/// Answers who may act for whom.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PermissionPort: Send + Sync {
    /// Elevated sessions (game masters) may act for any actor.
    async fn is_elevated(&self, session: SessionId) -> bool;

    async fn is_owner(&self, session: SessionId, actor: ActorId) -> bool;
}

/// Roll permission: elevated, or owner of the actor.
pub async fn can_roll_for(
    permissions: &dyn PermissionPort,
    session: SessionId,
    actor: ActorId,
) -> bool {
    permissions.is_elevated(session).await || permissions.is_owner(session, actor).await
}
