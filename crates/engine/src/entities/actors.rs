//! Actor and token lookups.

use std::sync::Arc;

use duelcard_domain::{ActorId, ActorSnapshot, TokenId, TokenSnapshot};

use crate::infrastructure::ports::{ActorDataPort, RepoError};

pub struct Actors {
    port: Arc<dyn ActorDataPort>,
}

impl Actors {
    pub fn new(port: Arc<dyn ActorDataPort>) -> Self {
        Self { port }
    }

    pub async fn get(&self, id: ActorId) -> Result<Option<ActorSnapshot>, RepoError> {
        self.port.get_actor(id).await
    }

    pub async fn get_token(&self, id: TokenId) -> Result<Option<TokenSnapshot>, RepoError> {
        self.port.get_token(id).await
    }
}
