//! In-memory adapters.
//!
//! Used by the demo binary and by tests. Cards and roll records are shared by
//! every session in the process, so one `Arc` of each stands in for a
//! table-wide document store.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use duelcard_domain::{
    ActorId, ActorSnapshot, ContestId, OpposedTestState, RollRecord, RollRecordId, SessionId,
    TokenId, TokenSnapshot,
};

use crate::infrastructure::feed::ChangeFeed;
use crate::infrastructure::ports::{
    ActorDataPort, CardRepo, PreferencesRepo, RepoError, RollRecordRepo, UserPreferences,
};

// =============================================================================
// Cards
// =============================================================================

pub struct InMemoryCardRepo {
    cards: DashMap<ContestId, OpposedTestState>,
    feed: Arc<ChangeFeed>,
}

impl InMemoryCardRepo {
    pub fn new(feed: Arc<ChangeFeed>) -> Self {
        Self {
            cards: DashMap::new(),
            feed,
        }
    }
}

#[async_trait]
impl CardRepo for InMemoryCardRepo {
    async fn get(&self, id: ContestId) -> Result<Option<OpposedTestState>, RepoError> {
        Ok(self.cards.get(&id).map(|card| card.value().clone()))
    }

    async fn create(&self, card: &OpposedTestState) -> Result<(), RepoError> {
        match self.cards.entry(card.id()) {
            Entry::Occupied(_) => return Err(RepoError::already_exists("Card", card.id())),
            Entry::Vacant(slot) => {
                slot.insert(card.clone());
            }
        }
        self.feed.card_changed(card.id());
        Ok(())
    }

    async fn replace(
        &self,
        card: &OpposedTestState,
        expected_sequence: u64,
    ) -> Result<(), RepoError> {
        {
            let mut stored = self
                .cards
                .get_mut(&card.id())
                .ok_or_else(|| RepoError::not_found("Card", card.id()))?;
            if stored.update_sequence() != expected_sequence {
                return Err(RepoError::conflict("Card", card.id(), expected_sequence));
            }
            *stored = card.clone();
        }
        self.feed.card_changed(card.id());
        Ok(())
    }
}

// =============================================================================
// Roll Records
// =============================================================================

pub struct InMemoryRollRecordRepo {
    records: DashMap<RollRecordId, RollRecord>,
    feed: Arc<ChangeFeed>,
}

impl InMemoryRollRecordRepo {
    pub fn new(feed: Arc<ChangeFeed>) -> Self {
        Self {
            records: DashMap::new(),
            feed,
        }
    }
}

#[async_trait]
impl RollRecordRepo for InMemoryRollRecordRepo {
    async fn publish(&self, record: &RollRecord) -> Result<(), RepoError> {
        match self.records.entry(record.id) {
            Entry::Occupied(_) => return Err(RepoError::already_exists("RollRecord", record.id)),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
            }
        }
        self.feed.roll_published(record.clone());
        Ok(())
    }

    async fn get(&self, id: RollRecordId) -> Result<Option<RollRecord>, RepoError> {
        Ok(self.records.get(&id).map(|r| r.value().clone()))
    }

    async fn list_for_contest(&self, contest_id: ContestId) -> Result<Vec<RollRecord>, RepoError> {
        let mut records: Vec<RollRecord> = self
            .records
            .iter()
            .filter(|r| r.contest_id == contest_id)
            .map(|r| r.value().clone())
            .collect();
        records.sort_by_key(|r| r.created_at);
        Ok(records)
    }
}

// =============================================================================
// Actors
// =============================================================================

/// Actor and token directory. Stands in for the host's character sheets.
#[derive(Default)]
pub struct InMemoryActorDirectory {
    actors: DashMap<ActorId, ActorSnapshot>,
    tokens: DashMap<TokenId, TokenSnapshot>,
}

impl InMemoryActorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_actor(&self, actor: ActorSnapshot) {
        self.actors.insert(actor.id, actor);
    }

    /// Delete an actor. Tokens that point at it are left dangling.
    pub fn remove_actor(&self, id: ActorId) -> Option<ActorSnapshot> {
        self.actors.remove(&id).map(|(_, actor)| actor)
    }

    /// Place a token for `actor` on the board and return its id.
    pub fn place_token(&self, actor: &ActorSnapshot) -> TokenId {
        let token = TokenSnapshot {
            id: TokenId::new(),
            actor_id: actor.id,
            name: actor.name.clone(),
        };
        let id = token.id;
        self.tokens.insert(id, token);
        id
    }

    /// Re-point an existing token at a different actor.
    pub fn relink_token(&self, token: TokenId, actor: ActorId) -> Result<(), RepoError> {
        let mut entry = self
            .tokens
            .get_mut(&token)
            .ok_or_else(|| RepoError::not_found("Token", token))?;
        entry.actor_id = actor;
        Ok(())
    }
}

#[async_trait]
impl ActorDataPort for InMemoryActorDirectory {
    async fn get_actor(&self, id: ActorId) -> Result<Option<ActorSnapshot>, RepoError> {
        Ok(self.actors.get(&id).map(|a| a.value().clone()))
    }

    async fn get_token(&self, id: TokenId) -> Result<Option<TokenSnapshot>, RepoError> {
        Ok(self.tokens.get(&id).map(|t| t.value().clone()))
    }
}

// =============================================================================
// Preferences
// =============================================================================

#[derive(Default)]
pub struct InMemoryPreferencesRepo {
    preferences: DashMap<SessionId, UserPreferences>,
}

impl InMemoryPreferencesRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferencesRepo for InMemoryPreferencesRepo {
    async fn get(&self, session: SessionId) -> Result<UserPreferences, RepoError> {
        Ok(self
            .preferences
            .get(&session)
            .map(|p| p.value().clone())
            .unwrap_or_default())
    }

    async fn save(
        &self,
        session: SessionId,
        preferences: &UserPreferences,
    ) -> Result<(), RepoError> {
        self.preferences.insert(session, preferences.clone());
        Ok(())
    }
}
