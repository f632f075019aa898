//! Storage port traits.
//!
//! The card store and the roll record store together form the persistent
//! messaging channel: every session can read them, and every write is visible
//! to every session. Nothing here assumes a particular transport.

use async_trait::async_trait;
use duelcard_domain::{ContestId, OpposedTestState, RollRecord, RollRecordId, SessionId};

use super::error::RepoError;
use super::types::UserPreferences;

// =============================================================================
// Coordination Cards
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CardRepo: Send + Sync {
    async fn get(&self, id: ContestId) -> Result<Option<OpposedTestState>, RepoError>;

    /// Store a new card. Fails with `AlreadyExists` if the id is taken.
    async fn create(&self, card: &OpposedTestState) -> Result<(), RepoError>;

    /// Replace the whole card, but only if the stored card still carries
    /// `expected_sequence`. Otherwise fails with `Conflict` and writes nothing.
    async fn replace(
        &self,
        card: &OpposedTestState,
        expected_sequence: u64,
    ) -> Result<(), RepoError>;
}

// =============================================================================
// Roll Records
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RollRecordRepo: Send + Sync {
    /// Publish a roll so every session sees it.
    async fn publish(&self, record: &RollRecord) -> Result<(), RepoError>;
    async fn get(&self, id: RollRecordId) -> Result<Option<RollRecord>, RepoError>;
    async fn list_for_contest(&self, contest_id: ContestId) -> Result<Vec<RollRecord>, RepoError>;
}

// =============================================================================
// Preferences Storage
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PreferencesRepo: Send + Sync {
    /// Missing preferences are not an error; callers get `UserPreferences::default()`.
    async fn get(&self, session: SessionId) -> Result<UserPreferences, RepoError>;
    async fn save(&self, session: SessionId, preferences: &UserPreferences)
        -> Result<(), RepoError>;
}
