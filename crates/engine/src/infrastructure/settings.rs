//! SQLite-backed per-session preferences.

use async_trait::async_trait;
use duelcard_domain::SessionId;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::infrastructure::ports::{ClockPort, PreferencesRepo, RepoError, UserPreferences};

/// SQLite implementation for preferences storage.
pub struct SqlitePreferencesRepo {
    pool: SqlitePool,
    clock: Arc<dyn ClockPort>,
}

impl SqlitePreferencesRepo {
    pub async fn new(pool: SqlitePool, clock: Arc<dyn ClockPort>) -> Result<Self, RepoError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_preferences (
                session_id TEXT PRIMARY KEY NOT NULL,
                preferences_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| RepoError::database("preferences", e))?;

        Ok(Self { pool, clock })
    }
}

#[async_trait]
impl PreferencesRepo for SqlitePreferencesRepo {
    async fn get(&self, session: SessionId) -> Result<UserPreferences, RepoError> {
        let row =
            sqlx::query("SELECT preferences_json FROM user_preferences WHERE session_id = ?")
                .bind(session.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RepoError::database("preferences", e))?;

        match row {
            Some(row) => {
                let json: String = row.get("preferences_json");
                serde_json::from_str(&json).map_err(|e| RepoError::Serialization(e.to_string()))
            }
            None => Ok(UserPreferences::default()),
        }
    }

    async fn save(
        &self,
        session: SessionId,
        preferences: &UserPreferences,
    ) -> Result<(), RepoError> {
        let json = serde_json::to_string(preferences)
            .map_err(|e| RepoError::Serialization(e.to_string()))?;
        let now = self.clock.now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO user_preferences (session_id, preferences_json, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(session_id) DO UPDATE SET
                preferences_json = excluded.preferences_json,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(session.to_string())
        .bind(json)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("preferences", e))?;

        Ok(())
    }
}
