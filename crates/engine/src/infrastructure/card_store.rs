//! SQLite-backed card and roll-record storage.
//!
//! Cards are stored as one JSON document per row next to a plain
//! `update_sequence` column, so the compare-and-swap can happen in SQL.

use std::sync::Arc;

use async_trait::async_trait;
use duelcard_domain::{ContestId, OpposedTestState, RollRecord, RollRecordId};
use sqlx::{Row, SqlitePool};

use crate::infrastructure::feed::ChangeFeed;
use crate::infrastructure::ports::{CardRepo, RepoError, RollRecordRepo};

/// Open (or create) the database file.
pub async fn connect(db_path: &str) -> Result<SqlitePool, RepoError> {
    SqlitePool::connect(&format!("sqlite:{}?mode=rwc", db_path))
        .await
        .map_err(|e| RepoError::database("connect", e))
}

// =============================================================================
// Cards
// =============================================================================

pub struct SqliteCardRepo {
    pool: SqlitePool,
    feed: Arc<ChangeFeed>,
}

impl SqliteCardRepo {
    pub async fn new(pool: SqlitePool, feed: Arc<ChangeFeed>) -> Result<Self, RepoError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS coordination_cards (
                id TEXT PRIMARY KEY NOT NULL,
                update_sequence INTEGER NOT NULL,
                card_json TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| RepoError::database("cards_schema", e))?;

        Ok(Self { pool, feed })
    }

    fn encode(card: &OpposedTestState) -> Result<(String, i64), RepoError> {
        let json =
            serde_json::to_string(card).map_err(|e| RepoError::Serialization(e.to_string()))?;
        let sequence = i64::try_from(card.update_sequence())
            .map_err(|_| RepoError::serialization("update sequence overflow"))?;
        Ok((json, sequence))
    }
}

#[async_trait]
impl CardRepo for SqliteCardRepo {
    async fn get(&self, id: ContestId) -> Result<Option<OpposedTestState>, RepoError> {
        let row = sqlx::query("SELECT card_json FROM coordination_cards WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("cards_get", e))?;

        match row {
            Some(row) => {
                let json: String = row.get("card_json");
                let card = serde_json::from_str(&json)
                    .map_err(|e| RepoError::Serialization(e.to_string()))?;
                Ok(Some(card))
            }
            None => Ok(None),
        }
    }

    async fn create(&self, card: &OpposedTestState) -> Result<(), RepoError> {
        let (json, sequence) = Self::encode(card)?;
        let result = sqlx::query(
            r#"
            INSERT INTO coordination_cards (id, update_sequence, card_json, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(card.id().to_string())
        .bind(sequence)
        .bind(json)
        .bind(card.context().updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("cards_create", e))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::already_exists("Card", card.id()));
        }
        self.feed.card_changed(card.id());
        Ok(())
    }

    async fn replace(
        &self,
        card: &OpposedTestState,
        expected_sequence: u64,
    ) -> Result<(), RepoError> {
        let (json, sequence) = Self::encode(card)?;
        let expected = i64::try_from(expected_sequence)
            .map_err(|_| RepoError::serialization("update sequence overflow"))?;

        let result = sqlx::query(
            r#"
            UPDATE coordination_cards
            SET card_json = ?, update_sequence = ?, updated_at = ?
            WHERE id = ? AND update_sequence = ?
            "#,
        )
        .bind(json)
        .bind(sequence)
        .bind(card.context().updated_at.to_rfc3339())
        .bind(card.id().to_string())
        .bind(expected)
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("cards_replace", e))?;

        if result.rows_affected() == 0 {
            let exists = sqlx::query("SELECT 1 FROM coordination_cards WHERE id = ?")
                .bind(card.id().to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RepoError::database("cards_replace", e))?
                .is_some();
            return Err(if exists {
                RepoError::conflict("Card", card.id(), expected_sequence)
            } else {
                RepoError::not_found("Card", card.id())
            });
        }

        self.feed.card_changed(card.id());
        Ok(())
    }
}

// =============================================================================
// Roll Records
// =============================================================================

pub struct SqliteRollRecordRepo {
    pool: SqlitePool,
    feed: Arc<ChangeFeed>,
}

impl SqliteRollRecordRepo {
    pub async fn new(pool: SqlitePool, feed: Arc<ChangeFeed>) -> Result<Self, RepoError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS roll_records (
                id TEXT PRIMARY KEY NOT NULL,
                contest_id TEXT NOT NULL,
                record_json TEXT NOT NULL,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| RepoError::database("rolls_schema", e))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_roll_records_contest ON roll_records (contest_id)",
        )
        .execute(&pool)
        .await
        .map_err(|e| RepoError::database("rolls_schema", e))?;

        Ok(Self { pool, feed })
    }

    fn decode(json: &str) -> Result<RollRecord, RepoError> {
        serde_json::from_str(json).map_err(|e| RepoError::Serialization(e.to_string()))
    }
}

#[async_trait]
impl RollRecordRepo for SqliteRollRecordRepo {
    async fn publish(&self, record: &RollRecord) -> Result<(), RepoError> {
        let json =
            serde_json::to_string(record).map_err(|e| RepoError::Serialization(e.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO roll_records (id, contest_id, record_json, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(record.id.to_string())
        .bind(record.contest_id.to_string())
        .bind(json)
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::database("rolls_publish", e))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::already_exists("RollRecord", record.id));
        }
        self.feed.roll_published(record.clone());
        Ok(())
    }

    async fn get(&self, id: RollRecordId) -> Result<Option<RollRecord>, RepoError> {
        let row = sqlx::query("SELECT record_json FROM roll_records WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepoError::database("rolls_get", e))?;

        row.map(|row| Self::decode(&row.get::<String, _>("record_json")))
            .transpose()
    }

    async fn list_for_contest(&self, contest_id: ContestId) -> Result<Vec<RollRecord>, RepoError> {
        let rows = sqlx::query(
            "SELECT record_json FROM roll_records WHERE contest_id = ? ORDER BY created_at",
        )
        .bind(contest_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::database("rolls_list", e))?;

        rows.iter()
            .map(|row| Self::decode(&row.get::<String, _>("record_json")))
            .collect()
    }
}
