//! SQLite-backed storage adapter.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use murshid_core::{
    config::StorageConfig,
    error::CoachError,
    journal::{JournalEntry, Role},
    profile::{Profile, ProfileField},
    progress::UserProgress,
    shellexpand,
    traits::{HistoryStore, ProfileStore, ProgressStore},
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::collections::BTreeMap;
use std::str::FromStr;
use tracing::{info, warn};
use uuid::Uuid;

/// Storage for journal entries, progress records, and profile fields,
/// sharing one SQLite pool.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (or create) the database and run migrations.
    pub async fn new(config: &StorageConfig) -> Result<Self, CoachError> {
        let db_path = shellexpand(&config.db_path);

        // Ensure parent directory exists.
        if let Some(parent) = std::path::Path::new(&db_path).parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CoachError::Storage(format!("failed to create data dir: {e}")))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{db_path}"))
            .map_err(|e| CoachError::Storage(format!("invalid db path: {e}")))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(opts)
            .await
            .map_err(|e| CoachError::Storage(format!("failed to connect to sqlite: {e}")))?;

        Self::run_migrations(&pool).await?;

        info!("Store initialized at {db_path}");

        Ok(Self { pool })
    }

    /// Open an in-memory database. Used by tests and throwaway sessions.
    pub async fn in_memory() -> Result<Self, CoachError> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| CoachError::Storage(format!("invalid db path: {e}")))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await
            .map_err(|e| CoachError::Storage(format!("failed to connect to sqlite: {e}")))?;

        Self::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run SQL migrations, tracking which have already been applied.
    async fn run_migrations(pool: &SqlitePool) -> Result<(), CoachError> {
        sqlx::raw_sql(
            "CREATE TABLE IF NOT EXISTS _migrations (
                name TEXT PRIMARY KEY,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            );",
        )
        .execute(pool)
        .await
        .map_err(|e| CoachError::Storage(format!("failed to create migrations table: {e}")))?;

        let migrations: &[(&str, &str)] =
            &[("001_init", include_str!("../migrations/001_init.sql"))];

        for (name, sql) in migrations {
            let applied: Option<(String,)> =
                sqlx::query_as("SELECT name FROM _migrations WHERE name = ?")
                    .bind(name)
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| {
                        CoachError::Storage(format!("failed to check migration {name}: {e}"))
                    })?;

            if applied.is_some() {
                continue;
            }

            sqlx::raw_sql(sql)
                .execute(pool)
                .await
                .map_err(|e| CoachError::Storage(format!("migration {name} failed: {e}")))?;

            sqlx::query("INSERT INTO _migrations (name) VALUES (?)")
                .bind(name)
                .execute(pool)
                .await
                .map_err(|e| {
                    CoachError::Storage(format!("failed to record migration {name}: {e}"))
                })?;
        }
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for Store {
    async fn append(
        &self,
        user_id: &str,
        day: u32,
        entry: &JournalEntry,
    ) -> Result<(), CoachError> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            "INSERT INTO journal (id, user_id, day, role, text, timestamp) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(day as i64)
        .bind(entry.role.as_str())
        .bind(&entry.text)
        .bind(entry.timestamp)
        .execute(&self.pool)
        .await
        .map_err(|e| CoachError::Storage(format!("journal insert failed: {e}")))?;

        Ok(())
    }

    async fn entries_for_day(
        &self,
        user_id: &str,
        day: u32,
    ) -> Result<Vec<JournalEntry>, CoachError> {
        let rows: Vec<(String, String, NaiveDateTime)> = sqlx::query_as(
            "SELECT role, text, timestamp FROM journal \
             WHERE user_id = ? AND day = ? ORDER BY rowid",
        )
        .bind(user_id)
        .bind(day as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CoachError::Storage(format!("journal query failed: {e}")))?;

        Ok(rows
            .into_iter()
            .map(|(role, text, timestamp)| JournalEntry::new(Role::parse(&role), text, timestamp))
            .collect())
    }

    async fn all_days(
        &self,
        user_id: &str,
    ) -> Result<BTreeMap<u32, Vec<JournalEntry>>, CoachError> {
        let rows: Vec<(i64, String, String, NaiveDateTime)> = sqlx::query_as(
            "SELECT day, role, text, timestamp FROM journal \
             WHERE user_id = ? ORDER BY day, rowid",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CoachError::Storage(format!("journal query failed: {e}")))?;

        let mut days: BTreeMap<u32, Vec<JournalEntry>> = BTreeMap::new();
        for (day, role, text, timestamp) in rows {
            days.entry(day as u32)
                .or_default()
                .push(JournalEntry::new(Role::parse(&role), text, timestamp));
        }

        Ok(days)
    }
}

#[async_trait]
impl ProgressStore for Store {
    async fn load(&self, user_id: &str) -> Result<Option<UserProgress>, CoachError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT data FROM progress WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| CoachError::Storage(format!("progress query failed: {e}")))?;

        let Some((data,)) = row else {
            return Ok(None);
        };

        // Malformed persisted state is treated as "record not found".
        match serde_json::from_str(&data) {
            Ok(progress) => Ok(Some(progress)),
            Err(e) => {
                warn!("malformed progress record for {user_id}, resetting: {e}");
                Ok(None)
            }
        }
    }

    async fn save(&self, user_id: &str, progress: &UserProgress) -> Result<(), CoachError> {
        let data = serde_json::to_string(progress)?;

        sqlx::query(
            "INSERT INTO progress (user_id, data, updated_at) \
             VALUES (?, ?, datetime('now')) \
             ON CONFLICT(user_id) DO UPDATE SET data = excluded.data, \
             updated_at = datetime('now')",
        )
        .bind(user_id)
        .bind(&data)
        .execute(&self.pool)
        .await
        .map_err(|e| CoachError::Storage(format!("progress save failed: {e}")))?;

        Ok(())
    }
}

#[async_trait]
impl ProfileStore for Store {
    async fn profile(&self, user_id: &str) -> Result<Profile, CoachError> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT field, value FROM profiles WHERE user_id = ?")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| CoachError::Storage(format!("profile query failed: {e}")))?;

        let mut profile = Profile::default();
        for (field, value) in rows {
            match field.as_str() {
                "display_name" => profile.display_name = Some(value),
                "style" => profile.style = Some(value),
                other => warn!("ignoring unknown profile field '{other}' for {user_id}"),
            }
        }

        Ok(profile)
    }

    async fn set_field_if_absent(
        &self,
        user_id: &str,
        field: ProfileField,
        value: &str,
    ) -> Result<bool, CoachError> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO profiles (user_id, field, value) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(field.as_str())
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| CoachError::Storage(format!("profile insert failed: {e}")))?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    /// Create an in-memory store for testing.
    async fn test_store() -> Store {
        Store::in_memory().await.unwrap()
    }

    fn entry(role: Role, text: &str, h: u32, m: u32) -> JournalEntry {
        let ts = NaiveDate::from_ymd_opt(2026, 3, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap();
        JournalEntry::new(role, text, ts)
    }

    #[tokio::test]
    async fn test_append_and_read_preserves_order() {
        let store = test_store().await;
        store
            .append("user1", 1, &entry(Role::User, "salam", 9, 0))
            .await
            .unwrap();
        store
            .append("user1", 1, &entry(Role::Assistant, "wa alaykum salam", 9, 1))
            .await
            .unwrap();

        let entries = store.entries_for_day("user1", 1).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].role, Role::User);
        assert_eq!(entries[0].text, "salam");
        assert_eq!(entries[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_missing_day_is_empty_not_error() {
        let store = test_store().await;
        let entries = store.entries_for_day("nobody", 3).await.unwrap();
        assert!(entries.is_empty());
        assert!(store.all_days("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_all_days_groups_by_day() {
        let store = test_store().await;
        store
            .append("user1", 2, &entry(Role::User, "day two", 8, 0))
            .await
            .unwrap();
        store
            .append("user1", 1, &entry(Role::User, "day one", 8, 0))
            .await
            .unwrap();
        store
            .append("user2", 1, &entry(Role::User, "other user", 8, 0))
            .await
            .unwrap();

        let days = store.all_days("user1").await.unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[&1][0].text, "day one");
        assert_eq!(days[&2][0].text, "day two");
    }

    #[tokio::test]
    async fn test_progress_round_trip() {
        let store = test_store().await;
        assert!(store.load("user1").await.unwrap().is_none());

        let mut progress = UserProgress::default();
        progress.total_points = 53;
        progress.current_streak = 2;
        store.save("user1", &progress).await.unwrap();

        let loaded = store.load("user1").await.unwrap().unwrap();
        assert_eq!(loaded, progress);

        // Whole-record overwrite.
        progress.total_points = 100;
        store.save("user1", &progress).await.unwrap();
        let loaded = store.load("user1").await.unwrap().unwrap();
        assert_eq!(loaded.total_points, 100);
    }

    #[tokio::test]
    async fn test_malformed_progress_degrades_to_none() {
        let store = test_store().await;
        sqlx::query("INSERT INTO progress (user_id, data) VALUES ('user1', 'not json {')")
            .execute(store.pool())
            .await
            .unwrap();

        assert!(store.load("user1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_profile_field_latch_first_write_wins() {
        let store = test_store().await;

        assert!(store
            .set_field_if_absent("user1", ProfileField::DisplayName, "Amin")
            .await
            .unwrap());
        // Second inference loses.
        assert!(!store
            .set_field_if_absent("user1", ProfileField::DisplayName, "Karim")
            .await
            .unwrap());

        let profile = store.profile("user1").await.unwrap();
        assert_eq!(profile.display_name.as_deref(), Some("Amin"));
        assert!(profile.style.is_none());
    }

    #[tokio::test]
    async fn test_unknown_user_has_empty_profile() {
        let store = test_store().await;
        let profile = store.profile("ghost").await.unwrap();
        assert_eq!(profile, Profile::default());
    }
}
