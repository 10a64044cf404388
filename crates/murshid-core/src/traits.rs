use crate::{
    error::CoachError,
    journal::JournalEntry,
    profile::{Profile, ProfileField},
    progress::UserProgress,
};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Journal storage — the append-only record of every exchange.
///
/// Entries are grouped by user id, then by program day. Nothing here is
/// ever updated or deleted; a "not found" day is an empty list, not an
/// error.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Append one entry to a user's journal for the given day.
    async fn append(
        &self,
        user_id: &str,
        day: u32,
        entry: &JournalEntry,
    ) -> Result<(), CoachError>;

    /// All entries for one day, in insertion order.
    async fn entries_for_day(
        &self,
        user_id: &str,
        day: u32,
    ) -> Result<Vec<JournalEntry>, CoachError>;

    /// Full history grouped by day. Days with no entries are absent.
    async fn all_days(
        &self,
        user_id: &str,
    ) -> Result<BTreeMap<u32, Vec<JournalEntry>>, CoachError>;
}

/// Gamification record storage — whole-record load and save.
///
/// Under concurrent requests for the same user, last save wins; the ledger
/// serializes same-user updates in-process, and anything beyond that is an
/// accepted weak-consistency trade-off for this workload.
#[async_trait]
pub trait ProgressStore: Send + Sync {
    /// Load a user's record. Absent or malformed persisted state both
    /// resolve to `Ok(None)` — never a parse error.
    async fn load(&self, user_id: &str) -> Result<Option<UserProgress>, CoachError>;

    /// Persist the whole record. Failures are retryable by the caller.
    async fn save(&self, user_id: &str, progress: &UserProgress) -> Result<(), CoachError>;
}

/// Profile storage — sparse per-user fields with one-shot-latch writes.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Load a user's profile; unknown users get an empty profile.
    async fn profile(&self, user_id: &str) -> Result<Profile, CoachError>;

    /// Set a field only if it has never been set. Returns `true` when the
    /// value was written, `false` when an earlier value already won.
    async fn set_field_if_absent(
        &self,
        user_id: &str,
        field: ProfileField,
        value: &str,
    ) -> Result<bool, CoachError>;
}
