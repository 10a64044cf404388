//! Progression ledger — the per-user accumulator for points, streaks,
//! counters, and badges.

use chrono::{NaiveDateTime, Timelike};
use murshid_core::{
    config::{Badge, DetectedAction, GamificationConfig},
    error::CoachError,
    progress::{BadgeId, UserProgress},
    traits::ProgressStore,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Result of applying one message's events to a user's record.
#[derive(Debug, Clone)]
pub struct MessageOutcome {
    pub progress: UserProgress,
    /// Points actually credited, multiplier included.
    pub points_awarded: u64,
}

/// Per-user gamification accumulator.
///
/// Every mutation is a whole-record load → pure transform → save through
/// one choke point, serialized per user by an in-process mutex so
/// concurrent requests for the same user cannot lose updates. Across
/// processes, last save wins — an accepted weak-consistency trade-off for
/// this workload.
pub struct ProgressLedger {
    store: Arc<dyn ProgressStore>,
    config: Arc<GamificationConfig>,
    user_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ProgressLedger {
    pub fn new(store: Arc<dyn ProgressStore>, config: Arc<GamificationConfig>) -> Self {
        Self {
            store,
            config,
            user_locks: Mutex::new(HashMap::new()),
        }
    }

    async fn lock_for(&self, user_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.user_locks.lock().await;
        locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Load a user's record, degrading to zero defaults when the load
    /// fails. Absence is not an error; a fresh record is synthesized.
    async fn load_or_default(&self, user_id: &str) -> UserProgress {
        match self.store.load(user_id).await {
            Ok(Some(progress)) => progress,
            Ok(None) => UserProgress::default(),
            Err(e) => {
                warn!("progress load failed for {user_id}, starting from defaults: {e}");
                UserProgress::default()
            }
        }
    }

    /// Read-only view of a user's record for display purposes.
    pub async fn progress_of(&self, user_id: &str) -> UserProgress {
        self.load_or_default(user_id).await
    }

    /// Apply one message's detected events at the given time.
    ///
    /// The summed base points are scaled by the single highest-priority
    /// matching multiplier (never stacked) and rounded to the nearest
    /// point. Save failures are returned to the caller as retryable.
    pub async fn apply_message(
        &self,
        user_id: &str,
        events: &[DetectedAction],
        at: NaiveDateTime,
    ) -> Result<MessageOutcome, CoachError> {
        let lock = self.lock_for(user_id).await;
        let _guard = lock.lock().await;

        let mut progress = self.load_or_default(user_id).await;

        let base: u32 = events.iter().map(|e| e.points).sum();
        let awarded = match self.config.multipliers.active_rule(at) {
            Some(rule) if base > 0 => {
                debug!(
                    "applying '{}' multiplier x{} to {base} base points for {user_id}",
                    rule.name, rule.factor
                );
                (f64::from(base) * rule.factor).round() as u64
            }
            _ => u64::from(base),
        };
        progress.total_points += awarded;

        let day = at.date();
        let count = progress.daily_action_counts.entry(day).or_insert(0);
        *count += 1;
        if *count > progress.max_actions_in_single_day {
            progress.max_actions_in_single_day = *count;
        }

        let dhikr_events = events.iter().filter(|e| e.kind.is_dhikr()).count() as u32;
        progress.total_dhikr_count += dhikr_events;

        if at.hour() < self.config.early_morning_hour {
            progress.early_morning_session_count += 1;
        }

        self.store.save(user_id, &progress).await?;

        Ok(MessageOutcome {
            progress,
            points_awarded: awarded,
        })
    }

    /// Register a session start for streak accounting. Idempotent per
    /// calendar day: repeated calls on the same day neither grow the
    /// streak nor double-count `total_sessions`.
    pub async fn register_session_start(
        &self,
        user_id: &str,
        at: NaiveDateTime,
    ) -> Result<u32, CoachError> {
        let lock = self.lock_for(user_id).await;
        let _guard = lock.lock().await;

        let mut progress = self.load_or_default(user_id).await;
        let today = at.date();

        match progress.last_session_date {
            Some(last) if last == today => {
                // Already counted today.
                return Ok(progress.current_streak);
            }
            Some(last) if Some(last) == today.pred_opt() => {
                progress.current_streak += 1;
            }
            // Gap of two or more days, or first-ever session.
            _ => {
                progress.current_streak = 1;
            }
        }

        progress.max_streak = progress.max_streak.max(progress.current_streak);
        progress.total_sessions += 1;
        progress.last_session_date = Some(today);

        self.store.save(user_id, &progress).await?;

        info!(
            "session start for {user_id}: streak {} (max {})",
            progress.current_streak, progress.max_streak
        );

        Ok(progress.current_streak)
    }

    /// Evaluate the badge catalog against the user's current record and
    /// persist any newly unlocked badges. Returns only the delta; badges
    /// already owned are never re-evaluated or removed.
    pub async fn refresh_badges(&self, user_id: &str) -> Result<Vec<BadgeId>, CoachError> {
        let lock = self.lock_for(user_id).await;
        let _guard = lock.lock().await;

        let mut progress = self.load_or_default(user_id).await;
        let unlocked = newly_earned_badges(&self.config.badges, &progress);
        if unlocked.is_empty() {
            return Ok(unlocked);
        }

        for id in &unlocked {
            progress.earned_badges.insert(id.clone());
        }
        self.store.save(user_id, &progress).await?;

        info!(
            "{user_id} earned badge(s): {}",
            unlocked
                .iter()
                .map(BadgeId::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(unlocked)
    }
}

/// Catalog rules not yet owned whose predicate holds right now. Pure;
/// merging the result into the record is the caller's job.
pub fn newly_earned_badges(catalog: &[Badge], progress: &UserProgress) -> Vec<BadgeId> {
    catalog
        .iter()
        .filter(|badge| !progress.has_badge(&badge.id) && badge.rule.satisfied(progress))
        .map(|badge| badge.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use murshid_core::config::{ActionKind, Config};
    use murshid_store::Store;

    async fn ledger() -> (ProgressLedger, Arc<Store>) {
        let store = Arc::new(Store::in_memory().await.unwrap());
        let config = Arc::new(Config::default().gamification);
        (
            ProgressLedger::new(store.clone() as Arc<dyn ProgressStore>, config),
            store,
        )
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn event(kind: ActionKind, points: u32) -> DetectedAction {
        DetectedAction { kind, points }
    }

    #[tokio::test]
    async fn test_same_day_session_is_idempotent() {
        let (ledger, _store) = ledger().await;
        let morning = at(2026, 3, 9, 9);
        let evening = at(2026, 3, 9, 21);

        assert_eq!(ledger.register_session_start("u", morning).await.unwrap(), 1);
        assert_eq!(ledger.register_session_start("u", evening).await.unwrap(), 1);

        let progress = ledger.progress_of("u").await;
        assert_eq!(progress.total_sessions, 1);
        assert_eq!(progress.current_streak, 1);
    }

    #[tokio::test]
    async fn test_consecutive_days_grow_streak() {
        let (ledger, _store) = ledger().await;
        for (d, expected) in [(9, 1), (10, 2), (11, 3)] {
            let streak = ledger
                .register_session_start("u", at(2026, 3, d, 8))
                .await
                .unwrap();
            assert_eq!(streak, expected);
        }

        let progress = ledger.progress_of("u").await;
        assert_eq!(progress.max_streak, 3);
        assert_eq!(progress.total_sessions, 3);
    }

    #[tokio::test]
    async fn test_gap_resets_streak_but_not_max() {
        let (ledger, _store) = ledger().await;
        ledger.register_session_start("u", at(2026, 3, 9, 8)).await.unwrap();
        ledger.register_session_start("u", at(2026, 3, 10, 8)).await.unwrap();
        // Two-day gap.
        let streak = ledger
            .register_session_start("u", at(2026, 3, 13, 8))
            .await
            .unwrap();
        assert_eq!(streak, 1);

        let progress = ledger.progress_of("u").await;
        assert_eq!(progress.current_streak, 1);
        assert_eq!(progress.max_streak, 2);
        assert_eq!(progress.total_sessions, 3);
    }

    #[tokio::test]
    async fn test_friday_early_morning_applies_single_multiplier() {
        let (ledger, _store) = ledger().await;
        // 2026-01-02 is a Friday; 07:00 is also in the early-morning window.
        let events = [
            event(ActionKind::Bismillah, 15),
            event(ActionKind::Alhamdulillah, 20),
        ];
        let outcome = ledger
            .apply_message("u", &events, at(2026, 1, 2, 7))
            .await
            .unwrap();

        // 35 base x1.5 (Friday wins, no stacking), rounded.
        assert_eq!(outcome.points_awarded, 53);
        assert_eq!(outcome.progress.total_points, 53);
        assert_eq!(outcome.progress.early_morning_session_count, 1);
        assert_eq!(outcome.progress.total_dhikr_count, 2);
        assert_eq!(outcome.progress.max_actions_in_single_day, 1);
    }

    #[tokio::test]
    async fn test_plain_weekday_awards_base_points() {
        let (ledger, _store) = ledger().await;
        // 2026-01-05 is a Monday, midday — no window matches.
        let events = [event(ActionKind::Alhamdulillah, 20)];
        let outcome = ledger
            .apply_message("u", &events, at(2026, 1, 5, 12))
            .await
            .unwrap();
        assert_eq!(outcome.points_awarded, 20);
        assert_eq!(outcome.progress.early_morning_session_count, 0);
    }

    #[tokio::test]
    async fn test_daily_counter_feeds_single_day_max() {
        let (ledger, _store) = ledger().await;
        for _ in 0..3 {
            ledger.apply_message("u", &[], at(2026, 1, 5, 12)).await.unwrap();
        }
        ledger.apply_message("u", &[], at(2026, 1, 6, 12)).await.unwrap();

        let progress = ledger.progress_of("u").await;
        assert_eq!(progress.actions_on(at(2026, 1, 5, 12).date()), 3);
        assert_eq!(progress.actions_on(at(2026, 1, 6, 12).date()), 1);
        assert_eq!(progress.max_actions_in_single_day, 3);
    }

    #[tokio::test]
    async fn test_badge_unlocks_at_exact_threshold() {
        let catalog = Config::default().gamification.badges;

        let progress = UserProgress {
            total_points: 4999,
            ..Default::default()
        };
        let earned = newly_earned_badges(&catalog, &progress);
        assert!(!earned.iter().any(|id| id.as_str() == "mountain-mover"));

        let progress = UserProgress {
            total_points: 5000,
            ..Default::default()
        };
        let earned = newly_earned_badges(&catalog, &progress);
        assert!(earned.iter().any(|id| id.as_str() == "mountain-mover"));
    }

    #[tokio::test]
    async fn test_badges_persist_and_never_return_twice() {
        let (ledger, _store) = ledger().await;
        ledger.register_session_start("u", at(2026, 3, 9, 9)).await.unwrap();

        let first = ledger.refresh_badges("u").await.unwrap();
        assert!(first.iter().any(|id| id.as_str() == "first-light"));

        // Earned once, never re-reported and never removed.
        let second = ledger.refresh_badges("u").await.unwrap();
        assert!(second.is_empty());

        ledger.apply_message("u", &[], at(2026, 3, 9, 12)).await.unwrap();
        let progress = ledger.progress_of("u").await;
        assert!(progress.has_badge(&BadgeId::new("first-light")));
    }

    #[tokio::test]
    async fn test_malformed_stored_record_degrades_to_fresh() {
        let (ledger, store) = ledger().await;
        sqlx::query("INSERT INTO progress (user_id, data) VALUES ('u', 'garbage')")
            .execute(store.pool())
            .await
            .unwrap();

        let outcome = ledger
            .apply_message("u", &[event(ActionKind::Bismillah, 15)], at(2026, 1, 5, 12))
            .await
            .unwrap();
        assert_eq!(outcome.progress.total_points, 15);
    }
}
