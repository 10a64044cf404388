use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Identifier of a badge in the catalog.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BadgeId(pub String);

impl BadgeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BadgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-user gamification record. Created lazily with zero defaults on
/// first access and persisted immediately; every mutation afterwards is a
/// whole-record read-modify-write.
///
/// Every field carries a serde default so a partially persisted record
/// loads with the missing pieces zeroed instead of failing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProgress {
    pub total_points: u64,
    pub total_sessions: u32,
    pub current_streak: u32,
    pub max_streak: u32,
    /// Calendar day (not timestamp) of the last counted session.
    pub last_session_date: Option<NaiveDate>,
    pub total_dhikr_count: u32,
    pub early_morning_session_count: u32,
    pub max_actions_in_single_day: u32,
    /// Per-day interaction tally. Grows with the journal; only the current
    /// day's value feeds `max_actions_in_single_day`.
    pub daily_action_counts: HashMap<NaiveDate, u32>,
    /// Monotonically growing: a badge is never removed once earned.
    pub earned_badges: BTreeSet<BadgeId>,
}

impl UserProgress {
    /// Interactions recorded on the given calendar day.
    pub fn actions_on(&self, day: NaiveDate) -> u32 {
        self.daily_action_counts.get(&day).copied().unwrap_or(0)
    }

    pub fn has_badge(&self, id: &BadgeId) -> bool {
        self.earned_badges.contains(id)
    }
}
