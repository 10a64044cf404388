//! Static gamification tables: recognized actions, temporal multipliers,
//! level thresholds, and the badge catalog. Loaded once at startup and
//! validated; immutable for the process lifetime.

use crate::error::CoachError;
use crate::progress::{BadgeId, UserProgress};
use chrono::{Datelike, NaiveDateTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

/// Broad grouping of action kinds. Dhikr events feed the dedicated
/// remembrance counter; engagement events only carry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionCategory {
    Dhikr,
    Engagement,
}

/// A category of recognized user expression carrying a fixed base point
/// value. One kind fires at most once per message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    Bismillah,
    Alhamdulillah,
    Subhanallah,
    Astaghfirullah,
    AllahuAkbar,
    LaIlahaIllallah,
    Salawat,
    Gratitude,
}

impl ActionKind {
    pub fn category(&self) -> ActionCategory {
        match self {
            Self::Gratitude => ActionCategory::Engagement,
            _ => ActionCategory::Dhikr,
        }
    }

    pub fn is_dhikr(&self) -> bool {
        self.category() == ActionCategory::Dhikr
    }
}

/// One detector rule: the phrases that trigger a kind and the base points
/// it awards. Phrases cover both Latin transliteration and Arabic script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRule {
    pub kind: ActionKind,
    pub points: u32,
    pub phrases: Vec<String>,
}

/// Transient detector output. Only its aggregate effect on
/// [`UserProgress`] is ever persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedAction {
    pub kind: ActionKind,
    pub points: u32,
}

/// When a multiplier window is active.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "when", rename_all = "kebab-case")]
pub enum MultiplierWindow {
    Friday,
    Before { hour: u32 },
    After { hour: u32 },
}

/// A temporal point multiplier. Rule order in the table is priority order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiplierRule {
    pub name: String,
    pub factor: f64,
    #[serde(flatten)]
    pub window: MultiplierWindow,
}

impl MultiplierRule {
    pub fn applies(&self, at: NaiveDateTime) -> bool {
        match self.window {
            MultiplierWindow::Friday => at.weekday() == Weekday::Fri,
            MultiplierWindow::Before { hour } => at.hour() < hour,
            MultiplierWindow::After { hour } => at.hour() >= hour,
        }
    }
}

/// Temporal multiplier table.
///
/// Policy: the single highest-priority matching rule applies to a
/// message's summed base points — multipliers never stack. Priority is
/// table order, with Friday listed (and therefore winning) first in the
/// default table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiplierConfig {
    pub enabled: bool,
    pub rules: Vec<MultiplierRule>,
}

impl MultiplierConfig {
    /// The single rule to apply at this time, if any.
    pub fn active_rule(&self, at: NaiveDateTime) -> Option<&MultiplierRule> {
        if !self.enabled {
            return None;
        }
        self.rules.iter().find(|rule| rule.applies(at))
    }
}

/// A named tier derived purely from cumulative points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub number: u32,
    pub name: String,
    pub min_points: u64,
}

/// Ordered level thresholds: non-empty, starting at zero points, strictly
/// increasing — which makes `level_of` total over all point values.
/// Construction from config data goes through `TryFrom`, so a table that
/// deserialized at all is already valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "Vec<Level>", into = "Vec<Level>")]
pub struct LevelTable(pub(crate) Vec<Level>);

impl TryFrom<Vec<Level>> for LevelTable {
    type Error = CoachError;

    fn try_from(levels: Vec<Level>) -> Result<Self, Self::Error> {
        let table = Self(levels);
        table.validate()?;
        Ok(table)
    }
}

impl From<LevelTable> for Vec<Level> {
    fn from(table: LevelTable) -> Self {
        table.0
    }
}

/// Position within the level ladder for a given point total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelProgress {
    /// Percent of the way from the current threshold to the next, 0-100.
    pub percent: u8,
    /// Points still needed to reach the next level; 0 at the top tier.
    pub points_needed: u64,
    /// The next level, or `None` when already at the maximum.
    pub next: Option<Level>,
}

impl LevelTable {
    /// Highest level whose threshold is at or below `points`.
    pub fn level_of(&self, points: u64) -> &Level {
        // Construction guarantees a non-empty table with a zero-point floor.
        let mut current = &self.0[0];
        for level in &self.0 {
            if level.min_points <= points {
                current = level;
            } else {
                break;
            }
        }
        current
    }

    /// Linear interpolation between the current and next thresholds.
    pub fn progress(&self, points: u64) -> LevelProgress {
        let current = self.level_of(points);
        let next = self
            .0
            .iter()
            .find(|level| level.min_points > current.min_points);

        match next {
            None => LevelProgress {
                percent: 100,
                points_needed: 0,
                next: None,
            },
            Some(next) => {
                let span = next.min_points - current.min_points;
                let done = points.saturating_sub(current.min_points);
                let percent = ((done * 100) / span).min(100) as u8;
                LevelProgress {
                    percent,
                    points_needed: next.min_points.saturating_sub(points),
                    next: Some(next.clone()),
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), CoachError> {
        if self.0.is_empty() {
            return Err(CoachError::Config("level table is empty".into()));
        }
        if self.0[0].min_points != 0 {
            return Err(CoachError::Config(
                "first level must start at 0 points".into(),
            ));
        }
        for pair in self.0.windows(2) {
            if pair[1].min_points <= pair[0].min_points {
                return Err(CoachError::Config(format!(
                    "level thresholds must be strictly increasing: {} then {}",
                    pair[0].min_points, pair[1].min_points
                )));
            }
            if pair[1].number <= pair[0].number {
                return Err(CoachError::Config(format!(
                    "level numbers must be strictly increasing: {} then {}",
                    pair[0].number, pair[1].number
                )));
            }
        }
        Ok(())
    }
}

/// Unlock predicate over a user's progress. All rules are "at or above a
/// threshold" checks on counters that only grow (streak checks read
/// `max_streak`, not the resettable current streak), so a rule that
/// becomes true stays true.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BadgeRule {
    TotalPoints(u64),
    MaxStreak(u32),
    TotalSessions(u32),
    DhikrCount(u32),
    EarlyMorningSessions(u32),
    ActionsInSingleDay(u32),
}

impl BadgeRule {
    pub fn satisfied(&self, progress: &UserProgress) -> bool {
        match *self {
            Self::TotalPoints(n) => progress.total_points >= n,
            Self::MaxStreak(n) => progress.max_streak >= n,
            Self::TotalSessions(n) => progress.total_sessions >= n,
            Self::DhikrCount(n) => progress.total_dhikr_count >= n,
            Self::EarlyMorningSessions(n) => progress.early_morning_session_count >= n,
            Self::ActionsInSingleDay(n) => progress.max_actions_in_single_day >= n,
        }
    }
}

/// One catalog entry: a named, one-time achievement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Badge {
    pub id: BadgeId,
    pub label: String,
    pub rule: BadgeRule,
}
