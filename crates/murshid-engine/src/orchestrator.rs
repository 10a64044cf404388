//! Session orchestrator — the strict per-message sequence tying detector,
//! ledger, journal, and summarizer together.

use crate::{ActionDetector, ContextSummarizer, ProgressLedger};
use chrono::NaiveDateTime;
use murshid_core::{
    config::{Config, Level},
    context::ConversationContext,
    error::CoachError,
    journal::{JournalEntry, Role},
    profile::ProfileField,
    progress::BadgeId,
    traits::{HistoryStore, ProfileStore, ProgressStore},
};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything the request layer needs from one processed message: the
/// prompt context for the downstream model call plus the gamification
/// delta for client notification.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub context: ConversationContext,
    pub points_awarded: u64,
    pub new_badges: Vec<BadgeId>,
    pub level: Level,
}

const NAME_PATTERNS: &[&str] = &["my name is ", "i am called ", "call me ", "je m'appelle "];

/// Keyword buckets for the behavioral-style latch. First bucket with a
/// match wins.
const STYLE_BUCKETS: &[(&str, &[&str])] = &[
    (
        "direct",
        &["be direct", "straight to the point", "no sugarcoating", "just tell me"],
    ),
    (
        "encouraging",
        &["encourage me", "be gentle", "be kind with me", "i get discouraged"],
    ),
    (
        "reflective",
        &["help me reflect", "deep questions", "take time to think", "i like to reflect"],
    ),
];

/// Combines the core components per incoming message.
///
/// The handling sequence is strict: later steps depend on state persisted
/// by earlier ones, so nothing may be skipped or reordered. The model call
/// and the assistant reply's journal append happen downstream, after this
/// returns; if generation is aborted, the updates made here deliberately
/// stay — the user's input was real regardless of the outcome.
pub struct SessionEngine {
    config: Arc<Config>,
    detector: ActionDetector,
    ledger: ProgressLedger,
    summarizer: ContextSummarizer,
    history: Arc<dyn HistoryStore>,
    profiles: Arc<dyn ProfileStore>,
}

impl SessionEngine {
    pub fn new(
        config: Arc<Config>,
        history: Arc<dyn HistoryStore>,
        progress: Arc<dyn ProgressStore>,
        profiles: Arc<dyn ProfileStore>,
    ) -> Self {
        let detector = ActionDetector::new(&config.gamification.actions);
        let gamification = Arc::new(config.gamification.clone());
        let ledger = ProgressLedger::new(progress, gamification);
        let summarizer = ContextSummarizer::new(history.clone(), profiles.clone());
        Self {
            config,
            detector,
            ledger,
            summarizer,
            history,
            profiles,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ledger(&self) -> &ProgressLedger {
        &self.ledger
    }

    pub fn summarizer(&self) -> &ContextSummarizer {
        &self.summarizer
    }

    /// Process one incoming user message.
    ///
    /// Storage write failures are returned as retryable errors; the caller
    /// decides whether to surface them to the end user.
    pub async fn handle_message(
        &self,
        user_id: &str,
        day: u32,
        text: &str,
        at: NaiveDateTime,
    ) -> Result<TurnOutcome, CoachError> {
        let max = self.config.gamification.program_days;
        if day == 0 || day > max {
            return Err(CoachError::InvalidDay { day, max });
        }

        // 1. One-shot profile inference: first inference wins, failures
        //    here never block the turn.
        self.latch_profile_fields(user_id, text).await;

        // 2. Detect point-bearing actions.
        let (events, base_points) = self.detector.detect(text);

        // 3. Apply them to the ledger.
        let outcome = self.ledger.apply_message(user_id, &events, at).await?;

        // 4. Count the session for streak purposes (idempotent per day).
        let streak = self.ledger.register_session_start(user_id, at).await?;

        // 5. Append the user's message to the journal.
        let entry = JournalEntry::new(Role::User, text, at);
        self.history.append(user_id, day, &entry).await?;

        // 6. Build the prompt context, which excludes the entry just
        //    appended and the not-yet-generated reply.
        let context = self.summarizer.build_context(user_id, day, text).await;

        // 7. Evaluate and persist newly earned badges.
        let new_badges = self.ledger.refresh_badges(user_id).await?;

        let level = self
            .config
            .gamification
            .levels
            .level_of(outcome.progress.total_points)
            .clone();

        info!(
            "[{user_id}] day {day}: {} event(s), {} base -> {} awarded, streak {streak}, \
             level {} ({})",
            events.len(),
            base_points,
            outcome.points_awarded,
            level.number,
            level.name,
        );

        Ok(TurnOutcome {
            context,
            points_awarded: outcome.points_awarded,
            new_badges,
            level,
        })
    }

    /// Append the completed assistant reply to the journal. Called by the
    /// transport layer once generation finishes.
    pub async fn record_reply(
        &self,
        user_id: &str,
        day: u32,
        text: &str,
        at: NaiveDateTime,
    ) -> Result<(), CoachError> {
        let max = self.config.gamification.program_days;
        if day == 0 || day > max {
            return Err(CoachError::InvalidDay { day, max });
        }
        let entry = JournalEntry::new(Role::Assistant, text, at);
        self.history.append(user_id, day, &entry).await
    }

    async fn latch_profile_fields(&self, user_id: &str, text: &str) {
        if let Some(name) = infer_display_name(text) {
            match self
                .profiles
                .set_field_if_absent(user_id, ProfileField::DisplayName, &name)
                .await
            {
                Ok(true) => info!("latched display name '{name}' for {user_id}"),
                Ok(false) => {}
                Err(e) => warn!("profile latch failed for {user_id}: {e}"),
            }
        }

        if let Some(style) = infer_style(text) {
            match self
                .profiles
                .set_field_if_absent(user_id, ProfileField::Style, style)
                .await
            {
                Ok(true) => info!("latched style '{style}' for {user_id}"),
                Ok(false) => {}
                Err(e) => warn!("profile latch failed for {user_id}: {e}"),
            }
        }
    }
}

/// Extract a display name from a self-introduction, if present. Works on
/// the lowercased text and re-capitalizes, so "my name is amin" and "MY
/// NAME IS AMIN" latch the same value.
fn infer_display_name(text: &str) -> Option<String> {
    let lower = text.to_lowercase();
    for pattern in NAME_PATTERNS {
        if let Some(pos) = lower.find(pattern) {
            let rest = &lower[pos + pattern.len()..];
            let word: String = rest
                .chars()
                .take_while(|c| c.is_alphabetic() || *c == '-')
                .collect();
            if word.chars().count() >= 2 {
                let mut chars = word.chars();
                let first = chars.next()?;
                return Some(first.to_uppercase().chain(chars).collect());
            }
        }
    }
    None
}

/// Infer a coaching-style tag from explicit preference phrases.
fn infer_style(text: &str) -> Option<&'static str> {
    let lower = text.to_lowercase();
    STYLE_BUCKETS
        .iter()
        .find(|(_, phrases)| phrases.iter().any(|p| lower.contains(p)))
        .map(|(tag, _)| *tag)
}
