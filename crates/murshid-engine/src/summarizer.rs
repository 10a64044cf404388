//! Context summarizer — folds a user's full journal into a bounded,
//! structured prompt context.

use murshid_core::{
    context::{
        ConversationContext, DayDigest, ProfileHeader, TranscriptLine, STYLE_PENDING,
        UNKNOWN_NAME,
    },
    journal::{JournalEntry, Role},
    profile::Profile,
    traits::{HistoryStore, ProfileStore},
};
use std::sync::Arc;
use tracing::warn;

/// Extracted digest lines are clipped to keep day summaries bounded.
const DIGEST_LINE_MAX_CHARS: usize = 160;

/// A user line expressing an intent or goal.
const OBJECTIVE_PATTERNS: &[&str] = &[
    "i want",
    "i would like",
    "i'd like",
    "my goal",
    "i need to",
    "i hope to",
    "i wish",
];

/// A coach line proposing a concrete action.
const PROPOSAL_PATTERNS: &[&str] = &[
    "try ",
    "i suggest",
    "i propose",
    "how about",
    "your challenge",
    "today's action",
    "commit to",
];

/// A user line affirming a commitment.
const COMMITMENT_PATTERNS: &[&str] = &[
    "i will",
    "i'll",
    "i commit",
    "i promise",
    "count me in",
    "inshallah",
    "deal",
];

/// Pure read/reduce over stored history. Never mutates anything, never
/// fails: storage errors degrade to empty history or placeholder profile
/// fields with a warning.
pub struct ContextSummarizer {
    history: Arc<dyn HistoryStore>,
    profiles: Arc<dyn ProfileStore>,
}

impl ContextSummarizer {
    pub fn new(history: Arc<dyn HistoryStore>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self { history, profiles }
    }

    /// Build the context for a turn: digest of every day strictly before
    /// `current_day`, verbatim transcript of the current day minus the
    /// just-appended current message, and the profile header. A user whose
    /// entire history is the message being processed gets the minimal
    /// first-session context.
    pub async fn build_context(
        &self,
        user_id: &str,
        current_day: u32,
        current_message: &str,
    ) -> ConversationContext {
        self.assemble(user_id, current_day, current_message, true).await
    }

    /// Context over everything stored, nothing excluded. Serves inspection
    /// paths where no new message is being appended.
    pub async fn full_context(&self, user_id: &str, current_day: u32) -> ConversationContext {
        self.assemble(user_id, current_day, "", false).await
    }

    async fn assemble(
        &self,
        user_id: &str,
        current_day: u32,
        current_message: &str,
        exclude_latest: bool,
    ) -> ConversationContext {
        let mut days = match self.history.all_days(user_id).await {
            Ok(days) => days,
            Err(e) => {
                warn!("history read failed for {user_id}, degrading to empty: {e}");
                Default::default()
            }
        };

        if days.is_empty() {
            return ConversationContext::first_session(current_message);
        }

        // On a turn the orchestrator has already journaled the incoming
        // message, so a sole current-day entry means the user has no
        // history beyond the message being processed.
        if exclude_latest
            && days.len() == 1
            && days.get(&current_day).is_some_and(|entries| entries.len() <= 1)
        {
            return ConversationContext::first_session(current_message);
        }

        // History may have been appended out of request order under
        // concurrent access; sort defensively. Sort is stable, so entries
        // sharing a timestamp keep insertion order.
        for entries in days.values_mut() {
            entries.sort_by_key(|entry| entry.timestamp);
        }

        let profile = match self.profiles.profile(user_id).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!("profile read failed for {user_id}, using placeholders: {e}");
                Profile::default()
            }
        };

        let prior_days = days
            .range(..current_day)
            .map(|(&day, entries)| digest_day(day, entries))
            .collect();

        let mut current: Vec<TranscriptLine> = Vec::new();
        if let Some(entries) = days.get(&current_day) {
            current = entries
                .iter()
                .map(|entry| TranscriptLine {
                    role: entry.role,
                    text: entry.text.clone(),
                })
                .collect();
            // Drop the entry the current turn just appended. Matched by
            // identity: after the timestamp sort the newest entry is not
            // necessarily last if a clock ran backwards.
            if exclude_latest && !current.is_empty() {
                match current
                    .iter()
                    .rposition(|line| line.role == Role::User && line.text == current_message)
                {
                    Some(idx) => {
                        current.remove(idx);
                    }
                    None => {
                        current.pop();
                    }
                }
            }
        }

        ConversationContext {
            profile: header_from(profile),
            prior_days,
            current_day: current,
            current_message: current_message.to_string(),
            first_session: false,
        }
    }
}

fn header_from(profile: Profile) -> ProfileHeader {
    ProfileHeader {
        display_name: profile
            .display_name
            .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
        style: profile.style.unwrap_or_else(|| STYLE_PENDING.to_string()),
    }
}

/// Condense one completed day: the first objective-sounding user line, the
/// first action proposal from the coach, and the *last* commitment from
/// the user — later commitments supersede earlier ones on purpose.
fn digest_day(day: u32, entries: &[JournalEntry]) -> DayDigest {
    let objective = entries
        .iter()
        .find(|e| e.role == Role::User && matches_any(&e.text, OBJECTIVE_PATTERNS))
        .map(|e| clip(&e.text));

    let proposed_action = entries
        .iter()
        .find(|e| e.role == Role::Assistant && matches_any(&e.text, PROPOSAL_PATTERNS))
        .map(|e| clip(&e.text));

    let commitment = entries
        .iter()
        .rev()
        .find(|e| e.role == Role::User && matches_any(&e.text, COMMITMENT_PATTERNS))
        .map(|e| clip(&e.text));

    DayDigest {
        day,
        objective,
        proposed_action,
        commitment,
    }
}

fn matches_any(text: &str, patterns: &[&str]) -> bool {
    let lower = text.to_lowercase();
    patterns.iter().any(|p| lower.contains(p))
}

fn clip(text: &str) -> String {
    if text.chars().count() <= DIGEST_LINE_MAX_CHARS {
        text.to_string()
    } else {
        let clipped: String = text.chars().take(DIGEST_LINE_MAX_CHARS).collect();
        format!("{clipped}...")
    }
}
