use crate::journal::Role;
use serde::{Deserialize, Serialize};

/// Placeholder shown when the user's name has not been inferred yet.
pub const UNKNOWN_NAME: &str = "unknown";
/// Placeholder shown when the coaching style has not been inferred yet.
pub const STYLE_PENDING: &str = "to be determined";

/// Resolved profile header for the prompt. Placeholders are applied at
/// build time so the header is always printable as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileHeader {
    pub display_name: String,
    pub style: String,
}

impl Default for ProfileHeader {
    fn default() -> Self {
        Self {
            display_name: UNKNOWN_NAME.to_string(),
            style: STYLE_PENDING.to_string(),
        }
    }
}

/// Condensed summary of one completed program day.
///
/// At most one objective, one proposed action, and one commitment survive
/// per day; a day whose conversation matched nothing keeps its header with
/// no body lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayDigest {
    pub day: u32,
    pub objective: Option<String>,
    pub proposed_action: Option<String>,
    pub commitment: Option<String>,
}

impl DayDigest {
    pub fn is_empty(&self) -> bool {
        self.objective.is_none() && self.proposed_action.is_none() && self.commitment.is_none()
    }
}

/// One verbatim line of the current day's transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptLine {
    pub role: Role,
    pub text: String,
}

/// Everything needed to prime a model call for one turn. Assembled fresh
/// per request, never persisted. Each field is inspectable on its own;
/// flattening into a single text blob is the consumer's concern and lives
/// in [`ConversationContext::to_prompt_string`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub profile: ProfileHeader,
    /// Digests for days strictly before the current one, ascending.
    pub prior_days: Vec<DayDigest>,
    /// Verbatim transcript of the current day, excluding the message that
    /// triggered this turn.
    pub current_day: Vec<TranscriptLine>,
    pub current_message: String,
    /// True when the user has no stored history at all.
    pub first_session: bool,
}

impl ConversationContext {
    /// Minimal context for a user with no history.
    pub fn first_session(current_message: impl Into<String>) -> Self {
        Self {
            profile: ProfileHeader::default(),
            prior_days: Vec::new(),
            current_day: Vec::new(),
            current_message: current_message.into(),
            first_session: true,
        }
    }

    /// Flatten the context into a single prompt string for providers that
    /// accept one text input.
    pub fn to_prompt_string(&self) -> String {
        let mut parts = Vec::new();

        if self.first_session {
            parts.push("[First session]\nNo prior history for this user.".to_string());
        } else {
            parts.push(format!(
                "[Profile]\nName: {}\nStyle: {}",
                self.profile.display_name, self.profile.style
            ));

            for digest in &self.prior_days {
                let mut lines = vec![format!("[Day {}]", digest.day)];
                if let Some(ref objective) = digest.objective {
                    lines.push(format!("Objective: {objective}"));
                }
                if let Some(ref action) = digest.proposed_action {
                    lines.push(format!("Proposed action: {action}"));
                }
                if let Some(ref commitment) = digest.commitment {
                    lines.push(format!("Commitment: {commitment}"));
                }
                parts.push(lines.join("\n"));
            }

            if !self.current_day.is_empty() {
                let transcript: Vec<String> = self
                    .current_day
                    .iter()
                    .map(|line| {
                        let role = match line.role {
                            Role::User => "User",
                            Role::Assistant => "Coach",
                        };
                        format!("{role}: {}", line.text)
                    })
                    .collect();
                parts.push(format!("[Today]\n{}", transcript.join("\n")));
            }
        }

        // Inspection contexts carry no incoming message; skip the block
        // rather than print it empty.
        if !self.current_message.is_empty() {
            parts.push(format!("[User]\n{}", self.current_message));
        }

        parts.join("\n\n")
    }
}
