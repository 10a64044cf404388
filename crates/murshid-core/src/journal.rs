use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Who wrote a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Parse a stored role string. Unknown values degrade to `User` so a
    /// malformed row never poisons a history read.
    pub fn parse(s: &str) -> Self {
        match s {
            "assistant" => Self::Assistant,
            _ => Self::User,
        }
    }
}

/// One message in a user's journal. Entries are append-only and never
/// mutated after being written; timestamps are timezone-resolved by the
/// caller before they reach the core (see the config module notes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub role: Role,
    pub text: String,
    pub timestamp: NaiveDateTime,
}

impl JournalEntry {
    pub fn new(role: Role, text: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp,
        }
    }
}
