use serde::{Deserialize, Serialize};

/// Sparse per-user profile. Each field is a one-shot latch: the first
/// inferred value sticks and is never overwritten automatically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub display_name: Option<String>,
    pub style: Option<String>,
}

/// The latchable profile fields, keyed by their storage name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    DisplayName,
    Style,
}

impl ProfileField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DisplayName => "display_name",
            Self::Style => "style",
        }
    }
}
