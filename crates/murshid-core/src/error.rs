use thiserror::Error;

/// Top-level error type for Murshid.
#[derive(Debug, Error)]
pub enum CoachError {
    /// Storage read/write error. Write failures are retryable by the caller.
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// A day outside the program range was requested. Never silently
    /// clamped, since the day selects which historical digest is built.
    #[error("invalid program day {day}: must be between 1 and {max}")]
    InvalidDay { day: u32, max: u32 },

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
