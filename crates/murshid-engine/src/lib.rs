//! # murshid-engine
//!
//! The stateful heart of Murshid: turning free-text messages into
//! gamification events and folding multi-day history into a bounded
//! prompt context.

pub mod detector;
pub mod ledger;
pub mod orchestrator;
pub mod summarizer;

pub use detector::ActionDetector;
pub use ledger::{newly_earned_badges, MessageOutcome, ProgressLedger};
pub use orchestrator::{SessionEngine, TurnOutcome};
pub use summarizer::ContextSummarizer;
