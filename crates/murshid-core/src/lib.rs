//! # murshid-core
//!
//! Core types, traits, configuration, and error handling for the Murshid
//! coaching companion.

pub mod config;
pub mod context;
pub mod error;
pub mod journal;
pub mod profile;
pub mod progress;
pub mod traits;

pub use config::shellexpand;
