//! # murshid-store
//!
//! SQLite-backed storage for Murshid: the append-only journal, whole-record
//! progress persistence, and latched profile fields.

pub mod store;

pub use store::Store;
