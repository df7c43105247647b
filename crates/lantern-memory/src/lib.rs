//! # lantern-memory
//!
//! Persistence for Lantern (SQLite-backed): runtime settings, the inbound
//! message log, broadcast schedules, and the rolling conversation window.

pub mod store;

pub use store::{LoggedMessage, Schedule, Store};
