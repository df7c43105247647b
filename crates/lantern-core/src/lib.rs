//! # lantern-core
//!
//! Core types, traits, configuration, and error handling for the Lantern bot.

pub mod config;
pub mod error;
pub mod message;
pub mod settings;
pub mod traits;
