//! # lantern-channels
//!
//! Messaging platform integrations for Lantern.

pub mod telegram;
pub(crate) mod utils;
