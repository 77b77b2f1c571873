//! # machma-channels
//!
//! Messaging platform integrations for machma.

pub mod telegram;
mod utils;
