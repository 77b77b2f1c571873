//! # machma-core
//!
//! Core types, traits, configuration, and error handling for the machma bot.

pub mod config;
pub mod error;
pub mod message;
pub mod traits;
