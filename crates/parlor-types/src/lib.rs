//! Shared domain types for Parlor.
//!
//! This crate contains the core domain types used across the Parlor platform:
//! Bot, ChatSession, ChatMessage, identity, config, and the error taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod bot;
pub mod chat;
pub mod config;
pub mod error;
pub mod identity;
