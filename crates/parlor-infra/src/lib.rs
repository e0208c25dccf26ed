//! Infrastructure layer for Parlor.
//!
//! Contains implementations of the ports defined in `parlor-core`: SQLite
//! repositories with split read/write pools, the OpenAI-compatible
//! completion gateway, the config loader, and the local identity provider.

pub mod config;
pub mod identity;
pub mod llm;
pub mod sqlite;
