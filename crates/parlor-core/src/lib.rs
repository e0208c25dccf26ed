//! Business logic and repository trait definitions for Parlor.
//!
//! This crate defines the "ports" (repository and gateway traits) that the
//! infrastructure layer implements, plus the services and the session
//! controller built on top of them. It depends only on `parlor-types` --
//! never on `parlor-infra` or any database/IO crate.

pub mod chat;
pub mod controller;
pub mod identity;
pub mod llm;
pub mod repository;
pub mod service;

#[cfg(test)]
pub(crate) mod testing;
