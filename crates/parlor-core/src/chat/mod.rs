//! Chat session and message persistence: the `ChatRepository` port and the
//! `ChatStore` service built on it.

pub mod repository;
pub mod store;
