//! HTTP request handlers for the REST API.

pub mod bot;
pub mod message;
pub mod session;
pub mod share;
