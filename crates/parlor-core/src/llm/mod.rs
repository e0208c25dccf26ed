//! Completion gateway port.

pub mod gateway;
