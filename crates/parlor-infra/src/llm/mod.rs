//! Completion gateway implementations.

pub mod openai;
