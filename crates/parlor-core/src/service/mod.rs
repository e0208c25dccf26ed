//! Domain services built on the repository ports.

pub mod bot;
