//! Repository trait definitions (ports implemented by parlor-infra).

pub mod bot;
