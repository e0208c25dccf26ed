//! The session controller and its cooperative operation guards.

pub mod guard;
pub mod session;

pub use guard::{GuardState, KeyedGuard, OpGuard};
pub use session::{SendError, SendOutcome, SessionController, ViewState};
