//! Identity provider port.
//!
//! The identity collaborator owns sign-in/sign-out and credentials; the
//! core only ever reads the current user id through this trait.

use parlor_types::identity::UserId;

/// Supplies the currently signed-in user, if any.
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<UserId>;
}
