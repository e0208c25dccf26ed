//! Identity provider for the local single-user install.
//!
//! The CLI has no sign-in flow: the user id comes from `config.toml`
//! (`[identity] user = "..."`, default `"local"`). The HTTP layer resolves
//! identity per request from API keys instead and never uses this.

use parlor_core::identity::IdentityProvider;
use parlor_types::config::IdentityConfig;
use parlor_types::identity::UserId;

/// Fixed identity read from configuration at startup.
#[derive(Debug, Clone)]
pub struct LocalIdentity {
    user: UserId,
}

impl LocalIdentity {
    pub fn from_config(config: &IdentityConfig) -> Self {
        Self {
            user: UserId::new(config.user.clone()),
        }
    }
}

impl IdentityProvider for LocalIdentity {
    fn current_user(&self) -> Option<UserId> {
        Some(self.user.clone())
    }
}
