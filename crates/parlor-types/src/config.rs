//! Global configuration shape for Parlor.
//!
//! Deserialized from `{data_dir}/config.toml` by the infra loader. Every
//! field has a default so a missing or partial file still yields a usable
//! configuration.

use serde::{Deserialize, Serialize};

/// Top-level configuration: identity for the local CLI plus completion
/// endpoint settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
}

/// Identity used by the CLI (single-user local install).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// User id attributed to CLI-created bots, sessions, and messages.
    #[serde(default = "default_user")]
    pub user: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            user: default_user(),
        }
    }
}

fn default_user() -> String {
    "local".to_string()
}

/// Settings for the OpenAI-compatible completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Base URL of the chat-completions API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,
    /// Maximum completion tokens per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Environment variable read for the bearer token.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            api_key_env: default_api_key_env(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_api_key_env() -> String {
    "PARLOR_API_KEY".to_string()
}
