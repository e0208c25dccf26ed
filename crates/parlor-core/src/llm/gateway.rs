//! CompletionGateway trait definition.
//!
//! The single boundary to the external text-generation service. One request
//! per call, two-message context (system prompt + user utterance), no prior
//! conversation history, no retries, no streaming.

use parlor_types::error::CompletionError;

/// Trait for completion backends (OpenAI-compatible endpoints, fakes).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in parlor-infra (e.g., `OpenAiGateway`).
pub trait CompletionGateway: Send + Sync {
    /// Human-readable gateway name (e.g., "openai").
    fn name(&self) -> &str;

    /// Request one reply for the given system prompt and user utterance.
    ///
    /// Resolves when the reply (or failure) arrives; all failure modes
    /// surface as [`CompletionError`] and are never retried here.
    fn complete(
        &self,
        system_prompt: &str,
        user_text: &str,
    ) -> impl std::future::Future<Output = Result<String, CompletionError>> + Send;
}
