//! Bot repository trait definition.

use parlor_types::bot::{Bot, BotId};
use parlor_types::error::RepositoryError;
use parlor_types::identity::UserId;

/// Repository trait for bot persistence.
///
/// Implementations live in parlor-infra (e.g., `SqliteBotRepository`).
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait BotRepository: Send + Sync {
    /// Create a new bot. Returns the created bot.
    fn create(
        &self,
        bot: &Bot,
    ) -> impl std::future::Future<Output = Result<Bot, RepositoryError>> + Send;

    /// Get a bot by its unique ID.
    fn get_by_id(
        &self,
        id: &BotId,
    ) -> impl std::future::Future<Output = Result<Option<Bot>, RepositoryError>> + Send;

    /// List all bots owned by a user, newest first.
    fn list_by_owner(
        &self,
        owner: &UserId,
    ) -> impl std::future::Future<Output = Result<Vec<Bot>, RepositoryError>> + Send;

    /// Update an existing bot. Returns the updated bot.
    fn update(
        &self,
        bot: &Bot,
    ) -> impl std::future::Future<Output = Result<Bot, RepositoryError>> + Send;

    /// Permanently delete a bot record by ID.
    ///
    /// Cascade to the bot's chat sessions is the service's responsibility.
    fn delete(
        &self,
        id: &BotId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
