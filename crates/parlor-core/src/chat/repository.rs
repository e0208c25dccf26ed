//! ChatRepository trait definition.
//!
//! CRUD over chat sessions and their ordered message sequences. Follows the
//! same RPITIT pattern as `BotRepository`.

use parlor_types::bot::BotId;
use parlor_types::chat::{ChatMessage, ChatSession, NewMessage};
use parlor_types::error::RepositoryError;
use parlor_types::identity::UserId;
use uuid::Uuid;

/// Repository trait for chat session and message persistence.
///
/// Implementations live in parlor-infra (e.g., `SqliteChatRepository`).
pub trait ChatRepository: Send + Sync {
    /// Create a new chat session.
    fn create_session(
        &self,
        session: &ChatSession,
    ) -> impl std::future::Future<Output = Result<ChatSession, RepositoryError>> + Send;

    /// Get a chat session by its unique ID.
    fn get_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<ChatSession>, RepositoryError>> + Send;

    /// List sessions for (owner, bot), sorted descending by
    /// `last_message_at`; sessions without a timestamp sort as epoch 0.
    fn list_sessions(
        &self,
        owner: &UserId,
        bot_id: &BotId,
    ) -> impl std::future::Future<Output = Result<Vec<ChatSession>, RepositoryError>> + Send;

    /// Append a message to a session.
    ///
    /// Assigns the message id and timestamp on the storage side and updates
    /// the parent session's `last_message`/`last_message_at` atomically with
    /// the insert. Returns the persisted message.
    fn append_message(
        &self,
        session_id: &Uuid,
        message: &NewMessage,
    ) -> impl std::future::Future<Output = Result<ChatMessage, RepositoryError>> + Send;

    /// Get all messages for a session, ordered ascending by creation time.
    fn list_messages(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;

    /// Delete a session and every message in it, all-or-nothing.
    fn delete_session(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete every session (and its messages) belonging to a bot.
    /// Returns the number of sessions removed. Used by bot deletion.
    fn delete_sessions_for_bot(
        &self,
        bot_id: &BotId,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
