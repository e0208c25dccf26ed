//! Chat store orchestrating session lifecycle and message persistence.
//!
//! `ChatStore` is the thin service layer above `ChatRepository`: it shapes
//! domain values (ids, placeholder timestamps), validates input, and applies
//! the ownership check on deletion.

use chrono::Utc;
use parlor_types::bot::BotId;
use parlor_types::chat::{ChatMessage, ChatSession, NewMessage};
use parlor_types::error::{ChatError, RepositoryError};
use parlor_types::identity::UserId;
use tracing::info;
use uuid::Uuid;

use crate::chat::repository::ChatRepository;

/// Session and message operations for one chat backend.
///
/// Generic over `ChatRepository` to maintain clean architecture --
/// parlor-core never depends on parlor-infra.
pub struct ChatStore<C: ChatRepository> {
    repo: C,
}

impl<C: ChatRepository> ChatStore<C> {
    pub fn new(repo: C) -> Self {
        Self { repo }
    }

    /// Create a new session for (owner, bot).
    ///
    /// `last_message_at` is set to the creation instant as a placeholder so
    /// a fresh session sorts ahead of long-idle ones.
    pub async fn create_session(
        &self,
        owner: &UserId,
        bot_id: &BotId,
    ) -> Result<ChatSession, ChatError> {
        let now = Utc::now();
        let session = ChatSession {
            id: Uuid::now_v7(),
            owner_id: owner.clone(),
            bot_id: *bot_id,
            last_message: None,
            last_message_at: Some(now),
            created_at: now,
        };

        let session = self
            .repo
            .create_session(&session)
            .await
            .map_err(storage_err)?;
        info!(session_id = %session.id, bot_id = %bot_id, "Chat session created");
        Ok(session)
    }

    /// Get a session by ID.
    pub async fn get_session(&self, session_id: &Uuid) -> Result<Option<ChatSession>, ChatError> {
        self.repo.get_session(session_id).await.map_err(storage_err)
    }

    /// List sessions for (owner, bot), most recently active first.
    pub async fn list_sessions(
        &self,
        owner: &UserId,
        bot_id: &BotId,
    ) -> Result<Vec<ChatSession>, ChatError> {
        self.repo
            .list_sessions(owner, bot_id)
            .await
            .map_err(storage_err)
    }

    /// Append a user-authored message to a session.
    pub async fn append_user_message(
        &self,
        session_id: Uuid,
        sender: &UserId,
        content: &str,
    ) -> Result<ChatMessage, ChatError> {
        self.append(
            session_id,
            NewMessage {
                content: content.to_string(),
                sender_id: sender.to_string(),
                is_bot: false,
            },
        )
        .await
    }

    /// Append a bot-attributed message to a session.
    pub async fn append_bot_message(
        &self,
        session_id: Uuid,
        bot_id: &BotId,
        content: &str,
    ) -> Result<ChatMessage, ChatError> {
        self.append(
            session_id,
            NewMessage {
                content: content.to_string(),
                sender_id: bot_id.to_string(),
                is_bot: true,
            },
        )
        .await
    }

    async fn append(
        &self,
        session_id: Uuid,
        message: NewMessage,
    ) -> Result<ChatMessage, ChatError> {
        if message.content.trim().is_empty() {
            return Err(ChatError::Validation(
                "message content cannot be empty".to_string(),
            ));
        }

        self.repo
            .append_message(&session_id, &message)
            .await
            .map_err(storage_err)
    }

    /// List a session's messages, ascending by creation time.
    pub async fn list_messages(&self, session_id: &Uuid) -> Result<Vec<ChatMessage>, ChatError> {
        self.repo
            .list_messages(session_id)
            .await
            .map_err(storage_err)
    }

    /// Delete a session and all its messages (all-or-nothing).
    ///
    /// The caller must own the session.
    pub async fn delete_session(&self, caller: &UserId, session_id: &Uuid) -> Result<(), ChatError> {
        let session = self
            .repo
            .get_session(session_id)
            .await
            .map_err(storage_err)?
            .ok_or(ChatError::SessionNotFound)?;

        if &session.owner_id != caller {
            return Err(ChatError::PermissionDenied);
        }

        self.repo
            .delete_session(session_id)
            .await
            .map_err(storage_err)?;
        info!(session_id = %session_id, "Chat session deleted");
        Ok(())
    }
}

fn storage_err(err: RepositoryError) -> ChatError {
    match err {
        RepositoryError::NotFound => ChatError::SessionNotFound,
        other => ChatError::Storage(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::InMemoryChatRepository;

    fn store() -> ChatStore<InMemoryChatRepository> {
        ChatStore::new(InMemoryChatRepository::default())
    }

    #[tokio::test]
    async fn create_session_sets_placeholder_timestamp() {
        let store = store();
        let owner = UserId::new("alice");
        let bot = BotId::new();

        let session = store.create_session(&owner, &bot).await.unwrap();
        assert!(session.last_message.is_none());
        assert_eq!(session.last_message_at, Some(session.created_at));
    }

    #[tokio::test]
    async fn append_updates_last_message_cache() {
        let store = store();
        let owner = UserId::new("alice");
        let bot = BotId::new();
        let session = store.create_session(&owner, &bot).await.unwrap();

        store
            .append_user_message(session.id, &owner, "hi")
            .await
            .unwrap();
        let reply = store
            .append_bot_message(session.id, &bot, "Hello.")
            .await
            .unwrap();

        let refreshed = store.get_session(&session.id).await.unwrap().unwrap();
        assert_eq!(refreshed.last_message.as_deref(), Some("Hello."));
        assert_eq!(refreshed.last_message_at, Some(reply.created_at));

        let messages = store.list_messages(&session.id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(
            refreshed.last_message.as_deref(),
            Some(messages.last().unwrap().content.as_str())
        );
    }

    #[tokio::test]
    async fn messages_come_back_in_ascending_order() {
        let store = store();
        let owner = UserId::new("alice");
        let bot = BotId::new();
        let session = store.create_session(&owner, &bot).await.unwrap();

        for text in ["one", "two", "three"] {
            store
                .append_user_message(session.id, &owner, text)
                .await
                .unwrap();
        }

        let messages = store.list_messages(&session.id).await.unwrap();
        let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
        assert!(messages.windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }

    #[tokio::test]
    async fn empty_content_is_rejected() {
        let store = store();
        let owner = UserId::new("alice");
        let bot = BotId::new();
        let session = store.create_session(&owner, &bot).await.unwrap();

        let err = store
            .append_user_message(session.id, &owner, "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_session_removes_messages_and_record() {
        let store = store();
        let owner = UserId::new("alice");
        let bot = BotId::new();
        let session = store.create_session(&owner, &bot).await.unwrap();
        for i in 0..5 {
            store
                .append_user_message(session.id, &owner, &format!("msg {i}"))
                .await
                .unwrap();
        }

        store.delete_session(&owner, &session.id).await.unwrap();

        assert!(store.get_session(&session.id).await.unwrap().is_none());
        assert!(store.list_messages(&session.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_session_requires_ownership() {
        let store = store();
        let owner = UserId::new("alice");
        let stranger = UserId::new("mallory");
        let bot = BotId::new();
        let session = store.create_session(&owner, &bot).await.unwrap();

        let err = store
            .delete_session(&stranger, &session.id)
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::PermissionDenied));
        assert!(store.get_session(&session.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn sessions_sort_most_recent_first() {
        let store = store();
        let owner = UserId::new("alice");
        let bot = BotId::new();

        let older = store.create_session(&owner, &bot).await.unwrap();
        let newer = store.create_session(&owner, &bot).await.unwrap();
        // Activity on the older session makes it the most recent.
        store
            .append_user_message(older.id, &owner, "bump")
            .await
            .unwrap();

        let sessions = store.list_sessions(&owner, &bot).await.unwrap();
        assert_eq!(sessions[0].id, older.id);
        assert_eq!(sessions[1].id, newer.id);
    }
}
