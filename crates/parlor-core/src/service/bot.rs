//! Bot registry service.
//!
//! Orchestrates bot creation, update, deletion (with cascade to chat
//! sessions), and sharing. Sharing is duplication: the recipient gets a
//! brand-new bot record tagged with a backreference to the original, never
//! a reference to the same record.

use chrono::Utc;
use parlor_types::bot::{Bot, BotId, CreateBotRequest, SharePreview, UpdateBotRequest};
use parlor_types::error::{BotError, RepositoryError};
use parlor_types::identity::UserId;
use tracing::info;

use crate::chat::repository::ChatRepository;
use crate::repository::bot::BotRepository;

/// Service orchestrating the bot lifecycle.
///
/// Holds a `ChatRepository` alongside the `BotRepository` so bot deletion
/// can cascade to the bot's sessions and messages.
pub struct BotService<B: BotRepository, C: ChatRepository> {
    bot_repo: B,
    chat_repo: C,
}

impl<B: BotRepository, C: ChatRepository> BotService<B, C> {
    pub fn new(bot_repo: B, chat_repo: C) -> Self {
        Self {
            bot_repo,
            chat_repo,
        }
    }

    /// Create a new bot owned by `owner`.
    ///
    /// Name and system prompt must be non-empty after trimming.
    pub async fn create_bot(
        &self,
        owner: &UserId,
        request: CreateBotRequest,
    ) -> Result<Bot, BotError> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(BotError::Validation("name cannot be empty".to_string()));
        }
        let system_prompt = request.system_prompt.trim().to_string();
        if system_prompt.is_empty() {
            return Err(BotError::Validation(
                "system prompt cannot be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let bot = Bot {
            id: BotId::new(),
            owner_id: owner.clone(),
            name,
            system_prompt,
            description: request.description,
            shared_from: None,
            created_at: now,
            updated_at: now,
        };

        let bot = self.bot_repo.create(&bot).await.map_err(storage_err)?;
        info!(bot_id = %bot.id, owner = %owner, "Bot created");
        Ok(bot)
    }

    /// Get a bot by ID.
    pub async fn get_bot(&self, id: &BotId) -> Result<Bot, BotError> {
        self.bot_repo
            .get_by_id(id)
            .await
            .map_err(storage_err)?
            .ok_or(BotError::NotFound)
    }

    /// List all bots owned by a user, newest first.
    pub async fn list_bots(&self, owner: &UserId) -> Result<Vec<Bot>, BotError> {
        self.bot_repo.list_by_owner(owner).await.map_err(storage_err)
    }

    /// Apply a partial update to a bot the caller owns.
    pub async fn update_bot(
        &self,
        caller: &UserId,
        id: &BotId,
        request: UpdateBotRequest,
    ) -> Result<Bot, BotError> {
        let mut bot = self.get_bot(id).await?;
        if &bot.owner_id != caller {
            return Err(BotError::PermissionDenied);
        }

        if let Some(name) = request.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(BotError::Validation("name cannot be empty".to_string()));
            }
            bot.name = name;
        }
        if let Some(prompt) = request.system_prompt {
            let prompt = prompt.trim().to_string();
            if prompt.is_empty() {
                return Err(BotError::Validation(
                    "system prompt cannot be empty".to_string(),
                ));
            }
            bot.system_prompt = prompt;
        }
        if let Some(description) = request.description {
            bot.description = Some(description);
        }
        bot.updated_at = Utc::now();

        self.bot_repo.update(&bot).await.map_err(storage_err)
    }

    /// Delete a bot the caller owns, cascading to every chat session (and
    /// its messages) attached to it, then the bot record itself.
    pub async fn delete_bot(&self, caller: &UserId, id: &BotId) -> Result<(), BotError> {
        let bot = self.get_bot(id).await?;
        if &bot.owner_id != caller {
            return Err(BotError::PermissionDenied);
        }

        let removed = self
            .chat_repo
            .delete_sessions_for_bot(id)
            .await
            .map_err(|e| BotError::Storage(e.to_string()))?;
        self.bot_repo.delete(id).await.map_err(storage_err)?;
        info!(bot_id = %id, sessions_removed = removed, "Bot deleted");
        Ok(())
    }

    /// Duplicate a bot for `recipient`.
    ///
    /// Reads the source's current name/prompt/description and creates a
    /// brand-new bot owned by the recipient with `shared_from` pointing at
    /// the source. The source record is never touched, and edits to it do
    /// not propagate to the copy.
    pub async fn share_bot(&self, source_id: &BotId, recipient: &UserId) -> Result<Bot, BotError> {
        let source = self.get_bot(source_id).await?;

        let now = Utc::now();
        let copy = Bot {
            id: BotId::new(),
            owner_id: recipient.clone(),
            name: source.name.clone(),
            system_prompt: source.system_prompt.clone(),
            description: source.description.clone(),
            shared_from: Some(source.id),
            created_at: now,
            updated_at: now,
        };

        let copy = self.bot_repo.create(&copy).await.map_err(storage_err)?;
        info!(source = %source_id, copy = %copy.id, recipient = %recipient, "Bot shared");
        Ok(copy)
    }

    /// Build the pre-fill payload behind a `/share/{botId}` link.
    pub async fn share_preview(&self, source_id: &BotId) -> Result<SharePreview, BotError> {
        let source = self.get_bot(source_id).await?;
        Ok(SharePreview {
            bot_id: source.id,
            name: source.name,
            system_prompt: source.system_prompt,
            description: source.description,
        })
    }
}

fn storage_err(err: RepositoryError) -> BotError {
    match err {
        RepositoryError::NotFound => BotError::NotFound,
        other => BotError::Storage(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::store::ChatStore;
    use crate::testing::{InMemoryBotRepository, InMemoryChatRepository};

    fn service() -> (BotService<InMemoryBotRepository, InMemoryChatRepository>, InMemoryChatRepository)
    {
        let chat_repo = InMemoryChatRepository::default();
        (
            BotService::new(InMemoryBotRepository::default(), chat_repo.clone()),
            chat_repo,
        )
    }

    fn request(name: &str, prompt: &str) -> CreateBotRequest {
        CreateBotRequest {
            name: name.to_string(),
            system_prompt: prompt.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn created_bot_listed_exactly_once() {
        let (service, _) = service();
        let owner = UserId::new("alice");

        let bot = service
            .create_bot(&owner, request("Helper", "You are terse."))
            .await
            .unwrap();

        let bots = service.list_bots(&owner).await.unwrap();
        assert_eq!(bots.iter().filter(|b| b.id == bot.id).count(), 1);
    }

    #[tokio::test]
    async fn create_rejects_blank_fields() {
        let (service, _) = service();
        let owner = UserId::new("alice");

        let err = service
            .create_bot(&owner, request("  ", "prompt"))
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::Validation(_)));

        let err = service
            .create_bot(&owner, request("Helper", "  "))
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::Validation(_)));
    }

    #[tokio::test]
    async fn update_requires_ownership() {
        let (service, _) = service();
        let owner = UserId::new("alice");
        let bot = service
            .create_bot(&owner, request("Helper", "You are terse."))
            .await
            .unwrap();

        let err = service
            .update_bot(
                &UserId::new("mallory"),
                &bot.id,
                UpdateBotRequest {
                    name: Some("Hijacked".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, BotError::PermissionDenied));

        let unchanged = service.get_bot(&bot.id).await.unwrap();
        assert_eq!(unchanged.name, "Helper");
    }

    #[tokio::test]
    async fn delete_cascades_to_sessions_and_messages() {
        let (service, chat_repo) = service();
        let store = ChatStore::new(chat_repo.clone());
        let owner = UserId::new("alice");
        let bot = service
            .create_bot(&owner, request("Helper", "You are terse."))
            .await
            .unwrap();

        let session = store.create_session(&owner, &bot.id).await.unwrap();
        for i in 0..3 {
            store
                .append_user_message(session.id, &owner, &format!("msg {i}"))
                .await
                .unwrap();
        }

        service.delete_bot(&owner, &bot.id).await.unwrap();

        assert!(matches!(
            service.get_bot(&bot.id).await.unwrap_err(),
            BotError::NotFound
        ));
        assert!(store.get_session(&session.id).await.unwrap().is_none());
        assert!(store.list_messages(&session.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn share_duplicates_without_touching_original() {
        let (service, _) = service();
        let owner = UserId::new("alice");
        let recipient = UserId::new("bob");
        let original = service
            .create_bot(&owner, request("Helper", "You are terse."))
            .await
            .unwrap();

        let copy = service.share_bot(&original.id, &recipient).await.unwrap();

        assert_ne!(copy.id, original.id);
        assert_eq!(copy.owner_id, recipient);
        assert_eq!(copy.shared_from, Some(original.id));
        assert_eq!(copy.name, original.name);
        assert_eq!(copy.system_prompt, original.system_prompt);

        // Original record is untouched.
        let after = service.get_bot(&original.id).await.unwrap();
        assert_eq!(after.owner_id, owner);
        assert_eq!(after.updated_at, original.updated_at);
        assert!(after.shared_from.is_none());

        // Edits to the original do not propagate to the copy.
        service
            .update_bot(
                &owner,
                &original.id,
                UpdateBotRequest {
                    system_prompt: Some("You are verbose.".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let copy_after = service.get_bot(&copy.id).await.unwrap();
        assert_eq!(copy_after.system_prompt, "You are terse.");
    }

    #[tokio::test]
    async fn share_preview_exposes_prefill_fields() {
        let (service, _) = service();
        let owner = UserId::new("alice");
        let bot = service
            .create_bot(&owner, request("Helper", "You are terse."))
            .await
            .unwrap();

        let preview = service.share_preview(&bot.id).await.unwrap();
        assert_eq!(preview.bot_id, bot.id);
        assert_eq!(preview.name, "Helper");
        assert_eq!(preview.system_prompt, "You are terse.");
    }
}
