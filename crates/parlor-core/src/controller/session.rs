//! Session controller: the state machine behind one bot's chat view.
//!
//! Owns the in-memory mirror of server state (bot, session list, message
//! list, selection) and drives the request/response cycle. It is generic
//! over the repository and gateway ports, so the whole machine is testable
//! without a UI framework or a database.
//!
//! Sending follows a two-phase local-apply/confirm-or-revert pattern: the
//! user message is appended to the in-memory list before any network write,
//! and if any later step fails the append is reverted and reported via
//! [`SendOutcome::RolledBack`]. Backend writes that already settled are
//! never retried and never undone here.

use std::sync::Arc;

use chrono::Utc;
use parlor_types::bot::{Bot, BotId};
use parlor_types::chat::{ChatMessage, ChatSession};
use parlor_types::error::{BotError, ChatError, CompletionError, ControllerError};
use parlor_types::identity::UserId;
use tracing::{info, warn};
use uuid::Uuid;

use crate::chat::repository::ChatRepository;
use crate::chat::store::ChatStore;
use crate::controller::guard::{KeyedGuard, OpGuard};
use crate::llm::gateway::CompletionGateway;
use crate::repository::bot::BotRepository;
use crate::service::bot::BotService;

/// Lifecycle of the chat view.
///
/// `Failed` is terminal for the current view (the bot does not exist);
/// Idle vs Sending within `Ready` is tracked by the send guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Uninitialized,
    LoadingBotAndSessions,
    CreatingFirstSession,
    LoadingMessages,
    Ready,
    Failed,
}

/// Result of an admitted send: either every step confirmed, or the
/// optimistic local append was reverted. Pre-flight rejections (empty text,
/// busy, no selection) never reach this type.
#[derive(Debug)]
pub enum SendOutcome {
    /// Optimistic apply confirmed end to end; both messages are persisted
    /// and visible.
    Delivered {
        user: ChatMessage,
        assistant: ChatMessage,
    },
    /// A step after the optimistic apply failed; the user message was
    /// removed from the visible list and no assistant message was added.
    RolledBack(SendError),
}

/// Which step of the send flow failed.
#[derive(Debug)]
pub enum SendError {
    /// Persisting the user message failed; nothing reached the backend.
    UserWrite(ChatError),
    /// The gateway call failed; the user message is persisted but the
    /// conversation shows neither it nor a reply. Never retried.
    Completion(CompletionError),
    /// Persisting the assistant reply failed after a successful completion.
    AssistantWrite(ChatError),
}

/// Orchestrates one bot's chat view: loads or creates sessions, selects the
/// active one, appends messages, and drives the completion cycle.
pub struct SessionController<B, C, G>
where
    B: BotRepository,
    C: ChatRepository,
    G: CompletionGateway,
{
    bot_service: Arc<BotService<B, C>>,
    chat_store: Arc<ChatStore<C>>,
    gateway: Arc<G>,
    user_id: UserId,

    state: ViewState,
    bot: Option<Bot>,
    sessions: Vec<ChatSession>,
    selected: Option<Uuid>,
    messages: Vec<ChatMessage>,

    sending: OpGuard,
    creating_session: OpGuard,
    loading_messages: OpGuard,
    deleting_session: KeyedGuard,
}

impl<B, C, G> SessionController<B, C, G>
where
    B: BotRepository,
    C: ChatRepository,
    G: CompletionGateway,
{
    pub fn new(
        bot_service: Arc<BotService<B, C>>,
        chat_store: Arc<ChatStore<C>>,
        gateway: Arc<G>,
        user_id: UserId,
    ) -> Self {
        Self {
            bot_service,
            chat_store,
            gateway,
            user_id,
            state: ViewState::Uninitialized,
            bot: None,
            sessions: Vec::new(),
            selected: None,
            messages: Vec::new(),
            sending: OpGuard::new("send"),
            creating_session: OpGuard::new("create-session"),
            loading_messages: OpGuard::new("load-messages"),
            deleting_session: KeyedGuard::new("delete-session"),
        }
    }

    // --- Accessors for the presentation layer ---

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn bot(&self) -> Option<&Bot> {
        self.bot.as_ref()
    }

    pub fn sessions(&self) -> &[ChatSession] {
        &self.sessions
    }

    pub fn selected_session(&self) -> Option<&ChatSession> {
        let id = self.selected?;
        self.sessions.iter().find(|s| s.id == id)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_sending(&self) -> bool {
        self.sending.is_in_flight()
    }

    // --- Entering the view ---

    /// Load the bot and its sessions, creating the first session when none
    /// exist, and selecting the most recently active one otherwise.
    ///
    /// A missing bot leaves the controller in `Failed`; no further action
    /// is taken on that view.
    pub async fn open(&mut self, bot_id: &BotId) -> Result<(), ControllerError> {
        self.state = ViewState::LoadingBotAndSessions;

        let bot = match self.bot_service.get_bot(bot_id).await {
            Ok(bot) => bot,
            Err(BotError::NotFound) => {
                self.state = ViewState::Failed;
                return Err(ControllerError::BotNotFound);
            }
            Err(e) => {
                self.state = ViewState::Failed;
                return Err(ControllerError::Storage(e.to_string()));
            }
        };
        self.bot = Some(bot);

        self.sessions = self
            .chat_store
            .list_sessions(&self.user_id, bot_id)
            .await
            .map_err(|e| {
                self.state = ViewState::Failed;
                ControllerError::Storage(e.to_string())
            })?;

        if self.sessions.is_empty() {
            self.state = ViewState::CreatingFirstSession;
            self.creating_session.try_begin()?;
            let created = self.chat_store.create_session(&self.user_id, bot_id).await;
            self.creating_session.finish();

            let session = created.map_err(|e| {
                self.state = ViewState::Failed;
                ControllerError::Storage(e.to_string())
            })?;
            self.selected = Some(session.id);
            self.sessions.push(session);
            self.messages.clear();
            self.state = ViewState::Ready;
            Ok(())
        } else {
            // Store order is most-recent-first; ties keep the stable
            // underlying order.
            self.selected = Some(self.sessions[0].id);
            self.load_selected_messages().await
        }
    }

    /// Switch the active session. Clears the message list and reloads it.
    pub async fn select_session(&mut self, session_id: Uuid) -> Result<(), ControllerError> {
        if !self.sessions.iter().any(|s| s.id == session_id) {
            return Err(ControllerError::UnknownSession);
        }
        self.selected = Some(session_id);
        self.load_selected_messages().await
    }

    async fn load_selected_messages(&mut self) -> Result<(), ControllerError> {
        let session_id = self.selected.ok_or(ControllerError::NoSessionSelected)?;

        self.loading_messages.try_begin()?;
        self.state = ViewState::LoadingMessages;
        self.messages.clear();

        let loaded = self.chat_store.list_messages(&session_id).await;
        self.loading_messages.finish();
        self.state = ViewState::Ready;

        match loaded {
            Ok(messages) => {
                self.messages = messages;
                Ok(())
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Failed to load messages");
                Err(ControllerError::Storage(e.to_string()))
            }
        }
    }

    // --- Sending ---

    /// Submit user text to the selected session.
    ///
    /// Pre-flight rejections are `Err`; once admitted, the result reports
    /// whether the optimistic apply was confirmed or reverted.
    pub async fn send(&mut self, text: &str) -> Result<SendOutcome, ControllerError> {
        let content = text.trim().to_string();
        if content.is_empty() {
            return Err(ControllerError::EmptyMessage);
        }
        if self.state != ViewState::Ready {
            return Err(ControllerError::NotReady);
        }
        let session_id = self.selected.ok_or(ControllerError::NoSessionSelected)?;
        let bot = self.bot.clone().ok_or(ControllerError::NotReady)?;

        self.sending.try_begin()?;
        let outcome = self.run_send(session_id, &bot, &content).await;
        self.sending.finish();
        Ok(outcome)
    }

    async fn run_send(&mut self, session_id: Uuid, bot: &Bot, content: &str) -> SendOutcome {
        // Phase 1: optimistic local apply, before any network write.
        let provisional_id = Uuid::now_v7();
        self.messages.push(ChatMessage {
            id: provisional_id,
            session_id,
            sender_id: self.user_id.to_string(),
            content: content.to_string(),
            is_bot: false,
            created_at: Utc::now(),
        });

        // Phase 2: confirm against the backend, reverting on any failure.
        let user_msg = match self
            .chat_store
            .append_user_message(session_id, &self.user_id, content)
            .await
        {
            Ok(msg) => msg,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "User message write failed; reverting");
                self.revert_optimistic(provisional_id);
                return SendOutcome::RolledBack(SendError::UserWrite(e));
            }
        };
        // Swap the provisional entry for the persisted one (storage-assigned
        // id and timestamp).
        if let Some(entry) = self.messages.iter_mut().find(|m| m.id == provisional_id) {
            *entry = user_msg.clone();
        }

        // The gateway call starts only after the user-message write settled.
        let reply = match self.gateway.complete(&bot.system_prompt, content).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Completion failed; reverting");
                self.revert_optimistic(user_msg.id);
                return SendOutcome::RolledBack(SendError::Completion(e));
            }
        };

        let assistant_msg = match self
            .chat_store
            .append_bot_message(session_id, &bot.id, &reply)
            .await
        {
            Ok(msg) => msg,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Assistant write failed; reverting");
                self.revert_optimistic(user_msg.id);
                return SendOutcome::RolledBack(SendError::AssistantWrite(e));
            }
        };

        self.messages.push(assistant_msg.clone());
        self.refresh_session_cache(session_id, &assistant_msg);
        info!(session_id = %session_id, "Message exchange delivered");
        SendOutcome::Delivered {
            user: user_msg,
            assistant: assistant_msg,
        }
    }

    fn revert_optimistic(&mut self, message_id: Uuid) {
        self.messages.retain(|m| m.id != message_id);
    }

    /// Mirror the backend's denormalized last-message cache and keep the
    /// in-memory session list in most-recent-first order.
    fn refresh_session_cache(&mut self, session_id: Uuid, latest: &ChatMessage) {
        if let Some(pos) = self.sessions.iter().position(|s| s.id == session_id) {
            let mut session = self.sessions.remove(pos);
            session.last_message = Some(latest.content.clone());
            session.last_message_at = Some(latest.created_at);
            self.sessions.insert(0, session);
        }
    }

    // --- Session management ---

    /// Create a new session, prepend it, select it, and clear the messages.
    /// Refused while a create is already in flight.
    pub async fn new_chat(&mut self) -> Result<Uuid, ControllerError> {
        let bot_id = self.bot.as_ref().map(|b| b.id).ok_or(ControllerError::NotReady)?;

        self.creating_session.try_begin()?;
        let created = self.chat_store.create_session(&self.user_id, &bot_id).await;
        self.creating_session.finish();

        let session = created.map_err(|e| ControllerError::Storage(e.to_string()))?;
        let id = session.id;
        self.sessions.insert(0, session);
        self.selected = Some(id);
        self.messages.clear();
        self.state = ViewState::Ready;
        Ok(id)
    }

    /// Delete a session.
    ///
    /// Refused when it would remove the last remaining session (controller
    /// guard, independent of any store constraint) or while another delete
    /// is in flight. If the deleted session was selected, selection falls
    /// back to the first remaining one.
    pub async fn delete_chat(&mut self, session_id: Uuid) -> Result<(), ControllerError> {
        if !self.sessions.iter().any(|s| s.id == session_id) {
            return Err(ControllerError::UnknownSession);
        }
        if self.sessions.len() <= 1 {
            return Err(ControllerError::LastSession);
        }

        self.deleting_session.try_begin(session_id)?;
        let deleted = self.chat_store.delete_session(&self.user_id, &session_id).await;
        self.deleting_session.finish();

        deleted.map_err(|e| ControllerError::Storage(e.to_string()))?;
        self.sessions.retain(|s| s.id != session_id);

        if self.selected == Some(session_id) {
            match self.sessions.first().map(|s| s.id) {
                Some(next) => {
                    self.selected = Some(next);
                    self.load_selected_messages().await?;
                }
                None => {
                    // Unreachable given the last-session guard, but state
                    // must stay consistent if it ever happens.
                    self.selected = None;
                    self.messages.clear();
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryBotRepository, InMemoryChatRepository, ScriptedGateway};
    use parlor_types::bot::CreateBotRequest;

    struct Fixture {
        controller: SessionController<InMemoryBotRepository, InMemoryChatRepository, ScriptedGateway>,
        bot: Bot,
        gateway: ScriptedGateway,
        chat_repo: InMemoryChatRepository,
        store: Arc<ChatStore<InMemoryChatRepository>>,
        user: UserId,
    }

    async fn fixture() -> Fixture {
        let bot_repo = InMemoryBotRepository::default();
        let chat_repo = InMemoryChatRepository::default();
        let gateway = ScriptedGateway::default();
        let user = UserId::new("alice");

        let bot_service = Arc::new(BotService::new(bot_repo, chat_repo.clone()));
        let store = Arc::new(ChatStore::new(chat_repo.clone()));
        let bot = bot_service
            .create_bot(
                &user,
                CreateBotRequest {
                    name: "Helper".to_string(),
                    system_prompt: "You are terse.".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap();

        let controller = SessionController::new(
            bot_service,
            store.clone(),
            Arc::new(gateway.clone()),
            user.clone(),
        );

        Fixture {
            controller,
            bot,
            gateway,
            chat_repo,
            store,
            user,
        }
    }

    #[tokio::test]
    async fn open_creates_first_session_when_none_exist() {
        let mut fx = fixture().await;

        fx.controller.open(&fx.bot.id).await.unwrap();

        assert_eq!(fx.controller.state(), ViewState::Ready);
        assert_eq!(fx.controller.sessions().len(), 1);
        assert!(fx.controller.selected_session().is_some());
        assert!(fx.controller.messages().is_empty());
    }

    #[tokio::test]
    async fn open_selects_most_recently_active_session() {
        let fx = fixture().await;
        let mut controller = fx.controller;

        let quiet = fx.store.create_session(&fx.user, &fx.bot.id).await.unwrap();
        let busy = fx.store.create_session(&fx.user, &fx.bot.id).await.unwrap();
        fx.store
            .append_user_message(quiet.id, &fx.user, "bump")
            .await
            .unwrap();

        controller.open(&fx.bot.id).await.unwrap();

        assert_eq!(controller.sessions().len(), 2);
        assert_eq!(controller.selected_session().unwrap().id, quiet.id);
        assert_ne!(controller.selected_session().unwrap().id, busy.id);
        // Selecting triggered the message load.
        assert_eq!(controller.messages().len(), 1);
    }

    #[tokio::test]
    async fn open_missing_bot_fails_and_stays_failed() {
        let mut fx = fixture().await;

        let err = fx.controller.open(&BotId::new()).await.unwrap_err();
        assert!(matches!(err, ControllerError::BotNotFound));
        assert_eq!(fx.controller.state(), ViewState::Failed);
        assert!(fx.controller.sessions().is_empty());
    }

    #[tokio::test]
    async fn send_happy_path_appends_both_messages() {
        let mut fx = fixture().await;
        fx.controller.open(&fx.bot.id).await.unwrap();
        fx.gateway.push_reply("Hello.");

        let outcome = fx.controller.send("hi").await.unwrap();

        let SendOutcome::Delivered { user, assistant } = outcome else {
            panic!("expected Delivered");
        };
        assert_eq!(user.content, "hi");
        assert!(!user.is_bot);
        assert_eq!(assistant.content, "Hello.");
        assert!(assistant.is_bot);

        let contents: Vec<&str> = fx
            .controller
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["hi", "Hello."]);

        // The in-memory session cache mirrors the backend.
        let selected = fx.controller.selected_session().unwrap();
        assert_eq!(selected.last_message.as_deref(), Some("Hello."));
        let persisted = fx.store.get_session(&selected.id).await.unwrap().unwrap();
        assert_eq!(persisted.last_message.as_deref(), Some("Hello."));
        assert!(!fx.controller.is_sending());
    }

    #[tokio::test]
    async fn send_empty_text_is_rejected_preflight() {
        let mut fx = fixture().await;
        fx.controller.open(&fx.bot.id).await.unwrap();

        let err = fx.controller.send("   ").await.unwrap_err();
        assert!(matches!(err, ControllerError::EmptyMessage));
        assert!(fx.controller.messages().is_empty());
    }

    #[tokio::test]
    async fn gateway_failure_retracts_optimistic_message() {
        let mut fx = fixture().await;
        fx.controller.open(&fx.bot.id).await.unwrap();
        fx.gateway
            .push_failure(CompletionError::Network("connection reset".to_string()));

        let session_id = fx.controller.selected_session().unwrap().id;
        let outcome = fx.controller.send("hi").await.unwrap();

        assert!(matches!(
            outcome,
            SendOutcome::RolledBack(SendError::Completion(_))
        ));
        // Visible list shows neither the user message nor any assistant reply.
        assert!(fx.controller.messages().is_empty());
        // The settled backend write stays: persisted but never retried.
        assert_eq!(fx.chat_repo.message_count(&session_id), 1);
        // The guard was released; a later send succeeds.
        fx.gateway.push_reply("Hello.");
        let outcome = fx.controller.send("hi again").await.unwrap();
        assert!(matches!(outcome, SendOutcome::Delivered { .. }));
    }

    #[tokio::test]
    async fn user_write_failure_rolls_back_before_gateway() {
        let mut fx = fixture().await;
        fx.controller.open(&fx.bot.id).await.unwrap();
        let session_id = fx.controller.selected_session().unwrap().id;

        fx.chat_repo.fail_next_append();
        let outcome = fx.controller.send("hi").await.unwrap();

        assert!(matches!(
            outcome,
            SendOutcome::RolledBack(SendError::UserWrite(_))
        ));
        assert!(fx.controller.messages().is_empty());
        assert_eq!(fx.chat_repo.message_count(&session_id), 0);
    }

    #[tokio::test]
    async fn new_chat_prepends_selects_and_clears() {
        let mut fx = fixture().await;
        fx.controller.open(&fx.bot.id).await.unwrap();
        fx.gateway.push_reply("Hello.");
        fx.controller.send("hi").await.unwrap();
        let first = fx.controller.selected_session().unwrap().id;

        let new_id = fx.controller.new_chat().await.unwrap();

        assert_eq!(fx.controller.sessions().len(), 2);
        assert_eq!(fx.controller.sessions()[0].id, new_id);
        assert_eq!(fx.controller.selected_session().unwrap().id, new_id);
        assert!(fx.controller.messages().is_empty());
        assert_ne!(new_id, first);
    }

    #[tokio::test]
    async fn deleting_the_last_session_is_refused() {
        let mut fx = fixture().await;
        fx.controller.open(&fx.bot.id).await.unwrap();
        let only = fx.controller.selected_session().unwrap().id;

        let err = fx.controller.delete_chat(only).await.unwrap_err();
        assert!(matches!(err, ControllerError::LastSession));
        // The operation was never attempted against the store.
        assert!(fx.store.get_session(&only).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn deleting_selected_session_falls_back_to_first_remaining() {
        let mut fx = fixture().await;
        fx.controller.open(&fx.bot.id).await.unwrap();
        let first = fx.controller.selected_session().unwrap().id;
        let second = fx.controller.new_chat().await.unwrap();

        fx.controller.delete_chat(second).await.unwrap();

        assert_eq!(fx.controller.sessions().len(), 1);
        assert_eq!(fx.controller.selected_session().unwrap().id, first);
        assert!(fx.store.get_session(&second).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_unknown_session_is_rejected() {
        let mut fx = fixture().await;
        fx.controller.open(&fx.bot.id).await.unwrap();
        fx.controller.new_chat().await.unwrap();

        let err = fx.controller.delete_chat(Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, ControllerError::UnknownSession));
    }

    #[tokio::test]
    async fn cascade_delete_leaves_nothing_queryable() {
        let mut fx = fixture().await;
        fx.controller.open(&fx.bot.id).await.unwrap();
        let session_id = fx.controller.selected_session().unwrap().id;
        for i in 0..4 {
            fx.gateway.push_reply("ok");
            fx.controller.send(&format!("msg {i}")).await.unwrap();
        }
        fx.controller.new_chat().await.unwrap();

        fx.controller.delete_chat(session_id).await.unwrap();

        assert!(fx.store.get_session(&session_id).await.unwrap().is_none());
        assert!(fx.store.list_messages(&session_id).await.unwrap().is_empty());
        assert_eq!(fx.chat_repo.message_count(&session_id), 0);
    }
}
