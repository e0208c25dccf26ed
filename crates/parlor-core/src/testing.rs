//! In-memory fakes for the repository and gateway ports, shared by the unit
//! tests across this crate. Cloning a fake shares its backing state so two
//! services can observe the same data, mirroring how the SQLite pool works.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use parlor_types::bot::{Bot, BotId};
use parlor_types::chat::{ChatMessage, ChatSession, NewMessage};
use parlor_types::error::{CompletionError, RepositoryError};
use parlor_types::identity::UserId;
use uuid::Uuid;

use crate::chat::repository::ChatRepository;
use crate::llm::gateway::CompletionGateway;
use crate::repository::bot::BotRepository;

#[derive(Clone, Default)]
pub(crate) struct InMemoryBotRepository {
    bots: Arc<Mutex<HashMap<BotId, Bot>>>,
}

impl BotRepository for InMemoryBotRepository {
    async fn create(&self, bot: &Bot) -> Result<Bot, RepositoryError> {
        let mut bots = self.bots.lock().unwrap();
        if bots.contains_key(&bot.id) {
            return Err(RepositoryError::Conflict(format!(
                "bot '{}' already exists",
                bot.id
            )));
        }
        bots.insert(bot.id, bot.clone());
        Ok(bot.clone())
    }

    async fn get_by_id(&self, id: &BotId) -> Result<Option<Bot>, RepositoryError> {
        Ok(self.bots.lock().unwrap().get(id).cloned())
    }

    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Bot>, RepositoryError> {
        let bots = self.bots.lock().unwrap();
        let mut owned: Vec<Bot> = bots
            .values()
            .filter(|b| &b.owner_id == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.0.cmp(&a.id.0)));
        Ok(owned)
    }

    async fn update(&self, bot: &Bot) -> Result<Bot, RepositoryError> {
        let mut bots = self.bots.lock().unwrap();
        match bots.get_mut(&bot.id) {
            Some(entry) => {
                *entry = bot.clone();
                Ok(bot.clone())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn delete(&self, id: &BotId) -> Result<(), RepositoryError> {
        match self.bots.lock().unwrap().remove(id) {
            Some(_) => Ok(()),
            None => Err(RepositoryError::NotFound),
        }
    }
}

#[derive(Default)]
struct ChatState {
    sessions: HashMap<Uuid, ChatSession>,
    messages: Vec<ChatMessage>,
    fail_next_append: bool,
}

#[derive(Clone, Default)]
pub(crate) struct InMemoryChatRepository {
    state: Arc<Mutex<ChatState>>,
}

impl InMemoryChatRepository {
    /// Make the next `append_message` call fail with a query error.
    pub(crate) fn fail_next_append(&self) {
        self.state.lock().unwrap().fail_next_append = true;
    }

    pub(crate) fn message_count(&self, session_id: &Uuid) -> usize {
        self.state
            .lock()
            .unwrap()
            .messages
            .iter()
            .filter(|m| &m.session_id == session_id)
            .count()
    }
}

impl ChatRepository for InMemoryChatRepository {
    async fn create_session(&self, session: &ChatSession) -> Result<ChatSession, RepositoryError> {
        self.state
            .lock()
            .unwrap()
            .sessions
            .insert(session.id, session.clone());
        Ok(session.clone())
    }

    async fn get_session(&self, session_id: &Uuid) -> Result<Option<ChatSession>, RepositoryError> {
        Ok(self.state.lock().unwrap().sessions.get(session_id).cloned())
    }

    async fn list_sessions(
        &self,
        owner: &UserId,
        bot_id: &BotId,
    ) -> Result<Vec<ChatSession>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let mut sessions: Vec<ChatSession> = state
            .sessions
            .values()
            .filter(|s| &s.owner_id == owner && &s.bot_id == bot_id)
            .cloned()
            .collect();
        // Descending by last_message_at, missing timestamps as epoch 0.
        sessions.sort_by(|a, b| {
            let ta = a.last_message_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
            let tb = b.last_message_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
            tb.cmp(&ta).then(b.id.cmp(&a.id))
        });
        Ok(sessions)
    }

    async fn append_message(
        &self,
        session_id: &Uuid,
        message: &NewMessage,
    ) -> Result<ChatMessage, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_next_append {
            state.fail_next_append = false;
            return Err(RepositoryError::Query("injected append failure".to_string()));
        }
        let session = state
            .sessions
            .get_mut(session_id)
            .ok_or(RepositoryError::NotFound)?;

        let persisted = ChatMessage {
            id: Uuid::now_v7(),
            session_id: *session_id,
            sender_id: message.sender_id.clone(),
            content: message.content.clone(),
            is_bot: message.is_bot,
            created_at: Utc::now(),
        };
        session.last_message = Some(persisted.content.clone());
        session.last_message_at = Some(persisted.created_at);
        state.messages.push(persisted.clone());
        Ok(persisted)
    }

    async fn list_messages(&self, session_id: &Uuid) -> Result<Vec<ChatMessage>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let mut messages: Vec<ChatMessage> = state
            .messages
            .iter()
            .filter(|m| &m.session_id == session_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(messages)
    }

    async fn delete_session(&self, session_id: &Uuid) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if state.sessions.remove(session_id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        state.messages.retain(|m| &m.session_id != session_id);
        Ok(())
    }

    async fn delete_sessions_for_bot(&self, bot_id: &BotId) -> Result<u64, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        let doomed: Vec<Uuid> = state
            .sessions
            .values()
            .filter(|s| &s.bot_id == bot_id)
            .map(|s| s.id)
            .collect();
        for id in &doomed {
            state.sessions.remove(id);
            state.messages.retain(|m| &m.session_id != id);
        }
        Ok(doomed.len() as u64)
    }
}

/// Gateway fake scripted with a queue of replies and failures.
#[derive(Clone, Default)]
pub(crate) struct ScriptedGateway {
    script: Arc<Mutex<VecDeque<Result<String, CompletionError>>>>,
}

impl ScriptedGateway {
    pub(crate) fn push_reply(&self, reply: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Ok(reply.to_string()));
    }

    pub(crate) fn push_failure(&self, error: CompletionError) {
        self.script.lock().unwrap().push_back(Err(error));
    }
}

impl CompletionGateway for ScriptedGateway {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        _system_prompt: &str,
        _user_text: &str,
    ) -> Result<String, CompletionError> {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CompletionError::Api("no scripted reply".to_string())))
    }
}
