//! SQLite chat repository implementation.
//!
//! Implements `ChatRepository` from `parlor-core`. Follows the same
//! patterns as `SqliteBotRepository`: raw queries, private row structs,
//! split reader/writer pool usage. Multi-row mutations (append with cache
//! refresh, session deletes) run inside a writer transaction so partial
//! state is never visible.

use chrono::Utc;
use parlor_core::chat::repository::ChatRepository;
use parlor_types::bot::BotId;
use parlor_types::chat::{ChatMessage, ChatSession, NewMessage};
use parlor_types::error::RepositoryError;
use parlor_types::identity::UserId;
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `ChatRepository`.
pub struct SqliteChatRepository {
    pool: DatabasePool,
}

impl SqliteChatRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain ChatSession.
struct ChatSessionRow {
    id: String,
    owner_id: String,
    bot_id: String,
    last_message: Option<String>,
    last_message_at: Option<String>,
    created_at: String,
}

impl ChatSessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            bot_id: row.try_get("bot_id")?,
            last_message: row.try_get("last_message")?,
            last_message_at: row.try_get("last_message_at")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_session(self) -> Result<ChatSession, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid session id: {e}")))?;
        let bot_id = self
            .bot_id
            .parse::<BotId>()
            .map_err(|e| RepositoryError::Query(format!("invalid bot_id: {e}")))?;
        let last_message_at = self
            .last_message_at
            .as_deref()
            .map(parse_datetime)
            .transpose()?;

        Ok(ChatSession {
            id,
            owner_id: UserId::new(self.owner_id),
            bot_id,
            last_message: self.last_message,
            last_message_at,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

/// Internal row type for mapping SQLite rows to domain ChatMessage.
struct ChatMessageRow {
    id: String,
    chat_id: String,
    sender_id: String,
    content: String,
    is_bot: i64,
    created_at: String,
}

impl ChatMessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            chat_id: row.try_get("chat_id")?,
            sender_id: row.try_get("sender_id")?,
            content: row.try_get("content")?,
            is_bot: row.try_get("is_bot")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<ChatMessage, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?;
        let session_id = Uuid::parse_str(&self.chat_id)
            .map_err(|e| RepositoryError::Query(format!("invalid chat_id: {e}")))?;

        Ok(ChatMessage {
            id,
            session_id,
            sender_id: self.sender_id,
            content: self.content,
            is_bot: self.is_bot != 0,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

impl ChatRepository for SqliteChatRepository {
    async fn create_session(&self, session: &ChatSession) -> Result<ChatSession, RepositoryError> {
        sqlx::query(
            "INSERT INTO chats (id, owner_id, bot_id, last_message, last_message_at, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(session.id.to_string())
        .bind(session.owner_id.as_str())
        .bind(session.bot_id.to_string())
        .bind(&session.last_message)
        .bind(session.last_message_at.as_ref().map(format_datetime))
        .bind(format_datetime(&session.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(session.clone())
    }

    async fn get_session(&self, session_id: &Uuid) -> Result<Option<ChatSession>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM chats WHERE id = ?")
            .bind(session_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let session_row = ChatSessionRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(session_row.into_session()?))
            }
            None => Ok(None),
        }
    }

    async fn list_sessions(
        &self,
        owner: &UserId,
        bot_id: &BotId,
    ) -> Result<Vec<ChatSession>, RepositoryError> {
        // Sessions without a cached timestamp sort as epoch 0, i.e. last.
        let rows = sqlx::query(
            "SELECT * FROM chats WHERE owner_id = ? AND bot_id = ?
             ORDER BY COALESCE(last_message_at, '1970-01-01T00:00:00+00:00') DESC, id DESC",
        )
        .bind(owner.as_str())
        .bind(bot_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in &rows {
            let session_row =
                ChatSessionRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            sessions.push(session_row.into_session()?);
        }

        Ok(sessions)
    }

    async fn append_message(
        &self,
        session_id: &Uuid,
        message: &NewMessage,
    ) -> Result<ChatMessage, RepositoryError> {
        // Id and timestamp are assigned here so ordering reflects the
        // storage side's clock.
        let persisted = ChatMessage {
            id: Uuid::now_v7(),
            session_id: *session_id,
            sender_id: message.sender_id.clone(),
            content: message.content.clone(),
            is_bot: message.is_bot,
            created_at: Utc::now(),
        };

        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        // The parent session's cache is refreshed in the same transaction.
        // The UPDATE runs first: a missing session is a NotFound here, not a
        // foreign-key violation on the INSERT below.
        let updated = sqlx::query("UPDATE chats SET last_message = ?, last_message_at = ? WHERE id = ?")
            .bind(&persisted.content)
            .bind(format_datetime(&persisted.created_at))
            .bind(persisted.session_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query(
            "INSERT INTO chat_messages (id, chat_id, sender_id, content, is_bot, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(persisted.id.to_string())
        .bind(persisted.session_id.to_string())
        .bind(&persisted.sender_id)
        .bind(&persisted.content)
        .bind(persisted.is_bot as i64)
        .bind(format_datetime(&persisted.created_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(persisted)
    }

    async fn list_messages(&self, session_id: &Uuid) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM chat_messages WHERE chat_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(session_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let message_row =
                ChatMessageRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            messages.push(message_row.into_message()?);
        }

        Ok(messages)
    }

    async fn delete_session(&self, session_id: &Uuid) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        sqlx::query("DELETE FROM chat_messages WHERE chat_id = ?")
            .bind(session_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let result = sqlx::query("DELETE FROM chats WHERE id = ?")
            .bind(session_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))
    }

    async fn delete_sessions_for_bot(&self, bot_id: &BotId) -> Result<u64, RepositoryError> {
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        sqlx::query(
            "DELETE FROM chat_messages WHERE chat_id IN (SELECT id FROM chats WHERE bot_id = ?)",
        )
        .bind(bot_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let result = sqlx::query("DELETE FROM chats WHERE bot_id = ?")
            .bind(bot_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
