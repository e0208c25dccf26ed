//! Chat session and message types for Parlor.
//!
//! A session is one ongoing conversation thread between a user and a bot;
//! messages are append-only turns within it, ordered by creation time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::bot::BotId;
use crate::identity::UserId;

/// Role of a message in a completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for MessageRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "system" => Ok(MessageRole::System),
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            other => Err(format!("invalid message role: '{other}'")),
        }
    }
}

/// A chat session between a user and a bot.
///
/// `last_message`/`last_message_at` are a denormalized cache of the most
/// recently appended message, refreshed in the same transaction as every
/// append. On creation (no messages yet) `last_message_at` holds the
/// creation instant as a placeholder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: Uuid,
    pub owner_id: UserId,
    pub bot_id: BotId,
    pub last_message: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A single message within a chat session. Append-only: never mutated
/// after creation. The timestamp is storage-assigned at insert time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: Uuid,
    /// The user id for user turns, the bot id for assistant turns.
    pub sender_id: String,
    pub content: String,
    pub is_bot: bool,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// The completion-request role this message maps to.
    pub fn role(&self) -> MessageRole {
        if self.is_bot {
            MessageRole::Assistant
        } else {
            MessageRole::User
        }
    }
}

/// A message to append. The repository assigns the id and timestamp so that
/// ordering reflects the storage side's clock, never the caller's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMessage {
    pub content: String,
    pub sender_id: String,
    pub is_bot: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_role_roundtrip() {
        for role in [MessageRole::System, MessageRole::User, MessageRole::Assistant] {
            let s = role.to_string();
            let parsed: MessageRole = s.parse().unwrap();
            assert_eq!(role, parsed);
        }
    }

    #[test]
    fn test_message_role_rejects_unknown() {
        assert!("moderator".parse::<MessageRole>().is_err());
    }

    #[test]
    fn test_chat_message_role_mapping() {
        let msg = ChatMessage {
            id: Uuid::now_v7(),
            session_id: Uuid::now_v7(),
            sender_id: "alice".to_string(),
            content: "hi".to_string(),
            is_bot: false,
            created_at: Utc::now(),
        };
        assert_eq!(msg.role(), MessageRole::User);

        let reply = ChatMessage { is_bot: true, ..msg };
        assert_eq!(reply.role(), MessageRole::Assistant);
    }

    #[test]
    fn test_chat_session_serialize() {
        let session = ChatSession {
            id: Uuid::now_v7(),
            owner_id: UserId::new("alice"),
            bot_id: BotId::new(),
            last_message: Some("Hello.".to_string()),
            last_message_at: Some(Utc::now()),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&session).unwrap();
        assert!(json.contains("\"last_message\":\"Hello.\""));
        let parsed: ChatSession = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.owner_id, UserId::new("alice"));
    }
}
