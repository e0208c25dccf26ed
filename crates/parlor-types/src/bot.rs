use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::identity::UserId;

/// Unique identifier for a bot, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BotId(pub Uuid);

impl BotId {
    /// Create a new BotId using UUID v7 (time-sortable, guaranteed ordering).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create a BotId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for BotId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for BotId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// A bot definition: a name plus the system prompt that parameterizes
/// every completion request made on its behalf.
///
/// A bot is owned by exactly one user. Sharing never grants access to this
/// record; it produces a copy owned by the recipient (see `shared_from`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bot {
    pub id: BotId,
    pub owner_id: UserId,
    /// Freeform display name.
    pub name: String,
    /// Instruction text prepended to every completion request.
    pub system_prompt: String,
    /// Short description (1-2 sentences for listings).
    pub description: Option<String>,
    /// Backreference to the bot this one was duplicated from, when created
    /// via sharing. No live link: edits to the original do not propagate.
    pub shared_from: Option<BotId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a new bot. Name and system prompt are required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBotRequest {
    pub name: String,
    pub system_prompt: String,
    pub description: Option<String>,
}

/// Partial update to an existing bot. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBotRequest {
    pub name: Option<String>,
    pub system_prompt: Option<String>,
    pub description: Option<String>,
}

/// Pre-fill payload backing a `/share/{botId}` link: everything a recipient
/// needs to create their own copy of the bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharePreview {
    pub bot_id: BotId,
    pub name: String,
    pub system_prompt: String,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bot_id_display_roundtrip() {
        let id = BotId::new();
        let s = id.to_string();
        let parsed: BotId = s.parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_bot_ids_time_sortable() {
        let a = BotId::new();
        let b = BotId::new();
        assert!(a.0 <= b.0);
    }

    #[test]
    fn test_update_bot_request_defaults() {
        let req = UpdateBotRequest::default();
        assert!(req.name.is_none());
        assert!(req.system_prompt.is_none());
        assert!(req.description.is_none());
    }

    #[test]
    fn test_bot_serialize() {
        let now = Utc::now();
        let bot = Bot {
            id: BotId::new(),
            owner_id: UserId::new("alice"),
            name: "Helper".to_string(),
            system_prompt: "You are terse.".to_string(),
            description: None,
            shared_from: None,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_string(&bot).unwrap();
        assert!(json.contains("\"owner_id\":\"alice\""));
        assert!(json.contains("\"system_prompt\":\"You are terse.\""));
    }
}
