//! SQLite bot repository implementation.
//!
//! Implements `BotRepository` from `parlor-core` using sqlx with split
//! read/write pools: raw queries, a private row struct for SQLite-to-domain
//! mapping, rfc3339 TEXT datetimes.

use parlor_core::repository::bot::BotRepository;
use parlor_types::bot::{Bot, BotId};
use parlor_types::error::RepositoryError;
use parlor_types::identity::UserId;
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `BotRepository`.
pub struct SqliteBotRepository {
    pool: DatabasePool,
}

impl SqliteBotRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to domain Bot.
struct BotRow {
    id: String,
    owner_id: String,
    name: String,
    system_prompt: String,
    description: Option<String>,
    shared_from: Option<String>,
    created_at: String,
    updated_at: String,
}

impl BotRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            name: row.try_get("name")?,
            system_prompt: row.try_get("system_prompt")?,
            description: row.try_get("description")?,
            shared_from: row.try_get("shared_from")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_bot(self) -> Result<Bot, RepositoryError> {
        let id = self
            .id
            .parse::<BotId>()
            .map_err(|e| RepositoryError::Query(format!("invalid bot id: {e}")))?;
        let shared_from = self
            .shared_from
            .as_deref()
            .map(|s| {
                s.parse::<BotId>()
                    .map_err(|e| RepositoryError::Query(format!("invalid shared_from id: {e}")))
            })
            .transpose()?;

        Ok(Bot {
            id,
            owner_id: UserId::new(&self.owner_id),
            name: self.name,
            system_prompt: self.system_prompt,
            description: self.description,
            shared_from,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

impl BotRepository for SqliteBotRepository {
    async fn create(&self, bot: &Bot) -> Result<Bot, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO bots (id, owner_id, name, system_prompt, description, shared_from, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(bot.id.to_string())
        .bind(bot.owner_id.as_str())
        .bind(&bot.name)
        .bind(&bot.system_prompt)
        .bind(&bot.description)
        .bind(bot.shared_from.map(|id| id.to_string()))
        .bind(format_datetime(&bot.created_at))
        .bind(format_datetime(&bot.updated_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(bot.clone()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => Err(
                RepositoryError::Conflict(format!("bot '{}' already exists", bot.id)),
            ),
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn get_by_id(&self, id: &BotId) -> Result<Option<Bot>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM bots WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let bot_row =
                    BotRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(bot_row.into_bot()?))
            }
            None => Ok(None),
        }
    }

    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Bot>, RepositoryError> {
        let rows = sqlx::query("SELECT * FROM bots WHERE owner_id = ? ORDER BY created_at DESC")
            .bind(owner.as_str())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut bots = Vec::with_capacity(rows.len());
        for row in &rows {
            let bot_row =
                BotRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            bots.push(bot_row.into_bot()?);
        }

        Ok(bots)
    }

    async fn update(&self, bot: &Bot) -> Result<Bot, RepositoryError> {
        let result = sqlx::query(
            "UPDATE bots SET name = ?, system_prompt = ?, description = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&bot.name)
        .bind(&bot.system_prompt)
        .bind(&bot.description)
        .bind(format_datetime(&bot.updated_at))
        .bind(bot.id.to_string())
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(bot.clone())
    }

    async fn delete(&self, id: &BotId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM bots WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
