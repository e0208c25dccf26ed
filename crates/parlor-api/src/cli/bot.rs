//! Bot lifecycle CLI commands: create, list, show, delete, share.

use anyhow::Result;
use chrono::{DateTime, Utc};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::{Confirm, Input};
use indicatif::{ProgressBar, ProgressStyle};

use parlor_types::bot::{BotId, CreateBotRequest};
use parlor_types::identity::UserId;

use crate::state::AppState;

/// Create a new bot via interactive prompts or one-shot flags.
///
/// # Examples
///
/// ```bash
/// # Interactive
/// parlor create bot
///
/// # One-shot with flags
/// parlor create bot --name "Helper" --system-prompt "You are terse."
/// ```
pub async fn create_bot(
    state: &AppState,
    name: Option<String>,
    system_prompt: Option<String>,
    description: Option<String>,
    json: bool,
) -> Result<()> {
    let name = match name {
        Some(n) => n,
        None => Input::<String>::new()
            .with_prompt("Bot name")
            .interact_text()?,
    };

    let system_prompt = match system_prompt {
        Some(p) => p,
        None => Input::<String>::new()
            .with_prompt("System prompt")
            .interact_text()?,
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.set_message("Creating bot...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let request = CreateBotRequest {
        name,
        system_prompt,
        description,
    };

    let result = state
        .bot_service
        .create_bot(&state.current_user(), request)
        .await;
    spinner.finish_and_clear();
    let bot = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&bot)?);
        return Ok(());
    }

    println!();
    println!("  {} Bot created!", style("✓").green().bold());
    println!();
    println!("  {}  {}", style("Name:").bold(), style(&bot.name).cyan());
    println!(
        "  {}  {}",
        style("ID:").bold(),
        style(bot.id.to_string()).dim()
    );
    println!();
    println!(
        "  Start chatting: {}",
        style(format!("parlor chat {}", bot.id)).yellow()
    );
    println!();

    Ok(())
}

/// List the configured user's bots in a colored table, newest first.
pub async fn list_bots(state: &AppState, json: bool) -> Result<()> {
    let bots = state.bot_service.list_bots(&state.current_user()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&bots)?);
        return Ok(());
    }

    if bots.is_empty() {
        println!();
        println!(
            "  {} No bots found. Create one with: {}",
            style("i").blue().bold(),
            style("parlor create bot").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Name").fg(Color::White),
        Cell::new("Description").fg(Color::White),
        Cell::new("Origin").fg(Color::White),
        Cell::new("Created").fg(Color::White),
        Cell::new("ID").fg(Color::White),
    ]);

    for bot in &bots {
        let desc = match &bot.description {
            Some(d) if d.chars().count() > 50 => {
                format!("{}...", d.chars().take(47).collect::<String>())
            }
            Some(d) => d.clone(),
            None => String::new(),
        };

        let origin = if bot.shared_from.is_some() {
            Cell::new("shared copy").fg(Color::Yellow)
        } else {
            Cell::new("own").fg(Color::DarkGrey)
        };

        table.add_row(vec![
            Cell::new(&bot.name).fg(Color::Cyan),
            Cell::new(desc),
            origin,
            Cell::new(format_relative_time(&bot.created_at)).fg(Color::DarkGrey),
            Cell::new(bot.id.to_string()).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} bot{}",
        style(bots.len()).bold(),
        if bots.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

/// Show the full profile of a bot, including its system prompt.
pub async fn show_bot(state: &AppState, id: &str, json: bool) -> Result<()> {
    let bot_id = parse_bot_id(id)?;
    let bot = state.bot_service.get_bot(&bot_id).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&bot)?);
        return Ok(());
    }

    println!();
    println!("  {}", style(&bot.name).cyan().bold());
    if let Some(desc) = &bot.description {
        println!("  {}", style(desc).dim());
    }
    println!();

    println!("  {}", style("── Details ──").dim());
    println!(
        "  {}      {}",
        style("ID:").bold(),
        style(bot.id.to_string()).dim()
    );
    println!("  {}   {}", style("Owner:").bold(), bot.owner_id);
    if let Some(source) = &bot.shared_from {
        println!(
            "  {}  {}",
            style("Copied from:").bold(),
            style(source.to_string()).dim()
        );
    }
    println!(
        "  {} {}",
        style("Created:").bold(),
        format_relative_time(&bot.created_at)
    );
    println!(
        "  {} {}",
        style("Updated:").bold(),
        format_relative_time(&bot.updated_at)
    );
    println!();

    println!("  {}", style("── System prompt ──").dim());
    for line in bot.system_prompt.lines() {
        println!("  {line}");
    }
    println!();

    Ok(())
}

/// Delete a bot and cascade to all its chat sessions.
pub async fn delete_bot(state: &AppState, id: &str, force: bool, json: bool) -> Result<()> {
    let bot_id = parse_bot_id(id)?;
    let bot = state.bot_service.get_bot(&bot_id).await?;

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Delete '{}' and ALL its chats? This cannot be undone",
                bot.name
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            println!("  Aborted.");
            return Ok(());
        }
    }

    state
        .bot_service
        .delete_bot(&state.current_user(), &bot_id)
        .await?;

    if json {
        println!("{}", serde_json::json!({ "deleted": bot_id.to_string() }));
    } else {
        println!();
        println!(
            "  {} Deleted '{}' and its chats.",
            style("✓").green().bold(),
            style(&bot.name).cyan()
        );
        println!();
    }

    Ok(())
}

/// Duplicate a bot for a recipient (default: the configured user).
///
/// The copy is fully independent: later edits to the original never reach
/// it, and vice versa.
pub async fn share_bot(
    state: &AppState,
    id: &str,
    to: Option<String>,
    json: bool,
) -> Result<()> {
    let bot_id = parse_bot_id(id)?;
    let recipient = to.map(UserId::new).unwrap_or_else(|| state.current_user());

    let copy = state.bot_service.share_bot(&bot_id, &recipient).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&copy)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} Copied '{}' to {}.",
        style("✓").green().bold(),
        style(&copy.name).cyan(),
        style(recipient.as_str()).bold()
    );
    println!(
        "  New bot ID: {}",
        style(copy.id.to_string()).dim()
    );
    println!();

    Ok(())
}

pub(crate) fn parse_bot_id(s: &str) -> Result<BotId> {
    s.parse::<BotId>()
        .map_err(|_| anyhow::anyhow!("invalid bot id: '{s}'"))
}

/// Render a timestamp as a coarse relative time ("3h ago").
pub(crate) fn format_relative_time(dt: &DateTime<Utc>) -> String {
    let delta = Utc::now().signed_duration_since(*dt);
    if delta.num_seconds() < 60 {
        "just now".to_string()
    } else if delta.num_minutes() < 60 {
        format!("{}m ago", delta.num_minutes())
    } else if delta.num_hours() < 24 {
        format!("{}h ago", delta.num_hours())
    } else {
        format!("{}d ago", delta.num_days())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bot_id_rejects_garbage() {
        assert!(parse_bot_id("not-a-uuid").is_err());
        assert!(parse_bot_id(&BotId::new().to_string()).is_ok());
    }

    #[test]
    fn test_format_relative_time_buckets() {
        let now = Utc::now();
        assert_eq!(format_relative_time(&now), "just now");
        assert_eq!(
            format_relative_time(&(now - chrono::Duration::minutes(5))),
            "5m ago"
        );
        assert_eq!(
            format_relative_time(&(now - chrono::Duration::hours(3))),
            "3h ago"
        );
        assert_eq!(
            format_relative_time(&(now - chrono::Duration::days(2))),
            "2d ago"
        );
    }
}
