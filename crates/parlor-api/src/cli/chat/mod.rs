//! Interactive chat REPL driving the session controller.
//!
//! One controller instance per `parlor chat <bot-id>` invocation. Slash
//! commands manage sessions in place; everything else is sent to the bot.

pub mod commands;

use std::io::Write as _;

use anyhow::Result;
use console::style;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use parlor_core::controller::{SendError, SendOutcome, SessionController};
use parlor_infra::llm::openai::OpenAiGateway;
use parlor_infra::sqlite::bot::SqliteBotRepository;
use parlor_infra::sqlite::chat::SqliteChatRepository;
use parlor_types::bot::Bot;
use parlor_types::chat::{ChatMessage, ChatSession};
use parlor_types::error::ControllerError;

use crate::cli::bot::{format_relative_time, parse_bot_id};
use crate::state::AppState;

use commands::ChatCommand;

type CliController = SessionController<SqliteBotRepository, SqliteChatRepository, OpenAiGateway>;

/// Run the interactive chat loop for a bot.
pub async fn run_chat(state: &AppState, id: &str) -> Result<()> {
    let bot_id = parse_bot_id(id)?;

    let mut controller = SessionController::new(
        state.bot_service.clone(),
        state.chat_store.clone(),
        state.gateway.clone(),
        state.current_user(),
    );

    if let Err(e) = controller.open(&bot_id).await {
        match e {
            ControllerError::BotNotFound => {
                println!();
                println!(
                    "  {} No bot with id {}. See {}.",
                    style("✗").red().bold(),
                    style(id).dim(),
                    style("parlor list bots").yellow()
                );
                println!();
                return Ok(());
            }
            other => return Err(other.into()),
        }
    }

    let bot = controller
        .bot()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("controller opened without a bot"))?;

    print_banner(&bot, &state.config.completion.model, controller.selected_session());
    for message in controller.messages() {
        print_message(&bot, message);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", style("you ❯").bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break; // Ctrl+D
        };

        if let Some(command) = commands::parse(&line) {
            match command {
                ChatCommand::Help => commands::print_help(),
                ChatCommand::Clear => {
                    print!("\x1B[2J\x1B[1;1H");
                }
                ChatCommand::Exit => break,
                ChatCommand::New => match controller.new_chat().await {
                    Ok(_) => println!("  {} New session started.", style("✓").green()),
                    Err(e) => print_controller_error(&e),
                },
                ChatCommand::List => print_sessions(&controller),
                ChatCommand::Switch(n) => {
                    match session_at(&controller, n) {
                        Some(session_id) => match controller.select_session(session_id).await {
                            Ok(()) => {
                                println!(
                                    "  {} Switched ({} message{}).",
                                    style("✓").green(),
                                    controller.messages().len(),
                                    if controller.messages().len() == 1 { "" } else { "s" }
                                );
                                for message in controller.messages() {
                                    print_message(&bot, message);
                                }
                            }
                            Err(e) => print_controller_error(&e),
                        },
                        None => println!("  {} No session {n}. Try /list.", style("✗").red()),
                    }
                }
                ChatCommand::Delete(n) => {
                    let Some(session_id) = session_at(&controller, n) else {
                        println!("  {} No session {n}. Try /list.", style("✗").red());
                        continue;
                    };
                    let confirmed = Confirm::new()
                        .with_prompt(format!("Delete session {n} and its messages?"))
                        .default(false)
                        .interact()?;
                    if !confirmed {
                        continue;
                    }
                    match controller.delete_chat(session_id).await {
                        Ok(()) => println!("  {} Session deleted.", style("✓").green()),
                        Err(e) => print_controller_error(&e),
                    }
                }
                ChatCommand::Unknown(msg) => {
                    println!("  {} {msg} (try /help)", style("?").yellow());
                }
            }
            continue;
        }

        if line.trim().is_empty() {
            continue;
        }

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        spinner.set_message(format!("{} is thinking...", bot.name));
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));

        let result = controller.send(&line).await;
        spinner.finish_and_clear();

        match result {
            Ok(SendOutcome::Delivered { assistant, .. }) => {
                println!("{} {}", style(format!("{} ❯", bot.name)).cyan().bold(), assistant.content);
            }
            Ok(SendOutcome::RolledBack(reason)) => {
                let detail = match reason {
                    SendError::UserWrite(e) => e.to_string(),
                    SendError::Completion(e) => e.to_string(),
                    SendError::AssistantWrite(e) => e.to_string(),
                };
                println!(
                    "  {} Message not delivered: {detail}",
                    style("✗").red().bold()
                );
            }
            Err(e) => print_controller_error(&e),
        }
    }

    println!();
    println!("  {}", style("Chat ended.").dim());
    Ok(())
}

/// Delete a session by id, outside the chat loop.
pub async fn delete_session(state: &AppState, id: &str, force: bool, json: bool) -> Result<()> {
    let session_id = id
        .parse::<Uuid>()
        .map_err(|_| anyhow::anyhow!("invalid session id: '{id}'"))?;

    if !force {
        let confirmed = Confirm::new()
            .with_prompt("Delete this session and all its messages?")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("  Aborted.");
            return Ok(());
        }
    }

    state
        .chat_store
        .delete_session(&state.current_user(), &session_id)
        .await?;

    if json {
        println!("{}", serde_json::json!({ "deleted": session_id.to_string() }));
    } else {
        println!("  {} Session deleted.", style("✓").green().bold());
    }

    Ok(())
}

fn session_at(controller: &CliController, n: usize) -> Option<Uuid> {
    controller.sessions().get(n - 1).map(|s| s.id)
}

fn print_banner(bot: &Bot, model: &str, session: Option<&ChatSession>) {
    println!();
    println!("  {}", style(&bot.name).cyan().bold());
    if let Some(desc) = &bot.description {
        println!("  {}", style(desc).dim());
    }
    println!();
    println!("  {}  {}", style("Model:").bold(), style(model).dim());
    if let Some(session) = session {
        let id = session.id.to_string();
        println!(
            "  {}  {}",
            style("Session:").bold(),
            style(&id[..8.min(id.len())]).dim()
        );
    }
    println!();
    println!("  {}", style("Type /help for commands, Ctrl+D to exit").dim());
    println!("  {}", style("---").dim());
    println!();
}

fn print_message(bot: &Bot, message: &ChatMessage) {
    if message.is_bot {
        println!(
            "{} {}",
            style(format!("{} ❯", bot.name)).cyan().bold(),
            message.content
        );
    } else {
        println!("{} {}", style("you ❯").bold(), message.content);
    }
}

fn print_sessions(controller: &CliController) {
    let sessions = controller.sessions();
    let selected = controller.selected_session().map(|s| s.id);

    println!();
    for (i, session) in sessions.iter().enumerate() {
        let marker = if Some(session.id) == selected {
            style("●").green()
        } else {
            style("○").dim()
        };
        let preview = match &session.last_message {
            Some(m) if m.chars().count() > 40 => {
                format!("{}...", m.chars().take(37).collect::<String>())
            }
            Some(m) => m.clone(),
            None => style("(no messages)").dim().to_string(),
        };
        let when = session
            .last_message_at
            .map(|dt| format_relative_time(&dt))
            .unwrap_or_else(|| "never".to_string());
        println!("  {marker} {}. {preview}  {}", i + 1, style(when).dim());
    }
    println!();
}

fn print_controller_error(err: &ControllerError) {
    match err {
        ControllerError::LastSession => println!(
            "  {} A bot keeps at least one session; create another before deleting this one.",
            style("✗").red()
        ),
        ControllerError::Busy(op) => {
            println!("  {} Still working on the previous {op}.", style("…").yellow())
        }
        other => println!("  {} {other}", style("✗").red()),
    }
}
