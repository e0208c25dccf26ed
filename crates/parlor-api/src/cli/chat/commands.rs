//! Slash command parsing for the chat loop.
//!
//! Commands start with `/` and provide in-chat controls for session
//! management and help.

use console::style;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Clear the terminal screen.
    Clear,
    /// Exit the chat.
    Exit,
    /// Start a new session with the same bot.
    New,
    /// List this bot's sessions, most recently active first.
    List,
    /// Switch to session N from the last `/list` output (1-based).
    Switch(usize),
    /// Delete session N from the last `/list` output (1-based).
    Delete(usize),
    /// Unknown command or bad argument.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let parts: Vec<&str> = trimmed.splitn(2, ' ').collect();
    let cmd = parts[0].to_lowercase();
    let arg = parts.get(1).map(|s| s.trim());

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/clear" | "/cls" => Some(ChatCommand::Clear),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        "/new" => Some(ChatCommand::New),
        "/list" | "/sessions" => Some(ChatCommand::List),
        "/switch" | "/sw" => match arg.and_then(|a| a.parse::<usize>().ok()) {
            Some(n) if n >= 1 => Some(ChatCommand::Switch(n)),
            _ => Some(ChatCommand::Unknown(
                "/switch requires a session number from /list".to_string(),
            )),
        },
        "/delete" | "/del" => match arg.and_then(|a| a.parse::<usize>().ok()) {
            Some(n) if n >= 1 => Some(ChatCommand::Delete(n)),
            _ => Some(ChatCommand::Unknown(
                "/delete requires a session number from /list".to_string(),
            )),
        },
        other => Some(ChatCommand::Unknown(other.to_string())),
    }
}

/// Print the help text listing all available commands.
pub fn print_help() {
    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    println!("  {}      {}", style("/help").cyan(), "Show this help message");
    println!("  {}     {}", style("/clear").cyan(), "Clear the screen");
    println!("  {}      {}", style("/exit").cyan(), "Leave the chat");
    println!("  {}       {}", style("/new").cyan(), "Start a new session");
    println!("  {}      {}", style("/list").cyan(), "List this bot's sessions");
    println!("  {}  {}", style("/switch N").cyan(), "Switch to session N");
    println!("  {}  {}", style("/delete N").cyan(), "Delete session N");
    println!();
    println!("  {}", style("Ctrl+D to exit").dim());
    println!();
}
