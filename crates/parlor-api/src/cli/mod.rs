//! CLI command definitions and dispatch for the `parlor` binary.
//!
//! Uses clap derive macros for argument parsing. The CLI follows a verb-noun
//! pattern (e.g., `parlor create bot`, `parlor list bots`).

pub mod bot;
pub mod chat;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Chat with bots you define by a system prompt.
#[derive(Parser)]
#[command(name = "parlor", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new resource.
    Create {
        #[command(subcommand)]
        resource: CreateResource,
    },

    /// List resources.
    #[command(alias = "ls")]
    List {
        #[command(subcommand)]
        resource: ListResource,
    },

    /// Show details of a bot.
    Show {
        /// Bot id to display.
        id: String,
    },

    /// Delete a resource.
    #[command(alias = "rm")]
    Delete {
        #[command(subcommand)]
        resource: DeleteResource,
    },

    /// Share a bot: create an independent copy for a recipient.
    Share {
        /// Bot id to share.
        id: String,

        /// Recipient user id (defaults to the configured user).
        #[arg(long)]
        to: Option<String>,
    },

    /// Start an interactive chat with a bot.
    Chat {
        /// Bot id to chat with.
        id: String,
    },

    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Export spans via OpenTelemetry (stdout exporter).
        #[arg(long)]
        otel: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum CreateResource {
    /// Create a new bot.
    Bot {
        /// Bot name (skips the interactive prompt if provided).
        #[arg(long)]
        name: Option<String>,

        /// System prompt sent with every completion request.
        #[arg(long)]
        system_prompt: Option<String>,

        /// Short description shown in listings.
        #[arg(long)]
        description: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ListResource {
    /// List all bots owned by the configured user.
    Bots,
}

#[derive(Subcommand)]
pub enum DeleteResource {
    /// Delete a bot permanently, together with all its chats.
    Bot {
        /// Bot id to delete.
        id: String,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },

    /// Delete a chat session and its messages.
    Session {
        /// Session id to delete.
        id: String,

        /// Skip confirmation prompt.
        #[arg(long)]
        force: bool,
    },
}
