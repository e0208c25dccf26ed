//! Parlor CLI and REST API entry point.
//!
//! Binary name: `parlor`
//!
//! Parses CLI arguments, initializes database and services, then dispatches
//! to the appropriate command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands, CreateResource, DeleteResource, ListResource};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,parlor=debug",
        _ => "trace",
    };

    // OTel export only makes sense for the long-running server
    let otel = matches!(cli.command, Commands::Serve { otel: true, .. });
    if let Err(e) = parlor_observe::tracing_setup::init_tracing(filter, otel) {
        eprintln!("failed to initialize tracing: {e}");
    }

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "parlor", &mut std::io::stdout());
        return Ok(());
    }

    // Initialize application state (DB, services)
    let state = AppState::init().await?;

    match cli.command {
        Commands::Create { resource } => match resource {
            CreateResource::Bot {
                name,
                system_prompt,
                description,
            } => {
                cli::bot::create_bot(&state, name, system_prompt, description, cli.json).await?;
            }
        },

        Commands::List { resource } => match resource {
            ListResource::Bots => {
                cli::bot::list_bots(&state, cli.json).await?;
            }
        },

        Commands::Show { id } => {
            cli::bot::show_bot(&state, &id, cli.json).await?;
        }

        Commands::Delete { resource } => match resource {
            DeleteResource::Bot { id, force } => {
                cli::bot::delete_bot(&state, &id, force, cli.json).await?;
            }
            DeleteResource::Session { id, force } => {
                cli::chat::delete_session(&state, &id, force, cli.json).await?;
            }
        },

        Commands::Share { id, to } => {
            cli::bot::share_bot(&state, &id, to, cli.json).await?;
        }

        Commands::Chat { id } => {
            cli::chat::run_chat(&state, &id).await?;
        }

        Commands::Serve { port, host, otel } => {
            // Ensure an API key exists, print it if new
            let api_key = http::extractors::auth::ensure_api_key(&state).await?;
            if api_key.starts_with("parlor_") {
                println!();
                println!(
                    "  {} API key generated (save this -- it won't be shown again):",
                    console::style("🔑").bold()
                );
                println!();
                println!("  {}", console::style(&api_key).yellow().bold());
                println!();
            }

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} Parlor API listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            println!("\n  Server stopped.");

            if otel {
                parlor_observe::tracing_setup::shutdown_tracing();
            }
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
