//! defter - command line client for the defter notes backend.
//!
//! Thin wrapper over `defter-core`: signs in, keeps the bearer token in
//! the OS keychain, and exposes the note, to-do, category, notification
//! and profile endpoints as subcommands.

mod commands;
mod config;

use std::io;
use std::sync::Arc;

use anyhow::{bail, Result};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use defter_core::api::ApiClient;
use defter_core::auth::{AuthEvents, KeyringTokenStore, SessionManager};
use defter_core::models::TodoStatus;
use defter_core::ClientConfig;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn usage() {
    eprintln!("defter - notes, to-dos and notifications from the terminal");
    eprintln!();
    eprintln!("Usage: defter <command> [args]");
    eprintln!();
    eprintln!("Session:");
    eprintln!("  login [username]        Sign in and store the token in the keychain");
    eprintln!("  logout                  Sign out and delete the stored token");
    eprintln!("  status                  Show who is signed in");
    eprintln!();
    eprintln!("Notes:");
    eprintln!("  notes                   List notes");
    eprintln!("  note <id>               Show one note");
    eprintln!("  add-note <title> <content>");
    eprintln!("  rm-note <id>");
    eprintln!();
    eprintln!("To-dos:");
    eprintln!("  todos                   List to-dos grouped by age");
    eprintln!("  add-todo <task...>");
    eprintln!("  done <id> | undo <id>   Set completion status");
    eprintln!("  rm-todo <id>");
    eprintln!();
    eprintln!("Categories:");
    eprintln!("  categories              List categories");
    eprintln!("  category <id>           Show a category and its notes");
    eprintln!("  add-category <name>");
    eprintln!("  rm-category <id>");
    eprintln!();
    eprintln!("Notifications:");
    eprintln!("  notifications           List all notifications");
    eprintln!("  unread                  List unread notifications");
    eprintln!("  read-notification <id>  Mark one as read");
    eprintln!("  rm-notification <id>");
    eprintln!();
    eprintln!("Account:");
    eprintln!("  profile                 Show the signed-in profile");
    eprintln!("  passwd                  Change the account password");
}

fn arg<'a>(args: &'a [String], index: usize, name: &str) -> Result<&'a str> {
    match args.get(index) {
        Some(value) => Ok(value.as_str()),
        None => bail!("Missing argument: {}", name),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().map(String::as_str) else {
        usage();
        return Ok(());
    };

    let store = Arc::new(KeyringTokenStore::new());
    let client = ApiClient::new(&ClientConfig::from_env(), store, AuthEvents::new())?;
    let manager = SessionManager::new(client);
    manager.set_logout_hook(|| {
        warn!("Session invalidated by the backend; run 'defter login' to sign in again");
    });

    info!(command, "defter starting");
    match command {
        "login" => commands::login(&manager, args.get(1).map(String::as_str)).await,
        "logout" => commands::logout(&manager).await,
        "status" => commands::status(&manager).await,

        "notes" => commands::list_notes(&manager).await,
        "note" => commands::show_note(&manager, arg(&args, 1, "note id")?).await,
        "add-note" => {
            let title = arg(&args, 1, "title")?;
            let content = arg(&args, 2, "content")?;
            commands::add_note(&manager, title, content).await
        }
        "rm-note" => commands::remove_note(&manager, arg(&args, 1, "note id")?).await,

        "todos" => commands::list_todos(&manager).await,
        "add-todo" => {
            let task = args[1..].join(" ");
            if task.is_empty() {
                bail!("Missing argument: task");
            }
            commands::add_todo(&manager, &task).await
        }
        "done" => {
            commands::set_todo(&manager, arg(&args, 1, "todo id")?, TodoStatus::Completed).await
        }
        "undo" => {
            commands::set_todo(&manager, arg(&args, 1, "todo id")?, TodoStatus::NotCompleted).await
        }
        "rm-todo" => commands::remove_todo(&manager, arg(&args, 1, "todo id")?).await,

        "categories" => commands::list_categories(&manager).await,
        "category" => commands::show_category(&manager, arg(&args, 1, "category id")?).await,
        "add-category" => commands::add_category(&manager, arg(&args, 1, "name")?).await,
        "rm-category" => commands::remove_category(&manager, arg(&args, 1, "category id")?).await,

        "notifications" => commands::list_notifications(&manager, false).await,
        "unread" => commands::list_notifications(&manager, true).await,
        "read-notification" => {
            commands::mark_notification_read(&manager, arg(&args, 1, "notification id")?).await
        }
        "rm-notification" => {
            commands::remove_notification(&manager, arg(&args, 1, "notification id")?).await
        }

        "profile" => commands::profile(&manager).await,
        "passwd" => commands::change_password(&manager).await,

        "help" | "--help" | "-h" => {
            usage();
            Ok(())
        }
        other => {
            usage();
            bail!("Unknown command: {}", other);
        }
    }
}
