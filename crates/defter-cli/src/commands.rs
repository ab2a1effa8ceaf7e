//! Subcommand implementations.
//!
//! Every data command resolves the session from the keychain first and
//! bails with a sign-in hint when there is no token. Errors out of the
//! core crate already carry user-facing messages.

use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use tracing::debug;

use defter_core::api::{Ack, NewNote, NotificationFilter, PasswordChange};
use defter_core::auth::{AuthState, LoginOutcome, SessionManager};
use defter_core::models::{GroupedTodos, TodoStatus};

use crate::config::Config;

pub async fn login(manager: &SessionManager, username: Option<&str>) -> Result<()> {
    let mut config = Config::load().unwrap_or_default();
    let username = match username {
        Some(name) => name.to_string(),
        None => prompt_username(config.last_username.as_deref())?,
    };
    let password =
        rpassword::prompt_password("Password: ").context("Failed to read password")?;
    if password.is_empty() {
        bail!("A password is required");
    }

    match manager.login(&username, &password).await {
        LoginOutcome::Success(response) => {
            let display = response.username.as_deref().unwrap_or(&username);
            println!("Logged in as {}", display);
            config.last_username = Some(username);
            if let Err(e) = config.save() {
                debug!(error = %e, "Could not save config");
            }
            Ok(())
        }
        LoginOutcome::Failure { message } => bail!(message),
    }
}

pub async fn logout(manager: &SessionManager) -> Result<()> {
    manager.logout().await;
    println!("Logged out.");
    Ok(())
}

pub async fn status(manager: &SessionManager) -> Result<()> {
    match manager.restore().await {
        AuthState::Authenticated => {
            let profile = manager.client().fetch_profile().await?;
            println!("Logged in as {} <{}>", profile.username, profile.email);
            match manager.client().fetch_unread_count().await {
                Ok(0) => {}
                Ok(unread) => println!("{} unread notification(s)", unread),
                Err(e) => debug!(error = %e, "Could not fetch unread count"),
            }
        }
        _ => println!("Not logged in."),
    }
    Ok(())
}

pub async fn list_notes(manager: &SessionManager) -> Result<()> {
    ensure_session(manager).await?;
    let notes = manager.client().fetch_notes().await?;
    if notes.is_empty() {
        println!("No notes yet.");
        return Ok(());
    }
    for note in &notes {
        let category = note.category_name.as_deref().unwrap_or("-");
        let shared = if note.is_shared() { "*" } else { " " };
        println!("{:>5}{} [{}] {}", note.note_id, shared, category, note.title);
    }
    Ok(())
}

pub async fn show_note(manager: &SessionManager, id: &str) -> Result<()> {
    ensure_session(manager).await?;
    let note = manager.client().fetch_note(parse_id(id)?).await?;

    println!("{}", note.title);
    if let Some(ref category) = note.category_name {
        println!("Category: {}", category);
    }
    println!("Created:  {}", note.created_at);
    if let Some(ref updated) = note.updated_at {
        println!("Updated:  {}", updated);
    }
    println!();
    println!("{}", note.content);
    Ok(())
}

pub async fn add_note(manager: &SessionManager, title: &str, content: &str) -> Result<()> {
    ensure_session(manager).await?;
    let note = NewNote {
        title: title.to_string(),
        content: content.to_string(),
        category_id: None,
        is_public: 0,
    };
    let ack = manager.client().add_note(&note).await?;
    report(&ack, "Note added.");
    Ok(())
}

pub async fn remove_note(manager: &SessionManager, id: &str) -> Result<()> {
    ensure_session(manager).await?;
    let ack = manager.client().delete_note(parse_id(id)?).await?;
    report(&ack, "Note deleted.");
    Ok(())
}

pub async fn list_todos(manager: &SessionManager) -> Result<()> {
    ensure_session(manager).await?;
    let todos = manager.client().fetch_todos().await?;
    if todos.is_empty() {
        println!("No to-dos.");
        return Ok(());
    }

    let today = chrono::Local::now().date_naive();
    let grouped = GroupedTodos::build(todos, today);
    for (heading, todos) in grouped.sections() {
        if todos.is_empty() {
            continue;
        }
        println!("{}", heading);
        for todo in todos {
            let mark = if todo.status.is_completed() { "x" } else { " " };
            println!("  [{}] {:>4} {}", mark, todo.id, todo.task);
        }
    }
    Ok(())
}

pub async fn add_todo(manager: &SessionManager, task: &str) -> Result<()> {
    ensure_session(manager).await?;
    let ack = manager.client().add_todo(task).await?;
    report(&ack, "To-do added.");
    Ok(())
}

pub async fn set_todo(manager: &SessionManager, id: &str, status: TodoStatus) -> Result<()> {
    ensure_session(manager).await?;
    let ack = manager.client().set_todo_status(parse_id(id)?, status).await?;
    report(&ack, "To-do updated.");
    Ok(())
}

pub async fn remove_todo(manager: &SessionManager, id: &str) -> Result<()> {
    ensure_session(manager).await?;
    let ack = manager.client().delete_todo(parse_id(id)?).await?;
    report(&ack, "To-do deleted.");
    Ok(())
}

pub async fn list_categories(manager: &SessionManager) -> Result<()> {
    ensure_session(manager).await?;
    let categories = manager.client().fetch_categories().await?;
    if categories.is_empty() {
        println!("No categories yet.");
        return Ok(());
    }
    for category in &categories {
        println!("{:>5} {}", category.category_id, category.name);
    }
    Ok(())
}

pub async fn show_category(manager: &SessionManager, id: &str) -> Result<()> {
    ensure_session(manager).await?;
    let category_id = parse_id(id)?;
    let name = manager.client().fetch_category_name(category_id).await?;
    let notes = manager.client().fetch_category_notes(category_id).await?;

    println!("{} ({} note(s))", name, notes.len());
    for note in &notes {
        println!("{:>5} {}", note.note_id, note.title);
    }
    Ok(())
}

pub async fn add_category(manager: &SessionManager, name: &str) -> Result<()> {
    ensure_session(manager).await?;
    let ack = manager.client().add_category(name).await?;
    report(&ack, "Category added.");
    Ok(())
}

pub async fn remove_category(manager: &SessionManager, id: &str) -> Result<()> {
    ensure_session(manager).await?;
    let ack = manager.client().delete_category(parse_id(id)?).await?;
    report(&ack, "Category deleted.");
    Ok(())
}

pub async fn list_notifications(manager: &SessionManager, unread_only: bool) -> Result<()> {
    ensure_session(manager).await?;
    let notifications = if unread_only {
        let filter = NotificationFilter {
            is_read: Some(false),
            ..NotificationFilter::default()
        };
        manager.client().fetch_filtered_notifications(&filter).await?
    } else {
        manager.client().fetch_notifications().await?
    };

    if notifications.is_empty() {
        println!("No notifications.");
        return Ok(());
    }
    for notification in &notifications {
        let mark = if notification.unread() { "*" } else { " " };
        println!(
            "{}{:>5} [{}] {}: {}",
            mark,
            notification.notification_id,
            notification.priority.as_str(),
            notification.title,
            notification.message
        );
    }
    Ok(())
}

pub async fn mark_notification_read(manager: &SessionManager, id: &str) -> Result<()> {
    ensure_session(manager).await?;
    let ack = manager.client().mark_notification_read(parse_id(id)?).await?;
    report(&ack, "Notification marked as read.");
    Ok(())
}

pub async fn remove_notification(manager: &SessionManager, id: &str) -> Result<()> {
    ensure_session(manager).await?;
    let ack = manager.client().delete_notification(parse_id(id)?).await?;
    report(&ack, "Notification deleted.");
    Ok(())
}

pub async fn profile(manager: &SessionManager) -> Result<()> {
    ensure_session(manager).await?;
    let profile = manager.client().fetch_profile().await?;

    println!("Username: {}", profile.username);
    println!("Email:    {}", profile.email);
    if let Some(ref phone) = profile.phone_number {
        println!("Phone:    {}", phone);
    }
    if let Some(ref role) = profile.role_description {
        println!("Role:     {}", role);
    }
    if !profile.permissions.is_empty() {
        println!("Permissions: {}", profile.permissions.join(", "));
    }
    if !profile.active() {
        println!("Account is inactive.");
    }
    Ok(())
}

pub async fn change_password(manager: &SessionManager) -> Result<()> {
    ensure_session(manager).await?;

    let current = rpassword::prompt_password("Current password: ")
        .context("Failed to read password")?;
    let new = rpassword::prompt_password("New password: ").context("Failed to read password")?;
    let confirm =
        rpassword::prompt_password("Confirm new password: ").context("Failed to read password")?;
    if new != confirm {
        bail!("Passwords do not match");
    }

    let change = PasswordChange {
        current_password: current,
        new_password: new,
        confirm_password: confirm,
    };
    let ack = manager.client().change_password(&change).await?;
    report(&ack, "Password changed.");
    Ok(())
}

/// Resolve the session from the stored token, bailing when signed out.
async fn ensure_session(manager: &SessionManager) -> Result<()> {
    if manager.restore().await != AuthState::Authenticated {
        bail!("Not logged in. Run 'defter login' first.");
    }
    Ok(())
}

fn prompt_username(last: Option<&str>) -> Result<String> {
    match last {
        Some(last) => print!("Username [{}]: ", last),
        None => print!("Username: "),
    }
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let typed = line.trim();

    if !typed.is_empty() {
        return Ok(typed.to_string());
    }
    match last {
        Some(last) => Ok(last.to_string()),
        None => bail!("A username is required"),
    }
}

fn parse_id(raw: &str) -> Result<i64> {
    raw.parse()
        .with_context(|| format!("'{}' is not a numeric id", raw))
}

/// Print the backend's own message when it sent one.
fn report(ack: &Ack, fallback: &str) {
    match ack.message.as_deref() {
        Some(message) if !message.is_empty() => println!("{}", message),
        _ => println!("{}", fallback),
    }
}
