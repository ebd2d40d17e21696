use crate::client::normalize::sort_by_recency;
use crate::client::{ChatApi, ChatClient, Conversation, Role, Session};
use crate::config::Config;
use crate::error::{ChatdeckError, Result};
use colored::Colorize;
use prettytable::{format, Table};

const TITLE_WIDTH: usize = 40;

/// Handle `chatdeck sessions`
pub async fn list_sessions(config: &Config, json: bool) -> Result<()> {
    let client = ChatClient::new(&config.client)?;
    let sessions = sort_by_recency(&client.fetch_sessions().await?);

    if json {
        let rendered =
            serde_json::to_string_pretty(&sessions).map_err(ChatdeckError::Serialization)?;
        println!("{}", rendered);
        return Ok(());
    }

    print_sessions(&sessions);
    Ok(())
}

/// Handle `chatdeck show <id>`
pub async fn show_conversation(config: &Config, session_id: &str) -> Result<()> {
    let client = ChatClient::new(&config.client)?;
    let conversation = client.fetch_conversation(session_id).await?;
    print_conversation(&conversation);
    Ok(())
}

/// Print sessions as a table, in the order given
pub fn print_sessions(sessions: &[Session]) {
    if sessions.is_empty() {
        println!("{}", "No conversation history found.".yellow());
        return;
    }

    println!("\nConversation History:");
    sessions_table(sessions).printstd();
    println!();
    println!(
        "Use {} to resume a session.",
        "chatdeck chat --resume <ID>".cyan()
    );
    println!();
}

/// Print a transcript with role labels
pub fn print_conversation(conversation: &Conversation) {
    println!(
        "\nSession {} ({} messages)\n",
        conversation.session_id.cyan(),
        conversation.messages.len()
    );
    for message in &conversation.messages {
        let when = message.timestamp.format("%Y-%m-%d %H:%M");
        let label = match message.role {
            Role::User => "you".green().bold(),
            Role::Assistant => "assistant".blue().bold(),
        };
        println!("[{}] {}: {}", when, label, message.content);
    }
    println!();
}

fn sessions_table(sessions: &[Session]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "ID".bold(),
        "Title".bold(),
        "Created".bold(),
        "Last Updated".bold()
    ]);

    for session in sessions {
        let created = session.created_at.format("%Y-%m-%d %H:%M").to_string();
        let updated = session.updated_at.format("%Y-%m-%d %H:%M").to_string();
        table.add_row(prettytable::row![
            short_id(&session.id).cyan(),
            truncate(&session.title, TITLE_WIDTH),
            created,
            updated
        ]);
    }

    table
}

/// First eight characters of an id
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

fn truncate(text: &str, max: usize) -> String {
    let single_line = text.replace('\n', " ");
    if single_line.chars().count() > max {
        let kept: String = single_line.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        single_line
    }
}
