/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

- `chat`: Interactive chat against a running service
- `history`: Session listing and transcript printing
- `health`: Service liveness check
- `special_commands`: Parser for `/`-prefixed commands in chat

The service itself is started by [`crate::server::serve`].
*/

use crate::client::ChatClient;
use crate::config::Config;
use crate::error::Result;
use colored::Colorize;

// Special commands parser for the chat prompt
pub mod special_commands;

// Session history listing
pub mod history;

// Chat command handler
pub mod chat {
    //! Interactive chat handler.
    //!
    //! Runs a readline loop over a [`ChatState`]: every user action goes
    //! through the state store's `dispatch`, and the loop prints whatever the
    //! store appended or reported.

    use super::*;
    use crate::client::{Conversation, Role};
    use crate::commands::history::{print_conversation, print_sessions, short_id};
    use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
    use crate::state::runtime::dispatch;
    use crate::state::{Action, ChatState};
    use rustyline::error::ReadlineError;
    use rustyline::history::History;
    use rustyline::DefaultEditor;

    /// Start interactive chat
    ///
    /// # Arguments
    ///
    /// * `config` - Global configuration (consumed)
    /// * `resume` - Optional session id or id prefix to open first
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client or the line editor cannot be created.
    /// Service failures are shown as notices and do not end the session.
    pub async fn run_chat(config: Config, resume: Option<String>) -> Result<()> {
        let client = ChatClient::new(&config.client)?;
        let mut state = ChatState::default();

        dispatch(&mut state, &client, Action::RefreshSessions).await;
        if let Some(id) = resume {
            open_session(&mut state, &client, &id).await;
        }
        show_notifications(&mut state, &client).await;

        let mut rl = DefaultEditor::new()?;
        print_welcome_banner(client.base_url());

        loop {
            let prompt = format_prompt(&state);
            match rl.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    remember_line(rl.history_mut(), trimmed)?;

                    match parse_special_command(trimmed) {
                        Ok(SpecialCommand::NewChat) => {
                            dispatch(&mut state, &client, Action::NewChat).await;
                            println!("{}", "Started a new conversation.".green());
                        }
                        Ok(SpecialCommand::ListSessions) => {
                            dispatch(&mut state, &client, Action::RefreshSessions).await;
                            if state.notifications.is_empty() {
                                print_sessions(&state.sorted_sessions());
                            }
                        }
                        Ok(SpecialCommand::OpenSession(id)) => {
                            open_session(&mut state, &client, &id).await;
                        }
                        Ok(SpecialCommand::Help) => print_help(),
                        Ok(SpecialCommand::Exit) => break,
                        Ok(SpecialCommand::None) => {
                            let before = state.messages.len();
                            dispatch(&mut state, &client, Action::SendMessage(line.clone()))
                                .await;
                            print_replies(&state, before);
                        }
                        Err(e) => eprintln!("{}", e.to_string().red()),
                    }

                    show_notifications(&mut state, &client).await;
                }
                Err(ReadlineError::Interrupted) => {
                    println!("CTRL-C");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    println!("CTRL-D");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {:?}", err);
                    break;
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    /// Adds a submitted line to the editor history
    fn remember_line<H: History>(history: &mut H, line: &str) -> Result<()> {
        history.add(line)?;
        Ok(())
    }

    async fn open_session(state: &mut ChatState, client: &ChatClient, id_or_prefix: &str) {
        let session_id = state
            .resolve_session(id_or_prefix)
            .map(|s| s.id.clone())
            .unwrap_or_else(|| id_or_prefix.to_string());

        dispatch(state, client, Action::SelectSession(session_id.clone())).await;

        if state.active_session_id.as_deref() == Some(session_id.as_str()) {
            print_conversation(&Conversation {
                session_id,
                messages: state.messages.clone(),
            });
        }
    }

    fn print_replies(state: &ChatState, before: usize) {
        for message in state.messages.iter().skip(before) {
            if message.role == Role::Assistant {
                println!("\n{}\n", message.content);
            }
        }
    }

    async fn show_notifications(state: &mut ChatState, client: &ChatClient) {
        if state.notifications.is_empty() {
            return;
        }
        for notification in &state.notifications {
            eprintln!("{}", notification.to_string().red().bold());
        }
        dispatch(state, client, Action::DismissNotifications).await;
    }

    fn format_prompt(state: &ChatState) -> String {
        let label = match &state.active_session_id {
            Some(id) => short_id(id).to_string(),
            None => "new".to_string(),
        };
        format!("[{}] >> ", label.cyan())
    }

    fn print_welcome_banner(base_url: &str) {
        println!();
        println!("{}", "Chatdeck interactive chat".bold());
        println!("Connected to {}", base_url.cyan());
        println!("Type {} for commands, {} to leave.", "/help".cyan(), "/exit".cyan());
        println!();
    }

}

// Health command handler
pub mod health {
    //! Service liveness check.

    use super::*;

    /// Query `/health` and print the result
    ///
    /// # Errors
    ///
    /// Returns error if the service is unreachable or unhealthy
    pub async fn check_health(config: &Config) -> Result<()> {
        let client = ChatClient::new(&config.client)?;
        let health = client.health().await?;

        println!("{} {}", "Service:".bold(), client.base_url().cyan());
        println!("{} {}", "Status:".bold(), health.status.green());
        println!("{} {}", "Storage:".bold(), health.storage);
        println!("{} {}", "Model:".bold(), health.model);
        Ok(())
    }
}
