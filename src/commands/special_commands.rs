//! Special commands parser for interactive chat
//!
//! Lines starting with `/` are commands for the client itself rather than
//! messages for the service. Commands are case-insensitive; session ids
//! passed to `/open` keep their case.

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Start a fresh conversation
    NewChat,

    /// Reload and print the session list
    ListSessions,

    /// Open a session by id or unique id prefix
    OpenSession(String),

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command; send the input as a message
    None,
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns `CommandError::UnknownCommand` if input starts with "/" but is not
/// a valid command, and `CommandError::MissingArgument` for `/open` without
/// an id.
///
/// # Examples
///
/// ```
/// use chatdeck::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// let cmd = parse_special_command("/open 3f2a").unwrap();
/// assert_eq!(cmd, SpecialCommand::OpenSession("3f2a".to_string()));
///
/// let cmd = parse_special_command("hello there").unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    // If input doesn't start with "/", it's not a command (except exit/quit)
    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    let (command, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((command, arg)) => (command.to_lowercase(), arg.trim()),
        None => (lower.clone(), ""),
    };

    match command.as_str() {
        "/new" => Ok(SpecialCommand::NewChat),
        "/sessions" | "/history" => Ok(SpecialCommand::ListSessions),
        "/open" | "/resume" => {
            if arg.is_empty() {
                Err(CommandError::MissingArgument {
                    command: command.clone(),
                    usage: format!("{} <session-id>", command),
                })
            } else {
                Ok(SpecialCommand::OpenSession(arg.to_string()))
            }
        }
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" | "exit" | "quit" => Ok(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

/// Print help text for the special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat
=====================================

CONVERSATIONS:
  /new            - Start a new conversation
  /sessions       - List past sessions, most recent first
  /history        - Same as /sessions
  /open <id>      - Open a session (a unique id prefix is enough)
  /resume <id>    - Same as /open

OTHER:
  /help           - Show this help
  /exit, exit     - Leave the chat (also /quit, quit, Ctrl-D)

Anything else is sent to the assistant.
"#
    );
}
