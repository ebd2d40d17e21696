//! Conversation state store
//!
//! All state mutations happen in [`update`]. Callers feed it an [`Action`]
//! and execute the returned [`Effect`]s (see [`runtime`]), feeding each
//! effect's outcome back in as another action.
//!
//! Nothing here cancels or orders in-flight work: whichever result action is
//! applied last wins.

pub mod runtime;

use crate::client::{ChatReply, Conversation, Message, Role, Session};
use std::fmt;

/// A user-visible failure notice
///
/// The displayed text is generic per operation; `detail` is only for logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    LoadHistoryFailed { detail: String },
    LoadConversationFailed { detail: String },
    SendFailed { detail: String },
}

impl Notification {
    pub fn detail(&self) -> &str {
        match self {
            Notification::LoadHistoryFailed { detail }
            | Notification::LoadConversationFailed { detail }
            | Notification::SendFailed { detail } => detail,
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Notification::LoadHistoryFailed { .. } => "Failed to load history",
            Notification::LoadConversationFailed { .. } => "Failed to load conversation",
            Notification::SendFailed { .. } => "Failed to send message",
        };
        f.write_str(text)
    }
}

/// Client-side chat state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatState {
    /// Session the transcript belongs to; `None` for a chat not yet sent
    pub active_session_id: Option<String>,
    /// Transcript of the active conversation, in append order
    pub messages: Vec<Message>,
    /// Sessions as last returned by the service, unsorted
    pub sessions: Vec<Session>,
    /// Failures not yet shown to the user
    pub notifications: Vec<Notification>,
}

impl ChatState {
    /// Sessions ordered most recent first
    pub fn sorted_sessions(&self) -> Vec<Session> {
        crate::client::normalize::sort_by_recency(&self.sessions)
    }

    /// Finds a known session by exact id or unique id prefix
    pub fn resolve_session(&self, id_or_prefix: &str) -> Option<&Session> {
        if let Some(exact) = self.sessions.iter().find(|s| s.id == id_or_prefix) {
            return Some(exact);
        }
        let mut matches = self
            .sessions
            .iter()
            .filter(|s| s.id.starts_with(id_or_prefix));
        match (matches.next(), matches.next()) {
            (Some(only), None) if !id_or_prefix.is_empty() => Some(only),
            _ => None,
        }
    }
}

/// Inputs to the reducer
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Start a fresh chat; no server call
    NewChat,
    /// Open an existing session
    SelectSession(String),
    /// Result of loading a session's history
    ConversationLoaded {
        session_id: String,
        result: Result<Conversation, String>,
    },
    /// User submitted text
    SendMessage(String),
    /// Result of sending a message
    MessageSent(Result<ChatReply, String>),
    /// Reload the session list
    RefreshSessions,
    /// Result of loading the session list
    SessionsLoaded(Result<Vec<Session>, String>),
    /// Drop all pending notifications
    DismissNotifications,
}

/// Side effects requested by the reducer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchSessions,
    FetchConversation(String),
    SendMessage {
        content: String,
        session_id: Option<String>,
    },
}

/// The reducer
///
/// Mutates `state` for `action` and returns the effects to execute.
pub fn update(state: &mut ChatState, action: Action) -> Vec<Effect> {
    match action {
        Action::NewChat => {
            state.active_session_id = None;
            state.messages.clear();
            vec![]
        }
        Action::SelectSession(session_id) => vec![Effect::FetchConversation(session_id)],
        Action::ConversationLoaded { session_id, result } => {
            match result {
                Ok(conversation) => {
                    state.active_session_id = Some(conversation.session_id);
                    state.messages = conversation.messages;
                }
                Err(detail) => {
                    tracing::warn!("Loading conversation {} failed: {}", session_id, detail);
                    state
                        .notifications
                        .push(Notification::LoadConversationFailed { detail });
                }
            }
            vec![]
        }
        Action::SendMessage(content) => {
            if content.trim().is_empty() {
                return vec![];
            }
            state.messages.push(Message::local(Role::User, content.clone()));
            vec![Effect::SendMessage {
                content,
                session_id: state.active_session_id.clone(),
            }]
        }
        Action::MessageSent(result) => match result {
            Ok(reply) => {
                state
                    .messages
                    .push(Message::local(Role::Assistant, reply.response_text));
                if state.active_session_id.is_none() {
                    state.active_session_id = Some(reply.session_id);
                    vec![Effect::FetchSessions]
                } else {
                    vec![]
                }
            }
            Err(detail) => {
                tracing::warn!("Sending message failed: {}", detail);
                state.notifications.push(Notification::SendFailed { detail });
                vec![]
            }
        },
        Action::RefreshSessions => vec![Effect::FetchSessions],
        Action::SessionsLoaded(result) => {
            match result {
                Ok(sessions) => state.sessions = sessions,
                Err(detail) => {
                    tracing::warn!("Loading sessions failed: {}", detail);
                    state
                        .notifications
                        .push(Notification::LoadHistoryFailed { detail });
                }
            }
            vec![]
        }
        Action::DismissNotifications => {
            state.notifications.clear();
            vec![]
        }
    }
}
