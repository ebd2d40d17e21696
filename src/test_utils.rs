//! Shared helpers for unit tests

use crate::api::SessionSummary;
use crate::client::{Conversation, Message, Role, Session};
use chrono::{DateTime, Utc};

/// Parses an RFC 3339 literal, panicking on bad input
pub fn fixed_time(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .expect("valid RFC 3339 literal")
        .with_timezone(&Utc)
}

/// A session summary carrying only an id
pub fn summary(id: &str) -> SessionSummary {
    SessionSummary {
        session_id: id.to_string(),
        message_count: None,
        last_message: None,
        created_at: None,
        last_message_timestamp: None,
    }
}

/// A normalized session updated at `updated_at`
pub fn session(id: &str, updated_at: &str) -> Session {
    let ts = fixed_time(updated_at);
    Session {
        id: id.to_string(),
        title: format!("Session {}", id),
        last_message: None,
        created_at: ts,
        updated_at: ts,
    }
}

/// A normalized message with a deterministic id and timestamp
pub fn message(id: &str, role: Role, content: &str) -> Message {
    Message {
        id: id.to_string(),
        content: content.to_string(),
        role,
        timestamp: fixed_time("2024-01-01T00:00:00Z"),
    }
}

/// A conversation of alternating user/assistant messages
pub fn conversation(session_id: &str, contents: &[&str]) -> Conversation {
    let messages = contents
        .iter()
        .enumerate()
        .map(|(i, content)| {
            let role = if i % 2 == 0 { Role::User } else { Role::Assistant };
            message(&format!("{}-{}", session_id, i), role, content)
        })
        .collect();
    Conversation {
        session_id: session_id.to_string(),
        messages,
    }
}
