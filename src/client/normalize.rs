//! Normalization from wire payloads to the view model
//!
//! Normalization never fails: every field the service may omit has a
//! documented substitute. The current time is passed in so the defaults are
//! deterministic under test.

use crate::api::{ConversationPayload, Lenient, SessionSummary, SessionsPayload, WireMessage};
use crate::client::types::{Conversation, Message, Role, Session};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Title used when a session has neither a last message nor an id
pub const PLACEHOLDER_TITLE: &str = "New conversation";

/// Number of id characters shown in a fallback title
const TITLE_ID_CHARS: usize = 8;

/// Parses a service timestamp
///
/// Accepts RFC 3339 (`2024-01-01T00:00:00Z`, with or without fractional
/// seconds) and offset-less ISO 8601, which is read as UTC.
///
/// # Examples
///
/// ```
/// use chatdeck::client::normalize::parse_timestamp;
///
/// assert!(parse_timestamp("2024-01-01T00:00:00Z").is_some());
/// assert!(parse_timestamp("2024-01-01T00:00:00.123456").is_some());
/// assert!(parse_timestamp("yesterday").is_none());
/// ```
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Formats a timestamp the way it travels on the wire
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Derives the display title of a session
///
/// Last message text, else `Session <first 8 chars of id>`, else the
/// placeholder.
pub fn session_title(last_message: Option<&str>, id: &str) -> String {
    if let Some(text) = last_message.map(str::trim).filter(|t| !t.is_empty()) {
        return text.to_string();
    }
    let id = id.trim();
    if id.is_empty() {
        return PLACEHOLDER_TITLE.to_string();
    }
    let short: String = id.chars().take(TITLE_ID_CHARS).collect();
    format!("Session {}", short)
}

/// Normalizes one session entry
pub fn normalize_session(raw: SessionSummary, now: DateTime<Utc>) -> Session {
    let created_at = raw
        .created_at
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or(now);
    let updated_at = raw
        .last_message_timestamp
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or(created_at);
    let title = session_title(raw.last_message.as_deref(), &raw.session_id);

    Session {
        id: raw.session_id,
        title,
        last_message: raw.last_message,
        created_at,
        updated_at,
    }
}

/// Normalizes a `GET /sessions` payload, in the order the service sent it
pub fn normalize_sessions(payload: SessionsPayload, now: DateTime<Utc>) -> Vec<Session> {
    payload
        .sessions
        .into_iter()
        .filter_map(Lenient::valid)
        .map(|raw| normalize_session(raw, now))
        .collect()
}

/// Returns the sessions ordered most recent first
///
/// Sessions with equal `updated_at` keep their relative order.
pub fn sort_by_recency(sessions: &[Session]) -> Vec<Session> {
    let mut sorted = sessions.to_vec();
    sorted.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    sorted
}

/// Normalizes one message at position `index` of the server list
pub fn normalize_message(
    session_id: &str,
    index: usize,
    raw: WireMessage,
    now: DateTime<Utc>,
) -> Message {
    let id = raw
        .id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("{}-{}", session_id, index));
    let timestamp = raw
        .timestamp
        .as_deref()
        .and_then(parse_timestamp)
        .unwrap_or(now);

    Message {
        id,
        content: raw.content.unwrap_or_default(),
        role: Role::from_wire(raw.role.as_deref()),
        timestamp,
    }
}

/// Normalizes a `GET /conversation/{id}` payload
///
/// `requested_id` is used when the body does not name its session. Fallback
/// message ids use the position in the server list, counting elements that
/// were skipped as malformed.
pub fn normalize_conversation(
    requested_id: &str,
    payload: ConversationPayload,
    now: DateTime<Utc>,
) -> Conversation {
    let session_id = payload
        .session_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| requested_id.to_string());

    let messages = payload
        .messages
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| item.valid().map(|raw| (index, raw)))
        .map(|(index, raw)| normalize_message(&session_id, index, raw, now))
        .collect();

    Conversation {
        session_id,
        messages,
    }
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        WireMessage {
            id: Some(message.id.clone()),
            content: Some(message.content.clone()),
            role: Some(message.role.as_str().to_string()),
            timestamp: Some(format_timestamp(&message.timestamp)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{fixed_time, summary};
    use serde_json::json;

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = fixed_time("2024-01-01T00:00:00Z");
        assert_eq!(parse_timestamp("2024-01-01T00:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01T00:00:00+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01T00:00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01 00:00:00"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-01-01T00:00:00.500000Z"),
            Some(expected + chrono::Duration::milliseconds(500))
        );
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("not a date"), None);
    }

    #[test]
    fn test_session_title_fallback_chain() {
        assert_eq!(session_title(Some("Hello there"), "abc"), "Hello there");
        assert_eq!(session_title(Some("   "), "abc123"), "Session abc123");
        assert_eq!(
            session_title(None, "0123456789abcdef"),
            "Session 01234567"
        );
        assert_eq!(session_title(None, ""), PLACEHOLDER_TITLE);
    }

    #[test]
    fn test_session_title_truncates_on_char_boundary() {
        assert_eq!(session_title(None, "ééééééééé"), "Session éééééééé");
    }

    #[test]
    fn test_normalize_session_only_created_at() {
        let now = fixed_time("2030-01-01T00:00:00Z");
        let mut raw = summary("abc123");
        raw.created_at = Some("2024-01-01T00:00:00Z".to_string());

        let session = normalize_session(raw, now);
        assert_eq!(session.id, "abc123");
        assert_eq!(session.title, "Session abc123");
        assert_eq!(session.created_at, fixed_time("2024-01-01T00:00:00Z"));
        assert_eq!(session.updated_at, session.created_at);
        assert_eq!(session.last_message, None);
    }

    #[test]
    fn test_normalize_session_all_fields_missing() {
        let now = fixed_time("2030-01-01T00:00:00Z");
        let session = normalize_session(summary("s1"), now);
        assert_eq!(session.created_at, now);
        assert_eq!(session.updated_at, now);
        assert_eq!(session.title, "Session s1");
    }

    #[test]
    fn test_normalize_session_invalid_last_timestamp_falls_back() {
        let now = fixed_time("2030-01-01T00:00:00Z");
        let mut raw = summary("s1");
        raw.created_at = Some("2024-02-01T10:00:00Z".to_string());
        raw.last_message_timestamp = Some("garbage".to_string());
        raw.last_message = Some("bye".to_string());

        let session = normalize_session(raw, now);
        assert_eq!(session.updated_at, fixed_time("2024-02-01T10:00:00Z"));
        assert_eq!(session.title, "bye");
    }

    #[test]
    fn test_sort_by_recency_descending() {
        let now = fixed_time("2030-01-01T00:00:00Z");
        let stamps = [
            ("t2", "2024-01-02T00:00:00Z"),
            ("t1", "2024-01-01T00:00:00Z"),
            ("t3", "2024-01-03T00:00:00Z"),
        ];
        let sessions: Vec<Session> = stamps
            .iter()
            .map(|(id, ts)| {
                let mut raw = summary(id);
                raw.last_message_timestamp = Some(ts.to_string());
                normalize_session(raw, now)
            })
            .collect();

        let ids: Vec<String> = sort_by_recency(&sessions)
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["t3", "t2", "t1"]);
    }

    #[test]
    fn test_normalize_conversation_fallback_ids_by_position() {
        let now = fixed_time("2030-01-01T00:00:00Z");
        let payload: ConversationPayload = serde_json::from_value(json!({
            "session_id": "s1",
            "messages": [
                {"content": "hi", "role": "user", "timestamp": "2024-01-01T00:00:00Z"},
                "garbage",
                {"id": "server-id", "content": "hello"},
                {"content": "again", "role": "user"}
            ]
        }))
        .unwrap();

        let conversation = normalize_conversation("ignored", payload, now);
        assert_eq!(conversation.session_id, "s1");
        let ids: Vec<&str> = conversation.messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["s1-0", "server-id", "s1-3"]);

        assert_eq!(conversation.messages[0].role, Role::User);
        assert_eq!(conversation.messages[1].role, Role::Assistant);
        assert_eq!(conversation.messages[1].timestamp, now);
        assert_eq!(
            conversation.messages[0].timestamp,
            fixed_time("2024-01-01T00:00:00Z")
        );
    }

    #[test]
    fn test_normalize_conversation_uses_requested_id() {
        let now = fixed_time("2030-01-01T00:00:00Z");
        let payload: ConversationPayload =
            serde_json::from_value(json!({"messages": [{}]})).unwrap();

        let conversation = normalize_conversation("req", payload, now);
        assert_eq!(conversation.session_id, "req");
        assert_eq!(conversation.messages[0].id, "req-0");
        assert_eq!(conversation.messages[0].content, "");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let now = fixed_time("2030-01-01T00:00:00Z");
        let payload: ConversationPayload = serde_json::from_value(json!({
            "session_id": "s1",
            "messages": [
                {"content": "hi", "role": "user", "timestamp": "2024-01-01T00:00:00.123456Z"},
                {"content": "hello"}
            ]
        }))
        .unwrap();
        let first = normalize_conversation("s1", payload, now);

        let later = fixed_time("2031-06-01T00:00:00Z");
        let again: Vec<Message> = first
            .messages
            .iter()
            .enumerate()
            .map(|(i, m)| normalize_message("s1", i, WireMessage::from(m), later))
            .collect();

        assert_eq!(again, first.messages);
    }

    #[test]
    fn test_wrong_typed_message_fields_keep_the_message() {
        let now = fixed_time("2030-01-01T00:00:00Z");
        let payload: ConversationPayload = serde_json::from_value(json!({
            "session_id": "s9",
            "messages": [
                {"content": "kept?", "role": "user", "timestamp": 1704067200},
                {"id": 7, "content": "numeric id"}
            ]
        }))
        .unwrap();

        let conversation = normalize_conversation("s9", payload, now);
        assert_eq!(conversation.messages.len(), 2);

        let first = &conversation.messages[0];
        assert_eq!(first.id, "s9-0");
        assert_eq!(first.content, "kept?");
        assert_eq!(first.role, Role::User);
        assert_eq!(first.timestamp, now);

        let second = &conversation.messages[1];
        assert_eq!(second.id, "7");
        assert_eq!(second.content, "numeric id");
        assert_eq!(second.role, Role::Assistant);
    }

    #[test]
    fn test_numeric_conversation_session_id_keeps_messages() {
        let now = fixed_time("2030-01-01T00:00:00Z");
        let payload: ConversationPayload = serde_json::from_value(json!({
            "session_id": 42,
            "messages": [{"content": "hi"}]
        }))
        .unwrap();

        let conversation = normalize_conversation("42", payload, now);
        assert_eq!(conversation.session_id, "42");
        assert_eq!(conversation.messages.len(), 1);
        assert_eq!(conversation.messages[0].id, "42-0");
        assert_eq!(conversation.messages[0].content, "hi");
    }

    #[test]
    fn test_wrong_typed_session_fields_use_fallbacks() {
        let now = fixed_time("2030-01-01T00:00:00Z");
        let payload: SessionsPayload = serde_json::from_value(json!({
            "sessions": [
                {"session_id": "abc", "created_at": 1704067200},
                {"session_id": "def", "last_message": ["not", "text"]}
            ]
        }))
        .unwrap();

        let sessions = normalize_sessions(payload, now);
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, "abc");
        assert_eq!(sessions[0].created_at, now);
        assert_eq!(sessions[0].updated_at, now);
        assert_eq!(sessions[1].title, "Session def");
        assert_eq!(sessions[1].last_message, None);
    }
}
