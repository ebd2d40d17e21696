use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// One persisted message of a conversation
///
/// Records written by older versions may lack any field or hold `null`;
/// such roles read as `assistant` and such content as empty text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    #[serde(default = "default_role", deserialize_with = "role_or_default")]
    pub role: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

fn default_role() -> String {
    "assistant".to_string()
}

fn role_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_role))
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl StoredMessage {
    /// Creates a message stamped with the current UTC time
    pub fn now(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            timestamp: Some(now_timestamp()),
        }
    }

    /// The recorded timestamp, treating an empty string as absent
    pub fn recorded_at(&self) -> Option<String> {
        self.timestamp.clone().filter(|t| !t.trim().is_empty())
    }
}

/// Metadata for a stored conversation session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    /// Unique identifier for the session
    pub session_id: String,
    /// Number of messages in the session
    pub message_count: usize,
    /// Content of the final message, if any
    pub last_message: Option<String>,
    /// Timestamp of the first timestamped message, else the record's creation time
    pub created_at: Option<String>,
    /// Timestamp of the last timestamped message, else the record's modification time
    pub last_message_timestamp: Option<String>,
}

/// Current UTC time as stored on disk, e.g. `2024-01-01T00:00:00.000000Z`
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
