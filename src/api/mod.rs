//! Wire schema of the chat service
//!
//! Every payload exchanged between the client adapter and the chat service
//! is described here with explicit types. Outbound types (what the service
//! writes) are strict; inbound payload types (what the client reads) mark
//! every field the service may omit as optional and decode list elements one
//! at a time, so a single malformed element never poisons the whole body.
//! Optional text fields of the wrong JSON type read as absent; numbers are
//! kept as their decimal text.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Body of `POST /chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Text typed by the user
    pub message: String,
    /// Session to continue; a new one is created when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Reply of `POST /chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Assistant reply text
    pub response: String,
    /// Session the exchange was recorded under
    #[serde(default)]
    pub session_id: Option<String>,
}

/// One entry of `GET /sessions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    #[serde(deserialize_with = "required_text")]
    pub session_id: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_count"
    )]
    pub message_count: Option<usize>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub last_message: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub last_message_timestamp: Option<String>,
}

/// Reply of `GET /sessions` as written by the service
#[derive(Debug, Clone, Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionSummary>,
}

/// One message as it travels on the wire
///
/// Stored records carry no `id`; the client derives one from the position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_text"
    )]
    pub id: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_text"
    )]
    pub content: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_text"
    )]
    pub role: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_text"
    )]
    pub timestamp: Option<String>,
}

/// Reply of `GET /conversation/{session_id}` as written by the service
#[derive(Debug, Clone, Serialize)]
pub struct ConversationResponse {
    pub session_id: String,
    pub messages: Vec<WireMessage>,
}

/// Reply of `GET /health`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub storage: String,
    #[serde(default)]
    pub model: String,
}

/// Reply of `GET /`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    pub memory_enabled: bool,
    pub storage: String,
    pub ai_model: String,
}

/// Error body returned with any non-success status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// A list element that either matched its schema or did not
///
/// Keeping the rejected value (instead of dropping it) preserves the
/// original positions of the elements that did decode.
#[derive(Debug, Clone, PartialEq)]
pub enum Lenient<T> {
    Valid(T),
    Invalid(Value),
}

impl<T> Lenient<T> {
    /// Returns the decoded element, if any
    pub fn valid(self) -> Option<T> {
        match self {
            Lenient::Valid(value) => Some(value),
            Lenient::Invalid(_) => None,
        }
    }
}

/// Inbound view of `GET /sessions`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionsPayload {
    #[serde(default, deserialize_with = "lenient_array")]
    pub sessions: Vec<Lenient<SessionSummary>>,
}

/// Inbound view of `GET /conversation/{session_id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConversationPayload {
    #[serde(default, deserialize_with = "lenient_text")]
    pub session_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_array")]
    pub messages: Vec<Lenient<WireMessage>>,
}

/// Decodes a field that should be an array of `T`
///
/// Anything other than an array (absent, null, object, scalar) yields an
/// empty list. Elements that do not match `T` are kept as `Invalid`.
fn lenient_array<'de, D, T>(deserializer: D) -> std::result::Result<Vec<Lenient<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    let items = match value {
        Value::Array(items) => items,
        Value::Null => return Ok(Vec::new()),
        other => {
            tracing::warn!("Expected a JSON array, got {}; treating as empty", kind_of(&other));
            return Ok(Vec::new());
        }
    };

    Ok(items
        .into_iter()
        .map(|item| match T::deserialize(&item) {
            Ok(decoded) => Lenient::Valid(decoded),
            Err(e) => {
                tracing::warn!("Skipping malformed list element: {}", e);
                Lenient::Invalid(item)
            }
        })
        .collect())
}

/// Decodes an optional text field
///
/// Strings are kept, numbers become their decimal text, and anything else
/// (null, booleans, arrays, objects) reads as absent.
fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(text_of(Value::deserialize(deserializer)?))
}

/// Decodes a required text field; numbers are accepted as text
fn required_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let kind = kind_of(&value);
    text_of(value).ok_or_else(|| D::Error::custom(format!("expected text, got {}", kind)))
}

/// Decodes an optional non-negative count; other values read as absent
fn lenient_count<'de, D>(deserializer: D) -> std::result::Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_u64().and_then(|n| usize::try_from(n).ok()))
}

fn text_of(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Null => None,
        other => {
            tracing::debug!("Ignoring {} where text was expected", kind_of(&other));
            None
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
