//! Conversation storage for the chat service
//!
//! Each session is one pretty-printed JSON array of [`StoredMessage`] named
//! `<session_id>.json`, kept either in the local memory directory
//! ([`FileStore`]) or in an S3 bucket ([`S3Store`]). Writes replace the whole
//! record; concurrent writers to the same session race and the last one wins.

use crate::config::StorageConfig;
use crate::error::{ChatdeckError, Result};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod s3;
pub mod types;
pub use s3::S3Store;
pub use types::{now_timestamp, StoredMessage, StoredSession};

const RECORD_EXTENSION: &str = "json";
const MAX_SESSION_ID_LEN: usize = 128;

/// Persistence backend used by the chat service
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Short name reported by `/` and `/health`
    fn kind(&self) -> &'static str;

    /// Loads a conversation; an unknown session is an empty conversation
    async fn load(&self, session_id: &str) -> Result<Vec<StoredMessage>>;

    /// Replaces the stored conversation
    async fn save(&self, session_id: &str, messages: &[StoredMessage]) -> Result<()>;

    /// Summarizes every stored conversation
    async fn list_sessions(&self) -> Result<Vec<StoredSession>>;
}

/// Checks that a session id can safely name a record
///
/// Ids are non-empty, at most 128 characters, and limited to ASCII
/// letters, digits, `-` and `_`. UUIDs always qualify.
///
/// # Examples
///
/// ```
/// use chatdeck::storage::validate_session_id;
///
/// assert!(validate_session_id("2f1c9a2e-8d4b-4c55-9d0e-1b2a3c4d5e6f").is_ok());
/// assert!(validate_session_id("../secrets").is_err());
/// ```
pub fn validate_session_id(session_id: &str) -> Result<()> {
    let valid = !session_id.is_empty()
        && session_id.len() <= MAX_SESSION_ID_LEN
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ChatdeckError::InvalidSessionId(session_id.to_string()).into())
    }
}

/// Create the store selected by the configuration
///
/// # Errors
///
/// Returns error if the S3 client cannot be configured
pub fn create_store(config: &StorageConfig) -> Result<Arc<dyn ConversationStore>> {
    if config.use_s3 {
        Ok(Arc::new(S3Store::new(config)?))
    } else {
        Ok(Arc::new(FileStore::new(config.memory_dir.clone())))
    }
}

/// Object name of a session record
fn record_name(session_id: &str) -> Result<String> {
    validate_session_id(session_id)?;
    Ok(format!("{}.{}", session_id, RECORD_EXTENSION))
}

/// Session id named by a record, if `name` is one
fn session_id_of(name: &str) -> Option<&str> {
    name.strip_suffix(".json")
        .filter(|stem| validate_session_id(stem).is_ok())
}

/// Parses the body of a session record
fn decode_record(bytes: &[u8], origin: &str) -> Result<Vec<StoredMessage>> {
    let messages: Vec<StoredMessage> = serde_json::from_slice(bytes)
        .with_context(|| format!("Failed to parse {}", origin))
        .map_err(|e| ChatdeckError::Storage(format!("{:#}", e)))?;
    Ok(messages)
}

/// Serializes a session record
fn encode_record(messages: &[StoredMessage]) -> Result<String> {
    serde_json::to_string_pretty(messages)
        .map_err(ChatdeckError::Serialization)
        .map_err(Into::into)
}

/// Summarizes a conversation from its messages alone
///
/// Timestamps come from the first and last messages that carry one; the
/// caller fills the gaps from record metadata.
fn summarize_messages(session_id: String, messages: &[StoredMessage]) -> StoredSession {
    StoredSession {
        session_id,
        message_count: messages.len(),
        last_message: messages.last().map(|m| m.content.clone()),
        created_at: messages.iter().find_map(StoredMessage::recorded_at),
        last_message_timestamp: messages.iter().rev().find_map(StoredMessage::recorded_at),
    }
}

fn format_utc(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Local filesystem store
pub struct FileStore {
    memory_dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `memory_dir`
    ///
    /// The directory is created on first save, not here.
    pub fn new<P: Into<PathBuf>>(memory_dir: P) -> Self {
        Self {
            memory_dir: memory_dir.into(),
        }
    }

    /// Directory holding the records
    pub fn memory_dir(&self) -> &Path {
        &self.memory_dir
    }

    fn record_path(&self, session_id: &str) -> Result<PathBuf> {
        Ok(self.memory_dir.join(record_name(session_id)?))
    }

    async fn read_record(path: &Path) -> Result<Option<Vec<StoredMessage>>> {
        let contents = match tokio::fs::read(path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ChatdeckError::Storage(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                ))
                .into())
            }
        };
        decode_record(&contents, &path.display().to_string()).map(Some)
    }

    async fn summarize(path: &Path, session_id: String) -> Result<StoredSession> {
        let messages = Self::read_record(path).await?.unwrap_or_default();
        let mut session = summarize_messages(session_id, &messages);

        if session.created_at.is_none() || session.last_message_timestamp.is_none() {
            if let Ok(metadata) = tokio::fs::metadata(path).await {
                if session.created_at.is_none() {
                    session.created_at = metadata
                        .created()
                        .or_else(|_| metadata.modified())
                        .ok()
                        .map(|t| format_utc(t.into()));
                }
                if session.last_message_timestamp.is_none() {
                    session.last_message_timestamp =
                        metadata.modified().ok().map(|t| format_utc(t.into()));
                }
            }
        }

        Ok(session)
    }
}

#[async_trait]
impl ConversationStore for FileStore {
    fn kind(&self) -> &'static str {
        "local"
    }

    async fn load(&self, session_id: &str) -> Result<Vec<StoredMessage>> {
        let path = self.record_path(session_id)?;
        let messages = Self::read_record(&path).await?.unwrap_or_default();
        tracing::debug!("Loaded {} messages for session {}", messages.len(), session_id);
        Ok(messages)
    }

    async fn save(&self, session_id: &str, messages: &[StoredMessage]) -> Result<()> {
        let path = self.record_path(session_id)?;

        tokio::fs::create_dir_all(&self.memory_dir)
            .await
            .context("Failed to create memory directory")
            .map_err(|e| ChatdeckError::Storage(format!("{:#}", e)))?;

        let json = encode_record(messages)?;

        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))
            .map_err(|e| ChatdeckError::Storage(format!("{:#}", e)))?;

        tracing::debug!("Saved {} messages for session {}", messages.len(), session_id);
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<StoredSession>> {
        let mut entries = match tokio::fs::read_dir(&self.memory_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(ChatdeckError::Storage(format!(
                    "Failed to read {}: {}",
                    self.memory_dir.display(),
                    e
                ))
                .into())
            }
        };

        let mut sessions = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| ChatdeckError::Storage(format!("Failed to list sessions: {}", e)))?
        {
            let path = entry.path();
            let Some(session_id) = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(session_id_of)
                .map(str::to_string)
            else {
                continue;
            };

            match Self::summarize(&path, session_id).await {
                Ok(session) => sessions.push(session),
                Err(e) => tracing::warn!("Skipping unreadable record {}: {}", path.display(), e),
            }
        }

        sessions.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        Ok(sessions)
    }
}
