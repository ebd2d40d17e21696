//! Error types for Chatdeck
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Chatdeck operations
///
/// Covers configuration loading, the HTTP client adapter, the chat
/// service, conversation storage, and the completion provider.
#[derive(Error, Debug)]
pub enum ChatdeckError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A call to the chat service failed
    ///
    /// Covers transport failures, non-success statuses, and bodies that are
    /// not JSON. The client adapter never distinguishes between them.
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Completion provider errors (API calls, malformed replies)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Conversation storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Session identifier contains characters that cannot name a record
    #[error("Invalid session id: {0}")]
    InvalidSessionId(String),

    /// Missing credentials for provider
    #[error("Missing credentials for provider: {0}")]
    MissingCredentials(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Config file is not valid YAML for [`crate::config::Config`]
    #[error("Failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for Chatdeck operations
///
/// Uses `anyhow::Error` so callers can attach context while the concrete
/// `ChatdeckError` stays recoverable via `downcast_ref`.
pub type Result<T> = anyhow::Result<T>;
