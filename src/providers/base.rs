//! Base provider trait and common types for Chatdeck
//!
//! This module defines the trait the chat service uses to obtain assistant
//! replies, along with the message type passed to it.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Message structure for a completion request
///
/// Represents one turn of the prompt sent to the model: the system prompt,
/// prior history, or the new user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (system, user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl Message {
    /// Creates a message with an arbitrary role
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Creates a new user message
    ///
    /// # Examples
    ///
    /// ```
    /// use chatdeck::providers::Message;
    ///
    /// let msg = Message::user("Hello, assistant!");
    /// assert_eq!(msg.role, "user");
    /// ```
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    /// Creates a new system message
    ///
    /// # Examples
    ///
    /// ```
    /// use chatdeck::providers::Message;
    ///
    /// let msg = Message::system("You are a helpful assistant");
    /// assert_eq!(msg.role, "system");
    /// ```
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }
}

/// Source of assistant replies
#[async_trait]
pub trait Provider: Send + Sync {
    /// Produces the assistant reply for a full prompt
    ///
    /// # Errors
    ///
    /// Returns error if the API call fails or the reply carries no text
    async fn complete(&self, messages: &[Message]) -> Result<String>;

    /// Model name reported by `/` and `/health`
    fn model(&self) -> String;
}
