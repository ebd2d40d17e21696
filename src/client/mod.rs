//! Client adapter for the chat service
//!
//! Issues HTTP requests to the chat service and normalizes the replies into
//! the view model in [`types`]. There is no retry and no caching: every call
//! is one request, and any transport failure, non-success status, or
//! non-JSON body fails the call with [`ChatdeckError::RequestFailed`].

pub mod normalize;
pub mod types;

pub use types::{ChatReply, Conversation, Message, Role, Session};

use crate::api::{
    ChatRequest, ChatResponse, ConversationPayload, HealthResponse, SessionsPayload,
};
use crate::config::ClientConfig;
use crate::error::{ChatdeckError, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Operations the conversation state store needs from the service
///
/// [`ChatClient`] is the HTTP implementation; the trait lets the state
/// runtime be driven by an in-memory double.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Sends a user message, creating a session when `session_id` is `None`
    async fn send_message(&self, content: &str, session_id: Option<&str>) -> Result<ChatReply>;

    /// Lists known sessions in the order the service returns them
    async fn fetch_sessions(&self) -> Result<Vec<Session>>;

    /// Loads the full history of one session
    async fn fetch_conversation(&self, session_id: &str) -> Result<Conversation>;
}

/// HTTP client for the chat service
///
/// # Examples
///
/// ```no_run
/// use chatdeck::client::{ChatApi, ChatClient};
/// use chatdeck::config::ClientConfig;
///
/// # async fn example() -> chatdeck::error::Result<()> {
/// let client = ChatClient::new(&ClientConfig::default())?;
/// let reply = client.send_message("Hello!", None).await?;
/// println!("{} (session {})", reply.response_text, reply.session_id);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: Client,
    base_url: Url,
}

impl ChatClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns error if the base URL does not parse or the HTTP client
    /// cannot be built
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = Url::parse(&config.api_url).map_err(|e| {
            ChatdeckError::Config(format!("Invalid API URL {}: {}", config.api_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ChatdeckError::Config(format!(
                "API URL cannot be used as a base: {}",
                config.api_url
            ))
            .into());
        }

        let mut builder = Client::builder().user_agent(concat!("chatdeck/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ChatdeckError::Config(format!("Failed to create HTTP client: {}", e)))?;

        tracing::debug!("Initialized chat client: base_url={}", base_url);

        Ok(Self { client, base_url })
    }

    /// Base URL of the chat service
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Calls `GET /health`
    ///
    /// # Errors
    ///
    /// Returns `RequestFailed` if the service is unreachable or unhealthy
    pub async fn health(&self) -> Result<HealthResponse> {
        let url = self.endpoint(&["health"])?;
        let body = self.get_json(url, "health check").await?;
        Ok(decode_or_default(body, "health"))
    }

    /// Joins path segments onto the base URL, percent-encoding each one
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ChatdeckError::Config(format!("API URL cannot be used as a base: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json(&self, url: Url, operation: &str) -> Result<Value> {
        tracing::debug!("GET {} ({})", url, operation);

        let response = self.client.get(url).send().await.map_err(|e| {
            tracing::error!("{} request failed: {}", operation, e);
            ChatdeckError::RequestFailed(format!("{} failed: {}", operation, e))
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("{} returned status {}", operation, status);
            return Err(ChatdeckError::RequestFailed(format!(
                "{} failed with status {}",
                operation, status
            ))
            .into());
        }

        response.json::<Value>().await.map_err(|e| {
            tracing::error!("{} returned an unreadable body: {}", operation, e);
            ChatdeckError::RequestFailed(format!("{} failed: {}", operation, e)).into()
        })
    }
}

/// Decodes a JSON body, substituting the default when the shape is wrong
fn decode_or_default<T: DeserializeOwned + Default>(body: Value, what: &str) -> T {
    serde_json::from_value(body).unwrap_or_else(|e| {
        tracing::warn!("Unexpected {} payload shape ({}); using defaults", what, e);
        T::default()
    })
}

#[async_trait]
impl ChatApi for ChatClient {
    async fn send_message(&self, content: &str, session_id: Option<&str>) -> Result<ChatReply> {
        let url = self.endpoint(&["chat"])?;
        let request = ChatRequest {
            message: content.to_string(),
            session_id: session_id.map(str::to_string),
        };

        tracing::debug!(
            "POST {} ({} chars, session={:?})",
            url,
            request.message.len(),
            request.session_id
        );

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Send request failed: {}", e);
                ChatdeckError::RequestFailed(format!("send failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("Send returned status {}", status);
            return Err(ChatdeckError::RequestFailed(format!(
                "send failed with status {}",
                status
            ))
            .into());
        }

        let reply: ChatResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse chat response: {}", e);
            ChatdeckError::RequestFailed(format!("send failed: {}", e))
        })?;

        let session_id = reply
            .session_id
            .filter(|id| !id.is_empty())
            .or(request.session_id)
            .ok_or_else(|| {
                ChatdeckError::RequestFailed("send failed: reply carried no session id".to_string())
            })?;

        Ok(ChatReply {
            response_text: reply.response,
            session_id,
        })
    }

    async fn fetch_sessions(&self) -> Result<Vec<Session>> {
        let url = self.endpoint(&["sessions"])?;
        let body = self.get_json(url, "load history").await?;
        let payload: SessionsPayload = decode_or_default(body, "sessions");
        let sessions = normalize::normalize_sessions(payload, Utc::now());
        tracing::debug!("Loaded {} sessions", sessions.len());
        Ok(sessions)
    }

    async fn fetch_conversation(&self, session_id: &str) -> Result<Conversation> {
        let url = self.endpoint(&["conversation", session_id])?;
        let body = self.get_json(url, "load conversation").await?;
        let payload: ConversationPayload = decode_or_default(body, "conversation");
        let conversation = normalize::normalize_conversation(session_id, payload, Utc::now());
        tracing::debug!(
            "Loaded conversation {} with {} messages",
            conversation.session_id,
            conversation.messages.len()
        );
        Ok(conversation)
    }
}
