//! OpenAI-compatible provider implementation for Chatdeck
//!
//! Calls `POST {api_base}/chat/completions` and returns the text of the
//! first choice. Works against OpenAI itself and any server exposing the
//! same endpoint.

use crate::config::ProviderConfig;
use crate::error::{ChatdeckError, Result};
use crate::providers::{Message, Provider};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// OpenAI chat completions provider
///
/// # Examples
///
/// ```no_run
/// use chatdeck::config::ProviderConfig;
/// use chatdeck::providers::{Message, OpenAiProvider, Provider};
///
/// # async fn example() -> chatdeck::error::Result<()> {
/// let provider = OpenAiProvider::new(ProviderConfig::default(), "sk-test")?;
/// let reply = provider.complete(&[Message::user("Hello!")]).await?;
/// # Ok(())
/// # }
/// ```
pub struct OpenAiProvider {
    client: Client,
    config: ProviderConfig,
    api_key: String,
}

/// Request body for `/chat/completions`
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
}

/// Response body of `/chat/completions`
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiProvider {
    /// Create a new provider instance
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: ProviderConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .user_agent(concat!("chatdeck/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ChatdeckError::Provider(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!(
            "Initialized OpenAI provider: api_base={}, model={}",
            config.api_base,
            config.model
        );

        Ok(Self {
            client,
            config,
            api_key: api_key.into(),
        })
    }

    /// Create a provider reading the key from `OPENAI_API_KEY`
    ///
    /// # Errors
    ///
    /// Returns `MissingCredentials` if the variable is unset or empty
    pub fn from_env(config: ProviderConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ChatdeckError::MissingCredentials("openai (OPENAI_API_KEY)".to_string()))?;
        Self::new(config, api_key)
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let request = CompletionRequest {
            model: &self.config.model,
            messages,
        };

        tracing::debug!("Sending completion request: {} messages", messages.len());

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Completion request failed: {}", e);
                ChatdeckError::Provider(format!("Completion request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!("Completion API returned error {}: {}", status, error_text);
            return Err(ChatdeckError::Provider(format!(
                "Completion API returned error {}: {}",
                status, error_text
            ))
            .into());
        }

        let completion: CompletionResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse completion response: {}", e);
            ChatdeckError::Provider(format!("Failed to parse completion response: {}", e))
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ChatdeckError::Provider("Completion response contained no text".to_string()).into()
            })
    }

    fn model(&self) -> String {
        self.config.model.clone()
    }
}
