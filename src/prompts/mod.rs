//! System prompt for the chat service
//!
//! The built-in prompt can be replaced by pointing
//! `provider.system_prompt_file` at a text file.

use crate::config::ProviderConfig;
use crate::error::{ChatdeckError, Result};

/// Prompt used when no prompt file is configured
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a friendly, knowledgeable assistant chatting with a visitor.
Answer clearly and concisely. Use the earlier turns of the conversation as
context, and ask a short clarifying question when a request is ambiguous.
If you do not know something, say so instead of guessing.";

/// Resolves the system prompt for the configured provider
///
/// # Errors
///
/// Returns error if a configured prompt file cannot be read or is empty
///
/// # Examples
///
/// ```
/// use chatdeck::config::ProviderConfig;
/// use chatdeck::prompts::{load_system_prompt, DEFAULT_SYSTEM_PROMPT};
///
/// let prompt = load_system_prompt(&ProviderConfig::default()).unwrap();
/// assert_eq!(prompt, DEFAULT_SYSTEM_PROMPT);
/// ```
pub fn load_system_prompt(config: &ProviderConfig) -> Result<String> {
    let Some(path) = &config.system_prompt_file else {
        return Ok(DEFAULT_SYSTEM_PROMPT.to_string());
    };

    let prompt = std::fs::read_to_string(path).map_err(|e| {
        ChatdeckError::Config(format!(
            "Failed to read system prompt {}: {}",
            path.display(),
            e
        ))
    })?;

    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(ChatdeckError::Config(format!(
            "System prompt file {} is empty",
            path.display()
        ))
        .into());
    }

    tracing::debug!("Loaded system prompt from {}", path.display());
    Ok(prompt.to_string())
}
