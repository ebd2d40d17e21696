//! Provider module for Chatdeck
//!
//! This module contains the completion provider abstraction and the
//! OpenAI-compatible implementation the chat service uses.

pub mod base;
pub mod openai;

pub use base::{Message, Provider};
pub use openai::OpenAiProvider;

use crate::config::ProviderConfig;
use crate::error::Result;
use std::sync::Arc;

/// Create the configured provider
///
/// # Errors
///
/// Returns error if credentials are missing or initialization fails
pub fn create_provider(config: &ProviderConfig) -> Result<Arc<dyn Provider>> {
    Ok(Arc::new(OpenAiProvider::from_env(config.clone())?))
}
