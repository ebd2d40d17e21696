//! Chatdeck - reference chatbot library
//!
//! This library provides both halves of a small conversational AI product:
//! a chat service that persists conversations and asks a completion model
//! for replies, and a client that talks to that service and keeps the
//! client-side conversation state.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `api`: Wire types shared by the service and the client
//! - `client`: HTTP adapter normalizing service payloads into domain types
//! - `state`: Conversation state store (reducer plus effect runtime)
//! - `server`: axum chat service
//! - `storage`: Per-session conversation persistence
//! - `providers`: Completion provider abstraction and OpenAI implementation
//! - `prompts`: System prompt resolution
//! - `commands`: Terminal front end for the CLI
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use chatdeck::client::{ChatApi, ChatClient};
//! use chatdeck::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let client = ChatClient::new(&config.client)?;
//!     let reply = client.send_message("Hello!", None).await?;
//!     println!("{}", reply.response_text);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod prompts;
pub mod providers;
pub mod server;
pub mod state;
pub mod storage;

// Re-export commonly used types
pub use client::{ChatApi, ChatClient};
pub use config::Config;
pub use error::{ChatdeckError, Result};
pub use state::{Action, ChatState, Effect};

#[cfg(test)]
pub mod test_utils;
