//! Command-line interface definition for Chatdeck
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands to run the chat service and to talk to it.

use clap::{Parser, Subcommand};

/// Chatdeck - reference chatbot service and terminal client
///
/// Run the conversational API with `serve`, or talk to a running
/// service with `chat`, `sessions`, `show`, and `health`.
#[derive(Parser, Debug, Clone)]
#[command(name = "chatdeck")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override the chat service base URL used by client commands
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Chatdeck
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the chat service
    Serve {
        /// Address to bind (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Start an interactive chat against the service
    Chat {
        /// Open an existing session before the first prompt
        #[arg(short, long)]
        resume: Option<String>,
    },

    /// List known sessions, most recent first
    Sessions {
        /// Print the normalized sessions as JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print the transcript of one session
    Show {
        /// Session identifier
        id: String,
    },

    /// Check that the service is alive
    Health,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            verbose: false,
            api_url: None,
            command: Commands::Health,
        }
    }
}
