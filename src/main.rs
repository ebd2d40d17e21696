//! Chatdeck - reference chatbot service and terminal client
//!
#![doc = "Chatdeck - reference chatbot service and terminal client"]
#![doc = "Main entry point for the chatdeck binary."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use chatdeck::cli::{Cli, Commands};
use chatdeck::commands;
use chatdeck::config::Config;
use chatdeck::server;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Serve { .. } => {
            tracing::info!("Starting chat service");
            server::serve(config).await?;
            Ok(())
        }
        Commands::Chat { resume } => {
            tracing::info!("Starting interactive chat");
            if let Some(r) = &resume {
                tracing::debug!("Resuming session: {}", r);
            }
            commands::chat::run_chat(config, resume).await?;
            Ok(())
        }
        Commands::Sessions { json } => {
            commands::history::list_sessions(&config, json).await?;
            Ok(())
        }
        Commands::Show { id } => {
            commands::history::show_conversation(&config, &id).await?;
            Ok(())
        }
        Commands::Health => {
            commands::health::check_health(&config).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "chatdeck=debug" } else { "chatdeck=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
