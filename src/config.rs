//! Configuration management for Chatdeck
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{ChatdeckError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Main configuration structure for Chatdeck
///
/// One file configures both halves of the application: the client adapter
/// used by the terminal commands, and the chat service started by `serve`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Client adapter settings
    #[serde(default)]
    pub client: ClientConfig,
    /// Chat service settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Conversation storage settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Completion provider settings
    #[serde(default)]
    pub provider: ProviderConfig,
}

/// Client adapter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the chat service
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Optional request timeout in seconds. Requests never time out when unset.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_seconds: None,
        }
    }
}

/// Chat service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Origins allowed by the CORS layer
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

/// Conversation storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one `<session_id>.json` file per conversation.
    /// With S3 enabled, saves that the bucket rejects land here instead.
    #[serde(default = "default_memory_dir")]
    pub memory_dir: PathBuf,

    /// Keep conversations in the S3 bucket below instead of `memory_dir`
    #[serde(default)]
    pub use_s3: bool,

    /// S3 bucket settings, read only when `use_s3` is set
    #[serde(default)]
    pub s3: S3Config,
}

fn default_memory_dir() -> PathBuf {
    PathBuf::from("../memory")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            memory_dir: default_memory_dir(),
            use_s3: false,
            s3: S3Config::default(),
        }
    }
}

/// S3 bucket settings
///
/// Credentials are never stored here; they come from the standard
/// `AWS_*` environment variables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3Config {
    /// Bucket holding one `<session_id>.json` object per conversation
    #[serde(default)]
    pub bucket: String,

    /// Region override; `AWS_REGION` or `us-east-1` otherwise
    #[serde(default)]
    pub region: Option<String>,

    /// Endpoint override for S3-compatible services
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Completion provider configuration
///
/// Targets any OpenAI-compatible `/chat/completions` endpoint. The API key is
/// never stored in the file; it is read from `OPENAI_API_KEY`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the completion API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model name sent with each request
    #[serde(default = "default_model")]
    pub model: String,

    /// Optional file whose contents replace the built-in system prompt
    #[serde(default)]
    pub system_prompt_file: Option<PathBuf>,
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            system_prompt_file: None,
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ChatdeckError::Config(format!("Failed to read config file: {}", e)))?;
        let config = serde_yaml::from_str(&contents).map_err(ChatdeckError::Yaml)?;
        Ok(config)
    }

    fn apply_env_vars(&mut self) {
        if let Ok(api_url) = std::env::var("CHATDECK_API_URL") {
            self.client.api_url = api_url;
        }

        if let Ok(host) = std::env::var("CHATDECK_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("CHATDECK_PORT") {
            if let Ok(value) = port.parse() {
                self.server.port = value;
            } else {
                tracing::warn!("Invalid CHATDECK_PORT: {}", port);
            }
        }

        if let Ok(origins) = std::env::var("CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(memory_dir) = std::env::var("MEMORY_DIR") {
            self.storage.memory_dir = PathBuf::from(memory_dir);
        }

        if let Ok(use_s3) = std::env::var("USE_S3") {
            self.storage.use_s3 = use_s3.trim().eq_ignore_ascii_case("true");
        }

        if let Ok(bucket) = std::env::var("S3_BUCKET") {
            self.storage.s3.bucket = bucket;
        }

        if let Ok(endpoint) = std::env::var("S3_ENDPOINT") {
            self.storage.s3.endpoint = Some(endpoint);
        }

        if let Ok(model) = std::env::var("CHATDECK_MODEL") {
            self.provider.model = model;
        }

        if let Ok(api_base) = std::env::var("OPENAI_API_BASE") {
            self.provider.api_base = api_base;
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(api_url) = &cli.api_url {
            self.client.api_url = api_url.clone();
        }

        if let crate::cli::Commands::Serve { host, port } = &cli.command {
            if let Some(host) = host {
                self.server.host = host.clone();
            }
            if let Some(port) = port {
                self.server.port = *port;
            }
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        validate_http_url("client.api_url", &self.client.api_url)?;
        validate_http_url("provider.api_base", &self.provider.api_base)?;

        if self.client.timeout_seconds == Some(0) {
            return Err(ChatdeckError::Config(
                "client.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.server.host.trim().is_empty() {
            return Err(
                ChatdeckError::Config("server.host cannot be empty".to_string()).into(),
            );
        }

        if self.server.port == 0 {
            return Err(
                ChatdeckError::Config("server.port must be greater than 0".to_string()).into(),
            );
        }

        if self.server.cors_origins.is_empty() {
            return Err(ChatdeckError::Config(
                "server.cors_origins must contain at least one origin".to_string(),
            )
            .into());
        }

        if self.storage.memory_dir.as_os_str().is_empty() {
            return Err(
                ChatdeckError::Config("storage.memory_dir cannot be empty".to_string()).into(),
            );
        }

        if self.storage.use_s3 {
            if self.storage.s3.bucket.trim().is_empty() {
                return Err(ChatdeckError::Config(
                    "storage.s3.bucket is required when storage.use_s3 is enabled".to_string(),
                )
                .into());
            }
            if let Some(endpoint) = &self.storage.s3.endpoint {
                validate_http_url("storage.s3.endpoint", endpoint)?;
            }
        }

        if self.provider.model.trim().is_empty() {
            return Err(
                ChatdeckError::Config("provider.model cannot be empty".to_string()).into(),
            );
        }

        Ok(())
    }
}

fn validate_http_url(field: &str, value: &str) -> Result<()> {
    let parsed = Url::parse(value)
        .map_err(|e| ChatdeckError::Config(format!("{} is not a valid URL: {}", field, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ChatdeckError::Config(format!(
            "{} must use http or https, got {}",
            field, other
        ))
        .into()),
    }
}
