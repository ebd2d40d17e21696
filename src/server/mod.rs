//! Chat service
//!
//! An axum application exposing `/chat`, `/sessions`,
//! `/conversation/:session_id`, `/health` and `/`. Handlers share an
//! [`AppState`] holding the conversation store and the completion provider.

mod handlers;

use crate::api::ErrorResponse;
use crate::config::Config;
use crate::error::{ChatdeckError, Result};
use crate::prompts::load_system_prompt;
use crate::providers::{create_provider, Provider};
use crate::storage::{create_store, ConversationStore};
use anyhow::Context;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// State shared by all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ConversationStore>,
    pub provider: Arc<dyn Provider>,
    pub system_prompt: Arc<str>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        provider: Arc<dyn Provider>,
        system_prompt: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            store,
            provider,
            system_prompt: system_prompt.into(),
        }
    }
}

/// Handler error carrying the status and `{ "detail": ... }` body
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        let status = match err.downcast_ref::<ChatdeckError>() {
            Some(ChatdeckError::InvalidSessionId(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            detail: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed: {}", self.detail);
        } else {
            tracing::warn!("Request rejected: {}", self.detail);
        }
        (self.status, Json(ErrorResponse { detail: self.detail })).into_response()
    }
}

/// Builds the CORS layer for the configured origins
///
/// A `*` entry allows any origin.
///
/// # Errors
///
/// Returns error if an origin is not a valid header value
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let values = origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|e| {
                    ChatdeckError::Config(format!("Invalid CORS origin {}: {}", origin, e))
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        AllowOrigin::list(values)
    };

    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .allow_credentials(false))
}

/// Builds the application router
pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/chat", post(handlers::chat))
        .route("/sessions", get(handlers::list_sessions))
        .route("/conversation/:session_id", get(handlers::get_conversation))
        .layer(cors)
        .with_state(state)
}

/// Run the chat service until Ctrl-C
///
/// # Errors
///
/// Returns error if the provider cannot be created, the prompt cannot be
/// loaded, or the listener cannot bind
pub async fn serve(config: Config) -> Result<()> {
    let store = create_store(&config.storage)?;
    let provider = create_provider(&config.provider)?;
    let system_prompt = load_system_prompt(&config.provider)?;
    let cors = cors_layer(&config.server.cors_origins)?;

    let store_kind = store.kind();
    let app = router(AppState::new(store, provider, system_prompt), cors);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = bind(&addr).await?;

    tracing::info!("Chat service listening on {} ({} storage)", addr, store_kind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ChatdeckError::Io)?;

    tracing::info!("Chat service stopped");
    Ok(())
}

async fn bind(addr: &str) -> Result<tokio::net::TcpListener> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(ChatdeckError::Io)
        .with_context(|| format!("Failed to bind {}", addr))?;
    Ok(listener)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
