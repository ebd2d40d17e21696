use async_trait::async_trait;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use chatdeck::error::{ChatdeckError, Result};
use chatdeck::providers::{Message, Provider};
use chatdeck::server::{cors_layer, router, AppState};
use chatdeck::storage::{ConversationStore, FileStore};

#[allow(dead_code)]
pub fn create_temp_store() -> (Arc<FileStore>, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let store = Arc::new(FileStore::new(tmp.path().join("memory")));
    (store, tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

#[allow(dead_code)]
/// Provider replying `echo: <last message>` and recording every prompt
#[derive(Clone, Default)]
pub struct EchoProvider {
    pub prompts: Arc<Mutex<Vec<Vec<Message>>>>,
}

#[allow(dead_code)]
impl EchoProvider {
    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Vec<Message> {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl Provider for EchoProvider {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        let last = messages.last().map(|m| m.content.as_str()).unwrap_or("");
        Ok(format!("echo: {}", last))
    }

    fn model(&self) -> String {
        "echo-model".to_string()
    }
}

#[allow(dead_code)]
/// Provider that always fails
#[derive(Clone, Default)]
pub struct FailingProvider;

#[async_trait]
impl Provider for FailingProvider {
    async fn complete(&self, _messages: &[Message]) -> Result<String> {
        Err(ChatdeckError::Provider("model unavailable".to_string()).into())
    }

    fn model(&self) -> String {
        "failing-model".to_string()
    }
}

#[allow(dead_code)]
pub fn app_with(store: Arc<dyn ConversationStore>, provider: Arc<dyn Provider>) -> axum::Router {
    let cors = cors_layer(&["http://localhost:3000".to_string()]).expect("valid origin");
    router(AppState::new(store, provider, "You are a test assistant."), cors)
}

/// Serves `app` on an ephemeral local port and returns its base URL
#[allow(dead_code)]
pub async fn spawn_server(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().expect("listener has an address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server failed");
    });
    format!("http://{}", addr)
}
