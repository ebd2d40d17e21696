use super::{ApiError, AppState};
use crate::api::{
    ChatRequest, ChatResponse, ConversationResponse, HealthResponse, RootResponse,
    SessionSummary, SessionsResponse, WireMessage,
};
use crate::providers::Message;
use crate::storage::{validate_session_id, StoredMessage, StoredSession};
use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

pub(super) async fn root(State(state): State<AppState>) -> Json<RootResponse> {
    Json(RootResponse {
        message: "AI chatbot".to_string(),
        memory_enabled: true,
        storage: state.store.kind().to_string(),
        ai_model: state.provider.model(),
    })
}

pub(super) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        storage: state.store.kind().to_string(),
        model: state.provider.model(),
    })
}

pub(super) async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let session_id = match request.session_id.filter(|id| !id.is_empty()) {
        Some(id) => {
            validate_session_id(&id)?;
            id
        }
        None => Uuid::new_v4().to_string(),
    };

    let mut conversation = state.store.load(&session_id).await?;
    tracing::info!(
        "Chat turn for session {} ({} prior messages)",
        session_id,
        conversation.len()
    );

    let mut prompt = Vec::with_capacity(conversation.len() + 2);
    prompt.push(Message::system(state.system_prompt.as_ref()));
    prompt.extend(
        conversation
            .iter()
            .map(|m| Message::new(m.role.clone(), m.content.clone())),
    );
    prompt.push(Message::user(request.message.clone()));

    let reply = state.provider.complete(&prompt).await?;

    conversation.push(StoredMessage::now("user", request.message));
    conversation.push(StoredMessage::now("assistant", reply.clone()));
    state.store.save(&session_id, &conversation).await?;

    Ok(Json(ChatResponse {
        response: reply,
        session_id: Some(session_id),
    }))
}

pub(super) async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<SessionsResponse>, ApiError> {
    let sessions = state
        .store
        .list_sessions()
        .await?
        .into_iter()
        .map(SessionSummary::from)
        .collect();
    Ok(Json(SessionsResponse { sessions }))
}

pub(super) async fn get_conversation(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ConversationResponse>, ApiError> {
    let messages = state
        .store
        .load(&session_id)
        .await?
        .into_iter()
        .map(WireMessage::from)
        .collect();
    Ok(Json(ConversationResponse {
        session_id,
        messages,
    }))
}

impl From<StoredSession> for SessionSummary {
    fn from(session: StoredSession) -> Self {
        SessionSummary {
            session_id: session.session_id,
            message_count: Some(session.message_count),
            last_message: session.last_message,
            created_at: session.created_at,
            last_message_timestamp: session.last_message_timestamp,
        }
    }
}

impl From<StoredMessage> for WireMessage {
    fn from(message: StoredMessage) -> Self {
        WireMessage {
            id: None,
            content: Some(message.content),
            role: Some(message.role),
            timestamp: message.timestamp,
        }
    }
}
