//! Effect runtime for the state store
//!
//! Executes the reducer's effects against a [`ChatApi`] one at a time,
//! awaiting each before the next, and feeds every outcome back through
//! [`update`].

use super::{update, Action, ChatState, Effect};
use crate::client::ChatApi;
use std::collections::VecDeque;

/// Applies `action` and every action produced by the resulting effects
pub async fn dispatch(state: &mut ChatState, api: &dyn ChatApi, action: Action) {
    let mut pending = VecDeque::from([action]);
    while let Some(action) = pending.pop_front() {
        for effect in update(state, action) {
            pending.push_back(perform(api, effect).await);
        }
    }
}

/// Runs one effect and converts its outcome into the matching action
pub async fn perform(api: &dyn ChatApi, effect: Effect) -> Action {
    match effect {
        Effect::FetchSessions => {
            Action::SessionsLoaded(api.fetch_sessions().await.map_err(|e| e.to_string()))
        }
        Effect::FetchConversation(session_id) => {
            let result = api
                .fetch_conversation(&session_id)
                .await
                .map_err(|e| e.to_string());
            Action::ConversationLoaded { session_id, result }
        }
        Effect::SendMessage {
            content,
            session_id,
        } => Action::MessageSent(
            api.send_message(&content, session_id.as_deref())
                .await
                .map_err(|e| e.to_string()),
        ),
    }
}
