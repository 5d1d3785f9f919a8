//! Chat assistant: answers a message with pet context and records the exchange.
//!
//! Context comes from the request's `petContext` when given, otherwise from the
//! latest stored profile.

use crate::error::ApiError;
use crate::AppState;
use anicare_core::{validate_chat_request, ChatExchange, NewChatExchange};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub(crate) struct ChatReply {
    pub(crate) response: String,
}

/// POST /api/chat
pub(crate) async fn send_message(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Json(body) = body.map_err(|r| ApiError::malformed("chat message", r))?;
    let request = validate_chat_request(&body)?;

    let context = match request.pet_context {
        Some(ctx) => Some(ctx),
        None => latest_context(&state),
    };

    let response = state.chat.respond(&request.message, context.as_deref()).await;

    let exchange = NewChatExchange {
        session_id: request.session_id,
        message: request.message,
        response: response.clone(),
    };
    match state.store.append_chat_exchange(exchange) {
        Ok(saved) => tracing::debug!(
            target: "anicare::chat",
            session_id = %saved.session_id,
            exchange_id = saved.id,
            "Recorded chat exchange"
        ),
        Err(e) => tracing::warn!(target: "anicare::chat", error = %e, "Could not save chat exchange"),
    }

    Ok(Json(ChatReply { response }))
}

/// GET /api/chat/:session_id – the session's exchanges in submission order.
pub(crate) async fn history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<ChatExchange>>, ApiError> {
    let exchanges = state
        .store
        .chat_history(&session_id)
        .map_err(ApiError::store("Failed to read chat history"))?;
    Ok(Json(exchanges))
}

fn latest_context(state: &AppState) -> Option<String> {
    match state.store.latest_profile() {
        Ok(profile) => profile.map(|p| p.context_line()),
        Err(e) => {
            tracing::warn!(target: "anicare::chat", error = %e, "Could not read latest profile for chat context");
            None
        }
    }
}
