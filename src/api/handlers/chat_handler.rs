//! Chat API Handlers

use axum::{Json, extract::State, response::IntoResponse};
use tracing::{debug, warn};

use crate::{
    api::{app_state::AppState, dto::chat_dto::*},
    config::ResponseMode,
    error::AppError,
    models::turn::ChatTurn,
    security::moderation::moderate,
};

/// Answer one visitor message
///
/// POST /api/chatbot/chat
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.metrics.record_chat_request();

    let verdict = moderate(&request.message);
    if !verdict.allowed {
        warn!(
            "Message rejected by moderation ({}): {}",
            verdict.blocked_by.map(|b| b.code()).unwrap_or("unknown"),
            verdict.reason
        );
        state.metrics.record_rejection();
        return Err(AppError::Rejected(verdict.reason));
    }

    let reply = state.orchestrator.resolve(&request.message).await;
    debug!("Chat reply served from {}", reply.source);
    state.metrics.record_reply(
        reply.source,
        state.orchestrator.mode() == ResponseMode::Remote,
    );

    let turn = ChatTurn::bot_reply(request.message, reply.text);
    Ok(Json(ChatResponse::from(turn)))
}

/// Suggested questions in display order, as a bare JSON array
///
/// GET /api/chatbot/suggestions
pub async fn suggestions(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.orchestrator.suggested_questions())
}
