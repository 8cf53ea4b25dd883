use axum::extract::State;
use axum::Json;

use crate::models::{ChatRequest, ChatResponse};
use crate::service::chat_service::ChatService;

/// POST `/api/chat` — relays one message; every outcome is HTTP 200 with an envelope.
pub async fn chat_handler(
    State(svc): State<ChatService>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    Json(svc.relay(request).await)
}
