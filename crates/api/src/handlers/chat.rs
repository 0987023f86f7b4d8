//! Handler for the chat relay endpoint.
//!
//! Route: `POST /chat` -- forwards the conversation to the configured
//! completion API and returns the upstream JSON unchanged.

use axum::extract::State;
use axum::Json;
use serde_json::Value;

use crate::chat::ChatRequest;
use crate::error::AppResult;
use crate::state::AppState;

/// POST /chat
pub async fn chat(
    State(state): State<AppState>,
    Json(input): Json<ChatRequest>,
) -> AppResult<Json<Value>> {
    let response = state.chat.relay(&input).await?;
    Ok(Json(response))
}
