pub mod health;

use axum::routing::post;
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the application route tree.
///
/// ```text
/// GET  /health      service health
/// POST /generate    batch image generation
/// POST /chat        chat-completion relay
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .route("/generate", post(handlers::generate::generate))
        .route("/chat", post(handlers::chat::chat))
}
