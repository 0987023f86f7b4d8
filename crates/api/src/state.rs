use std::sync::Arc;

use versecraft_pipeline::BatchPipeline;

use crate::chat::ChatClient;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`). Nothing in
/// here is mutable after startup.
#[derive(Clone)]
pub struct AppState {
    /// Immutable server configuration.
    pub config: Arc<ServerConfig>,
    /// Batch generation pipeline (engine client + orchestrator).
    pub pipeline: Arc<BatchPipeline>,
    /// Chat-completion upstream client.
    pub chat: Arc<ChatClient>,
}
