//! Handler for the batch generation endpoint.
//!
//! Route: `POST /generate` -- accepts base64 images plus prompts and a
//! lora name, runs the batch pipeline, and returns the generated
//! images base64-encoded.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use versecraft_pipeline::{uploads, BatchError};

use crate::error::AppResult;
use crate::state::AppState;

/// Inbound batch request.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    /// Style modifier (lora) applied to every item of the batch.
    pub lora: String,
    /// One prompt per image, in order.
    pub prompts: Vec<String>,
    /// Base64-encoded input images, in order.
    pub images_base64: Vec<String>,
}

/// Batch response: base64 artifacts of the items that succeeded.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub images: Vec<String>,
}

/// POST /generate
///
/// The count check runs before any upload is written; afterwards the
/// images are saved under a fresh batch namespace and handed to the
/// orchestrator. Per-item failures are already absorbed there, so
/// this handler only surfaces whole-batch errors.
pub async fn generate(
    State(state): State<AppState>,
    Json(input): Json<GenerateRequest>,
) -> AppResult<Json<GenerateResponse>> {
    if input.images_base64.len() != input.prompts.len() {
        return Err(BatchError::InputMismatch {
            images: input.images_base64.len(),
            prompts: input.prompts.len(),
        }
        .into());
    }

    let batch_id = Uuid::new_v4();
    tracing::info!(
        %batch_id,
        items = input.prompts.len(),
        lora = %input.lora,
        "Received generation batch",
    );

    let image_paths =
        uploads::save_base64_images(&state.config.upload_dir, batch_id, &input.images_base64)?;

    let images = state
        .pipeline
        .process(&image_paths, &input.prompts, &input.lora)
        .await?;

    tracing::info!(%batch_id, succeeded = images.len(), "Batch finished");
    Ok(Json(GenerateResponse { images }))
}
