//! The batch orchestrator.
//!
//! Sequences template instantiation, submission, and completion
//! polling over every item of a batch, strictly in input order. Items
//! are independent: a failure at any stage is logged with the task id
//! and the item is dropped from the result, never aborting the rest of
//! the batch. The only whole-batch abort is the pre-flight
//! image/prompt count check.

use std::path::{Path, PathBuf};

use uuid::Uuid;
use versecraft_comfyui::{wait_for_completion, ComfyUIApi, PollerConfig};
use versecraft_core::workflow::WorkflowTemplate;

use crate::uploads::encode_artifact;

/// File-system and poller settings for one pipeline instance.
///
/// Constructed once at startup from the server configuration and
/// read-only afterwards.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Path of the workflow template JSON.
    pub template_path: PathBuf,
    /// Directory the engine writes generated artifacts to.
    pub output_dir: PathBuf,
    /// Completion poller tuning.
    pub poller: PollerConfig,
}

/// Whole-batch failures. Everything else is isolated per item.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// The image and prompt lists have different lengths.
    #[error("Image count does not match prompt count: images={images}, prompts={prompts}")]
    InputMismatch { images: usize, prompts: usize },
}

/// Drives the generate pipeline for whole batches.
pub struct BatchPipeline {
    api: ComfyUIApi,
    config: PipelineConfig,
}

impl BatchPipeline {
    pub fn new(api: ComfyUIApi, config: PipelineConfig) -> Self {
        Self { api, config }
    }

    /// Process one batch of (image path, prompt) pairs with a shared
    /// lora, returning the base64-encoded artifacts of the items that
    /// succeeded, in input order.
    ///
    /// The template is loaded once per batch; if it cannot be read,
    /// every item fails validation and the result is empty. Failed
    /// items leave no placeholder in the returned list.
    pub async fn process(
        &self,
        image_paths: &[PathBuf],
        prompts: &[String],
        lora_name: &str,
    ) -> Result<Vec<String>, BatchError> {
        if image_paths.len() != prompts.len() {
            return Err(BatchError::InputMismatch {
                images: image_paths.len(),
                prompts: prompts.len(),
            });
        }

        let template = match WorkflowTemplate::load(&self.config.template_path) {
            Ok(template) => Some(template),
            Err(e) => {
                tracing::error!(
                    template = %self.config.template_path.display(),
                    error = %e,
                    "Failed to load workflow template; every item will fail validation",
                );
                None
            }
        };

        let mut results = Vec::new();
        for (item, (image_path, prompt)) in image_paths.iter().zip(prompts).enumerate() {
            let task_id = Uuid::new_v4();
            tracing::info!(item, %task_id, "Processing batch item");

            let Some(template) = template.as_ref() else {
                tracing::warn!(item, %task_id, "Skipping item: workflow template unavailable");
                continue;
            };

            match self
                .process_item(template, image_path, prompt, lora_name, task_id)
                .await
            {
                Some(encoded) => results.push(encoded),
                None => continue,
            }
        }

        Ok(results)
    }

    /// Run one item through instantiate -> submit -> poll -> encode.
    ///
    /// Returns `None` on failure at any stage; the failure has already
    /// been logged with the task id by then.
    async fn process_item(
        &self,
        template: &WorkflowTemplate,
        image_path: &Path,
        prompt: &str,
        lora_name: &str,
        task_id: Uuid,
    ) -> Option<String> {
        let job = match template.instantiate(image_path, prompt, lora_name, task_id) {
            Ok(job) => job,
            Err(e) => {
                tracing::warn!(%task_id, error = %e, "Workflow instantiation failed");
                return None;
            }
        };

        let prompt_id = match self.api.submit_workflow(&job).await {
            Ok(prompt_id) => prompt_id,
            Err(e) => {
                tracing::warn!(%task_id, error = %e, "Job submission failed");
                return None;
            }
        };
        tracing::info!(%task_id, %prompt_id, "Job submitted");

        let filename =
            match wait_for_completion(&self.api, &prompt_id, task_id, &self.config.poller).await {
                Ok(filename) => filename,
                Err(e) => {
                    tracing::warn!(%task_id, %prompt_id, error = %e, "Polling failed");
                    return None;
                }
            };

        match encode_artifact(&self.config.output_dir, &filename) {
            Ok(encoded) => Some(encoded),
            Err(e) => {
                tracing::warn!(
                    %task_id,
                    %filename,
                    error = %e,
                    "Generated artifact not readable",
                );
                None
            }
        }
    }
}
