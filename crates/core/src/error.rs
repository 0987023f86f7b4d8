use std::path::PathBuf;

/// Errors raised while loading or parameterizing a workflow template.
///
/// All variants are per-item failures: the batch orchestrator logs them
/// with the task identifier and moves on to the next item.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// The template file could not be read.
    #[error("Failed to read workflow template: {0}")]
    Io(#[from] std::io::Error),

    /// The template file is not valid workflow JSON.
    #[error("Failed to parse workflow template: {0}")]
    Parse(#[from] serde_json::Error),

    /// A node kind required by the pipeline is absent from the template.
    #[error("Workflow is missing required node: {class_type}")]
    MissingNode {
        /// ComfyUI class type of the missing node.
        class_type: &'static str,
    },

    /// The input image does not exist on disk at instantiation time.
    #[error("Image file not found: {path}")]
    ImageNotFound { path: PathBuf },
}
