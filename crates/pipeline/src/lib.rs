//! Batch orchestration for the generation pipeline.
//!
//! Drives template instantiation, job submission, and completion
//! polling item by item, isolating per-item failures so one bad item
//! never aborts the rest of the batch. Also hosts the upload/artifact
//! file helpers used by the HTTP layer.

pub mod batch;
pub mod uploads;

pub use batch::{BatchError, BatchPipeline, PipelineConfig};
pub use uploads::UploadError;
