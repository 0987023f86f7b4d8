//! HTTP client for a ComfyUI-style execution engine.
//!
//! Wraps workflow submission and the polling-based history API, and
//! provides the completion poller that waits for a job's output
//! artifact to appear.

pub mod api;
pub mod poller;

pub use api::{ComfyUIApi, PollingError, SubmissionError};
pub use poller::{wait_for_completion, PollerConfig};
