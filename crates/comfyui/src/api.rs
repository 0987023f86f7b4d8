//! REST client for the execution engine's HTTP endpoints.
//!
//! Wraps workflow submission (`POST` to the configured submit URL) and
//! history retrieval (`GET /history/{prompt_id}`) using [`reqwest`].

use std::time::Duration;

use indexmap::IndexMap;
use serde::Deserialize;
use versecraft_core::workflow::ConcreteJob;

/// HTTP client for a single execution engine instance.
pub struct ComfyUIApi {
    client: reqwest::Client,
    submit_url: String,
    base_url: String,
}

/// Response returned by the engine after successfully queuing a job.
///
/// `prompt_id` is optional at the wire level so its absence can be
/// reported as [`SubmissionError::MissingPromptId`] rather than a
/// generic decode failure.
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    prompt_id: Option<String>,
}

/// One entry of the engine's history store, keyed by prompt id.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEntry {
    /// Output node id to its reported artifacts. Order matters: the
    /// first node with an image wins the tie-break.
    #[serde(default)]
    pub outputs: IndexMap<String, NodeOutput>,
}

/// Artifacts reported by a single output node.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeOutput {
    #[serde(default)]
    pub images: Vec<ImageRef>,
}

/// Reference to one generated image file on the engine host.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageRef {
    pub filename: String,
    #[serde(default)]
    pub subfolder: String,
    #[serde(rename = "type", default)]
    pub folder_type: String,
}

/// Full history response: prompt id to entry.
pub type History = IndexMap<String, HistoryEntry>;

impl HistoryEntry {
    /// First reported artifact filename, if any output node has one.
    ///
    /// When several nodes (or several images) exist, index 0 of the
    /// first reporting node is the documented tie-break.
    pub fn first_output_filename(&self) -> Option<&str> {
        self.outputs
            .values()
            .find(|output| !output.images.is_empty())
            .map(|output| output.images[0].filename.as_str())
    }
}

/// Errors from job submission.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The engine returned a non-2xx status code.
    #[error("Engine rejected job ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The engine's response body lacked the job identifier.
    #[error("Invalid engine response: missing prompt_id")]
    MissingPromptId,
}

/// Errors from the history/status query path.
#[derive(Debug, thiserror::Error)]
pub enum PollingError {
    /// The HTTP request itself failed. Read timeouts are transient and
    /// retried by the poller; everything else is terminal.
    #[error("History request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The engine returned a non-2xx status code.
    #[error("History query failed ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The configured attempt cap was exhausted before the job produced
    /// an artifact.
    #[error("Job did not complete within {attempts} status queries")]
    DeadlineExceeded {
        /// Number of queries issued before giving up.
        attempts: u32,
    },
}

impl ComfyUIApi {
    /// Create a new API client.
    ///
    /// * `submit_url` - full submission endpoint, e.g. `http://host:8188/api/prompt`.
    /// * `base_url`   - engine base URL for the history API, e.g. `http://host:8188`.
    pub fn new(submit_url: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            submit_url: submit_url.into(),
            base_url: base_url.into(),
        }
    }

    /// Engine base URL used for history queries.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit a concrete job for execution.
    ///
    /// Sends the job as `{"prompt": <job>}` and returns the
    /// server-assigned prompt id. No retry at this layer; a failure is
    /// terminal for the item.
    pub async fn submit_workflow(&self, job: &ConcreteJob) -> Result<String, SubmissionError> {
        let body = serde_json::json!({ "prompt": job });

        let response = self.client.post(&self.submit_url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(SubmissionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let submitted = response.json::<SubmitResponse>().await?;
        submitted.prompt_id.ok_or(SubmissionError::MissingPromptId)
    }

    /// Query the history store for a prompt.
    ///
    /// `timeout` bounds the whole request; a prompt that has not
    /// finished yet comes back as an empty map, not an error.
    pub async fn get_history(
        &self,
        prompt_id: &str,
        timeout: Duration,
    ) -> Result<History, PollingError> {
        let response = self
            .client
            .get(format!("{}/history/{}", self.base_url, prompt_id))
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(PollingError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<History>().await?)
    }
}
