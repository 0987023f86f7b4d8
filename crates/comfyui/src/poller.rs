//! Completion poller for submitted jobs.
//!
//! One poller runs per prompt id. It cycles through a small state
//! machine: **Polling** (query history, sleep, repeat), **Done**
//! (artifact filename observed, returned as `Ok`), and **Failed**
//! (terminal error, returned as `Err`). A read timeout on the status
//! query is treated as transient: the poller stays in Polling and backs
//! off for longer before the next query.

use std::time::Duration;

use uuid::Uuid;

use crate::api::{ComfyUIApi, PollingError};

/// Steady-state delay between history queries.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Longer delay applied after a transient read timeout.
const DEFAULT_TIMEOUT_BACKOFF: Duration = Duration::from_secs(5);
/// Bound on each individual history request.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Tuning knobs for [`wait_for_completion`].
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Per-query HTTP timeout.
    pub request_timeout: Duration,
    /// Delay between queries while the job is still running.
    pub poll_interval: Duration,
    /// Delay after a transient read timeout.
    pub timeout_backoff: Duration,
    /// Optional cap on the number of status queries. `None` retries
    /// forever, matching the engine's own lack of a job deadline.
    pub max_attempts: Option<u32>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout_backoff: DEFAULT_TIMEOUT_BACKOFF,
            max_attempts: None,
        }
    }
}

/// Poll the history store until the job reports an output artifact.
///
/// Returns the first reported artifact filename (index 0 of the first
/// output node -- documented tie-break, see
/// [`HistoryEntry::first_output_filename`](crate::api::HistoryEntry::first_output_filename)).
///
/// State transitions:
/// - history contains the prompt id with an image reference -> Done;
/// - history lacks the prompt id or an image -> sleep
///   `poll_interval`, re-poll;
/// - request timed out -> sleep `timeout_backoff`, re-poll;
/// - any other I/O or protocol error -> Failed with the underlying
///   [`PollingError`];
/// - `max_attempts` exhausted -> Failed with
///   [`PollingError::DeadlineExceeded`].
///
/// The sleeps yield the task rather than blocking the executor, so
/// concurrent batches keep making progress.
pub async fn wait_for_completion(
    api: &ComfyUIApi,
    prompt_id: &str,
    task_id: Uuid,
    config: &PollerConfig,
) -> Result<String, PollingError> {
    let mut attempts: u32 = 0;

    loop {
        if let Some(max) = config.max_attempts {
            if attempts >= max {
                tracing::error!(%task_id, prompt_id, attempts, "Gave up polling for completion");
                return Err(PollingError::DeadlineExceeded { attempts });
            }
        }
        attempts += 1;

        match api.get_history(prompt_id, config.request_timeout).await {
            Ok(history) => {
                if let Some(filename) = history
                    .get(prompt_id)
                    .and_then(|entry| entry.first_output_filename())
                {
                    tracing::info!(%task_id, prompt_id, filename, "Job completed");
                    return Ok(filename.to_string());
                }
                tokio::time::sleep(config.poll_interval).await;
            }
            Err(PollingError::Request(e)) if e.is_timeout() => {
                tracing::warn!(%task_id, prompt_id, "History query timed out, retrying");
                tokio::time::sleep(config.timeout_backoff).await;
            }
            Err(e) => {
                tracing::error!(%task_id, prompt_id, error = %e, "Polling failed");
                return Err(e);
            }
        }
    }
}
