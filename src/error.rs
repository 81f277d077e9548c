use std::time::Duration;

use crate::types::TaskId;

/// Failures raised while talking to the Interactions API.
///
/// Every variant is a "request failed" outcome from the caller's point of view:
/// the remote call did not yield a usable task.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Network request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API request failed with status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Failed to parse API response: {detail}")]
    MalformedResponse { detail: String },
    #[error("URL parsing failed: {0}")]
    UrlParseFailed(#[from] url::ParseError),
    #[error("Credential cannot be used as a request header")]
    InvalidCredential,
}

/// Terminal failure of a single research run.
#[derive(Debug, thiserror::Error)]
pub enum ResearchError {
    #[error("Task submission failed (transport): {0}")]
    SubmissionFailed(#[source] TransportError),
    #[error("Polling task {task_id} failed (transport): {source}")]
    PollingFailed {
        task_id: TaskId,
        #[source]
        source: TransportError,
    },
    #[error("Remote task failed after {}s: {detail}", .elapsed.as_secs())]
    RemoteTaskFailed { detail: String, elapsed: Duration },
    #[error("Remote task {task_id} completed without any output text")]
    EmptyOutput { task_id: TaskId },
    #[error("Gave up waiting for task {task_id} after {}s (local deadline)", .elapsed.as_secs())]
    Timeout { task_id: TaskId, elapsed: Duration },
    #[error("Waiting for task {task_id} was cancelled")]
    Cancelled { task_id: TaskId },
}

/// Startup configuration problems, reported before any request is made.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("GEMINI_API_KEY is missing. Please set it in the environment or your .env file.")]
    MissingCredential,
}
