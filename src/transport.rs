use async_trait::async_trait;

use crate::error::TransportError;
use crate::types::{Task, TaskId, TaskSpec};

/// The two remote operations the poller depends on.
///
/// Implementations authenticate with a credential fixed at construction and
/// return tasks already normalized into [`Task`]. Each call makes exactly one
/// outbound request. `submit` is not idempotent on the remote side.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Creates a background task from `spec`.
    async fn submit(&self, spec: &TaskSpec) -> Result<Task, TransportError>;

    /// Fetches the current state of a previously submitted task.
    async fn fetch(&self, id: &TaskId) -> Result<Task, TransportError>;
}
