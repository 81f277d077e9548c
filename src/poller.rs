//! Drives one background task from submission to a terminal outcome.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::ResearchError;
use crate::transport::Transport;
use crate::types::{Status, TaskId, TaskSpec};

/// Fixed delay between status checks of a task that is still running.
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Source of the current time for elapsed-time reporting and deadlines.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Suspends the poll loop between status checks.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// The wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Tuning for a single run.
#[derive(Debug, Clone)]
pub struct PollOptions {
    /// Delay between status checks. Fixed, no backoff.
    pub poll_interval: Duration,
    /// Give up once this much time has passed since submission.
    /// `None` waits for the remote task indefinitely.
    pub timeout: Option<Duration>,
    /// Aborts the run, interrupting an in-flight fetch or wait.
    pub cancel: CancellationToken,
}

impl Default for PollOptions {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            timeout: None,
            cancel: CancellationToken::new(),
        }
    }
}

/// The successful result of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub task_id: TaskId,
    /// Text of the last output fragment.
    pub text: String,
    pub elapsed: Duration,
}

/// Runs tasks against a [`Transport`] and waits for them to finish.
///
/// A poller holds no per-run state, so one instance (or several clones of the
/// same transport) can drive any number of independent runs at once.
#[derive(Debug, Clone)]
pub struct Poller<T> {
    transport: T,
    options: PollOptions,
}

impl<T: Transport> Poller<T> {
    pub fn new(transport: T) -> Self {
        Self::with_options(transport, PollOptions::default())
    }

    pub fn with_options(transport: T, options: PollOptions) -> Self {
        Self { transport, options }
    }

    pub fn options(&self) -> &PollOptions {
        &self.options
    }

    /// Submits `spec` and polls until the task completes, fails, times out or
    /// is cancelled.
    ///
    /// Neither submission nor a failed status check is retried: the first
    /// transport error ends the run. Re-running after a submission failure may
    /// create a duplicate remote task.
    pub async fn run(
        &self,
        spec: &TaskSpec,
        clock: &dyn Clock,
        sleeper: &dyn Sleeper,
    ) -> Result<Completion, ResearchError> {
        let task = self
            .transport
            .submit(spec)
            .await
            .map_err(ResearchError::SubmissionFailed)?;
        let task_id = task.id;
        info!(task_id = %task_id, status = %task.status, agent = %spec.agent, "research task submitted");

        let cancel = &self.options.cancel;
        let start = clock.now();

        loop {
            let remaining = self.remaining(clock, start);
            if remaining == Some(Duration::ZERO) {
                return Err(self.timed_out(task_id, clock, start));
            }

            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ResearchError::Cancelled { task_id: task_id.clone() }),
                fetched = self.transport.fetch(&task_id) => fetched,
                _ = expire(sleeper, remaining) => return Err(self.timed_out(task_id.clone(), clock, start)),
            };
            let task = fetched.map_err(|source| ResearchError::PollingFailed {
                task_id: task_id.clone(),
                source,
            })?;
            let elapsed = clock.now().saturating_duration_since(start);

            match &task.status {
                Status::Completed => {
                    let Some(text) = task.final_text() else {
                        warn!(task_id = %task_id, "task completed without output text");
                        return Err(ResearchError::EmptyOutput { task_id });
                    };
                    info!(task_id = %task_id, elapsed_secs = elapsed.as_secs(), "research completed");
                    return Ok(Completion {
                        text: text.to_string(),
                        task_id,
                        elapsed,
                    });
                }
                Status::Failed => {
                    let detail = task.error.clone().unwrap_or_else(|| "unknown".to_string());
                    warn!(task_id = %task_id, elapsed_secs = elapsed.as_secs(), %detail, "research failed");
                    return Err(ResearchError::RemoteTaskFailed { detail, elapsed });
                }
                Status::InProgress(label) => {
                    info!(task_id = %task_id, status = %label, elapsed_secs = elapsed.as_secs(), "task still running");
                }
            }

            // The last wait before the deadline is clamped to what is left of it.
            let pause = match self.remaining(clock, start) {
                Some(Duration::ZERO) => return Err(self.timed_out(task_id, clock, start)),
                Some(left) => self.options.poll_interval.min(left),
                None => self.options.poll_interval,
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ResearchError::Cancelled { task_id: task_id.clone() }),
                _ = sleeper.sleep(pause) => {}
            }
        }
    }

    /// Time left before the deadline, or `None` when the run is unbounded.
    fn remaining(&self, clock: &dyn Clock, start: Instant) -> Option<Duration> {
        let elapsed = clock.now().saturating_duration_since(start);
        self.options
            .timeout
            .map(|timeout| timeout.saturating_sub(elapsed))
    }

    fn timed_out(&self, task_id: TaskId, clock: &dyn Clock, start: Instant) -> ResearchError {
        let elapsed = clock.now().saturating_duration_since(start);
        warn!(task_id = %task_id, elapsed_secs = elapsed.as_secs(), "deadline reached");
        ResearchError::Timeout { task_id, elapsed }
    }
}

/// Resolves once `remaining` has passed; never resolves for an unbounded run.
async fn expire(sleeper: &dyn Sleeper, remaining: Option<Duration>) {
    match remaining {
        Some(left) => sleeper.sleep(left).await,
        None => std::future::pending().await,
    }
}
