//! Status polling until a task reaches `succeeded` or `failed`.

use crate::error::{ArkGenError, Result};
use crate::task::client::TaskClient;
use crate::task::types::{TaskHandle, TaskOutcome, TaskStatus};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// Limits and pacing of the poll loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Wait between consecutive status queries.
    pub interval: Duration,
    /// Give up after this many status queries.
    pub max_attempts: Option<u32>,
    /// Give up once this much time has passed since the first query.
    pub timeout: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_attempts: None,
            timeout: Some(Duration::from_secs(600)), // 10 minutes for video
        }
    }
}

impl PollConfig {
    /// Sets the wait between status queries.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Caps the number of status queries.
    pub fn with_max_attempts(mut self, attempts: Option<u32>) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the overall deadline.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// What the poll loop observed.
#[derive(Debug, Clone, PartialEq)]
pub struct PollReport {
    /// The polled task.
    pub task_id: TaskHandle,
    /// Terminal outcome.
    pub outcome: TaskOutcome,
    /// Number of status queries issued.
    pub attempts: u32,
    /// Time from first query to terminal status.
    pub elapsed: Duration,
}

impl PollReport {
    /// Video URL of a succeeded task; a failed task becomes
    /// [`ArkGenError::TaskFailed`] with the payload rendered as JSON.
    pub fn into_video_url(self) -> Result<String> {
        match self.outcome {
            TaskOutcome::Succeeded { video_url, .. } => Ok(video_url),
            TaskOutcome::Failed { payload } => Err(ArkGenError::TaskFailed {
                task_id: self.task_id.to_string(),
                payload: payload.to_string(),
            }),
        }
    }
}

/// Drives status queries for one task.
#[derive(Debug, Clone, Default)]
pub struct Poller {
    config: PollConfig,
}

impl Poller {
    /// Creates a poller with the given limits.
    pub fn new(config: PollConfig) -> Self {
        Self { config }
    }

    /// The configured limits.
    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Queries `task` until it is terminal.
    ///
    /// A `failed` task is a normal return carrying the error payload; only
    /// transport errors and exhausted limits come back as `Err`.
    pub async fn poll<C>(&self, client: &C, task: &TaskHandle) -> Result<PollReport>
    where
        C: TaskClient + ?Sized,
    {
        let start = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            let snapshot = client.get(task).await?;

            let outcome = match snapshot.status {
                TaskStatus::Succeeded => {
                    let content = snapshot.content.unwrap_or_default();
                    let video_url = content.video_url.ok_or_else(|| {
                        ArkGenError::UnexpectedResponse(format!(
                            "task {task} succeeded but carried no video_url"
                        ))
                    })?;
                    tracing::info!(task_id = %task, attempts, "task succeeded");
                    TaskOutcome::Succeeded {
                        video_url,
                        last_frame_url: content.last_frame_url,
                    }
                }
                TaskStatus::Failed => {
                    let payload = snapshot.error.unwrap_or(serde_json::Value::Null);
                    tracing::warn!(task_id = %task, attempts, error = %payload, "task failed");
                    TaskOutcome::Failed { payload }
                }
                ref pending => {
                    if let Some(max) = self.config.max_attempts {
                        if attempts >= max {
                            tracing::warn!(task_id = %task, status = %pending, attempts, "giving up, attempt cap reached");
                            return Err(ArkGenError::PollExhausted {
                                task_id: task.to_string(),
                                attempts,
                            });
                        }
                    }
                    let wait = self.next_wait(start.elapsed())?;
                    tracing::info!(
                        task_id = %task,
                        status = %pending,
                        attempt = attempts,
                        elapsed_secs = start.elapsed().as_secs(),
                        "task pending, retrying in {:?}",
                        wait
                    );
                    tokio::time::sleep(wait).await;
                    continue;
                }
            };

            return Ok(PollReport {
                task_id: task.clone(),
                outcome,
                attempts,
                elapsed: start.elapsed(),
            });
        }
    }

    /// Wait before the next query, cut short so the last query lands on the
    /// deadline. Fails once the deadline has passed.
    fn next_wait(&self, elapsed: Duration) -> Result<Duration> {
        let Some(timeout) = self.config.timeout else {
            return Ok(self.config.interval);
        };
        let remaining = timeout.saturating_sub(elapsed);
        if remaining.is_zero() {
            return Err(ArkGenError::Timeout(timeout));
        }
        Ok(remaining.min(self.config.interval))
    }
}
