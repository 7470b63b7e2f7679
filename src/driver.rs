//! One generate-and-download run.

use crate::config::RunConfig;
use crate::download::{unix_timestamp, Downloader};
use crate::encode::image_to_data_url;
use crate::error::Result;
use crate::task::{GenerationRequest, Poller, TaskClient, TaskHandle, TaskOutcome};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RunOutcome {
    /// Video generated and saved.
    Downloaded {
        /// Remote URL of the video.
        video_url: String,
        /// Last frame URL, when requested.
        last_frame_url: Option<String>,
        /// Local file.
        path: PathBuf,
        /// File size.
        bytes: u64,
    },
    /// The service reported `failed`.
    TaskFailed {
        /// Error payload as returned.
        payload: serde_json::Value,
    },
    /// Video generated but the download did not complete.
    DownloadFailed {
        /// Remote URL of the video.
        video_url: String,
        /// Intended local file.
        path: PathBuf,
        /// Failure description.
        error: String,
    },
}

/// Summary of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    /// The submitted task.
    pub task_id: TaskHandle,
    /// Status queries issued.
    pub poll_attempts: u32,
    /// Time spent polling.
    pub poll_elapsed: Duration,
    /// Final outcome.
    pub outcome: RunOutcome,
}

impl RunReport {
    /// Returns true when the video is on disk.
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, RunOutcome::Downloaded { .. })
    }
}

/// Wires encoder, task client, poller and downloader for a single task.
///
/// `run` consumes the driver, so one driver submits exactly one task.
pub struct Driver<'a, C: TaskClient + ?Sized> {
    client: &'a C,
    downloader: &'a Downloader,
    config: RunConfig,
}

impl<'a, C: TaskClient + ?Sized> Driver<'a, C> {
    /// Creates a driver for one run.
    pub fn new(client: &'a C, downloader: &'a Downloader, config: RunConfig) -> Self {
        Self {
            client,
            downloader,
            config,
        }
    }

    /// Encodes, submits, polls and downloads.
    ///
    /// Errors before submission (unreadable image) and transport or limit
    /// errors during submission/polling are returned as `Err`. A failed task
    /// and a failed download are reported in the [`RunReport`].
    pub async fn run(self) -> Result<RunReport> {
        let config = self.config;

        let image = image_to_data_url(&config.image_path).await?;
        let request = GenerationRequest::new(config.prompt.as_str())
            .with_model(config.model.as_str())
            .with_params(config.params.clone())
            .with_first_frame(image)
            .with_return_last_frame(config.return_last_frame);

        info!(model = %request.model, service = self.client.name(), "creating generation task");
        let task = self.client.create(&request).await?;
        info!(task_id = %task, "task created, polling status");

        let report = Poller::new(config.poll).poll(self.client, &task).await?;

        let outcome = match report.outcome {
            TaskOutcome::Failed { payload } => {
                error!(task_id = %task, error = %payload, "task failed");
                RunOutcome::TaskFailed { payload }
            }
            TaskOutcome::Succeeded {
                video_url,
                last_frame_url,
            } => {
                let dest = config.output_path(unix_timestamp());
                info!(task_id = %task, path = %dest.display(), "task succeeded, downloading video");
                let result = self.downloader.download(&video_url, &dest).await;
                if result.success {
                    info!(path = %result.path.display(), bytes = result.bytes_written, "video downloaded");
                    RunOutcome::Downloaded {
                        video_url,
                        last_frame_url,
                        path: result.path,
                        bytes: result.bytes_written,
                    }
                } else {
                    RunOutcome::DownloadFailed {
                        video_url,
                        path: result.path,
                        error: result.error.unwrap_or_default(),
                    }
                }
            }
        };

        Ok(RunReport {
            task_id: task,
            poll_attempts: report.attempts,
            poll_elapsed: report.elapsed,
            outcome,
        })
    }
}
