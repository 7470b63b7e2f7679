//! Remote task client trait.

use crate::error::Result;
use crate::task::types::{GenerationRequest, TaskHandle, TaskSnapshot};
use async_trait::async_trait;

/// Submit-and-query interface of a content-generation service.
///
/// [`crate::task::ArkClient`] talks to the real API; anything else that
/// implements this (an in-memory script, a proxy) can drive the poller.
#[async_trait]
pub trait TaskClient: Send + Sync {
    /// Submits a generation task and returns its handle.
    async fn create(&self, request: &GenerationRequest) -> Result<TaskHandle>;

    /// Fetches the current status of a task.
    async fn get(&self, task: &TaskHandle) -> Result<TaskSnapshot>;

    /// Name of the backing service for display.
    fn name(&self) -> &str {
        "ark"
    }
}

