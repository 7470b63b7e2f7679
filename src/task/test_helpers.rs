//! In-memory task client for unit tests.

use crate::error::{ArkGenError, Result};
use crate::task::client::TaskClient;
use crate::task::types::{
    GenerationRequest, TaskContent, TaskHandle, TaskSnapshot, TaskStatus,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

/// Replays a fixed sequence of snapshots, one per `get`.
pub(crate) struct ScriptedClient {
    script: Mutex<VecDeque<TaskSnapshot>>,
    always: Option<TaskStatus>,
    creates: AtomicU32,
    gets: AtomicU32,
    submitted: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedClient {
    pub(crate) fn new(script: Vec<TaskSnapshot>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            always: None,
            creates: AtomicU32::new(0),
            gets: AtomicU32::new(0),
            submitted: Mutex::new(Vec::new()),
        }
    }

    /// Answers every `get` with the same status.
    pub(crate) fn always(status: TaskStatus) -> Self {
        Self {
            always: Some(status),
            ..Self::new(Vec::new())
        }
    }

    pub(crate) fn succeeded(video_url: &str) -> TaskSnapshot {
        let mut snapshot = TaskSnapshot::new("cgt-1", TaskStatus::Succeeded);
        snapshot.content = Some(TaskContent {
            video_url: Some(video_url.to_string()),
            last_frame_url: None,
        });
        snapshot
    }

    pub(crate) fn failed(payload: serde_json::Value) -> TaskSnapshot {
        let mut snapshot = TaskSnapshot::new("cgt-1", TaskStatus::Failed);
        snapshot.error = Some(payload);
        snapshot
    }

    pub(crate) fn create_calls(&self) -> u32 {
        self.creates.load(Ordering::SeqCst)
    }

    pub(crate) fn get_calls(&self) -> u32 {
        self.gets.load(Ordering::SeqCst)
    }

    pub(crate) fn submitted(&self) -> Vec<GenerationRequest> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskClient for ScriptedClient {
    async fn create(&self, request: &GenerationRequest) -> Result<TaskHandle> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        self.submitted.lock().unwrap().push(request.clone());
        Ok(TaskHandle::new("cgt-1"))
    }

    async fn get(&self, task: &TaskHandle) -> Result<TaskSnapshot> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if let Some(ref status) = self.always {
            return Ok(TaskSnapshot::new(task.as_str(), status.clone()));
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ArkGenError::Api {
                status: 500,
                message: "script exhausted".into(),
            })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
