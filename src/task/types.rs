//! Core types for content-generation tasks.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default Seedance model used when none is given.
pub const DEFAULT_MODEL: &str = "doubao-seedance-1-0-pro-250528";

/// Role an image plays in an image-to-video request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageRole {
    /// The image becomes the first frame of the video.
    FirstFrame,
    /// The image becomes the last frame of the video.
    LastFrame,
    /// The image is a style/subject reference.
    ReferenceImage,
}

/// Generation knobs rendered as `--flag value` pairs after the prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Output resolution (e.g. "480p", "720p", "1080p").
    pub resolution: Option<String>,
    /// Aspect ratio (e.g. "16:9", "9:16", "adaptive").
    pub ratio: Option<String>,
    /// Video duration in seconds.
    pub duration_secs: Option<u32>,
    /// Lock the camera position.
    pub camera_fixed: Option<bool>,
    /// Add the provider watermark.
    pub watermark: Option<bool>,
    /// Seed for reproducible generation.
    pub seed: Option<i64>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            resolution: Some("480p".into()),
            ratio: Some("16:9".into()),
            duration_secs: Some(12),
            camera_fixed: Some(false),
            watermark: Some(false),
            seed: None,
        }
    }
}

impl GenerationParams {
    /// Parameters with nothing set; the server picks its own defaults.
    pub fn none() -> Self {
        Self {
            resolution: None,
            ratio: None,
            duration_secs: None,
            camera_fixed: None,
            watermark: None,
            seed: None,
        }
    }

    /// Renders the parameters as the command suffix the text item carries.
    pub fn to_prompt_flags(&self) -> String {
        let mut flags = Vec::new();
        if let Some(ref resolution) = self.resolution {
            flags.push(format!("--resolution {resolution}"));
        }
        if let Some(ref ratio) = self.ratio {
            flags.push(format!("--ratio {ratio}"));
        }
        if let Some(duration) = self.duration_secs {
            flags.push(format!("--duration {duration}"));
        }
        if let Some(fixed) = self.camera_fixed {
            flags.push(format!("--camerafixed {fixed}"));
        }
        if let Some(watermark) = self.watermark {
            flags.push(format!("--watermark {watermark}"));
        }
        if let Some(seed) = self.seed {
            flags.push(format!("--seed {seed}"));
        }
        flags.join(" ")
    }
}

/// An image attached to a request, by data URL or public URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference {
    /// `data:image/...;base64,...` or `https://...`.
    pub url: String,
    /// Role of the image; `None` lets the model decide.
    pub role: Option<ImageRole>,
}

/// A request to generate a video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Model identifier.
    pub model: String,
    /// The text prompt describing the desired video.
    pub prompt: String,
    /// Optional reference image.
    pub image: Option<ImageReference>,
    /// Rendered into the prompt text.
    pub params: GenerationParams,
    /// Ask the API to also return the last frame as an image URL.
    pub return_last_frame: bool,
}

impl GenerationRequest {
    /// Creates a request for the default model.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            prompt: prompt.into(),
            image: None,
            params: GenerationParams::default(),
            return_last_frame: false,
        }
    }

    /// Sets the model identifier.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Uses the given image as the first frame.
    pub fn with_first_frame(self, url: impl Into<String>) -> Self {
        self.with_image(url, Some(ImageRole::FirstFrame))
    }

    /// Attaches an image with an explicit role.
    pub fn with_image(mut self, url: impl Into<String>, role: Option<ImageRole>) -> Self {
        self.image = Some(ImageReference {
            url: url.into(),
            role,
        });
        self
    }

    /// Replaces the generation parameters.
    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Requests the last frame alongside the video.
    pub fn with_return_last_frame(mut self, enabled: bool) -> Self {
        self.return_last_frame = enabled;
        self
    }

    /// Text sent in the `text` content item: prompt followed by flags.
    pub fn prompt_text(&self) -> String {
        let flags = self.params.to_prompt_flags();
        let prompt = self.prompt.trim();
        if flags.is_empty() {
            prompt.to_string()
        } else {
            format!("{prompt} {flags}")
        }
    }

    /// Wire content list: one text item, then the image if any.
    pub fn content(&self) -> Vec<ContentItem> {
        let mut items = vec![ContentItem::Text {
            text: self.prompt_text(),
        }];
        if let Some(ref image) = self.image {
            items.push(ContentItem::ImageUrl {
                image_url: ImageUrl {
                    url: image.url.clone(),
                },
                role: image.role,
            });
        }
        items
    }
}

/// One entry of the `content` array sent on task creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    /// Prompt text.
    Text { text: String },
    /// Image by URL or data URL.
    ImageUrl {
        image_url: ImageUrl,
        #[serde(skip_serializing_if = "Option::is_none")]
        role: Option<ImageRole>,
    },
}

/// URL wrapper of an `image_url` content item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUrl {
    /// Public URL or data URL.
    pub url: String,
}

/// Opaque identifier of a submitted task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskHandle(String);

impl TaskHandle {
    /// Wraps a task id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw task id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status reported for a task.
///
/// Only `succeeded` and `failed` are terminal. Unknown strings are kept
/// verbatim and treated as still pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    /// Waiting for capacity.
    Queued,
    /// Generation in progress.
    Running,
    /// Finished with a video.
    Succeeded,
    /// Finished with an error payload.
    Failed,
    /// Anything else the service reports.
    Other(String),
}

impl TaskStatus {
    /// Returns true for `succeeded` and `failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Wire spelling of the status.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for TaskStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "queued" => Self::Queued,
            "running" => Self::Running,
            "succeeded" => Self::Succeeded,
            "failed" => Self::Failed,
            _ => Self::Other(s),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result content of a finished task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskContent {
    /// Download URL of the generated video.
    #[serde(default)]
    pub video_url: Option<String>,
    /// URL of the last frame, when requested.
    #[serde(default)]
    pub last_frame_url: Option<String>,
}

/// One status record fetched from the service. Never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSnapshot {
    /// Task id.
    pub id: String,
    /// Model that ran the task.
    #[serde(default)]
    pub model: Option<String>,
    /// Current status.
    pub status: TaskStatus,
    /// Present once the task succeeded.
    #[serde(default)]
    pub content: Option<TaskContent>,
    /// Error payload, kept verbatim.
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    /// Token usage as reported.
    #[serde(default)]
    pub usage: Option<serde_json::Value>,
    /// Unix seconds.
    #[serde(default)]
    pub created_at: Option<i64>,
    /// Unix seconds.
    #[serde(default)]
    pub updated_at: Option<i64>,
}

impl TaskSnapshot {
    /// A bare snapshot with only id and status.
    pub fn new(id: impl Into<String>, status: TaskStatus) -> Self {
        Self {
            id: id.into(),
            model: None,
            status,
            content: None,
            error: None,
            usage: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Video URL, if the task carries one.
    pub fn video_url(&self) -> Option<&str> {
        self.content.as_ref()?.video_url.as_deref()
    }
}

/// Terminal result of polling a task.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// The task succeeded and produced a video.
    Succeeded {
        /// Download URL of the video.
        video_url: String,
        /// Last frame URL, when requested.
        last_frame_url: Option<String>,
    },
    /// The task failed; the payload is the service's error object.
    Failed {
        /// Error payload as returned.
        payload: serde_json::Value,
    },
}

impl TaskOutcome {
    /// Returns true for [`TaskOutcome::Succeeded`].
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_render() {
        let flags = GenerationParams::default().to_prompt_flags();
        assert_eq!(
            flags,
            "--resolution 480p --ratio 16:9 --duration 12 --camerafixed false --watermark false"
        );
    }

    #[test]
    fn test_empty_params_leave_prompt_alone() {
        let req = GenerationRequest::new("  A quiet valley  ").with_params(GenerationParams::none());
        assert_eq!(req.prompt_text(), "A quiet valley");
    }

    #[test]
    fn test_content_serialization_with_first_frame() {
        let req = GenerationRequest::new("Torches in the mountains")
            .with_first_frame("data:image/jpeg;base64,AAAA");
        let json = serde_json::to_value(req.content()).unwrap();

        assert_eq!(json[0]["type"], "text");
        assert!(json[0]["text"]
            .as_str()
            .unwrap()
            .starts_with("Torches in the mountains --resolution 480p"));
        assert_eq!(json[1]["type"], "image_url");
        assert_eq!(json[1]["image_url"]["url"], "data:image/jpeg;base64,AAAA");
        assert_eq!(json[1]["role"], "first_frame");
    }

    #[test]
    fn test_content_without_role_omits_field() {
        let req = GenerationRequest::new("x").with_image("https://example.com/a.png", None);
        let json = serde_json::to_value(req.content()).unwrap();
        assert!(json[1].get("role").is_none());
    }

    #[test]
    fn test_status_parsing() {
        let s: TaskStatus = serde_json::from_str(r#""queued""#).unwrap();
        assert_eq!(s, TaskStatus::Queued);
        let s: TaskStatus = serde_json::from_str(r#""succeeded""#).unwrap();
        assert!(s.is_terminal());
        let s: TaskStatus = serde_json::from_str(r#""cancelled""#).unwrap();
        assert_eq!(s, TaskStatus::Other("cancelled".into()));
        assert!(!s.is_terminal());
        assert_eq!(serde_json::to_string(&s).unwrap(), r#""cancelled""#);
    }

    #[test]
    fn test_snapshot_deserialization_succeeded() {
        let json = r#"{
            "id": "cgt-20250601-abc",
            "model": "doubao-seedance-1-0-pro-250528",
            "status": "succeeded",
            "content": {"video_url": "https://example.com/video.mp4"},
            "usage": {"completion_tokens": 246840},
            "created_at": 1748760000,
            "updated_at": 1748760090
        }"#;
        let snapshot: TaskSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.status, TaskStatus::Succeeded);
        assert_eq!(snapshot.video_url(), Some("https://example.com/video.mp4"));
        assert!(snapshot.error.is_none());
    }

    #[test]
    fn test_snapshot_deserialization_failed() {
        let json = r#"{
            "id": "cgt-1",
            "status": "failed",
            "error": {"code": "OutputVideoSensitiveContentDetected", "message": "blocked"}
        }"#;
        let snapshot: TaskSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.status, TaskStatus::Failed);
        assert_eq!(
            snapshot.error.as_ref().unwrap()["code"],
            "OutputVideoSensitiveContentDetected"
        );
        assert!(snapshot.video_url().is_none());
    }
}
