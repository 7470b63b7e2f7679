//! Error types for task submission, polling and download.

use std::path::PathBuf;
use std::time::Duration;

/// Maximum length of an error body carried inside an error value.
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Errors that can occur while generating a video.
#[derive(Debug, thiserror::Error)]
pub enum ArkGenError {
    /// API key missing or rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// The poll loop ran past its deadline.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// The poll loop used up its attempt budget without a terminal status.
    #[error("task {task_id} still pending after {attempts} status queries")]
    PollExhausted { task_id: String, attempts: u32 },

    /// Reference image does not exist.
    #[error("image not found: {}", .0.display())]
    ImageNotFound(PathBuf),

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The remote task reached the `failed` state.
    #[error("task {task_id} failed: {payload}")]
    TaskFailed { task_id: String, payload: String },

    /// Fetching the finished video failed.
    #[error("download failed: {0}")]
    Download(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (reading the image, writing the video).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The API answered with something we do not understand.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

impl ArkGenError {
    /// Returns true if this error is likely transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Timeout(_) | Self::Network(_)
        )
    }

    /// Returns the suggested retry delay, if available.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => *retry_after,
            Self::Timeout(_) => Some(Duration::from_secs(1)),
            Self::Network(_) => Some(Duration::from_secs(2)),
            _ => None,
        }
    }
}

/// Result type alias for generation operations.
pub type Result<T> = std::result::Result<T, ArkGenError>;

/// Trims an API error body for inclusion in an error value.
///
/// Bearer tokens echoed back by proxies are masked, and the text is cut to
/// a bounded length on a char boundary.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let masked = mask_bearer_tokens(text.trim());
    if masked.chars().count() <= MAX_ERROR_MESSAGE_LEN {
        return masked;
    }
    let mut cut: String = masked.chars().take(MAX_ERROR_MESSAGE_LEN).collect();
    cut.push_str("...");
    cut
}

fn mask_bearer_tokens(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find("Bearer ") {
        let (head, tail) = rest.split_at(pos + "Bearer ".len());
        out.push_str(head);
        out.push_str("***");
        let end = tail
            .find(|c: char| c.is_whitespace() || c == '"' || c == ',')
            .unwrap_or(tail.len());
        rest = &tail[end..];
    }
    out.push_str(rest);
    out
}

/// Reads a `Retry-After` header given in seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
