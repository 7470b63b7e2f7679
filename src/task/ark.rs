//! Volcengine Ark content-generation task client.

use crate::error::{parse_retry_after, sanitize_error_message, ArkGenError, Result};
use crate::task::client::TaskClient;
use crate::task::types::{ContentItem, GenerationRequest, TaskHandle, TaskSnapshot};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default regional endpoint.
pub const DEFAULT_BASE_URL: &str = "https://ark.cn-beijing.volces.com/api/v3";

const TASKS_PATH: &str = "/contents/generations/tasks";

/// Builder for [`ArkClient`].
#[derive(Debug, Clone)]
pub struct ArkClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    request_timeout: Duration,
}

impl Default for ArkClientBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl ArkClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API key. Falls back to `ARK_API_KEY` env var.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the API base URL. Falls back to `ARK_BASE_URL`, then the Beijing region.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the per-request HTTP timeout.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Builds the client, resolving the API key.
    pub fn build(self) -> Result<ArkClient> {
        let api_key = resolve_api_key(self.api_key, std::env::var("ARK_API_KEY").ok())?;

        let base_url = self
            .base_url
            .or_else(|| std::env::var("ARK_BASE_URL").ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .build()?;

        Ok(ArkClient {
            client,
            api_key,
            base_url,
        })
    }
}

fn resolve_api_key(explicit: Option<String>, from_env: Option<String>) -> Result<String> {
    explicit
        .filter(|k| !k.trim().is_empty())
        .or_else(|| from_env.filter(|k| !k.trim().is_empty()))
        .ok_or_else(|| ArkGenError::Auth("ARK_API_KEY not set and no API key provided".into()))
}

/// Client for Ark content-generation tasks.
#[derive(Debug, Clone)]
pub struct ArkClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl ArkClient {
    /// Creates a new [`ArkClientBuilder`].
    pub fn builder() -> ArkClientBuilder {
        ArkClientBuilder::new()
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn tasks_url(&self) -> String {
        format!("{}{}", self.base_url, TASKS_PATH)
    }

    fn task_url(&self, task: &TaskHandle) -> String {
        format!("{}{}/{}", self.base_url, TASKS_PATH, task.as_str())
    }

    /// Cancels a queued task, or deletes the record of a finished one.
    pub async fn cancel(&self, task: &TaskHandle) -> Result<()> {
        let response = self
            .client
            .delete(self.task_url(task))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status.as_u16(), &text, &headers));
        }

        tracing::info!(task_id = %task, "cancelled task");
        Ok(())
    }

    fn parse_error(
        &self,
        status: u16,
        text: &str,
        headers: &reqwest::header::HeaderMap,
    ) -> ArkGenError {
        let (code, message) = match serde_json::from_str::<ArkErrorResponse>(text) {
            Ok(resp) => (
                resp.error.code.unwrap_or_default(),
                sanitize_error_message(&resp.error.message.unwrap_or_default()),
            ),
            Err(_) => (String::new(), sanitize_error_message(text)),
        };

        if status == 401 || status == 403 || code.starts_with("Authentication") {
            return ArkGenError::Auth(message);
        }
        if status == 429 {
            let retry_after = parse_retry_after(headers).map(Duration::from_secs);
            return ArkGenError::RateLimited { retry_after };
        }
        if code.contains("Sensitive") || code.contains("Risk") {
            return ArkGenError::ContentBlocked(message);
        }
        if status == 400 || code.starts_with("InvalidParameter") {
            return ArkGenError::InvalidRequest(message);
        }
        ArkGenError::Api { status, message }
    }
}

#[async_trait]
impl TaskClient for ArkClient {
    async fn create(&self, request: &GenerationRequest) -> Result<TaskHandle> {
        let body = CreateTaskRequest::from_request(request);

        let response = self
            .client
            .post(self.tasks_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status.as_u16(), &text, &headers));
        }

        let created: CreateTaskResponse = response.json().await?;
        if created.id.is_empty() {
            return Err(ArkGenError::UnexpectedResponse(
                "task creation returned an empty id".into(),
            ));
        }

        tracing::debug!(task_id = %created.id, model = %request.model, "submitted generation task");
        Ok(TaskHandle::new(created.id))
    }

    async fn get(&self, task: &TaskHandle) -> Result<TaskSnapshot> {
        let response = self
            .client
            .get(self.task_url(task))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(self.parse_error(status.as_u16(), &text, &headers));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

// Request/Response types
#[derive(Debug, Serialize)]
struct CreateTaskRequest<'a> {
    model: &'a str,
    content: Vec<ContentItem>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    return_last_frame: bool,
}

impl<'a> CreateTaskRequest<'a> {
    fn from_request(req: &'a GenerationRequest) -> Self {
        Self {
            model: &req.model,
            content: req.content(),
            return_last_frame: req.return_last_frame,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreateTaskResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ArkErrorResponse {
    error: ArkErrorBody,
}

#[derive(Debug, Deserialize)]
struct ArkErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::types::{GenerationParams, TaskStatus};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ArkClient {
        ArkClientBuilder::new()
            .api_key("ark-test")
            .base_url(server.uri())
            .build()
            .unwrap()
    }

    #[test]
    fn test_resolve_api_key() {
        assert_eq!(
            resolve_api_key(Some("explicit".into()), Some("env".into())).unwrap(),
            "explicit"
        );
        assert_eq!(
            resolve_api_key(None, Some("env".into())).unwrap(),
            "env"
        );
        assert_eq!(
            resolve_api_key(Some("  ".into()), Some("env".into())).unwrap(),
            "env"
        );
        assert!(matches!(
            resolve_api_key(None, None),
            Err(ArkGenError::Auth(_))
        ));
        assert!(matches!(
            resolve_api_key(None, Some(String::new())),
            Err(ArkGenError::Auth(_))
        ));
    }

    #[test]
    fn test_builder_trims_trailing_slash() {
        let client = ArkClientBuilder::new()
            .api_key("ark-test")
            .base_url("https://example.com/api/v3/")
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "https://example.com/api/v3");
    }

    #[test]
    fn test_create_request_serialization() {
        let req = GenerationRequest::new("A cat")
            .with_params(GenerationParams::none())
            .with_first_frame("data:image/png;base64,AAAA");
        let json = serde_json::to_value(CreateTaskRequest::from_request(&req)).unwrap();

        assert_eq!(json["model"], "doubao-seedance-1-0-pro-250528");
        assert_eq!(json["content"][0]["text"], "A cat");
        assert_eq!(json["content"][1]["role"], "first_frame");
        assert!(json.get("return_last_frame").is_none());

        let req = req.with_return_last_frame(true);
        let json = serde_json::to_value(CreateTaskRequest::from_request(&req)).unwrap();
        assert_eq!(json["return_last_frame"], true);
    }

    #[tokio::test]
    async fn test_create_returns_handle() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/contents/generations/tasks"))
            .and(header("Authorization", "Bearer ark-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "doubao-seedance-1-0-pro-250528"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "cgt-20250601-xyz"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let handle = client_for(&server)
            .create(&GenerationRequest::new("A cat"))
            .await
            .unwrap();
        assert_eq!(handle.as_str(), "cgt-20250601-xyz");
    }

    #[tokio::test]
    async fn test_create_maps_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/contents/generations/tasks"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"code": "AuthenticationError", "message": "the API key is invalid"}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .create(&GenerationRequest::new("A cat"))
            .await
            .unwrap_err();
        assert!(matches!(err, ArkGenError::Auth(ref m) if m == "the API key is invalid"));
    }

    #[tokio::test]
    async fn test_create_maps_invalid_parameter() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/contents/generations/tasks"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"code": "InvalidParameter", "message": "duration must be 5 or 10"}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .create(&GenerationRequest::new("A cat"))
            .await
            .unwrap_err();
        assert!(matches!(err, ArkGenError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_create_maps_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/contents/generations/tasks"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .create(&GenerationRequest::new("A cat"))
            .await
            .unwrap_err();
        assert_eq!(err.retry_after(), Some(Duration::from_secs(7)));
    }

    #[tokio::test]
    async fn test_get_parses_snapshot() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contents/generations/tasks/cgt-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "cgt-1",
                "model": "doubao-seedance-1-0-pro-250528",
                "status": "running",
                "created_at": 1748760000,
                "updated_at": 1748760003
            })))
            .mount(&server)
            .await;

        let snapshot = client_for(&server)
            .get(&TaskHandle::new("cgt-1"))
            .await
            .unwrap();
        assert_eq!(snapshot.status, TaskStatus::Running);
        assert_eq!(snapshot.updated_at, Some(1748760003));
    }

    #[tokio::test]
    async fn test_get_malformed_body_is_json_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contents/generations/tasks/cgt-1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"id\": \"cgt-1\""))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .get(&TaskHandle::new("cgt-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ArkGenError::Json(_)));
    }

    #[tokio::test]
    async fn test_get_unknown_task_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/contents/generations/tasks/nope"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": {"code": "ResourceNotFound", "message": "task not found"}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .get(&TaskHandle::new("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, ArkGenError::Api { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_cancel_sends_delete() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/contents/generations/tasks/cgt-9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .cancel(&TaskHandle::new("cgt-9"))
            .await
            .unwrap();
    }
}
