//! HTTP client for the model provider's chat and batch APIs
//!
//! `InferenceGateway` is the seam the processors work against: the direct
//! processor only needs `complete_chunk`, the batch orchestrator needs the
//! file-upload/batch lifecycle calls. `OpenAiGateway` is the production
//! implementation over reqwest; tests substitute their own.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use crate::models::{BatchJob, BatchStatus};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the provider API, split so callers can decide what is worth
/// retrying without string matching.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("API returned {status}: {body}")]
    Http { status: StatusCode, body: String },

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected API response: {0}")]
    InvalidResponse(String),
}

impl From<GatewayError> for si_common::Error {
    fn from(err: GatewayError) -> Self {
        si_common::Error::Gateway(err.to_string())
    }
}

impl GatewayError {
    /// Rate limits, server-side failures, and network-level hiccups are
    /// transient. Client errors like bad auth or malformed requests are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Http { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            GatewayError::Transport(err) => err.is_timeout() || err.is_connect(),
            GatewayError::InvalidResponse(_) => false,
        }
    }
}

/// Provider-agnostic surface for chat completions and the batch lifecycle.
pub trait InferenceGateway: Send + Sync {
    /// Run one chat completion and return the raw message content.
    fn complete_chunk(
        &self,
        model: &str,
        system_prompt: &str,
        user_prompt: &str,
        response_format: &Value,
    ) -> impl std::future::Future<Output = Result<String, GatewayError>> + Send;

    /// Upload a JSONL request file and return its file id.
    fn upload_batch_file(
        &self,
        file_name: &str,
        jsonl_body: Vec<u8>,
    ) -> impl std::future::Future<Output = Result<String, GatewayError>> + Send;

    /// Create a batch over a previously uploaded input file.
    fn create_batch(
        &self,
        input_file_id: &str,
    ) -> impl std::future::Future<Output = Result<BatchJob, GatewayError>> + Send;

    /// Fetch current batch state.
    fn get_batch(
        &self,
        batch_id: &str,
    ) -> impl std::future::Future<Output = Result<BatchJob, GatewayError>> + Send;

    /// Download a file's raw content (batch output or error file).
    fn download_file(
        &self,
        file_id: &str,
    ) -> impl std::future::Future<Output = Result<String, GatewayError>> + Send;
}

/// Production gateway talking to the OpenAI REST API (or any compatible
/// endpoint selected via the base URL).
pub struct OpenAiGateway {
    client: reqwest::Client,
    base_url: String,
}

impl OpenAiGateway {
    pub fn new(api_key: &str, base_url: &str) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        let mut auth_value = HeaderValue::from_str(&auth)
            .map_err(|_| GatewayError::InvalidResponse("API key is not a valid header value".into()))?;
        auth_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_value);
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<body unavailable>".to_string());
        Err(GatewayError::Http { status, body })
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct FileObject {
    id: String,
}

#[derive(Deserialize)]
struct BatchObject {
    id: String,
    status: BatchStatus,
    #[serde(default)]
    request_counts: Option<RequestCounts>,
    #[serde(default)]
    output_file_id: Option<String>,
    #[serde(default)]
    error_file_id: Option<String>,
}

#[derive(Deserialize, Default)]
struct RequestCounts {
    #[serde(default)]
    total: u64,
    #[serde(default)]
    completed: u64,
    #[serde(default)]
    failed: u64,
}

impl From<BatchObject> for BatchJob {
    fn from(obj: BatchObject) -> Self {
        let counts = obj.request_counts.unwrap_or_default();
        BatchJob {
            id: obj.id,
            status: obj.status,
            total: counts.total,
            completed: counts.completed,
            failed: counts.failed,
            output_file_id: obj.output_file_id,
            error_file_id: obj.error_file_id,
        }
    }
}

impl InferenceGateway for OpenAiGateway {
    async fn complete_chunk(
        &self,
        model: &str,
        system_prompt: &str,
        user_prompt: &str,
        response_format: &Value,
    ) -> Result<String, GatewayError> {
        let body = serde_json::json!({
            "model": model,
            "temperature": 0,
            "response_format": response_format,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
        });
        let response = self
            .client
            .post(self.url("chat/completions"))
            .json(&body)
            .send()
            .await?;
        let parsed: ChatResponse = Self::check(response).await?.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| GatewayError::InvalidResponse("completion had no message content".into()))
    }

    async fn upload_batch_file(
        &self,
        file_name: &str,
        jsonl_body: Vec<u8>,
    ) -> Result<String, GatewayError> {
        let part = reqwest::multipart::Part::bytes(jsonl_body)
            .file_name(file_name.to_string())
            .mime_str("application/jsonl")?;
        let form = reqwest::multipart::Form::new()
            .text("purpose", "batch")
            .part("file", part);
        let response = self
            .client
            .post(self.url("files"))
            .multipart(form)
            .send()
            .await?;
        let file: FileObject = Self::check(response).await?.json().await?;
        Ok(file.id)
    }

    async fn create_batch(&self, input_file_id: &str) -> Result<BatchJob, GatewayError> {
        let body = serde_json::json!({
            "input_file_id": input_file_id,
            "endpoint": "/v1/chat/completions",
            "completion_window": "24h",
        });
        let response = self
            .client
            .post(self.url("batches"))
            .json(&body)
            .send()
            .await?;
        let batch: BatchObject = Self::check(response).await?.json().await?;
        Ok(batch.into())
    }

    async fn get_batch(&self, batch_id: &str) -> Result<BatchJob, GatewayError> {
        let response = self
            .client
            .get(self.url(&format!("batches/{batch_id}")))
            .send()
            .await?;
        let batch: BatchObject = Self::check(response).await?.json().await?;
        Ok(batch.into())
    }

    async fn download_file(&self, file_id: &str) -> Result<String, GatewayError> {
        let response = self
            .client
            .get(self.url(&format!("files/{file_id}/content")))
            .send()
            .await?;
        Ok(Self::check(response).await?.text().await?)
    }
}
