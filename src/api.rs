use async_trait::async_trait;
use reqwest::{multipart, Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned {status}")]
    Status {
        status: StatusCode,
        reason: Option<String>,
    },
    #[error("malformed response body: {0}")]
    MalformedBody(String),
    #[error("backend rejected the document: {0}")]
    Rejected(String),
    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ApiError {
    /// Reason string supplied by the backend, if it sent one
    pub fn backend_reason(&self) -> Option<&str> {
        match self {
            ApiError::Status { reason, .. } => reason.as_deref(),
            ApiError::Rejected(reason) => Some(reason),
            _ => None,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    response: String,
}

#[derive(Deserialize)]
struct UploadResponse {
    message: Option<String>,
    document_id: Option<String>,
    error: Option<String>,
}

/// Chunking parameters sent alongside an uploaded document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadConfig {
    pub chunk_size: i64,
    pub chunk_overlap: i64,
}

#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub config: UploadConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReceipt {
    pub message: String,
    pub document_id: Option<String>,
}

#[async_trait]
pub trait RagBackend: Send + Sync {
    async fn chat(&self, query: &str) -> Result<String, ApiError>;

    async fn upload_document(&self, upload: DocumentUpload) -> Result<UploadReceipt, ApiError>;
}

#[derive(Clone)]
pub struct RagClient {
    client: Client,
    base_url: String,
}

impl RagClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl RagBackend for RagClient {
    async fn chat(&self, query: &str) -> Result<String, ApiError> {
        let url = self.endpoint("chat/");

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { query })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        parse_chat_response(status, &body)
    }

    async fn upload_document(&self, upload: DocumentUpload) -> Result<UploadReceipt, ApiError> {
        let url = self.endpoint("upload_document/");

        let upload_config = serde_json::to_string(&upload.config)?;
        let file_part = multipart::Part::bytes(upload.bytes)
            .file_name(upload.file_name)
            .mime_str("application/pdf")?;
        let form = multipart::Form::new()
            .part("file", file_part)
            .text("upload_config", upload_config);

        let response = self.client.post(&url).multipart(form).send().await?;

        let status = response.status();
        let body = response.text().await?;
        parse_upload_response(status, &body)
    }
}

fn parse_chat_response(status: StatusCode, body: &str) -> Result<String, ApiError> {
    if !status.is_success() {
        return Err(ApiError::Status { status, reason: None });
    }

    let chat: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ApiError::MalformedBody(e.to_string()))?;
    Ok(chat.response)
}

fn parse_upload_response(status: StatusCode, body: &str) -> Result<UploadReceipt, ApiError> {
    if !status.is_success() {
        // A JSON error body may omit `error`; a non-JSON one is unreadable
        let error_body: UploadResponse = serde_json::from_str(body)
            .map_err(|e| ApiError::MalformedBody(format!("{} with unreadable body: {}", status, e)))?;
        return Err(ApiError::Status { status, reason: error_body.error });
    }

    let upload: UploadResponse = serde_json::from_str(body)
        .map_err(|e| ApiError::MalformedBody(e.to_string()))?;

    match (upload.message, upload.error) {
        (Some(message), _) => Ok(UploadReceipt {
            message,
            document_id: upload.document_id,
        }),
        (None, Some(error)) => Err(ApiError::Rejected(error)),
        (None, None) => Err(ApiError::MalformedBody(
            "response has neither `message` nor `error`".to_string(),
        )),
    }
}
