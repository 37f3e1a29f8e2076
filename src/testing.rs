//! Scripted backend and helpers shared by unit tests

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::oneshot;
use crate::api::{ApiError, DocumentUpload, RagBackend, UploadReceipt};
use crate::tui::AppEvent;
use crate::upload::UploadError;

#[derive(Default)]
pub struct FakeBackend {
    chat_replies: Mutex<VecDeque<Result<String, ApiError>>>,
    held_chat_replies: Mutex<HashMap<String, (oneshot::Receiver<()>, Result<String, ApiError>)>>,
    upload_replies: Mutex<VecDeque<Result<UploadReceipt, ApiError>>>,
    chat_queries: Mutex<Vec<String>>,
    uploads: Mutex<Vec<DocumentUpload>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chat_reply(self, reply: Result<String, ApiError>) -> Self {
        self.chat_replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn with_chat_failure(self) -> Self {
        self.with_chat_reply(Err(ApiError::Status {
            status: StatusCode::SERVICE_UNAVAILABLE,
            reason: None,
        }))
    }

    /// The reply to `query` is held back until the returned sender fires
    pub fn with_held_chat_reply(
        self,
        query: &str,
        reply: Result<String, ApiError>,
    ) -> (Self, oneshot::Sender<()>) {
        let (release, gate) = oneshot::channel();
        self.held_chat_replies
            .lock()
            .unwrap()
            .insert(query.to_string(), (gate, reply));
        (self, release)
    }

    pub fn with_upload_reply(self, reply: Result<UploadReceipt, ApiError>) -> Self {
        self.upload_replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn chat_queries(&self) -> Vec<String> {
        self.chat_queries.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<DocumentUpload> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl RagBackend for FakeBackend {
    async fn chat(&self, query: &str) -> Result<String, ApiError> {
        self.chat_queries.lock().unwrap().push(query.to_string());

        let held = self.held_chat_replies.lock().unwrap().remove(query);
        if let Some((gate, reply)) = held {
            let _ = gate.await;
            return reply;
        }

        self.chat_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::MalformedBody("no scripted chat reply".to_string())))
    }

    async fn upload_document(&self, upload: DocumentUpload) -> Result<UploadReceipt, ApiError> {
        self.uploads.lock().unwrap().push(upload);
        self.upload_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiError::MalformedBody("no scripted upload reply".to_string())))
    }
}

pub async fn next_chat_reply(rx: &mut UnboundedReceiver<AppEvent>) -> Result<String, ApiError> {
    loop {
        match rx.recv().await {
            Some(AppEvent::ChatReply(result)) => return result,
            Some(_) => continue,
            None => panic!("event channel closed before a chat reply arrived"),
        }
    }
}

pub async fn next_upload_result(
    rx: &mut UnboundedReceiver<AppEvent>,
) -> Result<UploadReceipt, UploadError> {
    loop {
        match rx.recv().await {
            Some(AppEvent::UploadFinished(result)) => return result,
            Some(_) => continue,
            None => panic!("event channel closed before an upload finished"),
        }
    }
}
