use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use crate::api::{ApiError, DocumentUpload, RagBackend, UploadConfig, UploadReceipt};
use crate::input::TextField;
use crate::tui::AppEvent;

/// Used when the chunk size field does not hold a number
pub const DEFAULT_CHUNK_SIZE: i64 = 500;
/// Used when the chunk overlap field does not hold a number
pub const DEFAULT_CHUNK_OVERLAP: i64 = 20;

// Advisory widget bounds (min, max, step). Typed values outside them are sent unchanged.
pub const CHUNK_SIZE_RANGE: (i64, i64, i64) = (100, 2000, 100);
pub const CHUNK_OVERLAP_RANGE: (i64, i64, i64) = (10, 500, 10);

pub const NO_FILE_SELECTED: &str = "Please select a PDF file";
pub const UPLOAD_IN_PROGRESS: &str = "Upload already in progress";
const GENERIC_FAILURE: &str = "Error uploading file";

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl UploadError {
    /// Text surfaced to the user; the underlying cause only goes to the log
    pub fn user_message(&self) -> String {
        match self {
            UploadError::Api(e) => match (e.backend_reason(), e) {
                (Some(reason), _) => format!("Upload failed: {}", reason),
                (None, ApiError::Status { .. }) => "Upload failed: Unknown error".to_string(),
                (None, _) => GENERIC_FAILURE.to_string(),
            },
            UploadError::Read { .. } => GENERIC_FAILURE.to_string(),
        }
    }
}

pub fn coerce_chunk_size(input: &str) -> i64 {
    input.trim().parse().unwrap_or(DEFAULT_CHUNK_SIZE)
}

pub fn coerce_chunk_overlap(input: &str) -> i64 {
    input.trim().parse().unwrap_or(DEFAULT_CHUNK_OVERLAP)
}

/// Move `current` by `steps` widget steps, clamped to the advisory range
fn step_value(current: i64, steps: i64, (min, max, step): (i64, i64, i64)) -> i64 {
    current.saturating_add(steps.saturating_mul(step)).clamp(min, max)
}

/// Reads the selected file and pairs it with the chunking parameters
pub async fn prepare_upload(path: &Path, config: UploadConfig) -> Result<DocumentUpload, UploadError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| UploadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string());

    Ok(DocumentUpload {
        file_name,
        bytes,
        config,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Failure(String),
}

/// Raw field contents of the upload panel
#[derive(Debug, Clone)]
pub struct UploadForm {
    pub file_path: TextField,
    pub chunk_size: TextField,
    pub chunk_overlap: TextField,
}

impl UploadForm {
    pub fn new(chunk_size: i64, chunk_overlap: i64) -> Self {
        Self {
            file_path: TextField::default(),
            chunk_size: TextField::new(chunk_size.to_string()),
            chunk_overlap: TextField::new(chunk_overlap.to_string()),
        }
    }

    pub fn selected_file(&self) -> Option<PathBuf> {
        if self.file_path.is_blank() {
            None
        } else {
            Some(PathBuf::from(self.file_path.value().trim()))
        }
    }

    pub fn select_file(&mut self, path: impl Into<String>) {
        self.file_path.set(path);
    }

    pub fn clear_selection(&mut self) {
        self.file_path.clear();
    }

    pub fn config(&self) -> UploadConfig {
        UploadConfig {
            chunk_size: coerce_chunk_size(self.chunk_size.value()),
            chunk_overlap: coerce_chunk_overlap(self.chunk_overlap.value()),
        }
    }

    pub fn step_chunk_size(&mut self, steps: i64) {
        let current = coerce_chunk_size(self.chunk_size.value());
        self.chunk_size
            .set(step_value(current, steps, CHUNK_SIZE_RANGE).to_string());
    }

    pub fn step_chunk_overlap(&mut self, steps: i64) {
        let current = coerce_chunk_overlap(self.chunk_overlap.value());
        self.chunk_overlap
            .set(step_value(current, steps, CHUNK_OVERLAP_RANGE).to_string());
    }
}

impl Default for UploadForm {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

pub struct UploadCoordinator {
    backend: Arc<dyn RagBackend>,
    events: UnboundedSender<AppEvent>,
    pub form: UploadForm,
    notice: Option<Notice>,
    in_flight: bool,
}

impl UploadCoordinator {
    pub fn new(backend: Arc<dyn RagBackend>, events: UnboundedSender<AppEvent>, form: UploadForm) -> Self {
        Self {
            backend,
            events,
            form,
            notice: None,
            in_flight: false,
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn is_uploading(&self) -> bool {
        self.in_flight
    }

    /// Returns true when a request was started
    pub fn submit(&mut self) -> bool {
        if self.in_flight {
            self.notice = Some(Notice::Failure(UPLOAD_IN_PROGRESS.to_string()));
            return false;
        }

        let Some(path) = self.form.selected_file() else {
            self.notice = Some(Notice::Failure(NO_FILE_SELECTED.to_string()));
            return false;
        };

        let config = self.form.config();
        log::info!(
            "Uploading {} (chunk_size={}, chunk_overlap={})",
            path.display(),
            config.chunk_size,
            config.chunk_overlap
        );

        self.in_flight = true;
        self.notice = None;

        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = match prepare_upload(&path, config).await {
                Ok(upload) => backend.upload_document(upload).await.map_err(UploadError::from),
                Err(e) => Err(e),
            };
            let _ = events.send(AppEvent::UploadFinished(result));
        });

        true
    }

    pub fn complete(&mut self, result: Result<UploadReceipt, UploadError>) {
        self.in_flight = false;

        match result {
            Ok(receipt) => {
                log::info!("Upload accepted: {}", receipt.message);
                let text = match receipt.document_id {
                    Some(id) => format!("{} ({})", receipt.message, id),
                    None => receipt.message,
                };
                self.notice = Some(Notice::Success(text));
                self.form.clear_selection();
            }
            Err(e) => {
                log::error!("Upload failed: {}", e);
                self.notice = Some(Notice::Failure(e.user_message()));
            }
        }
    }
}
