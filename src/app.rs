use std::sync::Arc;
use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;
use crate::api::{ApiError, RagBackend, UploadReceipt};
use crate::config::Config;
use crate::conversation::Conversation;
use crate::dispatcher::Dispatcher;
use crate::input::TextField;
use crate::tui::AppEvent;
use crate::upload::{UploadCoordinator, UploadError, UploadForm};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    FilePath,
    ChunkSize,
    ChunkOverlap,
    ChatInput,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::FilePath => Focus::ChunkSize,
            Focus::ChunkSize => Focus::ChunkOverlap,
            Focus::ChunkOverlap => Focus::ChatInput,
            Focus::ChatInput => Focus::FilePath,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Focus::FilePath => Focus::ChatInput,
            Focus::ChunkSize => Focus::FilePath,
            Focus::ChunkOverlap => Focus::ChunkSize,
            Focus::ChatInput => Focus::ChunkOverlap,
        }
    }

    pub fn is_upload_field(self) -> bool {
        self != Focus::ChatInput
    }
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: Focus,
    pub base_url: String,

    // Chat state
    pub conversation: Conversation,
    pub dispatcher: Dispatcher,
    pub chat_input: TextField,
    pub chat_scroll: u16,
    pub chat_height: u16, // Inner height of the transcript, for scroll calculations
    pub transcript_height: u16, // Wrapped line count of the last rendered transcript

    // Upload state
    pub uploader: UploadCoordinator,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Transcript area for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
}

impl App {
    pub fn new(
        backend: Arc<dyn RagBackend>,
        events: UnboundedSender<AppEvent>,
        config: &Config,
        base_url: &str,
    ) -> Self {
        let form = UploadForm::new(config.chunk_size(), config.chunk_overlap());

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            focus: Focus::ChatInput,
            base_url: base_url.to_string(),

            conversation: Conversation::new(),
            dispatcher: Dispatcher::new(Arc::clone(&backend), events.clone()),
            chat_input: TextField::default(),
            chat_scroll: 0,
            chat_height: 0,
            transcript_height: 0,

            uploader: UploadCoordinator::new(backend, events, form),

            animation_frame: 0,

            chat_area: None,
        }
    }

    /// Sends whatever is in the chat box. Blank input is left alone.
    pub fn submit_chat_input(&mut self) -> bool {
        if self.chat_input.is_blank() {
            return false;
        }

        let text = self.chat_input.take();
        self.dispatcher.send(&mut self.conversation, text);
        true
    }

    pub fn submit_upload(&mut self) -> bool {
        self.uploader.submit()
    }

    pub fn on_chat_reply(&mut self, result: Result<String, ApiError>) {
        self.dispatcher.complete(&mut self.conversation, result);
    }

    pub fn on_upload_finished(&mut self, result: Result<UploadReceipt, UploadError>) {
        self.uploader.complete(result);
    }

    /// Text field that currently receives keystrokes
    pub fn focused_field_mut(&mut self) -> &mut TextField {
        match self.focus {
            Focus::FilePath => &mut self.uploader.form.file_path,
            Focus::ChunkSize => &mut self.uploader.form.chunk_size,
            Focus::ChunkOverlap => &mut self.uploader.form.chunk_overlap,
            Focus::ChatInput => &mut self.chat_input,
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.prev();
    }

    /// Step a numeric upload field by whole widget steps; no-op elsewhere
    pub fn step_focused(&mut self, steps: i64) {
        match self.focus {
            Focus::ChunkSize => self.uploader.form.step_chunk_size(steps),
            Focus::ChunkOverlap => self.uploader.form.step_chunk_overlap(steps),
            _ => {}
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.dispatcher.is_waiting() || self.uploader.is_uploading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn scroll_down(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_add(1).min(self.max_chat_scroll());
    }

    pub fn scroll_up(&mut self) {
        self.chat_scroll = self.chat_scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half = (self.chat_height / 2).max(1);
        self.chat_scroll = self.chat_scroll.saturating_add(half).min(self.max_chat_scroll());
    }

    pub fn scroll_half_page_up(&mut self) {
        let half = (self.chat_height / 2).max(1);
        self.chat_scroll = self.chat_scroll.saturating_sub(half);
    }

    /// Scroll the transcript so the newest message (or "Thinking...") is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        self.chat_scroll = self.max_chat_scroll();
    }

    fn max_chat_scroll(&self) -> u16 {
        let visible_height = if self.chat_height > 0 { self.chat_height } else { 20 };
        self.transcript_height.saturating_sub(visible_height)
    }
}
