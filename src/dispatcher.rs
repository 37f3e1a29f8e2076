use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use crate::api::{ApiError, RagBackend};
use crate::conversation::{Conversation, Message};
use crate::tui::AppEvent;

/// Shown in place of an assistant reply whenever a chat request fails
pub const APOLOGY: &str = "Sorry, I couldn't process your request. Please try again later.";

/// Sends chat messages in two phases: the user's message is appended right
/// away, the assistant's reply (or the apology) when the backend answers.
pub struct Dispatcher {
    backend: Arc<dyn RagBackend>,
    events: UnboundedSender<AppEvent>,
    in_flight: usize,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn RagBackend>, events: UnboundedSender<AppEvent>) -> Self {
        Self {
            backend,
            events,
            in_flight: 0,
        }
    }

    /// Callers reject blank input before getting here.
    pub fn send(&mut self, conversation: &mut Conversation, text: String) {
        conversation.append(Message::user(text.clone()));
        self.in_flight += 1;

        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = backend.chat(&text).await;
            // A closed channel means the UI is already gone
            let _ = events.send(AppEvent::ChatReply(result));
        });
    }

    pub fn complete(&mut self, conversation: &mut Conversation, result: Result<String, ApiError>) {
        self.in_flight = self.in_flight.saturating_sub(1);

        match result {
            Ok(reply) => conversation.append(Message::assistant(reply)),
            Err(e) => {
                log::error!("Chat request failed: {}", e);
                conversation.append(Message::assistant(APOLOGY));
            }
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn is_waiting(&self) -> bool {
        self.in_flight > 0
    }
}
